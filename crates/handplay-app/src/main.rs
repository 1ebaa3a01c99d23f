//! handplay desktop simulator.
//!
//! Opens the file browser in an SDL2 window. Files are "played" by a
//! simulated engine that ticks a playback position and emits a quiet tone.
//!
//! Keys: E/D/S/F dpad, L circle, K cross, I triangle, J square, W/O
//! triggers. Set `HANDPLAY_CONFIG` to a TOML file to override defaults.

mod args;
mod sim_engine;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use handplay_core::{Drivers, UiContext};
use handplay_panels::{EngineFactory, FilesInit, FilesPanel, MediaEngine};
use handplay_types::HandplayConfig;

use args::Args;
use sim_engine::SimEngine;

const CONFIG_ENV: &str = "HANDPLAY_CONFIG";

fn load_config(args: &Args) -> Result<HandplayConfig> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            HandplayConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => HandplayConfig::default(),
    };
    if let Some(dir) = &args.files_dir {
        config.files_dir = Some(dir.clone());
    }
    config.swap_ok |= args.swap_ok;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(std::env::args().skip(1));
    let config = load_config(&args)?;
    log::info!("Starting handplay at {} fps", config.frame_rate);

    let home = std::env::current_dir().context("reading the working directory")?;
    let sdl = handplay_backend_sdl::open(&config, home).context("opening the simulator window")?;
    let drivers = Drivers {
        platform: Box::new(sdl.platform),
        render: Box::new(sdl.render),
        audio: Some(Box::new(sdl.audio)),
    };
    let mut ctx = UiContext::new(drivers, config).context("initializing the UI")?;

    let engine: EngineFactory =
        Arc::new(|| SimEngine::spawn().map(|e| Box::new(e) as Box<dyn MediaEngine>));
    ctx.push_initial::<FilesPanel>(FilesInit {
        start_dir: None,
        engine,
    })
    .context("opening the file browser")?;

    ctx.main_loop();
    drop(ctx);
    log::info!("handplay exited");
    Ok(())
}
