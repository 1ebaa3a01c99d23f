//! SDL2 backend for handplay.
//!
//! Runs the handheld UI in a desktop window: the keyboard stands in for the
//! buttons, SDL2_ttf renders text and an SDL audio queue plays PCM. Used for
//! development and for the desktop simulator binary.

mod audio;
mod font;
mod platform;
mod render;

use std::path::PathBuf;

use handplay_platform::{SCREEN_HEIGHT, SCREEN_WIDTH};
use handplay_types::{HandplayConfig, HandplayError, Result};

pub use audio::SdlAudio;
pub use platform::SdlPlatform;
pub use render::SdlRender;

const WINDOW_TITLE: &str = "handplay";

/// The three drivers sharing one SDL context.
pub struct SdlDrivers {
    pub platform: SdlPlatform,
    pub render: SdlRender,
    pub audio: SdlAudio,
}

/// Open the simulator window and the SDL subsystems behind it.
pub fn open(config: &HandplayConfig, files_dir: PathBuf) -> Result<SdlDrivers> {
    let sdl = sdl2::init().map_err(platform_err)?;
    let video = sdl.video().map_err(platform_err)?;
    let scale = config.window_scale.max(1);
    let window = video
        .window(WINDOW_TITLE, SCREEN_WIDTH * scale, SCREEN_HEIGHT * scale)
        .position_centered()
        .build()
        .map_err(platform_err)?;
    let event_pump = sdl.event_pump().map_err(platform_err)?;
    let audio = sdl.audio().map_err(|e| HandplayError::Audio(e.to_string()))?;

    log::info!(
        "SDL2 window opened: {}x{} (scale {scale})",
        SCREEN_WIDTH * scale,
        SCREEN_HEIGHT * scale
    );

    Ok(SdlDrivers {
        platform: SdlPlatform::new(event_pump, files_dir, config.swap_ok),
        render: SdlRender::new(window)?,
        audio: SdlAudio::new(audio),
    })
}

fn platform_err(e: impl ToString) -> HandplayError {
    HandplayError::Platform(e.to_string())
}
