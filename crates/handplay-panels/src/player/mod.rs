//! Playback panel.
//!
//! Owns one media engine for the lifetime of the panel. Engine events are
//! drained on every loop iteration; when the engine reports shutdown it is
//! terminated on a helper thread and the panel pops itself once that thread
//! is done, so the UI loop never blocks on engine teardown.

pub mod engine;
pub mod osc;
pub mod perf;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use handplay_core::{Panel, Ui, Waker};
use handplay_platform::{AudioSpec, PixelFormat, SCREEN_HEIGHT, SCREEN_WIDTH, TextureId};
use handplay_types::{Color, Key, Rect, Result};

use self::engine::{EngineCommand, EngineEvent, EngineFactory, MediaEngine, VideoFrame};
use self::osc::Osc;
use self::perf::PerfOverlay;

/// Queued audio is topped up while it holds fewer buffers than this.
const AUDIO_BACKLOG_BUFFERS: usize = 2;

pub struct PlayerInit {
    pub path: PathBuf,
    /// Show the engine statistics overlay.
    pub enable_perf: bool,
    pub engine: EngineFactory,
}

struct VideoTexture {
    tex: TextureId,
    width: u32,
    height: u32,
}

pub struct PlayerPanel {
    path: PathBuf,
    engine: Option<Box<dyn MediaEngine>>,
    osc: Osc,
    perf: Option<PerfOverlay>,
    audio: Option<AudioSpec>,
    /// A PCM buffer taken from the engine that did not fit yet.
    pending_pcm: Option<Vec<i16>>,
    video: Option<VideoTexture>,
    /// Set by the teardown thread once the engine is gone.
    teardown: Option<Arc<AtomicBool>>,
}

impl PlayerPanel {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn osc(&self) -> &Osc {
        &self.osc
    }

    pub fn perf(&self) -> Option<&PerfOverlay> {
        self.perf.as_ref()
    }

    /// True once the engine reported shutdown.
    pub fn is_closing(&self) -> bool {
        self.teardown.is_some()
    }

    fn begin_teardown(&mut self, ui: &Ui) {
        if let Some(engine) = self.engine.take() {
            log::info!("Engine shut down, terminating");
            self.teardown = Some(terminate_async(engine, ui.waker()));
        }
    }

    fn feed_audio(&mut self, ui: &mut Ui) {
        let (Some(spec), Some(engine)) = (self.audio, self.engine.as_mut()) else {
            return;
        };
        let Some(audio) = ui.audio() else {
            return;
        };
        let limit = spec.samples * AUDIO_BACKLOG_BUFFERS;
        while audio.backlog() < limit {
            let Some(pcm) = self.pending_pcm.take().or_else(|| engine.take_audio()) else {
                break;
            };
            if let Err(e) = audio.output(Some(pcm.as_slice())) {
                log::warn!("Audio output failed: {e}");
                self.pending_pcm = Some(pcm);
                break;
            }
        }
    }

    fn update_video(&mut self, ui: &mut Ui) {
        let Some(frame) = self.engine.as_mut().and_then(|e| e.take_video_frame()) else {
            return;
        };
        match self.upload_frame(ui, &frame) {
            Ok(()) => ui.invalidate(),
            Err(e) => log::warn!("Dropping video frame {frame:?}: {e}"),
        }
    }

    fn upload_frame(&mut self, ui: &mut Ui, frame: &VideoFrame) -> Result<()> {
        let render = ui.render();
        let reuse = self
            .video
            .as_ref()
            .is_some_and(|v| v.width == frame.width && v.height == frame.height);
        if !reuse {
            if let Some(old) = self.video.take() {
                render.texture_uninit(old.tex);
            }
            let tex = render.texture_init(frame.width, frame.height, PixelFormat::Rgba8888)?;
            self.video = Some(VideoTexture {
                tex,
                width: frame.width,
                height: frame.height,
            });
        }
        let Some(video) = self.video.as_ref() else {
            return Ok(());
        };
        let stride = frame.width as usize * PixelFormat::Rgba8888.bytes_per_pixel();
        render.texture_upload(video.tex, &frame.data, stride)
    }

    fn draw_video(&self, ui: &mut Ui) -> Result<()> {
        let render = ui.render();
        render.clear(Color::BLACK)?;
        match &self.video {
            Some(v) => render.draw_texture(v.tex, fit_rect(v.width, v.height)),
            None => Ok(()),
        }
    }

    fn close_audio(&mut self, ui: &mut Ui) {
        self.pending_pcm = None;
        if self.audio.take().is_none() {
            return;
        }
        if let Some(audio) = ui.audio() {
            if let Err(e) = audio.output(None) {
                log::debug!("Audio drain failed: {e}");
            }
            audio.close();
        }
    }
}

impl Panel for PlayerPanel {
    type Init = PlayerInit;

    fn init(ui: &mut Ui, init: PlayerInit) -> Result<Self> {
        let mut engine = (init.engine)()?;
        engine.set_waker(ui.waker());
        if let Err(e) = engine.load(&init.path) {
            terminate_async(engine, ui.waker());
            return Err(e);
        }
        log::info!("Playing {}", init.path.display());

        let mut audio = None;
        if let (Some(spec), Some(driver)) = (engine.audio_spec(), ui.audio()) {
            match driver.open(spec) {
                Ok(()) => audio = Some(spec),
                Err(e) => log::warn!("Playing without sound: {e}"),
            }
        }

        let perf = init
            .enable_perf
            .then(|| PerfOverlay::new(Duration::from_millis(ui.config().perf.interval_ms)));

        Ok(Self {
            path: init.path,
            engine: Some(engine),
            osc: Osc::new(ui),
            perf,
            audio,
            pending_pcm: None,
            video: None,
            teardown: None,
        })
    }

    fn uninit(&mut self, ui: &mut Ui) {
        self.osc.clear();
        if let Some(perf) = self.perf.as_mut() {
            perf.stop(ui);
        }
        self.close_audio(ui);
        if let Some(video) = self.video.take() {
            ui.render().texture_uninit(video.tex);
        }
        // Popped before the engine shut down on its own.
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.command(EngineCommand::Quit) {
                log::debug!("Quit before terminate failed: {e}");
            }
            terminate_async(engine, ui.waker());
        }
    }

    fn on_draw(&mut self, ui: &mut Ui) -> Result<()> {
        self.draw_video(ui)?;
        if let Some(perf) = &self.perf {
            perf.draw(ui)?;
        }
        self.osc.draw(ui)
    }

    fn on_poll(&mut self, ui: &mut Ui) {
        if let Some(done) = &self.teardown {
            if done.load(Ordering::Acquire) {
                ui.pop();
            }
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        self.osc.poll(ui, engine.as_mut());
        if let Some(perf) = self.perf.as_mut() {
            perf.poll(ui, engine.as_mut());
        }

        while let Some(event) = engine.poll_event() {
            match event {
                EngineEvent::PropertyChange(prop) => self.osc.on_property(ui, prop),
                EngineEvent::Shutdown => {
                    self.begin_teardown(ui);
                    return;
                }
            }
        }

        self.feed_audio(ui);
        self.update_video(ui);
    }

    fn on_key(&mut self, ui: &mut Ui, key: Key) {
        if let Some(engine) = self.engine.as_mut() {
            self.osc.on_key(ui, key, engine.as_mut());
        }
    }
}

/// Run the blocking engine teardown off the UI thread. The returned flag is
/// set, and the UI woken, once it finished.
fn terminate_async(engine: Box<dyn MediaEngine>, waker: Waker) -> Arc<AtomicBool> {
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    let spawned = thread::Builder::new()
        .name("engine-teardown".into())
        .spawn(move || {
            engine.terminate();
            flag.store(true, Ordering::Release);
            waker.wake();
            log::info!("Engine terminated");
        });
    if let Err(e) = spawned {
        log::warn!("Could not spawn engine teardown thread: {e}");
        done.store(true, Ordering::Release);
    }
    done
}

/// Largest rectangle with the frame's aspect ratio, centered on screen.
fn fit_rect(width: u32, height: u32) -> Rect {
    let (sw, sh) = (SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32);
    if width == 0 || height == 0 {
        return Rect::new(0.0, 0.0, sw, sh);
    }
    let scale = (sw / width as f32).min(sh / height as f32);
    let (w, h) = (width as f32 * scale, height as f32 * scale);
    Rect::from_xywh((sw - w) / 2.0, (sh - h) / 2.0, w, h)
}
