//! Test harness around a [`UiContext`] running on headless drivers.
//!
//! The harness drives the loop with a synthetic clock: every
//! [`step`](Harness::step) moves time forward by exactly one frame, so frame
//! times and key-repeat timing are deterministic.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use handplay_platform::headless::{
    AudioProbe, HeadlessAudio, HeadlessPlatform, HeadlessRender, PlatformProbe, RenderProbe,
};
use handplay_types::{HandplayConfig, KeyBits, KeyCode};

use crate::context::{Drivers, UiContext};

pub struct Harness {
    pub ctx: UiContext,
    pub platform: PlatformProbe,
    pub render: RenderProbe,
    pub audio: AudioProbe,
    held: KeyBits,
    now: Instant,
}

impl Harness {
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(files_dir, HandplayConfig::default())
    }

    pub fn with_config(files_dir: impl Into<PathBuf>, config: HandplayConfig) -> Self {
        let (platform, platform_probe) = HeadlessPlatform::new(files_dir);
        let (render, render_probe) = HeadlessRender::new();
        let (audio, audio_probe) = HeadlessAudio::new(4);
        let drivers = Drivers {
            platform: Box::new(platform),
            render: Box::new(render),
            audio: Some(Box::new(audio)),
        };
        let ctx = UiContext::new(drivers, config).expect("headless drivers always initialize");
        let now = ctx.ui().frame_time();
        Self {
            ctx,
            platform: platform_probe,
            render: render_probe,
            audio: audio_probe,
            held: KeyBits::NONE,
            now,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn frame_interval(&self) -> Duration {
        self.ctx.ui().config().frame_interval()
    }

    /// Advance one frame and run one loop iteration.
    pub fn step(&mut self) -> bool {
        self.now += self.frame_interval();
        self.ctx.run_iteration_at(self.now)
    }

    pub fn steps(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Run frames until at least `duration` of synthetic time has passed.
    pub fn run_for(&mut self, duration: Duration) {
        let end = self.now + duration;
        while self.now < end {
            self.step();
        }
    }

    /// Run one iteration without crossing a frame boundary: polls and
    /// dispatched tasks only.
    pub fn idle(&mut self) -> bool {
        self.ctx.run_iteration_at(self.now)
    }

    pub fn press(&mut self, code: KeyCode) {
        self.held.insert(code);
        self.platform.set_keys(self.held);
        self.step();
    }

    pub fn release(&mut self, code: KeyCode) {
        self.held.remove(code);
        self.platform.set_keys(self.held);
        self.step();
    }

    /// Press and release on consecutive frames.
    pub fn tap(&mut self, code: KeyCode) {
        self.press(code);
        self.release(code);
    }
}
