//! Simulated media engine for the desktop build.
//!
//! A worker thread plays a file by ticking a position forward: it reports
//! progress, fills the audio queue with a quiet tone and paints a moving
//! test pattern. Duration is derived from the file size so larger files
//! play longer.

use std::f64::consts::TAU;
use std::fs;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};

use handplay_core::Waker;
use handplay_panels::{
    EngineCommand, EngineEvent, EngineStats, MediaEngine, Property, StatsReply, VideoFrame,
};
use handplay_platform::AudioSpec;
use handplay_types::{HandplayError, Result};

const TICK: Duration = Duration::from_millis(50);
const FRAME_PERIOD: Duration = Duration::from_millis(250);

const AUDIO: AudioSpec = AudioSpec {
    samples: 1024,
    freq: 48_000,
    channels: 2,
};
const AUDIO_QUEUE: usize = 8;
const TONE_HZ: f64 = 220.0;
/// Fraction of full scale.
const TONE_LEVEL: f64 = 0.05;

const VIDEO_W: u32 = 192;
const VIDEO_H: u32 = 108;
/// Decoder surfaces held while playing.
const DR_SURFACES: u32 = 2;

/// Simulated bitrate used to turn file sizes into durations.
const BYTES_PER_SECOND: f64 = 16_000.0;
const MIN_DURATION: f64 = 10.0;
const MAX_DURATION: f64 = 600.0;

enum Msg {
    Waker(Waker),
    Load { title: String, duration: f64 },
    Command(EngineCommand),
    Stats(StatsReply),
}

#[derive(Debug, Clone, PartialEq)]
struct Playback {
    duration: f64,
    position: f64,
    paused: bool,
}

impl Playback {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            position: 0.0,
            paused: false,
        }
    }

    /// Move forward by `dt` unless paused. Returns true at the end.
    fn advance(&mut self, dt: Duration) -> bool {
        if !self.paused {
            self.position = (self.position + dt.as_secs_f64()).min(self.duration);
        }
        self.position >= self.duration
    }

    fn seek(&mut self, secs: f64) {
        self.position = (self.position + secs).clamp(0.0, self.duration);
    }

    fn percent(&self) -> f64 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.position / self.duration * 100.0
        }
    }
}

fn duration_for(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_SECOND).clamp(MIN_DURATION, MAX_DURATION)
}

/// One buffer of a sine tone, same value on every channel.
fn tone(phase: &mut f64, spec: &AudioSpec) -> Vec<i16> {
    let step = TONE_HZ / f64::from(spec.freq);
    let amplitude = f64::from(i16::MAX) * TONE_LEVEL;
    let mut pcm = Vec::with_capacity(spec.buffer_len());
    for _ in 0..spec.samples {
        let value = ((*phase * TAU).sin() * amplitude) as i16;
        pcm.extend(std::iter::repeat_n(value, usize::from(spec.channels)));
        *phase = (*phase + step).fract();
    }
    pcm
}

/// Horizontal color bands that scroll with the playback position.
fn test_pattern(position: f64) -> VideoFrame {
    let shift = (position * 40.0) as u32;
    let mut data = Vec::with_capacity((VIDEO_W * VIDEO_H * 4) as usize);
    for y in 0..VIDEO_H {
        for x in 0..VIDEO_W {
            let band = (x + shift) % VIDEO_W;
            data.extend_from_slice(&[
                (band * 255 / VIDEO_W) as u8,
                (y * 255 / VIDEO_H) as u8,
                0x72,
                0xff,
            ]);
        }
    }
    VideoFrame {
        width: VIDEO_W,
        height: VIDEO_H,
        data,
    }
}

struct Worker {
    rx: Receiver<Msg>,
    events: Sender<EngineEvent>,
    audio: Sender<Vec<i16>>,
    video: Sender<VideoFrame>,
    waker: Option<Waker>,
    playback: Option<Playback>,
    phase: f64,
    last_frame: Option<Instant>,
}

impl Worker {
    fn run(mut self) {
        let mut next_tick = Instant::now() + TICK;
        loop {
            match self.rx.recv_deadline(next_tick) {
                Ok(msg) => self.handle(msg),
                Err(RecvTimeoutError::Timeout) => {
                    self.tick(TICK);
                    next_tick += TICK;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!("Simulated engine thread exiting");
    }

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_ok() {
            if let Some(waker) = &self.waker {
                waker.wake();
            }
        }
    }

    fn emit_property(&self, prop: Property) {
        self.emit(EngineEvent::PropertyChange(prop));
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Waker(waker) => self.waker = Some(waker),
            Msg::Load { title, duration } => {
                log::info!("Simulating {title} ({duration:.0}s)");
                self.playback = Some(Playback::new(duration));
                self.emit_property(Property::MediaTitle(title));
                self.emit_property(Property::Duration(duration));
                self.emit_property(Property::Pause(false));
                self.emit_property(Property::PercentPos(0.0));
            }
            Msg::Command(cmd) => self.command(cmd),
            Msg::Stats(reply) => reply(self.stats()),
        }
    }

    fn command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Quit => {
                self.playback = None;
                self.emit(EngineEvent::Shutdown);
            }
            EngineCommand::Seek(secs) => {
                if let Some(p) = self.playback.as_mut() {
                    p.seek(secs);
                    let percent = p.percent();
                    self.emit_property(Property::PercentPos(percent));
                }
            }
            EngineCommand::CyclePause => {
                if let Some(p) = self.playback.as_mut() {
                    p.paused = !p.paused;
                    let paused = p.paused;
                    self.emit_property(Property::Pause(paused));
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        if playback.paused {
            return;
        }
        if playback.advance(dt) {
            log::info!("Simulated playback reached the end");
            self.playback = None;
            self.emit(EngineEvent::Shutdown);
            return;
        }
        let (percent, position) = (playback.percent(), playback.position);
        self.emit_property(Property::PercentPos(percent));

        while !self.audio.is_full() {
            if self.audio.try_send(tone(&mut self.phase, &AUDIO)).is_err() {
                break;
            }
        }

        let now = Instant::now();
        if self
            .last_frame
            .is_none_or(|at| now.duration_since(at) >= FRAME_PERIOD)
        {
            self.last_frame = Some(now);
            // A full slot means the UI has not taken the last frame yet.
            let _ = self.video.try_send(test_pattern(position));
        }
    }

    fn stats(&self) -> EngineStats {
        let Some(playback) = &self.playback else {
            return EngineStats::default();
        };
        let frame_bytes = u64::from(VIDEO_W * VIDEO_H * 4);
        let buffer_bytes = (AUDIO.buffer_len() * std::mem::size_of::<i16>()) as u64;
        EngineStats {
            dr_count: DR_SURFACES,
            dr_bytes: frame_bytes * u64::from(DR_SURFACES),
            fw_bytes: self.audio.len() as u64 * buffer_bytes,
            total_bytes: (playback.position * BYTES_PER_SECOND) as u64,
        }
    }
}

/// Handle to a simulated engine thread.
pub struct SimEngine {
    tx: Sender<Msg>,
    events: Receiver<EngineEvent>,
    audio: Receiver<Vec<i16>>,
    video: Receiver<VideoFrame>,
    thread: JoinHandle<()>,
}

impl SimEngine {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = unbounded();
        let (events_tx, events) = unbounded();
        let (audio_tx, audio) = bounded(AUDIO_QUEUE);
        let (video_tx, video) = bounded(1);
        let worker = Worker {
            rx,
            events: events_tx,
            audio: audio_tx,
            video: video_tx,
            waker: None,
            playback: None,
            phase: 0.0,
            last_frame: None,
        };
        let thread = thread::Builder::new()
            .name("sim-engine".into())
            .spawn(move || worker.run())?;
        Ok(Self {
            tx,
            events,
            audio,
            video,
            thread,
        })
    }

    fn send(&self, msg: Msg) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| HandplayError::Engine("engine thread has exited".into()))
    }
}

impl MediaEngine for SimEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(HandplayError::Engine(format!(
                "{} is not a playable file",
                path.display()
            )));
        }
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.send(Msg::Load {
            title,
            duration: duration_for(meta.len()),
        })
    }

    fn command(&mut self, cmd: EngineCommand) -> Result<()> {
        self.send(Msg::Command(cmd))
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.try_recv().ok()
    }

    fn set_waker(&mut self, waker: Waker) {
        if let Err(e) = self.send(Msg::Waker(waker)) {
            log::debug!("Waker not installed: {e}");
        }
    }

    fn request_stats(&mut self, reply: StatsReply) {
        if let Err(e) = self.send(Msg::Stats(reply)) {
            log::debug!("Stats request dropped: {e}");
        }
    }

    fn terminate(self: Box<Self>) {
        let SimEngine { tx, thread, .. } = *self;
        drop(tx);
        if thread.join().is_err() {
            log::warn!("Simulated engine thread panicked");
        }
    }

    fn audio_spec(&self) -> Option<AudioSpec> {
        Some(AUDIO)
    }

    fn take_audio(&mut self) -> Option<Vec<i16>> {
        self.audio.try_recv().ok()
    }

    fn take_video_frame(&mut self) -> Option<VideoFrame> {
        self.video.try_recv().ok()
    }
}
