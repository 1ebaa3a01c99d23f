//! In-memory drivers.
//!
//! Each driver is paired with a probe that shares its state, so a test can
//! hand the driver to the runtime and still script key presses or inspect
//! recorded draw calls afterwards. Probes are `Rc` based; like the drivers
//! they stay on the UI thread.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use handplay_types::{Color, HandplayError, KeyBits, Rect, Result};

use crate::audio::{AudioDriver, AudioSpec};
use crate::platform::{PlatformDriver, PlatformEvent};
use crate::render::{ColorVertex, FontId, PixelFormat, RenderDriver, TextureId};

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PlatformState {
    keys: KeyBits,
    events: VecDeque<PlatformEvent>,
    battery: Option<u8>,
    initialized: bool,
    uninitialized: bool,
    key_polls: usize,
}

/// Platform driver whose keys and events are scripted through a
/// [`PlatformProbe`].
pub struct HeadlessPlatform {
    state: Rc<RefCell<PlatformState>>,
    files_dir: PathBuf,
}

impl HeadlessPlatform {
    pub fn new(files_dir: impl Into<PathBuf>) -> (Self, PlatformProbe) {
        let state = Rc::new(RefCell::new(PlatformState {
            battery: Some(80),
            ..PlatformState::default()
        }));
        let probe = PlatformProbe {
            state: Rc::clone(&state),
        };
        (
            Self {
                state,
                files_dir: files_dir.into(),
            },
            probe,
        )
    }
}

impl PlatformDriver for HeadlessPlatform {
    fn init(&mut self) -> Result<()> {
        self.state.borrow_mut().initialized = true;
        Ok(())
    }

    fn uninit(&mut self) {
        self.state.borrow_mut().uninitialized = true;
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.state.borrow_mut().events.drain(..).collect()
    }

    fn poll_keys(&mut self) -> KeyBits {
        let mut state = self.state.borrow_mut();
        state.key_polls += 1;
        state.keys
    }

    fn files_dir(&self) -> PathBuf {
        self.files_dir.clone()
    }

    fn battery_level(&self) -> Option<u8> {
        self.state.borrow().battery
    }
}

/// Script handle for a [`HeadlessPlatform`].
#[derive(Clone)]
pub struct PlatformProbe {
    state: Rc<RefCell<PlatformState>>,
}

impl PlatformProbe {
    /// Replace the held key mask reported by the next `poll_keys`.
    pub fn set_keys(&self, keys: KeyBits) {
        self.state.borrow_mut().keys = keys;
    }

    pub fn push_event(&self, event: PlatformEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn set_battery(&self, level: Option<u8>) {
        self.state.borrow_mut().battery = level;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    pub fn is_uninitialized(&self) -> bool {
        self.state.borrow().uninitialized
    }

    pub fn key_polls(&self) -> usize {
        self.state.borrow().key_polls
    }
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Rects { rects: Vec<Rect>, color: Color },
    Vertices(Vec<ColorVertex>),
    Text {
        text: String,
        x: f32,
        y: f32,
        size: u16,
        color: Color,
    },
    Texture { tex: TextureId, dst: Rect },
    ClipPush(Rect),
    ClipPop,
}

#[derive(Debug, Default)]
struct RenderState {
    calls: Vec<DrawCall>,
    frames: usize,
    in_frame: bool,
    fonts_loaded: usize,
    fail_font: bool,
    fail_start: bool,
    textures: HashMap<u64, (u32, u32)>,
    uploads: usize,
    next_id: u64,
}

/// Render driver that records draw calls instead of drawing.
///
/// Text is measured as half the font size per character.
pub struct HeadlessRender {
    state: Rc<RefCell<RenderState>>,
}

impl HeadlessRender {
    pub fn new() -> (Self, RenderProbe) {
        let state = Rc::new(RefCell::new(RenderState::default()));
        let probe = RenderProbe {
            state: Rc::clone(&state),
        };
        (Self { state }, probe)
    }

    fn record(&self, call: DrawCall) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.in_frame {
            return Err(HandplayError::Render("draw call outside of a frame".into()));
        }
        state.calls.push(call);
        Ok(())
    }

    fn next_id(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }
}

impl RenderDriver for HeadlessRender {
    fn init(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn uninit(&mut self) {
        self.state.borrow_mut().textures.clear();
    }

    fn render_start(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_start) {
            return Err(HandplayError::Render("display not ready".into()));
        }
        state.in_frame = true;
        state.calls.clear();
        Ok(())
    }

    fn render_end(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.in_frame = false;
        state.frames += 1;
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.record(DrawCall::Clear(color))
    }

    fn texture_init(&mut self, width: u32, height: u32, _format: PixelFormat) -> Result<TextureId> {
        let id = self.next_id();
        self.state.borrow_mut().textures.insert(id, (width, height));
        Ok(TextureId(id))
    }

    fn texture_uninit(&mut self, tex: TextureId) {
        self.state.borrow_mut().textures.remove(&tex.0);
    }

    fn texture_upload(&mut self, tex: TextureId, data: &[u8], stride: usize) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let (w, h) = *state
            .textures
            .get(&tex.0)
            .ok_or_else(|| HandplayError::Render(format!("unknown texture {}", tex.0)))?;
        let row = w as usize * PixelFormat::Rgba8888.bytes_per_pixel();
        if stride < row || data.len() < stride * (h as usize).saturating_sub(1) + row {
            return Err(HandplayError::Render("texture upload too short".into()));
        }
        state.uploads += 1;
        Ok(())
    }

    fn draw_texture(&mut self, tex: TextureId, dst: Rect) -> Result<()> {
        self.record(DrawCall::Texture { tex, dst })
    }

    fn font_init(&mut self, _path: Option<&Path>) -> Result<FontId> {
        if self.state.borrow().fail_font {
            return Err(HandplayError::Render("no font available".into()));
        }
        let id = self.next_id();
        self.state.borrow_mut().fonts_loaded += 1;
        Ok(FontId(id))
    }

    fn font_uninit(&mut self, _font: FontId) {}

    fn font_measure(&mut self, _font: FontId, size: u16, text: &str) -> Result<f32> {
        Ok(text.chars().count() as f32 * f32::from(size) * 0.5)
    }

    fn draw_text(
        &mut self,
        _font: FontId,
        size: u16,
        color: Color,
        x: f32,
        y: f32,
        text: &str,
    ) -> Result<()> {
        self.record(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
            size,
            color,
        })
    }

    fn clip_push(&mut self, rect: Rect) -> Result<()> {
        self.record(DrawCall::ClipPush(rect))
    }

    fn clip_pop(&mut self) -> Result<()> {
        self.record(DrawCall::ClipPop)
    }

    fn draw_rectangles(&mut self, rects: &[Rect], color: Color) -> Result<()> {
        self.record(DrawCall::Rects {
            rects: rects.to_vec(),
            color,
        })
    }

    fn draw_vertices(&mut self, strip: &[ColorVertex]) -> Result<()> {
        self.record(DrawCall::Vertices(strip.to_vec()))
    }
}

/// Inspection handle for a [`HeadlessRender`].
#[derive(Clone)]
pub struct RenderProbe {
    state: Rc<RefCell<RenderState>>,
}

impl RenderProbe {
    /// Completed frames.
    pub fn frames(&self) -> usize {
        self.state.borrow().frames
    }

    /// Calls of the most recent frame.
    pub fn calls(&self) -> Vec<DrawCall> {
        self.state.borrow().calls.clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    pub fn fonts_loaded(&self) -> usize {
        self.state.borrow().fonts_loaded
    }

    /// Make every following `font_init` fail.
    pub fn fail_fonts(&self) {
        self.state.borrow_mut().fail_font = true;
    }

    /// Make the next `render_start` fail.
    pub fn fail_next_frame(&self) {
        self.state.borrow_mut().fail_start = true;
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn uploads(&self) -> usize {
        self.state.borrow().uploads
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct AudioState {
    spec: Option<AudioSpec>,
    queue: VecDeque<usize>,
    played: usize,
}

/// Audio driver with a virtual ring. A buffer counts as played when the ring
/// overflows or when the probe advances playback.
pub struct HeadlessAudio {
    state: Rc<RefCell<AudioState>>,
    buffer_count: usize,
}

impl HeadlessAudio {
    pub fn new(buffer_count: usize) -> (Self, AudioProbe) {
        let state = Rc::new(RefCell::new(AudioState::default()));
        let probe = AudioProbe {
            state: Rc::clone(&state),
        };
        (
            Self {
                state,
                buffer_count: buffer_count.max(1),
            },
            probe,
        )
    }
}

fn queued_backlog(state: &AudioState) -> usize {
    let total: usize = state.queue.iter().sum();
    total.saturating_sub(state.queue.front().copied().unwrap_or(0))
}

impl AudioDriver for HeadlessAudio {
    fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    fn open(&mut self, spec: AudioSpec) -> Result<()> {
        if spec.channels == 0 || spec.samples == 0 || spec.freq == 0 {
            return Err(HandplayError::Audio(format!("invalid spec {spec:?}")));
        }
        let mut state = self.state.borrow_mut();
        state.spec = Some(spec);
        state.queue.clear();
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.spec = None;
        state.queue.clear();
    }

    fn output(&mut self, pcm: Option<&[i16]>) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        let spec = state
            .spec
            .ok_or_else(|| HandplayError::Audio("output on a closed device".into()))?;
        let Some(pcm) = pcm else {
            state.queue.clear();
            return Ok(0);
        };
        let frames = pcm.len() / spec.channels as usize;
        while state.queue.len() >= self.buffer_count {
            if let Some(done) = state.queue.pop_front() {
                state.played += done;
            }
        }
        state.queue.push_back(frames);
        Ok(queued_backlog(&state))
    }

    fn backlog(&self) -> usize {
        queued_backlog(&self.state.borrow())
    }
}

/// Inspection handle for a [`HeadlessAudio`].
#[derive(Clone)]
pub struct AudioProbe {
    state: Rc<RefCell<AudioState>>,
}

impl AudioProbe {
    pub fn is_open(&self) -> bool {
        self.state.borrow().spec.is_some()
    }

    /// Frames that finished playing.
    pub fn played(&self) -> usize {
        self.state.borrow().played
    }

    /// Finish the buffer currently playing.
    pub fn play_one(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(done) = state.queue.pop_front() {
            state.played += done;
        }
    }
}
