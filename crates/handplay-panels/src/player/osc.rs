//! On-screen controls drawn over playback.
//!
//! Top bar with the media title, clock and battery; bottom bar with the
//! progress frame. The bars appear when playback pauses or resumes and hide
//! again after a delay. Clock and battery texts are refreshed by pollers
//! driven by the frame time.

use std::time::{Duration, Instant};

use handplay_core::{KeyBinding, KeyFire, KeyRepeat, Ui};
use handplay_platform::{FontId, RenderDriver, SCREEN_HEIGHT, SCREEN_WIDTH, ShapeItem};
use handplay_types::time::CalendarTime;
use handplay_types::{Color, Key, KeyCode, Rect, Result};

use super::engine::{EngineCommand, MediaEngine, Property};

const COLOR_OVERLAY: Color = Color::from_abgr(0xbf00_0000);
const COLOR_TEXT: Color = Color::from_abgr(0xffff_ffff);
const COLOR_PROGRESS_BAR: Color = Color::from_abgr(0xff72_2b72);
const COLOR_PROGRESS_FRAME: Color = Color::from_abgr(0xbfff_ffff);

const SCREEN_W: f32 = SCREEN_WIDTH as f32;
const SCREEN_H: f32 = SCREEN_HEIGHT as f32;

const TOP_H: f32 = 40.0;
const TEXT_Y: f32 = 28.0;
const FONT_SIZE: u16 = 20;
const TITLE_X: f32 = 20.0;
const TIME_X: f32 = 810.0;
const BATTERY_X: f32 = 890.0;
const TITLE_MAX_CHARS: usize = 35;

const BOTTOM_H: f32 = 90.0;
const BOTTOM_T: f32 = SCREEN_H - BOTTOM_H;

const FRAME_MARGIN_X: f32 = 20.0;
const FRAME_MARGIN_T: f32 = 20.0;
const FRAME_LINE_W: f32 = 2.0;
const FRAME_H: f32 = 20.0;
const FRAME_L: f32 = FRAME_MARGIN_X;
const FRAME_R: f32 = SCREEN_W - FRAME_MARGIN_X;
const FRAME_T: f32 = BOTTOM_T + FRAME_MARGIN_T;
const FRAME_B: f32 = FRAME_T + FRAME_H;

const BAR_MARGIN: f32 = 4.0;
const BAR_L: f32 = FRAME_L + BAR_MARGIN;
const BAR_T: f32 = FRAME_T + BAR_MARGIN;
const BAR_B: f32 = FRAME_B - BAR_MARGIN;
/// Progress bar width at 100%.
pub const BAR_FULL_W: u32 = (FRAME_R - FRAME_L - 2.0 * BAR_MARGIN) as u32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum OscAction {
    Seek(f64),
    CyclePause,
    Quit,
}

const OSC_KEYS: [KeyBinding<OscAction>; 6] = [
    KeyBinding::repeat(KeyCode::DpadUp, OscAction::Seek(10.0)),
    KeyBinding::repeat(KeyCode::DpadDown, OscAction::Seek(-10.0)),
    KeyBinding::repeat(KeyCode::DpadLeft, OscAction::Seek(-5.0)),
    KeyBinding::repeat(KeyCode::DpadRight, OscAction::Seek(5.0)),
    KeyBinding::click(KeyCode::VirtualOk, OscAction::CyclePause),
    KeyBinding::click(KeyCode::VirtualCancel, OscAction::Quit),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Poller {
    Clock,
    Battery,
    Hide,
}

impl Poller {
    const ALL: [Poller; 3] = [Poller::Clock, Poller::Battery, Poller::Hide];

    /// Delay until the next run; `None` for one-shot pollers.
    fn period(self) -> Option<Duration> {
        match self {
            Poller::Clock => Some(Duration::from_secs(60)),
            Poller::Battery => Some(Duration::from_secs(5 * 60)),
            Poller::Hide => None,
        }
    }
}

pub struct Osc {
    visible: bool,
    keys: KeyRepeat<OscAction>,
    hide_delay: Duration,
    title: String,
    progress_width: u32,
    clock_text: String,
    battery_text: String,
    battery: Option<u8>,
    /// Next run of each poller, indexed like `Poller::ALL`.
    schedule: [Option<Instant>; 3],
}

impl Osc {
    pub fn new(ui: &Ui) -> Self {
        let config = &ui.config().osc;
        let now = ui.frame_time();
        Self {
            visible: false,
            keys: KeyRepeat::new(config.repeat()),
            hide_delay: Duration::from_millis(config.hide_delay_ms),
            title: String::new(),
            progress_width: 0,
            clock_text: String::new(),
            battery_text: String::new(),
            battery: None,
            schedule: [Some(now), Some(now), None],
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn progress_width(&self) -> u32 {
        self.progress_width
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    pub fn battery_text(&self) -> &str {
        &self.battery_text
    }

    /// Run due pollers and key repeats.
    pub fn poll(&mut self, ui: &mut Ui, engine: &mut dyn MediaEngine) {
        let now = ui.frame_time();
        self.run_pollers(ui, now);
        if let Some(fire) = self.keys.poll(now) {
            perform(fire, engine);
        }
    }

    pub fn on_key(&mut self, ui: &mut Ui, key: Key, engine: &mut dyn MediaEngine) {
        if let Some(fire) = self.keys.dispatch(key, ui.frame_time(), &OSC_KEYS) {
            perform(fire, engine);
        }
    }

    pub fn on_property(&mut self, ui: &mut Ui, prop: Property) {
        match prop {
            Property::Pause(_) => {
                self.show(ui, true);
                return;
            }
            Property::PercentPos(percent) => {
                let width = (f64::from(BAR_FULL_W) * percent.clamp(0.0, 100.0) / 100.0) as u32;
                if width == self.progress_width {
                    return;
                }
                self.progress_width = width;
            }
            Property::MediaTitle(title) => self.title = ellipsize(&title, TITLE_MAX_CHARS),
            Property::Duration(_) => return,
        }
        ui.invalidate();
    }

    /// Show the bars and run due pollers. With `delayed_hide` the bars hide
    /// again after the configured delay.
    pub fn show(&mut self, ui: &mut Ui, delayed_hide: bool) {
        self.visible = true;
        self.schedule[Poller::Hide as usize] = None;
        let now = ui.frame_time();
        self.run_pollers(ui, now);
        ui.invalidate();
        if delayed_hide {
            self.schedule[Poller::Hide as usize] = Some(now + self.hide_delay);
        }
    }

    /// Drop pending pollers and held keys.
    pub fn clear(&mut self) {
        self.visible = false;
        self.schedule = [None; 3];
        self.keys.reset();
    }

    fn run_pollers(&mut self, ui: &mut Ui, now: Instant) {
        for poller in Poller::ALL {
            let slot = poller as usize;
            if !self.schedule[slot].is_some_and(|at| at <= now) {
                continue;
            }
            self.run_poller(ui, poller);
            self.schedule[slot] = poller.period().map(|p| now + p);
        }
    }

    fn run_poller(&mut self, ui: &mut Ui, poller: Poller) {
        match poller {
            Poller::Clock => {
                let text = CalendarTime::now().clock_text();
                if text != self.clock_text {
                    self.clock_text = text;
                    ui.invalidate();
                }
            }
            Poller::Battery => {
                let level = ui.platform().battery_level();
                if level == self.battery {
                    return;
                }
                self.battery = level;
                self.battery_text = level.map(|l| format!("{l}%")).unwrap_or_default();
                ui.invalidate();
            }
            Poller::Hide => {
                log::trace!("Hiding OSC");
                self.visible = false;
                ui.invalidate();
            }
        }
    }

    pub fn draw(&self, ui: &mut Ui) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        ui.render().draw_shapes(&self.shapes())?;
        let Some(font) = ui.font() else {
            return Ok(());
        };
        self.draw_texts(ui.render(), font)
    }

    fn shapes(&self) -> [ShapeItem; 4] {
        [
            ShapeItem::fill(Rect::new(0.0, 0.0, SCREEN_W, TOP_H), COLOR_OVERLAY),
            ShapeItem::fill(Rect::new(0.0, BOTTOM_T, SCREEN_W, SCREEN_H), COLOR_OVERLAY),
            ShapeItem::line(
                Rect::new(FRAME_L, FRAME_T, FRAME_R, FRAME_B),
                FRAME_LINE_W,
                COLOR_PROGRESS_FRAME,
            ),
            ShapeItem::fill(
                Rect::new(BAR_L, BAR_T, BAR_L + self.progress_width as f32, BAR_B),
                COLOR_PROGRESS_BAR,
            ),
        ]
    }

    fn draw_texts(&self, render: &mut dyn RenderDriver, font: FontId) -> Result<()> {
        if !self.title.is_empty() {
            render.draw_text(font, FONT_SIZE, COLOR_TEXT, TITLE_X, TEXT_Y, &self.title)?;
        }
        render.draw_text(font, FONT_SIZE, COLOR_TEXT, BATTERY_X, TEXT_Y, &self.battery_text)?;
        render.draw_text(font, FONT_SIZE, COLOR_TEXT, TIME_X, TEXT_Y, &self.clock_text)
    }
}

fn perform(fire: KeyFire<OscAction>, engine: &mut dyn MediaEngine) {
    let cmd = match fire.action {
        OscAction::Seek(secs) => EngineCommand::Seek(secs * f64::from(fire.repeat.max(1))),
        OscAction::CyclePause => EngineCommand::CyclePause,
        OscAction::Quit => EngineCommand::Quit,
    };
    if let Err(e) = engine.command(cmd.clone()) {
        log::warn!("Engine rejected {cmd:?}: {e}");
    }
}

/// Keep at most `max_chars` characters, marking a cut with `...`.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
