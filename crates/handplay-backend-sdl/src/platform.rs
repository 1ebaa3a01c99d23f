//! Keyboard-as-gamepad input and desktop device facts.

use std::path::{Path, PathBuf};

use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;

use handplay_platform::{PlatformDriver, PlatformEvent};
use handplay_types::{KeyBits, KeyCode, Result};

/// Physical key for each handheld button, laid out for two hands on the
/// home row.
const KEY_MAP: [(Scancode, KeyCode); 12] = [
    (Scancode::S, KeyCode::DpadLeft),
    (Scancode::F, KeyCode::DpadRight),
    (Scancode::E, KeyCode::DpadUp),
    (Scancode::D, KeyCode::DpadDown),
    (Scancode::J, KeyCode::Square),
    (Scancode::L, KeyCode::Circle),
    (Scancode::I, KeyCode::Triangle),
    (Scancode::K, KeyCode::Cross),
    (Scancode::W, KeyCode::TriggerL),
    (Scancode::O, KeyCode::TriggerR),
    (Scancode::N, KeyCode::Start),
    (Scancode::M, KeyCode::Select),
];

/// Desktop machines have no battery we can read.
const SIMULATED_BATTERY: u8 = 80;

const FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

pub struct SdlPlatform {
    event_pump: EventPump,
    files_dir: PathBuf,
    swap_ok: bool,
    /// Events seen while pumping for key state.
    pending: Vec<PlatformEvent>,
}

impl SdlPlatform {
    pub fn new(event_pump: EventPump, files_dir: PathBuf, swap_ok: bool) -> Self {
        Self {
            event_pump,
            files_dir,
            swap_ok,
            pending: Vec::new(),
        }
    }

    fn pump(&mut self) {
        for event in self.event_pump.poll_iter() {
            if let Event::Quit { .. } = event {
                self.pending.push(PlatformEvent::Quit);
            }
        }
    }
}

/// Map held physical keys to button bits and derive the virtual OK/CANCEL
/// pair from Circle and Cross.
fn map_keys(held: impl Fn(Scancode) -> bool, swap_ok: bool) -> KeyBits {
    let mut bits = KeyBits::NONE;
    for (scancode, code) in KEY_MAP {
        if held(scancode) {
            bits.insert(code);
        }
    }
    let (ok, cancel) = if swap_ok {
        (KeyCode::Cross, KeyCode::Circle)
    } else {
        (KeyCode::Circle, KeyCode::Cross)
    };
    if bits.contains(ok) {
        bits.insert(KeyCode::VirtualOk);
    }
    if bits.contains(cancel) {
        bits.insert(KeyCode::VirtualCancel);
    }
    bits
}

impl PlatformDriver for SdlPlatform {
    fn init(&mut self) -> Result<()> {
        log::info!("SDL2 platform ready, files in {}", self.files_dir.display());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.pump();
        std::mem::take(&mut self.pending)
    }

    fn poll_keys(&mut self) -> KeyBits {
        self.pump();
        let keyboard = self.event_pump.keyboard_state();
        map_keys(|sc| keyboard.is_scancode_pressed(sc), self.swap_ok)
    }

    fn files_dir(&self) -> PathBuf {
        self.files_dir.clone()
    }

    fn battery_level(&self) -> Option<u8> {
        Some(SIMULATED_BATTERY)
    }

    fn font_path(&self) -> Option<PathBuf> {
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .map(Path::to_path_buf)
    }
}
