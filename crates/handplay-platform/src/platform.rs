//! Platform capability: input, device facts, process lifecycle.

use std::path::PathBuf;

use handplay_types::{KeyBits, Result};

/// Native events a platform reports besides key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The user asked to close the application (window close button).
    Quit,
}

/// Platform backend trait.
///
/// Called from the UI thread only. `init` runs once before the first frame
/// and `uninit` once after the panel stack has emptied.
pub trait PlatformDriver {
    fn init(&mut self) -> Result<()>;

    fn uninit(&mut self) {}

    /// Final process hook, called after every driver has been released.
    fn exit(&mut self) {}

    /// Pump the native event queue.
    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        Vec::new()
    }

    /// Currently held keys.
    fn poll_keys(&mut self) -> KeyBits;

    /// Root directory of the user's media files.
    fn files_dir(&self) -> PathBuf;

    /// Battery charge in percent, if the device has a battery.
    fn battery_level(&self) -> Option<u8> {
        None
    }

    /// Font file for the default UI font, if the platform knows one.
    fn font_path(&self) -> Option<PathBuf> {
        None
    }
}
