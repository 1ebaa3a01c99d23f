//! Runtime configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields the stock handheld behavior.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HandplayError, Result};

/// Auto-repeat timing for one group of key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatConfig {
    /// Hold time before auto-repeat starts.
    pub trigger_delay_ms: u64,
    /// Interval between repeat pulses.
    pub repeat_delay_ms: u64,
}

impl RepeatConfig {
    pub const fn new(trigger_delay_ms: u64, repeat_delay_ms: u64) -> Self {
        Self {
            trigger_delay_ms,
            repeat_delay_ms,
        }
    }

    pub fn trigger_delay(&self) -> Duration {
        Duration::from_millis(self.trigger_delay_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self::new(300, 40)
    }
}

/// File browser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub trigger_delay_ms: u64,
    pub repeat_delay_ms: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            trigger_delay_ms: 600,
            repeat_delay_ms: 40,
        }
    }
}

impl FilesConfig {
    pub fn repeat(&self) -> RepeatConfig {
        RepeatConfig::new(self.trigger_delay_ms, self.repeat_delay_ms)
    }
}

/// Playback overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub trigger_delay_ms: u64,
    pub repeat_delay_ms: u64,
    /// Time the overlay stays visible after the last interaction.
    pub hide_delay_ms: u64,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            trigger_delay_ms: 300,
            repeat_delay_ms: 40,
            hide_delay_ms: 1500,
        }
    }
}

impl OscConfig {
    pub fn repeat(&self) -> RepeatConfig {
        RepeatConfig::new(self.trigger_delay_ms, self.repeat_delay_ms)
    }
}

/// Performance overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    pub interval_ms: u64,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandplayConfig {
    /// Frames per second the main loop paces redraws to.
    pub frame_rate: u32,
    /// Start directory for the file browser. Falls back to the platform's
    /// files directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_dir: Option<PathBuf>,
    /// Font used when the platform has no system font to offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Swap the confirm and back buttons.
    pub swap_ok: bool,
    /// Integer scale factor of the simulator window.
    pub window_scale: u32,
    pub files: FilesConfig,
    pub osc: OscConfig,
    pub perf: PerfConfig,
}

impl Default for HandplayConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            files_dir: None,
            font_path: None,
            swap_ok: false,
            window_scale: 1,
            files: FilesConfig::default(),
            osc: OscConfig::default(),
            perf: PerfConfig::default(),
        }
    }
}

impl HandplayConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: HandplayConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=240).contains(&self.frame_rate) {
            return Err(HandplayError::Config(format!(
                "frame_rate must be within 1..=240, got {}",
                self.frame_rate
            )));
        }
        if self.window_scale == 0 {
            return Err(HandplayError::Config("window_scale must be non-zero".into()));
        }
        let delays = [
            ("files.trigger_delay_ms", self.files.trigger_delay_ms),
            ("files.repeat_delay_ms", self.files.repeat_delay_ms),
            ("osc.trigger_delay_ms", self.osc.trigger_delay_ms),
            ("osc.repeat_delay_ms", self.osc.repeat_delay_ms),
            ("osc.hide_delay_ms", self.osc.hide_delay_ms),
            ("perf.interval_ms", self.perf.interval_ms),
        ];
        for (name, value) in delays {
            if value == 0 {
                return Err(HandplayError::Config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    /// Length of one frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.frame_rate.max(1)))
    }
}
