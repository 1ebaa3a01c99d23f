//! Error types for handplay.

use std::io;

/// Errors produced by the handplay runtime, drivers and panels.
#[derive(Debug, thiserror::Error)]
pub enum HandplayError {
    #[error("platform error: {0}")]
    Platform(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("panel error: {0}")]
    Panel(String),

    #[error("panel {panel} failed to initialize: {reason}")]
    PanelInit { panel: &'static str, reason: String },

    #[error("dispatch error: {0}")]
    Dispatch(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HandplayError>;
