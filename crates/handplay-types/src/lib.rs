//! Foundation types for handplay.
//!
//! Platform-agnostic vocabulary shared by every handplay crate: key codes and
//! key bitmasks, colors and rectangles, calendar helpers, the TOML
//! configuration and the error type.

pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod time;

pub use color::{Color, Rect};
pub use config::HandplayConfig;
pub use error::{HandplayError, Result};
pub use input::{Key, KeyBits, KeyCode, KeyState};
