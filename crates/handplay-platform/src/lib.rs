//! Capability contracts between the handplay runtime and the device.
//!
//! The runtime never talks to a window system, GPU or sound device directly.
//! It calls a [`PlatformDriver`] for input and device facts, a
//! [`RenderDriver`] for drawing and an [`AudioDriver`] for PCM output. The
//! SDL2 simulator backend implements all three; [`headless`] provides
//! in-memory drivers for tests.

pub mod audio;
pub mod headless;
pub mod platform;
pub mod render;
pub mod shape;

pub use audio::{AudioDriver, AudioSpec};
pub use platform::{PlatformDriver, PlatformEvent};
pub use render::{ColorVertex, FontId, PixelFormat, RenderDriver, TextureId};
pub use shape::{ShapeItem, ShapeKind, VertexBatch};

/// Native screen size of the handheld.
pub const SCREEN_WIDTH: u32 = 960;
pub const SCREEN_HEIGHT: u32 = 544;
