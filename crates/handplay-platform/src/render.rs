//! Render capability.

use std::path::Path;

use handplay_types::{Color, HandplayError, Rect, Result};

use crate::shape::{ShapeItem, VertexBatch};

/// Opaque handle to a texture owned by the render driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Opaque handle to a loaded font face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u64);

/// Pixel layout of texture uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
        }
    }
}

/// One vertex of a colored triangle strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorVertex {
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

/// Rendering backend trait.
///
/// # Core Methods (required)
///
/// `init`, `uninit`, `render_start`, `render_end`, `clear`, the texture
/// lifecycle (`texture_init`, `texture_uninit`, `texture_upload`,
/// `draw_texture`), the font lifecycle (`font_init`, `font_uninit`,
/// `font_measure`, `draw_text`), `clip_push`, `clip_pop` and
/// `draw_rectangles`.
///
/// # Extended Primitives (optional, with defaults)
///
/// Zero-copy texture attachment and the colored-vertex path default to
/// [`HandplayError::Unsupported`]. `draw_shapes` composes a [`VertexBatch`]
/// and submits it through `draw_vertices`; backends without a vertex path
/// override it.
pub trait RenderDriver {
    // -----------------------------------------------------------------------
    // Core methods (required -- no default implementations)
    // -----------------------------------------------------------------------

    fn init(&mut self, width: u32, height: u32) -> Result<()>;

    fn uninit(&mut self);

    /// Begin a frame. Every draw call of the frame happens between
    /// `render_start` and `render_end`.
    fn render_start(&mut self) -> Result<()>;

    /// Finish the frame and present it.
    fn render_end(&mut self) -> Result<()>;

    fn clear(&mut self, color: Color) -> Result<()>;

    fn texture_init(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<TextureId>;

    fn texture_uninit(&mut self, tex: TextureId);

    /// Replace the texture contents. `stride` is the byte length of one row
    /// in `data`.
    fn texture_upload(&mut self, tex: TextureId, data: &[u8], stride: usize) -> Result<()>;

    fn draw_texture(&mut self, tex: TextureId, dst: Rect) -> Result<()>;

    /// Load a font face. `path` of `None` asks for the backend's built-in face.
    fn font_init(&mut self, path: Option<&Path>) -> Result<FontId>;

    fn font_uninit(&mut self, font: FontId);

    /// Width in pixels of `text` rendered at `size`.
    fn font_measure(&mut self, font: FontId, size: u16, text: &str) -> Result<f32>;

    /// Draw a glyph run with its baseline at `y`.
    fn draw_text(
        &mut self,
        font: FontId,
        size: u16,
        color: Color,
        x: f32,
        y: f32,
        text: &str,
    ) -> Result<()>;

    /// Push a clip rectangle. The effective clip is the intersection of all
    /// pushed rects.
    fn clip_push(&mut self, rect: Rect) -> Result<()>;

    fn clip_pop(&mut self) -> Result<()>;

    fn draw_rectangles(&mut self, rects: &[Rect], color: Color) -> Result<()>;

    // -----------------------------------------------------------------------
    // Extended: direct rendering
    // -----------------------------------------------------------------------

    /// Wrap a caller-owned frame buffer as a texture without copying.
    fn texture_attach(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<TextureId> {
        let _ = (width, height, format);
        Err(HandplayError::Unsupported("texture attach"))
    }

    fn texture_detach(&mut self, tex: TextureId) -> Result<()> {
        let _ = tex;
        Err(HandplayError::Unsupported("texture detach"))
    }

    // -----------------------------------------------------------------------
    // Extended: colored vertices
    // -----------------------------------------------------------------------

    /// Draw one triangle strip.
    fn draw_vertices(&mut self, strip: &[ColorVertex]) -> Result<()> {
        let _ = strip;
        Err(HandplayError::Unsupported("vertex batches"))
    }

    fn draw_shapes(&mut self, items: &[ShapeItem]) -> Result<()> {
        let mut batch = VertexBatch::prepare(items);
        batch.compose_items(items);
        batch.commit(self)
    }
}
