//! Canvas-backed render driver.

use std::collections::HashMap;
use std::path::Path;

use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{BlendMode, Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};

use handplay_platform::{FontId, PixelFormat, RenderDriver, ShapeItem, TextureId};
use handplay_types::{Color, HandplayError, Rect, Result};

use crate::font::FontCache;

/// SDL2 render driver.
///
/// # Safety
///
/// `textures` is declared before `texture_creator` so the textures are
/// dropped before the creator they borrow from. `texture_init` erases the
/// borrow to `'static` on that basis.
pub struct SdlRender {
    canvas: Canvas<Window>,
    textures: HashMap<u64, Texture<'static>>,
    texture_creator: TextureCreator<WindowContext>,
    next_texture_id: u64,
    fonts: FontCache,
    clip_stack: Vec<Rect>,
}

fn render_err(e: impl ToString) -> HandplayError {
    HandplayError::Render(e.to_string())
}

fn sdl_color(color: Color) -> sdl2::pixels::Color {
    sdl2::pixels::Color::RGBA(color.r, color.g, color.b, color.a)
}

/// Smallest pixel rectangle covering `rect`.
fn sdl_rect(rect: Rect) -> sdl2::rect::Rect {
    let x = rect.x0.floor();
    let y = rect.y0.floor();
    let w = (rect.x1.ceil() - x).max(0.0) as u32;
    let h = (rect.y1.ceil() - y).max(0.0) as u32;
    sdl2::rect::Rect::new(x as i32, y as i32, w, h)
}

impl SdlRender {
    pub fn new(window: Window) -> Result<Self> {
        let canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .map_err(render_err)?;
        let texture_creator = canvas.texture_creator();
        Ok(Self {
            canvas,
            textures: HashMap::new(),
            texture_creator,
            next_texture_id: 1,
            fonts: FontCache::new()?,
            clip_stack: Vec::new(),
        })
    }

    fn set_color(&mut self, color: Color) {
        let mode = if color.a < 255 {
            BlendMode::Blend
        } else {
            BlendMode::None
        };
        self.canvas.set_blend_mode(mode);
        self.canvas.set_draw_color(sdl_color(color));
    }

    fn texture(&mut self, tex: TextureId) -> Result<&mut Texture<'static>> {
        self.textures
            .get_mut(&tex.0)
            .ok_or_else(|| HandplayError::Render(format!("texture not found: {}", tex.0)))
    }
}

impl RenderDriver for SdlRender {
    fn init(&mut self, width: u32, height: u32) -> Result<()> {
        // Scaled windows keep drawing in handheld coordinates.
        self.canvas.set_logical_size(width, height).map_err(render_err)
    }

    fn uninit(&mut self) {
        self.textures.clear();
        log::info!("SDL2 renderer shut down");
    }

    fn render_start(&mut self) -> Result<()> {
        self.clip_stack.clear();
        self.canvas.set_clip_rect(None);
        Ok(())
    }

    fn render_end(&mut self) -> Result<()> {
        self.canvas.present();
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.canvas.set_draw_color(sdl_color(color));
        self.canvas.clear();
        Ok(())
    }

    fn texture_init(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<TextureId> {
        let sdl_format = match format {
            // Byte order R, G, B, A in memory.
            PixelFormat::Rgba8888 => PixelFormatEnum::ABGR8888,
        };
        let mut texture = self
            .texture_creator
            .create_texture_streaming(sdl_format, width, height)
            .map_err(render_err)?;
        texture.set_blend_mode(BlendMode::Blend);

        // SAFETY: the texture borrows `self.texture_creator`, which is
        // dropped after `self.textures` (see the struct docs).
        let texture: Texture<'static> = unsafe { std::mem::transmute(texture) };

        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.textures.insert(id, texture);
        Ok(TextureId(id))
    }

    fn texture_uninit(&mut self, tex: TextureId) {
        self.textures.remove(&tex.0);
    }

    fn texture_upload(&mut self, tex: TextureId, data: &[u8], stride: usize) -> Result<()> {
        self.texture(tex)?
            .update(None, data, stride)
            .map_err(render_err)
    }

    fn draw_texture(&mut self, tex: TextureId, dst: Rect) -> Result<()> {
        let texture = self
            .textures
            .get(&tex.0)
            .ok_or_else(|| HandplayError::Render(format!("texture not found: {}", tex.0)))?;
        self.canvas
            .copy(texture, None, sdl_rect(dst))
            .map_err(render_err)
    }

    fn font_init(&mut self, path: Option<&Path>) -> Result<FontId> {
        self.fonts.open(path)
    }

    fn font_uninit(&mut self, font: FontId) {
        self.fonts.close(font);
    }

    fn font_measure(&mut self, font: FontId, size: u16, text: &str) -> Result<f32> {
        let (w, _) = self
            .fonts
            .sized(font, size)?
            .size_of(text)
            .map_err(render_err)?;
        Ok(w as f32)
    }

    fn draw_text(
        &mut self,
        font: FontId,
        size: u16,
        color: Color,
        x: f32,
        y: f32,
        text: &str,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let face = self.fonts.sized(font, size)?;
        let surface = face
            .render(text)
            .blended(sdl_color(color))
            .map_err(render_err)?;
        let top = y - face.ascent() as f32;
        let texture = self
            .texture_creator
            .create_texture_from_surface(&surface)
            .map_err(render_err)?;
        let dst = sdl2::rect::Rect::new(x as i32, top as i32, surface.width(), surface.height());
        self.canvas.copy(&texture, None, dst).map_err(render_err)
    }

    fn clip_push(&mut self, rect: Rect) -> Result<()> {
        let clip = match self.clip_stack.last() {
            Some(current) => current.intersect(&rect).unwrap_or_default(),
            None => rect,
        };
        self.clip_stack.push(clip);
        self.canvas.set_clip_rect(sdl_rect(clip));
        Ok(())
    }

    fn clip_pop(&mut self) -> Result<()> {
        self.clip_stack.pop();
        match self.clip_stack.last() {
            Some(prev) => self.canvas.set_clip_rect(sdl_rect(*prev)),
            None => self.canvas.set_clip_rect(None),
        }
        Ok(())
    }

    fn draw_rectangles(&mut self, rects: &[Rect], color: Color) -> Result<()> {
        self.set_color(color);
        let rects: Vec<_> = rects.iter().copied().map(sdl_rect).collect();
        self.canvas.fill_rects(&rects).map_err(render_err)
    }

    // No vertex path: shapes become plain rectangle fills.
    fn draw_shapes(&mut self, items: &[ShapeItem]) -> Result<()> {
        for item in items {
            self.draw_rectangles(&item.to_rects(), item.color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_covers_fractional_edges() {
        let r = sdl_rect(Rect::new(10.5, 20.0, 30.2, 40.0));
        assert_eq!((r.x(), r.y(), r.width(), r.height()), (10, 20, 21, 20));
    }

    #[test]
    fn whole_screen_maps_exactly() {
        let r = sdl_rect(Rect::new(0.0, 0.0, 960.0, 544.0));
        assert_eq!((r.x(), r.y(), r.width(), r.height()), (0, 0, 960, 544));
    }
}
