//! Rectangle shapes batched into one colored triangle strip.
//!
//! Each item contributes a fixed number of vertices (4 for a fill, 10 for an
//! outline ring). Consecutive items are stitched with two degenerate
//! vertices, the last vertex of the previous item followed by the first
//! vertex of the next, so the whole batch is a single draw call.

use handplay_types::{Color, Rect, Result};

use crate::render::{ColorVertex, RenderDriver};

const FILL_VERTS: usize = 4;
const LINE_VERTS: usize = 10;
const JOIN_VERTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Fill,
    /// Outline centered on the rectangle edges.
    Line { width: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeItem {
    pub kind: ShapeKind,
    pub color: Color,
    pub rect: Rect,
}

impl ShapeItem {
    pub const fn fill(rect: Rect, color: Color) -> Self {
        Self {
            kind: ShapeKind::Fill,
            color,
            rect,
        }
    }

    pub const fn line(rect: Rect, width: f32, color: Color) -> Self {
        Self {
            kind: ShapeKind::Line { width },
            color,
            rect,
        }
    }

    fn vertex_count(&self) -> usize {
        match self.kind {
            ShapeKind::Fill => FILL_VERTS,
            ShapeKind::Line { .. } => LINE_VERTS,
        }
    }

    /// The same shape as plain rectangles, for backends that only fill
    /// rectangles.
    pub fn to_rects(&self) -> Vec<Rect> {
        let r = self.rect;
        match self.kind {
            ShapeKind::Fill => vec![r],
            ShapeKind::Line { width } => {
                let h = width * 0.5;
                vec![
                    Rect::new(r.x0 - h, r.y0 - h, r.x1 + h, r.y0 + h),
                    Rect::new(r.x0 - h, r.y1 - h, r.x1 + h, r.y1 + h),
                    Rect::new(r.x0 - h, r.y0 + h, r.x0 + h, r.y1 - h),
                    Rect::new(r.x1 - h, r.y0 + h, r.x1 + h, r.y1 - h),
                ]
            }
        }
    }
}

/// Vertex storage for one strip.
#[derive(Debug, Default)]
pub struct VertexBatch {
    verts: Vec<ColorVertex>,
}

impl VertexBatch {
    /// Total strip length for `items`, including the joins.
    pub fn vertex_count(items: &[ShapeItem]) -> usize {
        let body: usize = items.iter().map(ShapeItem::vertex_count).sum();
        body + items.len().saturating_sub(1) * JOIN_VERTS
    }

    /// Reserve room for `items`.
    pub fn prepare(items: &[ShapeItem]) -> Self {
        Self {
            verts: Vec::with_capacity(Self::vertex_count(items)),
        }
    }

    pub fn compose(&mut self, x: f32, y: f32, color: Color) {
        self.verts.push(ColorVertex { x, y, color });
    }

    /// Append a duplicate of an already composed vertex.
    pub fn copy(&mut self, index: usize) {
        if let Some(v) = self.verts.get(index).copied() {
            self.verts.push(v);
        }
    }

    pub fn compose_items(&mut self, items: &[ShapeItem]) {
        for (i, item) in items.iter().enumerate() {
            let join = self.verts.len();
            if i > 0 {
                // Placeholders; the second one is patched once the item's
                // first vertex exists.
                self.copy(join - 1);
                self.copy(join - 1);
            }
            self.compose_item(item);
            if i > 0 {
                self.verts[join + 1] = self.verts[join + 2];
            }
        }
    }

    fn compose_item(&mut self, item: &ShapeItem) {
        let r = item.rect;
        let c = item.color;
        match item.kind {
            ShapeKind::Fill => {
                self.compose(r.x1, r.y1, c);
                self.compose(r.x0, r.y1, c);
                self.compose(r.x1, r.y0, c);
                self.compose(r.x0, r.y0, c);
            }
            ShapeKind::Line { width } => {
                let h = width * 0.5;
                let outer = Rect::new(r.x0 - h, r.y0 - h, r.x1 + h, r.y1 + h);
                let inner = Rect::new(r.x0 + h, r.y0 + h, r.x1 - h, r.y1 - h);
                let ring = [
                    (outer.x0, outer.y0, inner.x0, inner.y0),
                    (outer.x1, outer.y0, inner.x1, inner.y0),
                    (outer.x1, outer.y1, inner.x1, inner.y1),
                    (outer.x0, outer.y1, inner.x0, inner.y1),
                    (outer.x0, outer.y0, inner.x0, inner.y0),
                ];
                for (ox, oy, ix, iy) in ring {
                    self.compose(ox, oy, c);
                    self.compose(ix, iy, c);
                }
            }
        }
    }

    pub fn vertices(&self) -> &[ColorVertex] {
        &self.verts
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Submit the strip. An empty batch draws nothing.
    pub fn commit<R: RenderDriver + ?Sized>(self, render: &mut R) -> Result<()> {
        if self.verts.is_empty() {
            return Ok(());
        }
        render.draw_vertices(&self.verts)
    }
}
