//! Crop rectangle and its handle-driven editing rules.

use crate::handles::{Corner, Edge};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest width or height a crop box can be resized to.
pub const MIN_CROP_SIZE: f64 = 10.0;

/// Crop rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A box covering the whole canvas.
    pub fn full_canvas(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// A zero-size box anchored at `point`, grown by the first resize.
    pub fn seed_at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Check whether a canvas point lies inside the box (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// The nine ways a crop box can be dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropHandle {
    /// Drag the whole box.
    Move,
    Corner(Corner),
    Edge(Edge),
}

/// Resize or move a crop box snapshot by a canvas-space delta.
///
/// The edge or corner opposite the dragged handle stays fixed. Each
/// dimension is clamped independently to `min_size`, so one axis of a
/// corner drag can stop while the other keeps following the pointer.
pub fn apply_crop_handle(initial: &CropBox, handle: CropHandle, delta: Vec2, min_size: f64) -> CropBox {
    let CropBox { x, y, width, height } = *initial;
    let grow = |size: f64, d: f64| (size + d).max(min_size);
    let shrink = |size: f64, d: f64| (size - d).max(min_size);

    match handle {
        CropHandle::Move => CropBox::new(x + delta.x, y + delta.y, width, height),
        CropHandle::Corner(Corner::BottomRight) => {
            CropBox::new(x, y, grow(width, delta.x), grow(height, delta.y))
        }
        CropHandle::Corner(Corner::TopLeft) => {
            let w = shrink(width, delta.x);
            let h = shrink(height, delta.y);
            CropBox::new(x + width - w, y + height - h, w, h)
        }
        CropHandle::Corner(Corner::TopRight) => {
            let w = grow(width, delta.x);
            let h = shrink(height, delta.y);
            CropBox::new(x, y + height - h, w, h)
        }
        CropHandle::Corner(Corner::BottomLeft) => {
            let w = shrink(width, delta.x);
            let h = grow(height, delta.y);
            CropBox::new(x + width - w, y, w, h)
        }
        CropHandle::Edge(Edge::Top) => {
            let h = shrink(height, delta.y);
            CropBox::new(x, y + height - h, width, h)
        }
        CropHandle::Edge(Edge::Bottom) => CropBox::new(x, y, width, grow(height, delta.y)),
        CropHandle::Edge(Edge::Left) => {
            let w = shrink(width, delta.x);
            CropBox::new(x + width - w, y, w, height)
        }
        CropHandle::Edge(Edge::Right) => CropBox::new(x, y, grow(width, delta.x), height),
    }
}
