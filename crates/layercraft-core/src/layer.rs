//! Layers placed on the canvas and the move/scale math applied to them.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// Smallest on-canvas width a layer may be scaled down to.
pub const MIN_LAYER_WIDTH: f64 = 20.0;

/// A raster layer positioned on the canvas.
///
/// Layers are owned by the host. The engine reads their placement and
/// natural size and reports changes through [`LayerUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    /// Left edge in canvas space.
    pub x: f64,
    /// Top edge in canvas space.
    pub y: f64,
    /// Uniform scale applied to the natural size.
    pub scale: f64,
    pub opacity: f64,
    pub is_visible: bool,
    /// Intrinsic pixel width.
    pub natural_width: u32,
    /// Intrinsic pixel height.
    pub natural_height: u32,
}

impl Layer {
    /// Create a visible, unscaled layer at the canvas origin.
    pub fn new(natural_width: u32, natural_height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            is_visible: true,
            natural_width,
            natural_height,
        }
    }

    /// Width on the canvas.
    pub fn width(&self) -> f64 {
        f64::from(self.natural_width) * self.scale
    }

    /// Height on the canvas.
    pub fn height(&self) -> f64 {
        f64::from(self.natural_height) * self.scale
    }

    /// Bounding box in canvas space.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width(), self.y + self.height())
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Check whether a canvas point lies on the layer (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        let b = self.bounds();
        point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &LayerUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(scale) = update.scale {
            self.scale = scale;
        }
    }
}

/// Partial placement change reported to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale: Option<f64>,
}

impl LayerUpdate {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.scale.is_none()
    }
}

/// Translate a layer snapshot by a canvas-space delta.
pub fn move_layer(initial: &Layer, delta: Vec2) -> LayerUpdate {
    LayerUpdate {
        x: Some(initial.x + delta.x),
        y: Some(initial.y + delta.y),
        scale: None,
    }
}

/// Proportionally resize a layer snapshot around its center.
///
/// All four corner handles share this rule: the new half-size follows
/// whichever axis the pointer is farther out on, relative to the aspect
/// ratio, and the layer's center stays where it was at pointer-down.
/// Returns `None` when the result would be narrower than `min_width`.
pub fn scale_layer(initial: &Layer, pointer: Point, min_width: f64) -> Option<LayerUpdate> {
    if initial.natural_width == 0 || initial.natural_height == 0 {
        return None;
    }

    let natural_width = f64::from(initial.natural_width);
    let natural_height = f64::from(initial.natural_height);
    let center = initial.center();
    let aspect = natural_width / natural_height;

    let dist_x = (pointer.x - center.x).abs();
    let dist_y = (pointer.y - center.y).abs();

    let new_width = if dist_x / aspect > dist_y {
        dist_x * 2.0
    } else {
        dist_y * aspect * 2.0
    };
    if new_width < min_width {
        return None;
    }

    let new_height = new_width / aspect;
    Some(LayerUpdate {
        x: Some(center.x - new_width / 2.0),
        y: Some(center.y - new_height / 2.0),
        scale: Some(new_width / natural_width),
    })
}
