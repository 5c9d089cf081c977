//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 10.0;
/// Multiplicative step applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;
/// Fraction of the container a centered canvas occupies.
pub const FIT_MARGIN: f64 = 0.9;

/// The pan/zoom transform mapping canvas space to screen space.
///
/// Screen = canvas * scale + (x, y). Translation is applied after scaling in
/// the render transform, so pan deltas are plain screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal translation in screen pixels.
    pub x: f64,
    /// Vertical translation in screen pixels.
    pub y: f64,
    /// Zoom factor, kept within `MIN_SCALE..=MAX_SCALE`.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

/// Wheel direction to zoom factor: scrolling up (negative delta) zooms in.
pub fn zoom_factor(wheel_delta: f64, step: f64) -> f64 {
    if wheel_delta < 0.0 { step } else { 1.0 / step }
}

impl Viewport {
    /// Create a viewport with identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current translation as a vector.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Get the affine transform for rendering (canvas -> screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.scale)
    }

    /// Get the inverse transform for input handling (screen -> canvas).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset())
    }

    /// Pan the viewport by a delta in screen pixels. Scale is untouched.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Zoom one wheel notch around `cursor` using the default limits.
    pub fn zoom_at(&mut self, cursor: Point, wheel_delta: f64) {
        self.zoom_by(cursor, zoom_factor(wheel_delta, ZOOM_STEP), MIN_SCALE, MAX_SCALE);
    }

    /// Multiply the scale by `factor`, keeping the canvas point under
    /// `cursor` fixed on screen.
    pub fn zoom_by(&mut self, cursor: Point, factor: f64, min_scale: f64, max_scale: f64) {
        let new_scale = (self.scale * factor).clamp(min_scale, max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        // Position must be derived from the old scale before it is replaced.
        let ratio = new_scale / self.scale;
        let new_x = cursor.x - (cursor.x - self.x) * ratio;
        let new_y = cursor.y - (cursor.y - self.y) * ratio;
        *self = Self {
            x: new_x,
            y: new_y,
            scale: new_scale,
        };
    }

    /// Fit and center a canvas inside a container using the default margin.
    pub fn center_view(&mut self, canvas: Size, container: Size) {
        self.fit(canvas, container, FIT_MARGIN, MIN_SCALE, MAX_SCALE);
    }

    /// Fit and center a canvas inside a container.
    ///
    /// The canvas is never enlarged past 100% before the margin is applied.
    /// Degenerate sizes leave the viewport untouched.
    pub fn fit(&mut self, canvas: Size, container: Size, margin: f64, min_scale: f64, max_scale: f64) {
        if canvas.width <= 0.0 || canvas.height <= 0.0 || container.width <= 0.0 || container.height <= 0.0 {
            return;
        }

        let scale = ((container.width / canvas.width)
            .min(container.height / canvas.height)
            .min(1.0)
            * margin)
            .clamp(min_scale, max_scale);

        self.scale = scale;
        self.x = (container.width - canvas.width * scale) / 2.0;
        self.y = (container.height - canvas.height * scale) / 2.0;
    }
}
