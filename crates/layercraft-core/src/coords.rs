//! Conversions between screen, canvas and layer-local space.
//!
//! Screen space is the editing surface in device-independent pixels. Canvas
//! space is the fixed logical coordinate system that layers and the crop box
//! live in. Layer-local space is relative to one layer's origin and scale and
//! matches the pixel grid of that layer's mask.

use crate::layer::Layer;
use crate::viewport::Viewport;
use kurbo::Point;

/// Convert a screen point to canvas coordinates.
pub fn screen_to_canvas(point: Point, viewport: &Viewport) -> Point {
    Point::new(
        (point.x - viewport.x) / viewport.scale,
        (point.y - viewport.y) / viewport.scale,
    )
}

/// Convert a canvas point to screen coordinates.
pub fn canvas_to_screen(point: Point, viewport: &Viewport) -> Point {
    Point::new(
        point.x * viewport.scale + viewport.x,
        point.y * viewport.scale + viewport.y,
    )
}

/// Convert a canvas point into a layer's local (natural pixel) space.
pub fn canvas_to_layer_local(point: Point, layer: &Layer) -> Point {
    Point::new(
        (point.x - layer.x) / layer.scale,
        (point.y - layer.y) / layer.scale,
    )
}

/// Convert a layer-local point back to canvas coordinates.
pub fn layer_local_to_canvas(point: Point, layer: &Layer) -> Point {
    Point::new(point.x * layer.scale + layer.x, point.y * layer.scale + layer.y)
}

/// Convert a screen point straight into a layer's local space.
pub fn screen_to_layer_local(point: Point, viewport: &Viewport, layer: &Layer) -> Point {
    canvas_to_layer_local(screen_to_canvas(point, viewport), layer)
}
