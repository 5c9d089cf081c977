//! Drag handles and the pointer-down hit test.
//!
//! Hit testing is a pure function of engine state: the active layer's four
//! corner handles, the layer bounding boxes in reverse render order, and the
//! crop box's eight handles plus its body.

use crate::crop::{CropBox, CropHandle};
use crate::layer::{Layer, LayerId};
use crate::tools::Tool;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle hitbox half-size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of a resize handle on a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

/// A resize handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a canvas point falls in this handle's square hitbox.
    /// `tolerance` is the half-size of the box and should account for zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point.x - self.position.x).abs() <= tolerance && (point.y - self.position.y).abs() <= tolerance
    }
}

/// Corner handles for a bounding rectangle.
pub fn corner_handles(bounds: Rect) -> Vec<Handle> {
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
    ]
}

/// Corner handles followed by edge midpoint handles.
pub fn corner_and_edge_handles(bounds: Rect) -> Vec<Handle> {
    let center = bounds.center();
    let mut handles = corner_handles(bounds);
    handles.extend([
        Handle::new(Point::new(center.x, bounds.y0), HandleKind::Edge(Edge::Top)),
        Handle::new(Point::new(bounds.x1, center.y), HandleKind::Edge(Edge::Right)),
        Handle::new(Point::new(center.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
        Handle::new(Point::new(bounds.x0, center.y), HandleKind::Edge(Edge::Left)),
    ]);
    handles
}

/// Find which corner of a layer (if any) is hit.
pub fn hit_test_layer_corner(layer: &Layer, point: Point, tolerance: f64) -> Option<Corner> {
    corner_handles(layer.bounds())
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .and_then(|h| match h.kind {
            HandleKind::Corner(corner) => Some(corner),
            HandleKind::Edge(_) => None,
        })
}

/// Find the topmost visible layer under a canvas point.
///
/// `layers` is in render order, so the last matching entry wins.
pub fn hit_test_layers(layers: &[Layer], point: Point) -> Option<LayerId> {
    layers
        .iter()
        .rev()
        .find(|layer| layer.is_visible && layer.contains(point))
        .map(|layer| layer.id)
}

/// Find which part of the crop box (if any) is hit. Handles win over the body.
pub fn hit_test_crop(crop: &CropBox, point: Point, tolerance: f64) -> Option<CropHandle> {
    let handle = corner_and_edge_handles(crop.rect())
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| match h.kind {
            HandleKind::Corner(corner) => CropHandle::Corner(corner),
            HandleKind::Edge(edge) => CropHandle::Edge(edge),
        });
    handle.or_else(|| crop.contains(point).then_some(CropHandle::Move))
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    /// A corner handle of the active layer.
    LayerCorner { layer: LayerId, corner: Corner },
    /// The body of a layer.
    LayerBody(LayerId),
    /// Part of the crop box.
    Crop(CropHandle),
    /// Nothing interactive; the canvas itself.
    Empty,
}

/// State the hit test reads.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub tool: Tool,
    pub layers: &'a [Layer],
    pub active_layer: Option<LayerId>,
    pub crop_box: Option<CropBox>,
    /// Half-size of a handle hitbox in canvas units.
    pub tolerance: f64,
}

/// Classify a canvas point into a drag handle for the current tool.
pub fn hit_test(ctx: &HitContext<'_>, point: Point) -> DragHandle {
    match ctx.tool {
        Tool::Move => {
            let active = ctx
                .active_layer
                .and_then(|id| ctx.layers.iter().find(|layer| layer.id == id))
                .filter(|layer| layer.is_visible);
            if let Some(layer) = active {
                if let Some(corner) = hit_test_layer_corner(layer, point, ctx.tolerance) {
                    return DragHandle::LayerCorner { layer: layer.id, corner };
                }
            }
            hit_test_layers(ctx.layers, point).map_or(DragHandle::Empty, DragHandle::LayerBody)
        }
        Tool::Crop => ctx
            .crop_box
            .and_then(|crop| hit_test_crop(&crop, point, ctx.tolerance))
            .map_or(DragHandle::Empty, DragHandle::Crop),
        Tool::Brush | Tool::Rectangle => DragHandle::Empty,
    }
}

/// Pointer cursor the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorIcon {
    Default,
    Grab,
    Grabbing,
    Move,
    Crosshair,
    /// Top-left / bottom-right diagonal.
    NwseResize,
    /// Top-right / bottom-left diagonal.
    NeswResize,
    NsResize,
    EwResize,
}

impl CursorIcon {
    pub fn for_corner(corner: Corner) -> Self {
        match corner {
            Corner::TopLeft | Corner::BottomRight => CursorIcon::NwseResize,
            Corner::TopRight | Corner::BottomLeft => CursorIcon::NeswResize,
        }
    }

    pub fn for_edge(edge: Edge) -> Self {
        match edge {
            Edge::Top | Edge::Bottom => CursorIcon::NsResize,
            Edge::Left | Edge::Right => CursorIcon::EwResize,
        }
    }
}

impl DragHandle {
    /// Hover cursor for this handle.
    pub fn cursor(&self) -> CursorIcon {
        match self {
            DragHandle::LayerCorner { corner, .. } => CursorIcon::for_corner(*corner),
            DragHandle::LayerBody(_) | DragHandle::Crop(CropHandle::Move) => CursorIcon::Move,
            DragHandle::Crop(CropHandle::Corner(corner)) => CursorIcon::for_corner(*corner),
            DragHandle::Crop(CropHandle::Edge(edge)) => CursorIcon::for_edge(*edge),
            DragHandle::Empty => CursorIcon::Default,
        }
    }
}
