//! Drag operations captured at pointer-down and replayed on every move.
//!
//! Each operation stores an immutable snapshot of the entity it manipulates
//! and the down-point. Every move derives the new state from
//! `snapshot + (current - down)`, never from the already-updated entity.

use crate::coords::screen_to_canvas;
use crate::crop::{CropBox, CropHandle, apply_crop_handle};
use crate::handles::{Corner, CursorIcon};
use crate::layer::{Layer, LayerId, LayerUpdate, move_layer, scale_layer};
use crate::viewport::Viewport;
use kurbo::Point;

/// An in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOperation {
    /// Pan the viewport. The down-point is in screen space.
    Pan {
        start_screen: Point,
        start_viewport: Viewport,
    },
    MoveLayer {
        start_canvas: Point,
        initial_layer: Layer,
    },
    ScaleLayer {
        corner: Corner,
        start_canvas: Point,
        initial_layer: Layer,
    },
    MoveCrop {
        start_canvas: Point,
        initial_crop_box: CropBox,
    },
    ResizeCrop {
        handle: CropHandle,
        start_canvas: Point,
        initial_crop_box: CropBox,
    },
}

/// What a drag step asks the owner to change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    Viewport(Viewport),
    Layer(LayerId, LayerUpdate),
    CropBox(CropBox),
    /// The step was rejected by a size limit; keep the previous state.
    Unchanged,
}

/// Limits applied while resolving a drag step.
#[derive(Debug, Clone, Copy)]
pub struct DragLimits {
    pub min_layer_width: f64,
    pub min_crop_size: f64,
}

impl DragOperation {
    /// Resolve the entity state for the pointer at `screen`.
    ///
    /// `viewport` is used to map the pointer into canvas space for every
    /// operation except `Pan`, which works in screen pixels.
    pub fn update(&self, screen: Point, viewport: &Viewport, limits: DragLimits) -> DragUpdate {
        match self {
            DragOperation::Pan {
                start_screen,
                start_viewport,
            } => {
                let mut next = *start_viewport;
                next.pan(screen - *start_screen);
                DragUpdate::Viewport(next)
            }
            DragOperation::MoveLayer {
                start_canvas,
                initial_layer,
            } => {
                let delta = screen_to_canvas(screen, viewport) - *start_canvas;
                DragUpdate::Layer(initial_layer.id, move_layer(initial_layer, delta))
            }
            DragOperation::ScaleLayer { initial_layer, .. } => {
                let pointer = screen_to_canvas(screen, viewport);
                match scale_layer(initial_layer, pointer, limits.min_layer_width) {
                    Some(update) => DragUpdate::Layer(initial_layer.id, update),
                    None => DragUpdate::Unchanged,
                }
            }
            DragOperation::MoveCrop {
                start_canvas,
                initial_crop_box,
            } => {
                let delta = screen_to_canvas(screen, viewport) - *start_canvas;
                DragUpdate::CropBox(apply_crop_handle(
                    initial_crop_box,
                    CropHandle::Move,
                    delta,
                    limits.min_crop_size,
                ))
            }
            DragOperation::ResizeCrop {
                handle,
                start_canvas,
                initial_crop_box,
            } => {
                let delta = screen_to_canvas(screen, viewport) - *start_canvas;
                DragUpdate::CropBox(apply_crop_handle(
                    initial_crop_box,
                    *handle,
                    delta,
                    limits.min_crop_size,
                ))
            }
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DragOperation::Pan { .. } => "pan",
            DragOperation::MoveLayer { .. } => "move-layer",
            DragOperation::ScaleLayer { .. } => "scale-layer",
            DragOperation::MoveCrop { .. } => "move-crop",
            DragOperation::ResizeCrop { .. } => "resize-crop",
        }
    }

    /// Cursor shown while this operation is active.
    pub fn cursor(&self) -> CursorIcon {
        match self {
            DragOperation::Pan { .. } => CursorIcon::Grabbing,
            DragOperation::MoveLayer { .. } | DragOperation::MoveCrop { .. } => CursorIcon::Move,
            DragOperation::ScaleLayer { corner, .. } => CursorIcon::for_corner(*corner),
            DragOperation::ResizeCrop { handle, .. } => match handle {
                CropHandle::Move => CursorIcon::Move,
                CropHandle::Corner(corner) => CursorIcon::for_corner(*corner),
                CropHandle::Edge(edge) => CursorIcon::for_edge(*edge),
            },
        }
    }
}

/// Drag state machine: `Idle -> Dragging -> Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragOperation),
}

impl DragState {
    /// Start a drag. Any operation already in flight is replaced.
    pub fn begin(&mut self, operation: DragOperation) {
        log::debug!("drag begin: {}", operation.name());
        *self = DragState::Dragging(operation);
    }

    /// Finish the current drag, returning the operation that was active.
    pub fn end(&mut self) -> Option<DragOperation> {
        match std::mem::take(self) {
            DragState::Idle => None,
            DragState::Dragging(operation) => {
                log::debug!("drag end: {}", operation.name());
                Some(operation)
            }
        }
    }

    pub fn operation(&self) -> Option<&DragOperation> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(operation) => Some(operation),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::Edge;

    const LIMITS: DragLimits = DragLimits {
        min_layer_width: 20.0,
        min_crop_size: 10.0,
    };

    #[test]
    fn test_pan_uses_screen_delta_from_snapshot() {
        let start_viewport = Viewport { x: 10.0, y: 20.0, scale: 3.0 };
        let op = DragOperation::Pan {
            start_screen: Point::new(100.0, 100.0),
            start_viewport,
        };
        // The live viewport is ignored for pans.
        let live = Viewport { x: 999.0, y: 999.0, scale: 3.0 };
        let update = op.update(Point::new(130.0, 90.0), &live, LIMITS);
        assert_eq!(update, DragUpdate::Viewport(Viewport { x: 40.0, y: 10.0, scale: 3.0 }));
    }

    #[test]
    fn test_move_layer_does_not_accumulate() {
        let layer = Layer::new(100, 100);
        let viewport = Viewport { x: 0.0, y: 0.0, scale: 2.0 };
        let op = DragOperation::MoveLayer {
            start_canvas: screen_to_canvas(Point::new(50.0, 50.0), &viewport),
            initial_layer: layer.clone(),
        };

        // Many small moves then a return to a fixed point give the same result.
        for i in 0..50 {
            let _ = op.update(Point::new(50.0 + f64::from(i), 50.0), &viewport, LIMITS);
        }
        let update = op.update(Point::new(70.0, 40.0), &viewport, LIMITS);
        assert_eq!(
            update,
            DragUpdate::Layer(layer.id, LayerUpdate { x: Some(10.0), y: Some(-5.0), scale: None })
        );
    }

    #[test]
    fn test_scale_layer_rejection_is_unchanged() {
        let layer = Layer::new(200, 100);
        let op = DragOperation::ScaleLayer {
            corner: Corner::BottomRight,
            start_canvas: Point::new(200.0, 100.0),
            initial_layer: layer,
        };
        let update = op.update(Point::new(101.0, 50.0), &Viewport::default(), LIMITS);
        assert_eq!(update, DragUpdate::Unchanged);
    }

    #[test]
    fn test_resize_crop_in_canvas_space() {
        let op = DragOperation::ResizeCrop {
            handle: CropHandle::Edge(Edge::Right),
            start_canvas: Point::new(100.0, 50.0),
            initial_crop_box: CropBox::new(0.0, 0.0, 100.0, 100.0),
        };
        let viewport = Viewport { x: 0.0, y: 0.0, scale: 0.5 };
        // 20 screen px at 0.5 scale = 40 canvas units.
        let update = op.update(Point::new(70.0, 25.0), &viewport, LIMITS);
        assert_eq!(update, DragUpdate::CropBox(CropBox::new(0.0, 0.0, 140.0, 100.0)));
    }

    #[test]
    fn test_state_machine() {
        let mut state = DragState::default();
        assert!(!state.is_dragging());
        assert!(state.end().is_none());

        state.begin(DragOperation::MoveCrop {
            start_canvas: Point::ZERO,
            initial_crop_box: CropBox::new(0.0, 0.0, 10.0, 10.0),
        });
        assert!(state.is_dragging());
        assert_eq!(state.operation().map(DragOperation::cursor), Some(CursorIcon::Move));

        let ended = state.end();
        assert!(matches!(ended, Some(DragOperation::MoveCrop { .. })));
        assert_eq!(state, DragState::Idle);
    }
}
