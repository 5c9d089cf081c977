//! The interaction engine: routes pointer, wheel and key events to the
//! viewport, layer transforms, crop editing and mask painting.
//!
//! Everything runs synchronously inside the event handlers. After each call
//! the host redraws from the updated viewport, layers, crop box and mask.

use crate::config::{ConfigError, EngineConfig};
use crate::coords::{screen_to_canvas, screen_to_layer_local};
use crate::crop::{CropBox, CropHandle};
use crate::drag::{DragLimits, DragOperation, DragState, DragUpdate};
use crate::handles::{Corner, CursorIcon, DragHandle, HitContext, hit_test};
use crate::input::{InputState, Key, KeyEvent, MouseButton, PointerEvent};
use crate::layer::{Layer, LayerId, LayerUpdate};
use crate::mask::{MaskHistory, MaskPainter, MaskRaster};
use crate::tools::{BrushSettings, Tool};
use crate::viewport::{Viewport, zoom_factor};
use kurbo::{Point, Size, Vec2};

/// State and callbacks supplied by the application embedding the engine.
pub trait EngineHost {
    /// Layers in render order; the last one is drawn on top.
    fn layers(&self) -> &[Layer];
    fn active_layer(&self) -> Option<LayerId>;
    /// Logical canvas size.
    fn canvas_size(&self) -> Size;
    fn tool(&self) -> Tool;
    fn brush(&self) -> BrushSettings;
    fn crop_box(&self) -> Option<CropBox>;

    /// Placement of a layer changed.
    fn on_layer_update(&mut self, id: LayerId, update: LayerUpdate);
    /// Replace or remove the crop box.
    fn set_crop_box(&mut self, crop_box: Option<CropBox>);
    /// A layer was clicked and should become active.
    fn on_select_layer(&mut self, id: LayerId);
}

fn find_layer(layers: &[Layer], id: LayerId) -> Option<&Layer> {
    layers.iter().find(|layer| layer.id == id)
}

/// Owns the viewport, the active drag and the active layer's mask.
#[derive(Debug, Clone)]
pub struct CanvasEngine {
    viewport: Viewport,
    config: EngineConfig,
    drag: DragState,
    painter: MaskPainter,
    input: InputState,
    container: Option<Size>,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            viewport: Viewport::default(),
            painter: MaskPainter::new(config.history_limit),
            config,
            drag: DragState::default(),
            input: InputState::default(),
            container: None,
        }
    }
}

impl CanvasEngine {
    /// Create an engine with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom limits.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            painter: MaskPainter::new(config.history_limit),
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Size of the element hosting the editing surface, if laid out yet.
    pub fn set_container_size(&mut self, size: Option<Size>) {
        self.container = size;
    }

    pub fn container_size(&self) -> Option<Size> {
        self.container
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The drag in progress, if any.
    pub fn drag_operation(&self) -> Option<&DragOperation> {
        self.drag.operation()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn is_drawing(&self) -> bool {
        self.painter.is_drawing()
    }

    pub fn painter(&self) -> &MaskPainter {
        &self.painter
    }

    /// Read access to the active mask surface.
    pub fn raster(&self) -> Option<&MaskRaster> {
        self.painter.raster()
    }

    pub fn history(&self) -> Option<&MaskHistory> {
        self.painter.history()
    }

    fn limits(&self) -> DragLimits {
        DragLimits {
            min_layer_width: self.config.min_layer_width,
            min_crop_size: self.config.min_crop_size,
        }
    }

    /// Handle hitbox half-size in canvas units at the current zoom.
    fn hit_tolerance(&self) -> f64 {
        self.config.handle_size / self.viewport.scale
    }

    /// Fit the canvas into the container and center it.
    pub fn center_view<H: EngineHost>(&mut self, host: &H) {
        let Some(container) = self.container else {
            return;
        };
        self.viewport.fit(
            host.canvas_size(),
            container,
            self.config.fit_margin,
            self.config.min_scale,
            self.config.max_scale,
        );
    }

    /// Bind the mask to the host's active layer.
    ///
    /// Call when the active layer changes or its natural size becomes known.
    /// Selecting another layer always starts from a blank mask and history.
    pub fn on_active_layer_changed<H: EngineHost>(&mut self, host: &H) {
        let active = host
            .active_layer()
            .and_then(|id| find_layer(host.layers(), id));
        match active {
            Some(layer) if layer.natural_width > 0 && layer.natural_height > 0 => self.painter.attach(layer),
            _ => self.painter.detach(),
        }
    }

    /// React to a tool switch: the crop tool gets a full-canvas box when
    /// none exists, and leaving it discards the box.
    pub fn on_tool_changed<H: EngineHost>(&mut self, host: &mut H) {
        match (host.tool(), host.crop_box()) {
            (Tool::Crop, None) => {
                let crop = CropBox::full_canvas(host.canvas_size());
                log::debug!("crop box created: {:?}", crop);
                host.set_crop_box(Some(crop));
            }
            (tool, Some(_)) if tool != Tool::Crop => {
                log::debug!("crop box discarded on tool change");
                host.set_crop_box(None);
            }
            _ => {}
        }
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer_event<H: EngineHost>(&mut self, host: &mut H, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(host, position, button),
            PointerEvent::Move { position } => self.pointer_move(host, position),
            PointerEvent::Up { position, button } => self.pointer_up(host, position, button),
            PointerEvent::Leave => self.pointer_leave(host),
            PointerEvent::Wheel { position, delta } => self.wheel(position, delta),
        }
    }

    /// Dispatch a key event.
    pub fn handle_key_event<H: EngineHost>(&mut self, host: &mut H, event: KeyEvent) {
        self.input.handle_key_event(&event);
        if event == KeyEvent::Pressed(Key::Escape) && host.tool() == Tool::Crop {
            if matches!(
                self.drag.operation(),
                Some(DragOperation::MoveCrop { .. } | DragOperation::ResizeCrop { .. })
            ) {
                self.drag.end();
            }
            if host.crop_box().is_some() {
                log::debug!("crop box discarded on escape");
                host.set_crop_box(None);
            }
        }
    }

    /// Classify the pointer-down target and start a drag or a mask stroke.
    pub fn pointer_down<H: EngineHost>(&mut self, host: &mut H, position: Point, button: MouseButton) {
        self.input.handle_pointer_event(&PointerEvent::Down { position, button });
        if self.drag.is_dragging() || self.painter.is_drawing() {
            return;
        }

        if self.input.is_button_pressed(MouseButton::Middle) || (button == MouseButton::Left && self.input.pan_override()) {
            self.begin_pan(position);
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let tool = host.tool();
        if tool.is_drawing() {
            self.begin_paint(host, tool, position);
            return;
        }

        let canvas = screen_to_canvas(position, &self.viewport);
        let crop_box = host.crop_box();
        let ctx = HitContext {
            tool,
            layers: host.layers(),
            active_layer: host.active_layer(),
            crop_box,
            tolerance: self.hit_tolerance(),
        };
        let target = hit_test(&ctx, canvas);
        let snapshot = match target {
            DragHandle::LayerCorner { layer, .. } | DragHandle::LayerBody(layer) => {
                find_layer(ctx.layers, layer).cloned()
            }
            DragHandle::Crop(_) | DragHandle::Empty => None,
        };

        let operation = match (target, snapshot, crop_box) {
            (DragHandle::LayerCorner { corner, .. }, Some(initial_layer), _) => DragOperation::ScaleLayer {
                corner,
                start_canvas: canvas,
                initial_layer,
            },
            (DragHandle::LayerBody(id), Some(initial_layer), _) => {
                host.on_select_layer(id);
                self.on_active_layer_changed(host);
                DragOperation::MoveLayer {
                    start_canvas: canvas,
                    initial_layer,
                }
            }
            (DragHandle::Crop(CropHandle::Move), _, Some(initial_crop_box)) => DragOperation::MoveCrop {
                start_canvas: canvas,
                initial_crop_box,
            },
            (DragHandle::Crop(handle), _, Some(initial_crop_box)) => DragOperation::ResizeCrop {
                handle,
                start_canvas: canvas,
                initial_crop_box,
            },
            // Cropping outside the box draws a fresh one from the down-point.
            _ if tool == Tool::Crop => DragOperation::ResizeCrop {
                handle: CropHandle::Corner(Corner::BottomRight),
                start_canvas: canvas,
                initial_crop_box: CropBox::seed_at(canvas),
            },
            _ => {
                self.begin_pan(position);
                return;
            }
        };
        self.drag.begin(operation);
    }

    fn begin_pan(&mut self, position: Point) {
        self.drag.begin(DragOperation::Pan {
            start_screen: position,
            start_viewport: self.viewport,
        });
    }

    fn begin_paint<H: EngineHost>(&mut self, host: &H, tool: Tool, position: Point) {
        self.on_active_layer_changed(host);
        let Some(layer) = self.painter.layer().and_then(|id| find_layer(host.layers(), id)) else {
            return;
        };
        let brush = host.brush();
        let local = screen_to_layer_local(position, &self.viewport, layer);
        let width = brush.local_width(layer.scale, self.viewport.scale);
        self.painter.begin(tool, local, width, brush.color);
    }

    /// Continue the active stroke or drag.
    pub fn pointer_move<H: EngineHost>(&mut self, host: &mut H, position: Point) {
        self.input.handle_pointer_event(&PointerEvent::Move { position });

        if self.painter.is_drawing() {
            let layer = self.painter.layer().and_then(|id| find_layer(host.layers(), id));
            if let Some(layer) = layer {
                let local = screen_to_layer_local(position, &self.viewport, layer);
                self.painter.extend(local);
            }
            return;
        }

        let Some(operation) = self.drag.operation() else {
            return;
        };
        let update = operation.update(position, &self.viewport, self.limits());
        log::trace!("{} -> {:?}", operation.name(), update);
        match update {
            DragUpdate::Viewport(viewport) => self.viewport = viewport,
            DragUpdate::Layer(id, update) => host.on_layer_update(id, update),
            DragUpdate::CropBox(crop) => host.set_crop_box(Some(crop)),
            DragUpdate::Unchanged => {}
        }
    }

    /// Commit the active stroke or drag.
    pub fn pointer_up<H: EngineHost>(&mut self, _host: &mut H, position: Point, button: MouseButton) {
        self.input.handle_pointer_event(&PointerEvent::Up { position, button });
        self.finish_gesture();
    }

    /// The pointer left the surface; treated exactly like a release.
    pub fn pointer_leave<H: EngineHost>(&mut self, _host: &mut H) {
        self.input.handle_pointer_event(&PointerEvent::Leave);
        self.finish_gesture();
    }

    fn finish_gesture(&mut self) {
        if self.painter.is_drawing() {
            self.painter.finish();
        }
        self.drag.end();
    }

    /// Zoom one wheel notch around the cursor.
    ///
    /// A pan in progress is re-anchored at the zoomed viewport so the next
    /// move continues from it instead of restoring the old scale.
    pub fn wheel(&mut self, position: Point, delta: Vec2) {
        let pointer = self.input.pointer_position;
        self.input.handle_pointer_event(&PointerEvent::Wheel { position, delta });
        self.viewport.zoom_by(
            position,
            zoom_factor(delta.y, self.config.zoom_step),
            self.config.min_scale,
            self.config.max_scale,
        );
        if let DragState::Dragging(DragOperation::Pan {
            start_screen,
            start_viewport,
        }) = &mut self.drag
        {
            *start_screen = pointer;
            *start_viewport = self.viewport;
        }
    }

    /// Blank the active mask and record it in history.
    pub fn clear<H: EngineHost>(&mut self, host: &H) {
        self.on_active_layer_changed(host);
        self.painter.clear();
    }

    /// Step the active mask back one snapshot. Returns whether anything changed.
    pub fn undo<H: EngineHost>(&mut self, host: &H) -> bool {
        self.on_active_layer_changed(host);
        self.painter.undo()
    }

    /// Cursor to show for the pointer at `position`.
    pub fn cursor_at<H: EngineHost>(&self, host: &H, position: Point) -> CursorIcon {
        if let Some(operation) = self.drag.operation() {
            return operation.cursor();
        }
        if self.input.pan_override() {
            return CursorIcon::Grab;
        }
        let tool = host.tool();
        if tool.is_drawing() {
            return CursorIcon::Crosshair;
        }
        let ctx = HitContext {
            tool,
            layers: host.layers(),
            active_layer: host.active_layer(),
            crop_box: host.crop_box(),
            tolerance: self.hit_tolerance(),
        };
        match hit_test(&ctx, screen_to_canvas(position, &self.viewport)) {
            DragHandle::Empty if tool == Tool::Crop => CursorIcon::Crosshair,
            DragHandle::Empty => CursorIcon::Grab,
            handle => handle.cursor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::Color;

    /// Minimal host that applies callbacks to its own state.
    struct TestHost {
        layers: Vec<Layer>,
        active: Option<LayerId>,
        canvas: Size,
        tool: Tool,
        brush: BrushSettings,
        crop: Option<CropBox>,
        selected: Vec<LayerId>,
        layer_updates: usize,
    }

    impl TestHost {
        fn new() -> Self {
            let base = Layer::new(400, 300);
            let mut sticker = Layer::new(200, 100);
            sticker.x = 100.0;
            sticker.y = 100.0;
            Self {
                active: Some(base.id),
                layers: vec![base, sticker],
                canvas: Size::new(400.0, 300.0),
                tool: Tool::Move,
                brush: BrushSettings::new(Color::from_rgba8(0, 0, 255, 255), 10.0),
                crop: None,
                selected: Vec::new(),
                layer_updates: 0,
            }
        }

        fn layer(&self, index: usize) -> &Layer {
            &self.layers[index]
        }
    }

    impl EngineHost for TestHost {
        fn layers(&self) -> &[Layer] {
            &self.layers
        }
        fn active_layer(&self) -> Option<LayerId> {
            self.active
        }
        fn canvas_size(&self) -> Size {
            self.canvas
        }
        fn tool(&self) -> Tool {
            self.tool
        }
        fn brush(&self) -> BrushSettings {
            self.brush
        }
        fn crop_box(&self) -> Option<CropBox> {
            self.crop
        }
        fn on_layer_update(&mut self, id: LayerId, update: LayerUpdate) {
            self.layer_updates += 1;
            if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
                layer.apply(&update);
            }
        }
        fn set_crop_box(&mut self, crop_box: Option<CropBox>) {
            self.crop = crop_box;
        }
        fn on_select_layer(&mut self, id: LayerId) {
            self.selected.push(id);
            self.active = Some(id);
        }
    }

    fn drag<H: EngineHost>(engine: &mut CanvasEngine, host: &mut H, from: Point, to: Point) {
        engine.pointer_down(host, from, MouseButton::Left);
        engine.pointer_move(host, Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0));
        engine.pointer_move(host, to);
        engine.pointer_up(host, to, MouseButton::Left);
    }

    #[test]
    fn test_center_view_needs_container() {
        let host = TestHost::new();
        let mut engine = CanvasEngine::new();
        engine.center_view(&host);
        assert_eq!(*engine.viewport(), Viewport::default());

        engine.set_container_size(Some(Size::new(800.0, 600.0)));
        engine.center_view(&host);
        assert!((engine.viewport().scale - 0.9).abs() < 1e-12);
        assert!((engine.viewport().x - 220.0).abs() < 1e-9);
        assert!((engine.viewport().y - 165.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_topmost_layer_selects_and_moves() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        let sticker = host.layer(1).id;

        drag(&mut engine, &mut host, Point::new(150.0, 150.0), Point::new(180.0, 130.0));

        assert_eq!(host.selected, vec![sticker]);
        assert!((host.layer(1).x - 130.0).abs() < 1e-9);
        assert!((host.layer(1).y - 80.0).abs() < 1e-9);
        assert!((host.layer(0).x).abs() < f64::EPSILON);
        assert!(!engine.is_dragging());
    }

    #[test]
    fn test_move_delta_is_in_canvas_space() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        engine.set_viewport(Viewport { x: 0.0, y: 0.0, scale: 2.0 });

        // Screen (300, 300) is canvas (150, 150) on the sticker.
        drag(&mut engine, &mut host, Point::new(300.0, 300.0), Point::new(340.0, 300.0));
        assert!((host.layer(1).x - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_drag_scales_around_center() {
        let mut host = TestHost::new();
        host.active = Some(host.layer(1).id);
        let mut engine = CanvasEngine::new();

        // Bottom-right corner of the sticker sits at (300, 200), center (200, 150).
        engine.pointer_down(&mut host, Point::new(300.0, 200.0), MouseButton::Left);
        assert!(matches!(engine.drag_operation(), Some(DragOperation::ScaleLayer { corner: Corner::BottomRight, .. })));
        engine.pointer_move(&mut host, Point::new(400.0, 180.0));
        engine.pointer_up(&mut host, Point::new(400.0, 180.0), MouseButton::Left);

        let layer = host.layer(1);
        assert!((layer.scale - 2.0).abs() < 1e-9);
        assert!((layer.center().x - 200.0).abs() < 1e-9);
        assert!((layer.center().y - 150.0).abs() < 1e-9);
        assert!(host.selected.is_empty());
    }

    #[test]
    fn test_scale_below_minimum_keeps_last_valid_state() {
        let mut host = TestHost::new();
        host.active = Some(host.layer(1).id);
        let mut engine = CanvasEngine::new();

        engine.pointer_down(&mut host, Point::new(300.0, 200.0), MouseButton::Left);
        engine.pointer_move(&mut host, Point::new(250.0, 150.0));
        let before = host.layer(1).clone();
        engine.pointer_move(&mut host, Point::new(201.0, 151.0));
        assert_eq!(host.layer(1), &before);
        engine.pointer_up(&mut host, Point::new(201.0, 151.0), MouseButton::Left);
    }

    #[test]
    fn test_empty_canvas_pans() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        drag(&mut engine, &mut host, Point::new(600.0, 600.0), Point::new(650.0, 580.0));
        assert_eq!(*engine.viewport(), Viewport { x: 50.0, y: -20.0, scale: 1.0 });
        assert_eq!(host.layer_updates, 0);
    }

    #[test]
    fn test_space_and_middle_button_pan() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();

        engine.handle_key_event(&mut host, KeyEvent::Pressed(Key::Space));
        drag(&mut engine, &mut host, Point::new(150.0, 150.0), Point::new(160.0, 150.0));
        engine.handle_key_event(&mut host, KeyEvent::Released(Key::Space));
        assert!((engine.viewport().x - 10.0).abs() < f64::EPSILON);
        assert_eq!(host.layer_updates, 0);

        host.tool = Tool::Brush;
        engine.pointer_down(&mut host, Point::new(150.0, 150.0), MouseButton::Middle);
        engine.pointer_move(&mut host, Point::new(150.0, 170.0));
        engine.pointer_up(&mut host, Point::new(150.0, 170.0), MouseButton::Middle);
        assert!((engine.viewport().y - 20.0).abs() < f64::EPSILON);
        assert_eq!(engine.history().map(MaskHistory::len), None);
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        engine.pointer_down(&mut host, Point::new(150.0, 150.0), MouseButton::Left);
        engine.pointer_move(&mut host, Point::new(160.0, 150.0));
        engine.pointer_leave(&mut host);
        assert!(!engine.is_dragging());

        // Moves after leaving do nothing.
        engine.pointer_move(&mut host, Point::new(300.0, 300.0));
        assert!((host.layer(1).x - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_at_cursor() {
        let mut engine = CanvasEngine::new();
        engine.wheel(Point::new(100.0, 100.0), Vec2::new(0.0, -120.0));
        let viewport = engine.viewport();
        assert!((viewport.scale - 1.1).abs() < 1e-12);
        assert!((viewport.x + 10.0).abs() < 1e-9);
        assert!((viewport.y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_tool_lifecycle() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();

        host.tool = Tool::Crop;
        engine.on_tool_changed(&mut host);
        assert_eq!(host.crop, Some(CropBox::new(0.0, 0.0, 400.0, 300.0)));

        // Drag the bottom-right handle far inward; it clamps to the minimum.
        drag(&mut engine, &mut host, Point::new(400.0, 300.0), Point::new(-100.0, -100.0));
        assert_eq!(host.crop, Some(CropBox::new(0.0, 0.0, 10.0, 10.0)));

        host.tool = Tool::Move;
        engine.on_tool_changed(&mut host);
        assert_eq!(host.crop, None);
    }

    #[test]
    fn test_crop_move_and_edge() {
        let mut host = TestHost::new();
        host.tool = Tool::Crop;
        host.crop = Some(CropBox::new(50.0, 50.0, 100.0, 100.0));
        let mut engine = CanvasEngine::new();

        drag(&mut engine, &mut host, Point::new(100.0, 100.0), Point::new(120.0, 90.0));
        assert_eq!(host.crop, Some(CropBox::new(70.0, 40.0, 100.0, 100.0)));

        // Left edge midpoint is now at (70, 90).
        drag(&mut engine, &mut host, Point::new(70.0, 90.0), Point::new(40.0, 90.0));
        assert_eq!(host.crop, Some(CropBox::new(40.0, 40.0, 130.0, 100.0)));
    }

    #[test]
    fn test_crop_outside_box_draws_new_one() {
        let mut host = TestHost::new();
        host.tool = Tool::Crop;
        let mut engine = CanvasEngine::new();

        drag(&mut engine, &mut host, Point::new(20.0, 30.0), Point::new(120.0, 33.0));
        assert_eq!(host.crop, Some(CropBox::new(20.0, 30.0, 100.0, 10.0)));
    }

    #[test]
    fn test_escape_discards_crop() {
        let mut host = TestHost::new();
        host.tool = Tool::Crop;
        host.crop = Some(CropBox::new(0.0, 0.0, 100.0, 100.0));
        let mut engine = CanvasEngine::new();

        engine.pointer_down(&mut host, Point::new(50.0, 50.0), MouseButton::Left);
        engine.handle_key_event(&mut host, KeyEvent::Pressed(Key::Escape));
        assert_eq!(host.crop, None);
        assert!(!engine.is_dragging());

        // Escape with another tool leaves the crop box alone.
        host.tool = Tool::Move;
        host.crop = Some(CropBox::new(0.0, 0.0, 100.0, 100.0));
        engine.handle_key_event(&mut host, KeyEvent::Pressed(Key::Escape));
        assert!(host.crop.is_some());
    }

    #[test]
    fn test_brush_strokes_and_undo() {
        let mut host = TestHost::new();
        host.tool = Tool::Brush;
        let mut engine = CanvasEngine::new();

        drag(&mut engine, &mut host, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        let after_first = engine.raster().unwrap().clone();
        assert!(after_first.pixel(50, 10).is_some_and(|p| p == [0, 0, 255, 255]));

        drag(&mut engine, &mut host, Point::new(10.0, 50.0), Point::new(100.0, 50.0));
        drag(&mut engine, &mut host, Point::new(10.0, 90.0), Point::new(100.0, 90.0));
        assert_eq!(engine.history().unwrap().len(), 4);

        assert!(engine.undo(&host));
        assert!(engine.undo(&host));
        assert_eq!(engine.raster().unwrap(), &after_first);
        assert!(engine.undo(&host));
        assert!(!engine.undo(&host));
        assert_eq!(engine.history().unwrap().index(), 0);
    }

    #[test]
    fn test_brush_width_tracks_zoom_and_layer_scale() {
        let mut host = TestHost::new();
        host.tool = Tool::Brush;
        host.layers[0].scale = 0.5;
        let mut engine = CanvasEngine::new();
        engine.set_viewport(Viewport { x: 0.0, y: 0.0, scale: 2.0 });

        // Layer-local = screen / 2 / 0.5 = screen; width = 10 / 0.5 / 2 = 10.
        drag(&mut engine, &mut host, Point::new(20.0, 40.0), Point::new(120.0, 40.0));
        let raster = engine.raster().unwrap();
        assert!(raster.pixel(70, 44).is_some_and(|p| p[3] == 255));
        assert!(raster.pixel(70, 47).is_some_and(|p| p[3] == 0));
    }

    #[test]
    fn test_rectangle_tool_commits_on_up() {
        let mut host = TestHost::new();
        host.tool = Tool::Rectangle;
        let mut engine = CanvasEngine::new();

        engine.pointer_down(&mut host, Point::new(10.0, 10.0), MouseButton::Left);
        engine.pointer_move(&mut host, Point::new(200.0, 200.0));
        engine.pointer_move(&mut host, Point::new(20.0, 20.0));
        assert_eq!(engine.raster().unwrap().painted_pixels(), 100);
        assert_eq!(engine.history().unwrap().len(), 1);

        engine.pointer_leave(&mut host);
        assert_eq!(engine.history().unwrap().len(), 2);
        assert!(!engine.is_drawing());
    }

    #[test]
    fn test_clear_and_layer_switch() {
        let mut host = TestHost::new();
        host.tool = Tool::Brush;
        let mut engine = CanvasEngine::new();

        drag(&mut engine, &mut host, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        engine.clear(&host);
        assert!(engine.raster().unwrap().is_blank());
        assert_eq!(engine.history().unwrap().len(), 3);

        host.active = Some(host.layer(1).id);
        engine.on_active_layer_changed(&host);
        let raster = engine.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (200, 100));
        assert_eq!(engine.history().unwrap().len(), 1);
        assert!(!engine.undo(&host));
    }

    #[test]
    fn test_drawing_without_active_layer_is_noop() {
        let mut host = TestHost::new();
        host.tool = Tool::Brush;
        host.active = None;
        let mut engine = CanvasEngine::new();

        drag(&mut engine, &mut host, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        assert!(engine.raster().is_none());
        engine.clear(&host);
        assert!(!engine.undo(&host));
    }

    #[test]
    fn test_tool_change_mid_drag_keeps_operation() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        engine.pointer_down(&mut host, Point::new(150.0, 150.0), MouseButton::Left);
        host.tool = Tool::Brush;
        engine.pointer_move(&mut host, Point::new(170.0, 150.0));
        engine.pointer_up(&mut host, Point::new(170.0, 150.0), MouseButton::Left);

        assert!((host.layer(1).x - 120.0).abs() < 1e-9);
        assert!(engine.raster().is_some_and(MaskRaster::is_blank));
        assert!(!engine.is_drawing());
    }

    #[test]
    fn test_cursor_feedback() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();
        assert_eq!(engine.cursor_at(&host, Point::new(150.0, 150.0)), CursorIcon::Move);
        assert_eq!(engine.cursor_at(&host, Point::new(400.0, 300.0)), CursorIcon::NwseResize);
        assert_eq!(engine.cursor_at(&host, Point::new(900.0, 900.0)), CursorIcon::Grab);

        engine.pointer_down(&mut host, Point::new(900.0, 900.0), MouseButton::Left);
        assert_eq!(engine.cursor_at(&host, Point::new(900.0, 900.0)), CursorIcon::Grabbing);
        engine.pointer_up(&mut host, Point::new(900.0, 900.0), MouseButton::Left);

        host.tool = Tool::Brush;
        assert_eq!(engine.cursor_at(&host, Point::ZERO), CursorIcon::Crosshair);
    }

    #[test]
    fn test_click_select_rebinds_mask() {
        let mut host = TestHost::new();
        host.tool = Tool::Brush;
        let mut engine = CanvasEngine::new();
        drag(&mut engine, &mut host, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        assert_eq!(engine.history().map(MaskHistory::len), Some(2));

        host.tool = Tool::Move;
        engine.pointer_down(&mut host, Point::new(150.0, 150.0), MouseButton::Left);
        engine.pointer_up(&mut host, Point::new(150.0, 150.0), MouseButton::Left);

        assert_eq!(host.active, Some(host.layer(1).id));
        assert_eq!(engine.painter().layer(), Some(host.layer(1).id));
        let raster = engine.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (200, 100));
        assert!(raster.is_blank());
        assert_eq!(engine.history().map(MaskHistory::len), Some(1));
        assert!(!engine.undo(&host));
    }

    #[test]
    fn test_wheel_during_pan_keeps_zoom() {
        let mut host = TestHost::new();
        let mut engine = CanvasEngine::new();

        engine.pointer_down(&mut host, Point::ZERO, MouseButton::Middle);
        engine.wheel(Point::new(100.0, 100.0), Vec2::new(0.0, -1.0));
        engine.pointer_move(&mut host, Point::new(10.0, 0.0));

        let viewport = *engine.viewport();
        assert!((viewport.scale - 1.1).abs() < 1e-12);
        assert!(viewport.x.abs() < 1e-9);
        assert!((viewport.y + 10.0).abs() < 1e-9);

        engine.pointer_up(&mut host, Point::new(10.0, 0.0), MouseButton::Middle);
        assert!(!engine.is_dragging());
    }

    #[test]
    fn test_with_config_validates() {
        let bad = EngineConfig { min_scale: 0.0, ..Default::default() };
        assert!(CanvasEngine::with_config(bad).is_err());

        let config = EngineConfig { max_scale: 2.0, ..Default::default() };
        let mut engine = CanvasEngine::with_config(config).unwrap();
        for _ in 0..20 {
            engine.wheel(Point::ZERO, Vec2::new(0.0, -1.0));
        }
        assert!((engine.viewport().scale - 2.0).abs() < f64::EPSILON);
    }
}
