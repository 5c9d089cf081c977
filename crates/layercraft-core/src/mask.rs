//! Raster mask painting with snapshot-based undo.

use crate::layer::{Layer, LayerId};
use crate::tools::Tool;
use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use std::fmt;
use thiserror::Error;

/// Mask errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("Pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// An RGBA8 raster in layer-local pixel space.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for MaskRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

impl MaskRaster {
    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap an existing RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, MaskError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(MaskError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&b| b == 0)
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    /// Paint every pixel whose center lies inside `rect` (any corner order).
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.abs();
        let color = rgba(color);
        let x0 = rect.x0.round() as i64;
        let x1 = rect.x1.round() as i64;
        let y0 = rect.y0.round() as i64;
        let y1 = rect.y1.round() as i64;
        for y in y0.max(0)..y1.min(i64::from(self.height)) {
            for x in x0.max(0)..x1.min(i64::from(self.width)) {
                self.put(x, y, color);
            }
        }
    }

    /// Paint a round-capped line segment of the given width.
    pub fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Color) {
        let radius = (width / 2.0).max(0.5);
        let color = rgba(color);
        let bounds = Rect::from_points(from, to).inflate(radius, radius);
        let x0 = (bounds.x0.floor() as i64).max(0);
        let y0 = (bounds.y0.floor() as i64).max(0);
        let x1 = (bounds.x1.ceil() as i64).min(i64::from(self.width));
        let y1 = (bounds.y1.ceil() as i64).min(i64::from(self.height));

        let seg = to - from;
        let len_sq = seg.hypot2();
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq < f64::EPSILON {
                    0.0
                } else {
                    ((center - from).dot(seg) / len_sq).clamp(0.0, 1.0)
                };
                let nearest = from + seg * t;
                if (center - nearest).hypot2() <= radius * radius {
                    self.put(x, y, color);
                }
            }
        }
    }
}

/// Ordered raster snapshots plus the index of the current one.
///
/// Always holds at least one snapshot and `index < len`.
#[derive(Debug, Clone)]
pub struct MaskHistory {
    snapshots: Vec<MaskRaster>,
    index: usize,
    limit: usize,
}

impl MaskHistory {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: MaskRaster, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: MaskRaster) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.index = 0;
    }

    /// Append a snapshot, discarding anything after the current index.
    pub fn commit(&mut self, raster: &MaskRaster) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(raster.clone());
        if self.snapshots.len() > self.limit {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    /// Step back one snapshot. Returns the snapshot to restore, if any.
    pub fn undo(&mut self) -> Option<&MaskRaster> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// The snapshot at the current index.
    pub fn current(&self) -> &MaskRaster {
        &self.snapshots[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// State of a mask drawing gesture.
#[derive(Debug, Clone, Default)]
pub enum PaintState {
    #[default]
    Idle,
    /// Freehand stroke in layer-local space.
    Brush {
        path: BezPath,
        last: Point,
        width: f64,
        color: Color,
    },
    /// Rectangle anchored at `start`, previewed over the last snapshot.
    Rectangle { start: Point, color: Color },
}

/// The active layer's mask surface and its history.
#[derive(Debug, Clone)]
struct MaskSurface {
    layer: LayerId,
    raster: MaskRaster,
    history: MaskHistory,
}

/// Paints onto the active layer's mask.
///
/// Exactly one surface exists at a time; switching layers replaces it.
#[derive(Debug, Clone)]
pub struct MaskPainter {
    surface: Option<MaskSurface>,
    state: PaintState,
    history_limit: usize,
}

impl Default for MaskPainter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}

impl MaskPainter {
    pub fn new(history_limit: usize) -> Self {
        Self {
            surface: None,
            state: PaintState::Idle,
            history_limit,
        }
    }

    /// Bind the painter to `layer`.
    ///
    /// A different layer, or new natural dimensions for the same one, gets a
    /// blank raster and a history holding just that blank snapshot.
    pub fn attach(&mut self, layer: &Layer) {
        if let Some(surface) = &self.surface {
            if surface.layer == layer.id
                && surface.raster.width() == layer.natural_width
                && surface.raster.height() == layer.natural_height
            {
                return;
            }
        }
        log::debug!(
            "mask reset for layer {} ({}x{})",
            layer.id,
            layer.natural_width,
            layer.natural_height
        );
        let raster = MaskRaster::new(layer.natural_width, layer.natural_height);
        let history = MaskHistory::new(raster.clone(), self.history_limit);
        self.surface = Some(MaskSurface {
            layer: layer.id,
            raster,
            history,
        });
        self.state = PaintState::Idle;
    }

    /// Release the surface when no layer is active.
    pub fn detach(&mut self) {
        self.surface = None;
        self.state = PaintState::Idle;
    }

    /// Layer the current surface belongs to.
    pub fn layer(&self) -> Option<LayerId> {
        self.surface.as_ref().map(|s| s.layer)
    }

    /// Read access to the live mask for compositing or export.
    pub fn raster(&self) -> Option<&MaskRaster> {
        self.surface.as_ref().map(|s| &s.raster)
    }

    pub fn history(&self) -> Option<&MaskHistory> {
        self.surface.as_ref().map(|s| &s.history)
    }

    pub fn state(&self) -> &PaintState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        !matches!(self.state, PaintState::Idle)
    }

    /// Start a gesture at a layer-local point. `width` is the local stroke width.
    pub fn begin(&mut self, tool: Tool, point: Point, width: f64, color: Color) {
        if self.surface.is_none() {
            return;
        }
        self.state = match tool {
            Tool::Brush => {
                let mut path = BezPath::new();
                path.move_to(point);
                PaintState::Brush {
                    path,
                    last: point,
                    width,
                    color,
                }
            }
            Tool::Rectangle => PaintState::Rectangle { start: point, color },
            Tool::Move | Tool::Crop => PaintState::Idle,
        };
    }

    /// Continue the gesture to a layer-local point.
    pub fn extend(&mut self, point: Point) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match &mut self.state {
            PaintState::Idle => {}
            PaintState::Brush {
                path,
                last,
                width,
                color,
            } => {
                path.line_to(point);
                surface.raster.stroke_segment(*last, point, *width, *color);
                *last = point;
            }
            PaintState::Rectangle { start, color } => {
                surface.raster = surface.history.current().clone();
                surface.raster.fill_rect(Rect::from_points(*start, point), *color);
            }
        }
    }

    /// End the gesture and commit the raster to history.
    pub fn finish(&mut self) {
        if matches!(std::mem::take(&mut self.state), PaintState::Idle) {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.history.commit(&surface.raster);
            log::debug!("mask commit, history {}/{}", surface.history.index() + 1, surface.history.len());
        }
    }

    /// Path of the brush stroke in progress, for preview rendering.
    pub fn current_path(&self) -> Option<&BezPath> {
        match &self.state {
            PaintState::Brush { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Restore the previous snapshot. No-op at the start of history.
    pub fn undo(&mut self) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        match surface.history.undo() {
            Some(snapshot) => {
                surface.raster = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Blank the mask and commit the blank state.
    pub fn clear(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.state = PaintState::Idle;
        surface.raster.clear();
        surface.history.commit(&surface.raster);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::from_rgba8(255, 0, 0, 255)
    }

    fn painter_for(layer: &Layer) -> MaskPainter {
        let mut painter = MaskPainter::new(50);
        painter.attach(layer);
        painter
    }

    fn stroke(painter: &mut MaskPainter, from: Point, to: Point) {
        painter.begin(Tool::Brush, from, 4.0, red());
        painter.extend(to);
        painter.finish();
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(MaskRaster::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            MaskRaster::from_rgba(2, 2, vec![0; 15]),
            Err(MaskError::BufferSize { width: 2, height: 2, expected: 16, actual: 15 })
        );
    }

    #[test]
    fn test_fill_rect_any_corner_order() {
        let mut raster = MaskRaster::new(10, 10);
        raster.fill_rect(Rect::new(6.0, 5.0, 2.0, 1.0), red());
        assert_eq!(raster.painted_pixels(), 16);
        assert_eq!(raster.pixel(2, 1), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(6, 5), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut raster = MaskRaster::new(4, 4);
        raster.fill_rect(Rect::new(-10.0, -10.0, 100.0, 2.0), red());
        assert_eq!(raster.painted_pixels(), 8);
    }

    #[test]
    fn test_stroke_segment_width() {
        let mut raster = MaskRaster::new(20, 20);
        raster.stroke_segment(Point::new(2.0, 10.0), Point::new(18.0, 10.0), 4.0, red());
        assert!(raster.pixel(10, 10).is_some_and(|p| p[3] == 255));
        assert!(raster.pixel(10, 8).is_some_and(|p| p[3] == 255));
        assert!(raster.pixel(10, 5).is_some_and(|p| p[3] == 0));
        // Round cap extends past the endpoint.
        assert!(raster.pixel(1, 10).is_some_and(|p| p[3] == 255));
    }

    #[test]
    fn test_history_undo_to_first_stroke() {
        let layer = Layer::new(40, 40);
        let mut painter = painter_for(&layer);

        stroke(&mut painter, Point::new(5.0, 5.0), Point::new(35.0, 5.0));
        let after_first = painter.raster().unwrap().clone();
        stroke(&mut painter, Point::new(5.0, 20.0), Point::new(35.0, 20.0));
        stroke(&mut painter, Point::new(5.0, 30.0), Point::new(35.0, 30.0));
        assert_eq!(painter.history().unwrap().len(), 4);

        assert!(painter.undo());
        assert!(painter.undo());
        assert_eq!(painter.raster().unwrap(), &after_first);
        assert_eq!(painter.history().unwrap().index(), 1);

        assert!(painter.undo());
        assert!(painter.raster().unwrap().is_blank());
        assert!(!painter.undo());
        assert_eq!(painter.history().unwrap().index(), 0);
    }

    #[test]
    fn test_commit_after_undo_discards_future() {
        let layer = Layer::new(20, 20);
        let mut painter = painter_for(&layer);
        stroke(&mut painter, Point::new(1.0, 1.0), Point::new(19.0, 1.0));
        stroke(&mut painter, Point::new(1.0, 10.0), Point::new(19.0, 10.0));
        painter.undo();
        stroke(&mut painter, Point::new(1.0, 18.0), Point::new(19.0, 18.0));

        let history = painter.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        // The undone middle stroke is gone.
        assert!(painter.raster().unwrap().pixel(10, 10).is_some_and(|p| p[3] == 0));
    }

    #[test]
    fn test_rectangle_preview_is_non_destructive() {
        let layer = Layer::new(20, 20);
        let mut painter = painter_for(&layer);
        painter.begin(Tool::Rectangle, Point::new(0.0, 0.0), 1.0, red());
        painter.extend(Point::new(15.0, 15.0));
        painter.extend(Point::new(5.0, 5.0));
        assert_eq!(painter.raster().unwrap().painted_pixels(), 25);
        assert_eq!(painter.history().unwrap().len(), 1);

        painter.finish();
        assert_eq!(painter.history().unwrap().len(), 2);
        assert!(!painter.is_drawing());
    }

    #[test]
    fn test_clear_commits() {
        let layer = Layer::new(10, 10);
        let mut painter = painter_for(&layer);
        stroke(&mut painter, Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        painter.clear();
        assert!(painter.raster().unwrap().is_blank());
        assert_eq!(painter.history().unwrap().len(), 3);
        assert!(painter.undo());
        assert!(!painter.raster().unwrap().is_blank());
    }

    #[test]
    fn test_attach_resets_on_layer_change() {
        let a = Layer::new(10, 10);
        let b = Layer::new(30, 20);
        let mut painter = painter_for(&a);
        stroke(&mut painter, Point::new(0.0, 5.0), Point::new(10.0, 5.0));

        // Re-attaching the same layer keeps the mask.
        painter.attach(&a);
        assert_eq!(painter.history().unwrap().len(), 2);

        painter.attach(&b);
        let raster = painter.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (30, 20));
        assert!(raster.is_blank());
        assert_eq!(painter.history().unwrap().len(), 1);
        assert_eq!(painter.layer(), Some(b.id));
    }

    #[test]
    fn test_no_surface_is_noop() {
        let mut painter = MaskPainter::default();
        painter.begin(Tool::Brush, Point::ZERO, 2.0, red());
        assert!(!painter.is_drawing());
        painter.clear();
        assert!(!painter.undo());
        assert!(painter.raster().is_none());
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let mut history = MaskHistory::new(MaskRaster::new(2, 2), 3);
        for _ in 0..5 {
            history.commit(&MaskRaster::new(2, 2));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn test_brush_path_tracks_points() {
        let layer = Layer::new(10, 10);
        let mut painter = painter_for(&layer);
        painter.begin(Tool::Brush, Point::new(1.0, 1.0), 2.0, red());
        painter.extend(Point::new(5.0, 5.0));
        painter.extend(Point::new(8.0, 2.0));
        assert_eq!(painter.current_path().map(|p| p.elements().len()), Some(3));
        painter.finish();
        assert!(painter.current_path().is_none());
    }
}
