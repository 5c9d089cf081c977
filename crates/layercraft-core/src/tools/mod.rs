//! Tool selection and brush settings.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Available tools. Selection is owned by the host; the engine reacts to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select, move and scale layers; drag empty canvas to pan.
    #[default]
    Move,
    /// Freehand painting on the active layer's mask.
    Brush,
    /// Filled rectangles on the active layer's mask.
    Rectangle,
    /// Edit the crop box.
    Crop,
}

impl Tool {
    /// Whether this tool paints onto the mask.
    pub fn is_drawing(self) -> bool {
        matches!(self, Tool::Brush | Tool::Rectangle)
    }
}

/// Brush color and on-screen diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub color: Color,
    /// Diameter in screen pixels, independent of zoom and layer scale.
    pub size: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color::from_rgba8(255, 0, 0, 255),
            size: 20.0,
        }
    }
}

impl BrushSettings {
    pub fn new(color: Color, size: f64) -> Self {
        Self { color, size }
    }

    /// Stroke width in layer-local pixels for the given layer and viewport scale.
    pub fn local_width(&self, layer_scale: f64, viewport_scale: f64) -> f64 {
        self.size / layer_scale / viewport_scale
    }
}
