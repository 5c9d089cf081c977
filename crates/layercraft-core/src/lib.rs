//! LayerCraft Core Library
//!
//! Platform-agnostic interaction logic for a layered image editing surface:
//! viewport pan and zoom, layer move and scale, crop box editing, and mask
//! painting with undo.

pub mod config;
pub mod coords;
pub mod crop;
pub mod drag;
pub mod engine;
pub mod handles;
pub mod input;
pub mod layer;
pub mod mask;
pub mod tools;
pub mod viewport;

pub use config::{ConfigError, EngineConfig};
pub use coords::{canvas_to_layer_local, canvas_to_screen, layer_local_to_canvas, screen_to_canvas, screen_to_layer_local};
pub use crop::{CropBox, CropHandle};
pub use drag::{DragOperation, DragState, DragUpdate};
pub use engine::{CanvasEngine, EngineHost};
pub use handles::{Corner, CursorIcon, DragHandle, Edge};
pub use input::{InputState, Key, KeyEvent, MouseButton, PointerEvent};
pub use layer::{Layer, LayerId, LayerUpdate};
pub use mask::{MaskError, MaskHistory, MaskPainter, MaskRaster};
pub use tools::{BrushSettings, Tool};
pub use viewport::Viewport;
