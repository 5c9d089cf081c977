//! Scripted editing sessions.
//!
//! A session script describes a canvas, its layers and a list of input
//! events. Replaying it drives a [`CanvasEngine`] exactly as a windowed
//! host would and yields a serializable summary of the final state.

use crate::error::{AppError, AppResult};
use kurbo::Size;
use layercraft_core::{
    BrushSettings, CanvasEngine, CropBox, EngineConfig, EngineHost, KeyEvent, Layer, LayerId, LayerUpdate,
    MaskRaster, PointerEvent, Tool, Viewport,
};
use peniko::Color;
use serde::{Deserialize, Serialize};

fn default_scale() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// Initial placement of one layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_scale")]
    pub opacity: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl LayerSpec {
    fn to_layer(&self) -> Layer {
        let mut layer = Layer::new(self.width, self.height);
        layer.x = self.x;
        layer.y = self.y;
        layer.scale = self.scale;
        layer.opacity = self.opacity;
        layer.is_visible = self.visible;
        layer
    }
}

/// Brush color as RGBA bytes plus on-screen size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BrushSpec {
    pub color: [u8; 4],
    pub size: f64,
}

impl Default for BrushSpec {
    fn default() -> Self {
        let defaults = BrushSettings::default();
        let rgba = defaults.color.to_rgba8();
        Self {
            color: [rgba.r, rgba.g, rgba.b, rgba.a],
            size: defaults.size,
        }
    }
}

impl From<BrushSpec> for BrushSettings {
    fn from(spec: BrushSpec) -> Self {
        let [r, g, b, a] = spec.color;
        BrushSettings::new(Color::from_rgba8(r, g, b, a), spec.size)
    }
}

/// One step of a session script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// Switch the active tool.
    Tool(Tool),
    /// Make the layer at this index active.
    SelectLayer(usize),
    /// Resize the container hosting the surface.
    Resize(Size),
    CenterView,
    Undo,
    Clear,
}

/// A complete session script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub canvas: Size,
    #[serde(default)]
    pub container: Option<Size>,
    pub layers: Vec<LayerSpec>,
    /// Index into `layers`.
    #[serde(default)]
    pub active_layer: Option<usize>,
    #[serde(default)]
    pub tool: Tool,
    #[serde(default)]
    pub brush: BrushSpec,
    #[serde(default)]
    pub crop_box: Option<CropBox>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Document state owned by the host side of the engine.
#[derive(Debug, Clone)]
pub struct SessionHost {
    layers: Vec<Layer>,
    active: Option<LayerId>,
    canvas: Size,
    tool: Tool,
    brush: BrushSettings,
    crop_box: Option<CropBox>,
}

impl SessionHost {
    fn layer_id(&self, index: usize) -> AppResult<LayerId> {
        self.layers
            .get(index)
            .map(|layer| layer.id)
            .ok_or_else(|| AppError::Script(format!("layer index {} out of range ({} layers)", index, self.layers.len())))
    }

    fn active_index(&self) -> Option<usize> {
        let active = self.active?;
        self.layers.iter().position(|layer| layer.id == active)
    }
}

impl EngineHost for SessionHost {
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
        self.crop_box
    }

    fn on_layer_update(&mut self, id: LayerId, update: LayerUpdate) {
        if let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) {
            layer.apply(&update);
        }
    }

    fn set_crop_box(&mut self, crop_box: Option<CropBox>) {
        self.crop_box = crop_box;
    }

    fn on_select_layer(&mut self, id: LayerId) {
        log::debug!("Layer selected: {}", id);
        self.active = Some(id);
    }
}

/// Mask readout included in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskSummary {
    pub width: u32,
    pub height: u32,
    pub painted_pixels: usize,
    pub history_index: usize,
    pub history_len: usize,
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub viewport: Viewport,
    pub tool: Tool,
    pub active_layer: Option<usize>,
    pub layers: Vec<Layer>,
    pub crop_box: Option<CropBox>,
    pub mask: Option<MaskSummary>,
}

/// A host and engine pair replaying script events.
#[derive(Debug, Clone)]
pub struct Session {
    host: SessionHost,
    engine: CanvasEngine,
}

impl Session {
    /// Build the document from a script and bind the engine to it.
    pub fn new(script: &Script, config: EngineConfig) -> AppResult<Self> {
        let engine = CanvasEngine::with_config(config)?;
        let mut host = SessionHost {
            layers: script.layers.iter().map(LayerSpec::to_layer).collect(),
            active: None,
            canvas: script.canvas,
            tool: script.tool,
            brush: script.brush.into(),
            crop_box: script.crop_box,
        };
        if let Some(index) = script.active_layer {
            host.active = Some(host.layer_id(index)?);
        }

        let mut session = Self { host, engine };
        session.engine.on_active_layer_changed(&session.host);
        if let Some(container) = script.container {
            session.engine.set_container_size(Some(container));
            session.engine.center_view(&session.host);
        }
        log::info!(
            "Session ready: {} layers, canvas {}x{}",
            session.host.layers.len(),
            script.canvas.width,
            script.canvas.height
        );
        Ok(session)
    }

    /// Replay every event of `script` on a fresh session.
    pub fn replay(script: &Script, config: EngineConfig) -> AppResult<Self> {
        let mut session = Self::new(script, config)?;
        for (step, event) in script.events.iter().enumerate() {
            log::trace!("step {}: {:?}", step, event);
            session.apply(event)?;
        }
        log::info!("Replay finished after {} events", script.events.len());
        Ok(session)
    }

    /// Apply a single script event.
    pub fn apply(&mut self, event: &ScriptEvent) -> AppResult<()> {
        match event {
            ScriptEvent::Pointer(pointer) => self.engine.handle_pointer_event(&mut self.host, *pointer),
            ScriptEvent::Key(key) => self.engine.handle_key_event(&mut self.host, *key),
            ScriptEvent::Tool(tool) => {
                self.host.tool = *tool;
                self.engine.on_tool_changed(&mut self.host);
            }
            ScriptEvent::SelectLayer(index) => {
                self.host.active = Some(self.host.layer_id(*index)?);
                self.engine.on_active_layer_changed(&self.host);
            }
            ScriptEvent::Resize(size) => {
                self.engine.set_container_size(Some(*size));
            }
            ScriptEvent::CenterView => self.engine.center_view(&self.host),
            ScriptEvent::Undo => {
                if !self.engine.undo(&self.host) {
                    log::debug!("Nothing to undo");
                }
            }
            ScriptEvent::Clear => self.engine.clear(&self.host),
        }
        Ok(())
    }

    pub fn host(&self) -> &SessionHost {
        &self.host
    }

    pub fn engine(&self) -> &CanvasEngine {
        &self.engine
    }

    /// The active layer's mask, if one is bound.
    pub fn mask(&self) -> Option<&MaskRaster> {
        self.engine.raster()
    }

    pub fn summary(&self) -> SessionSummary {
        let mask = self.engine.raster().zip(self.engine.history()).map(|(raster, history)| MaskSummary {
            width: raster.width(),
            height: raster.height(),
            painted_pixels: raster.painted_pixels(),
            history_index: history.index(),
            history_len: history.len(),
        });
        SessionSummary {
            viewport: *self.engine.viewport(),
            tool: self.host.tool,
            active_layer: self.host.active_index(),
            layers: self.host.layers.clone(),
            crop_box: self.host.crop_box,
            mask,
        }
    }
}
