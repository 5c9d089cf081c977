//! Engine configuration.

use crate::crop::MIN_CROP_SIZE;
use crate::handles::HANDLE_SIZE;
use crate::layer::MIN_LAYER_WIDTH;
use crate::viewport::{FIT_MARGIN, MAX_SCALE, MIN_SCALE, ZOOM_STEP};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of mask snapshots kept for undo.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid zoom range: {min}..{max}")]
    ZoomRange { min: f64, max: f64 },
    #[error("Zoom step must be greater than 1, got {0}")]
    ZoomStep(f64),
    #[error("Fit margin must be in (0, 1], got {0}")]
    FitMargin(f64),
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("History limit must be at least 1")]
    HistoryLimit,
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunable limits for the engine. Defaults match the interactive editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Factor applied per wheel notch.
    pub zoom_step: f64,
    /// Fraction of the container used by `center_view`.
    pub fit_margin: f64,
    /// Minimum on-canvas layer width while scaling.
    pub min_layer_width: f64,
    /// Minimum crop box width and height.
    pub min_crop_size: f64,
    /// Handle hitbox half-size in screen pixels.
    pub handle_size: f64,
    /// Maximum number of mask snapshots, including the current one.
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            zoom_step: ZOOM_STEP,
            fit_margin: FIT_MARGIN,
            min_layer_width: MIN_LAYER_WIDTH,
            min_crop_size: MIN_CROP_SIZE,
            handle_size: HANDLE_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ConfigError::ZoomRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        if !(self.zoom_step > 1.0) {
            return Err(ConfigError::ZoomStep(self.zoom_step));
        }
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            return Err(ConfigError::FitMargin(self.fit_margin));
        }
        for (name, value) in [
            ("min_layer_width", self.min_layer_width),
            ("min_crop_size", self.min_crop_size),
            ("handle_size", self.handle_size),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if self.history_limit == 0 {
            return Err(ConfigError::HistoryLimit);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
