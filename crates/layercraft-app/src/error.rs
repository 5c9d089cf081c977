//! Application errors.

use layercraft_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid script: {0}")]
    Script(String),
    #[error("No active layer mask to export")]
    NoMask,
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
