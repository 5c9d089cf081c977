//! LayerCraft Application
//!
//! Headless host for the LayerCraft engine: replays scripted editing
//! sessions and exports the resulting mask.

mod error;
mod export;
mod session;

pub use error::{AppError, AppResult};
pub use export::{encode_png, write_png};
pub use session::{BrushSpec, LayerSpec, MaskSummary, Script, ScriptEvent, Session, SessionHost, SessionSummary};
