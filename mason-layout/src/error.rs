//! Layout error types.
//!
//! Packing itself never fails; these cover loading and validating the
//! configuration around it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
