//! Grid configuration.
//!
//! A grid is configured by its arrangement, two spacing values, an initial
//! container extent and the width tracking mode. Configs are plain JSON:
//!
//! ```json
//! {
//!   "arrangement": { "kind": "columns", "count": 2 },
//!   "line_spacing": 8.0,
//!   "item_spacing": 5.0,
//!   "tracking": { "mode": "debounce", "quiet_ms": 300 }
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults (rows, zero
//! spacing, background tracking).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::policy::TrackingMode;
use crate::request::Arrangement;

/// Configuration surface of one masonry grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub arrangement: Arrangement,
    /// Spacing between rows (or columns).
    pub line_spacing: f32,
    /// Spacing between items within a row (or column).
    pub item_spacing: f32,
    /// Initial container extent.
    pub constraint: f32,
    pub tracking: TrackingMode,
}

impl GridConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), ?config, "loaded grid config");
        Ok(config)
    }

    /// Reject spacing and extents that no packing pass could use.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fields = [
            ("line_spacing", self.line_spacing),
            ("item_spacing", self.item_spacing),
            ("constraint", self.constraint),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
