//! Item lists read from JSON.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use mason_layout::{GridConfig, LayoutRequest, Measure};
use serde::Deserialize;

/// One entry of an item list file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSpec {
    pub id: String,
    pub extent: f32,
}

/// Items in display order, plus the extent table the measure accessor reads.
#[derive(Debug)]
pub struct ItemSet {
    ids: Vec<String>,
    extents: Arc<HashMap<String, f32>>,
}

impl ItemSet {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read items from {}", path.display()))?;
        let specs: Vec<ItemSpec> =
            serde_json::from_str(&json).with_context(|| format!("Invalid item list in {}", path.display()))?;
        Self::from_specs(specs)
    }

    /// Item ids are measurement-cache keys, so they must be unique.
    pub fn from_specs(specs: Vec<ItemSpec>) -> Result<Self> {
        let mut ids = Vec::with_capacity(specs.len());
        let mut extents = HashMap::with_capacity(specs.len());
        for spec in specs {
            if extents.insert(spec.id.clone(), spec.extent).is_some() {
                bail!("Duplicate item id '{}'", spec.id);
            }
            ids.push(spec.id);
        }
        tracing::debug!(items = ids.len(), "loaded item list");
        Ok(Self { ids, extents: Arc::new(extents) })
    }

    /// A request over every item, shaped by `config`.
    pub fn request(&self, config: &GridConfig) -> LayoutRequest<String> {
        let extents = Arc::clone(&self.extents);
        let measure: Measure<String> = Arc::new(move |id: &String| extents.get(id).copied().unwrap_or(0.0));
        LayoutRequest::from_config(self.ids.clone(), config, measure)
    }
}
