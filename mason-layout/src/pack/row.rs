//! Row packer - greedy left-to-right flow.
//!
//! Items are laid out horizontally until the next one would exceed the max
//! row extent, then wrap to a new row. The first item of a row is always
//! placed, even when it is wider than the row: it is clamped to the max and
//! occupies the row alone. That keeps the packer from ever emitting an empty
//! row or looping on an oversized item.

use crate::cancel::{CancelToken, Cancelled};

use super::Row;

/// Inputs that shape a row packing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowParams {
    /// Width available to a row.
    pub max_extent: f32,
    /// Horizontal spacing between items in a row.
    pub item_spacing: f32,
}

/// Pack `items` into rows no wider than `params.max_extent`.
///
/// `extent_of` is usually backed by a [`MeasureCache`](crate::MeasureCache).
/// A zero, negative or NaN max extent means the container has not been
/// measured yet and yields no rows. An infinite max extent packs everything
/// into one row.
pub fn pack_rows<K: Clone>(
    items: &[K],
    mut extent_of: impl FnMut(&K) -> f32,
    params: RowParams,
    cancel: &CancelToken,
) -> Result<Vec<Row<K>>, Cancelled> {
    let max_extent = params.max_extent;
    if items.is_empty() || max_extent.is_nan() || max_extent <= 0.0 {
        return Ok(Vec::new());
    }

    let mut rows: Vec<Row<K>> = Vec::new();

    for key in items {
        cancel.check()?;

        let extent = extent_of(key).min(max_extent);

        // Check if the item fits on the current row
        match rows.last_mut() {
            Some(row) if row.extent + params.item_spacing + extent <= max_extent => {
                row.push(key.clone(), extent, params.item_spacing);
            }
            _ => rows.push(Row::starting_with(key.clone(), extent)),
        }
    }

    tracing::trace!(items = items.len(), rows = rows.len(), max_extent, "packed rows");
    Ok(rows)
}

// =========================================================================
// Tests
// =========================================================================
