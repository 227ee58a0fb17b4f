//! Packing algorithms and their output types.
//!
//! Both packers are pure functions over a snapshot of items and an extent
//! accessor. They never reorder items and never look ahead, so the same input
//! always yields the same lanes.
//!
//! ```text
//! rows:    [a b c] [d] [e f]          (wrap when the next item would overflow)
//! columns: [a d] [b] [c e f]          (append to the shortest column)
//! ```

mod column;
mod row;

pub use column::{ColumnParams, pack_columns};
pub use row::{RowParams, pack_rows};

use serde::Serialize;

use crate::request::Arrangement;

/// An item placed in a row, with its extent clamped to the row width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowItem<K> {
    pub key: K,
    pub extent: f32,
}

/// A horizontal run of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<K> {
    /// Sum of item extents plus the spacing between them.
    pub extent: f32,
    pub items: Vec<RowItem<K>>,
}

impl<K> Row<K> {
    fn starting_with(key: K, extent: f32) -> Self {
        Self {
            extent,
            items: vec![RowItem { key, extent }],
        }
    }

    fn push(&mut self, key: K, extent: f32, spacing: f32) {
        self.extent += spacing + extent;
        self.items.push(RowItem { key, extent });
    }

    /// Number of items in the row.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the row holds no items. Packed rows never are.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item identities in placement order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.items.iter().map(|item| &item.key)
    }
}

/// A vertical stack of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column<K> {
    /// Sum of item extents plus the spacing between them.
    pub extent: f32,
    pub items: Vec<K>,
}

impl<K> Column<K> {
    fn new() -> Self {
        Self {
            extent: 0.0,
            items: Vec::new(),
        }
    }

    fn push(&mut self, key: K, extent: f32, spacing: f32) {
        if !self.items.is_empty() {
            self.extent += spacing;
        }
        self.extent += extent;
        self.items.push(key);
    }

    /// Number of items in the column.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the column holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The retained output of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "lanes", rename_all = "snake_case")]
pub enum LayoutResult<K> {
    Rows(Vec<Row<K>>),
    Columns(Vec<Column<K>>),
}

impl<K> LayoutResult<K> {
    /// An empty result shaped for `arrangement`.
    pub fn empty(arrangement: Arrangement) -> Self {
        match arrangement {
            Arrangement::Rows => Self::Rows(Vec::new()),
            Arrangement::Columns { .. } => Self::Columns(Vec::new()),
        }
    }

    /// Rows, if this is a row layout.
    pub fn rows(&self) -> Option<&[Row<K>]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Columns(_) => None,
        }
    }

    /// Columns, if this is a column layout.
    pub fn columns(&self) -> Option<&[Column<K>]> {
        match self {
            Self::Columns(columns) => Some(columns),
            Self::Rows(_) => None,
        }
    }

    /// Number of lanes (rows or columns).
    pub fn lane_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Columns(columns) => columns.len(),
        }
    }

    /// Aggregate extent of each lane, in lane order.
    pub fn lane_extents(&self) -> Vec<f32> {
        match self {
            Self::Rows(rows) => rows.iter().map(|row| row.extent).collect(),
            Self::Columns(columns) => columns.iter().map(|column| column.extent).collect(),
        }
    }

    /// Total number of placed items.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.iter().map(Row::len).sum(),
            Self::Columns(columns) => columns.iter().map(Column::len).sum(),
        }
    }

    /// Whether no items were placed.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn test_empty_result_matches_arrangement() {
        let rows: LayoutResult<u32> = LayoutResult::empty(Arrangement::Rows);
        assert!(rows.rows().is_some());
        assert!(rows.is_empty());

        let count = NonZeroUsize::new(3).unwrap();
        let columns: LayoutResult<u32> = LayoutResult::empty(Arrangement::Columns { count });
        assert!(columns.columns().is_some());
        assert_eq!(columns.lane_count(), 0);
    }

    #[test]
    fn test_column_spacing_only_between_items() {
        let mut column = Column::new();
        column.push("a", 30.0, 5.0);
        assert_eq!(column.extent, 30.0);
        column.push("b", 10.0, 5.0);
        assert_eq!(column.extent, 45.0);
    }

    #[test]
    fn test_result_serializes_with_kind_tag() {
        let result = LayoutResult::Rows(vec![Row::starting_with("a", 10.0)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "rows");
        assert_eq!(json["lanes"][0]["items"][0]["key"], "a");
    }
}
