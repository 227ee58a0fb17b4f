//! Layout requests - one immutable snapshot per render.
//!
//! A request captures everything a packing pass depends on. The coordinator
//! compares each new request with the previous one (see [`crate::policy`])
//! to decide whether the retained result can be reused.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{SharedCache, lock_cache};
use crate::cancel::{CancelToken, Cancelled};
use crate::config::GridConfig;
use crate::item::{ItemKey, Measure};
use crate::pack::{ColumnParams, LayoutResult, RowParams, pack_columns, pack_rows};

/// How items are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Arrangement {
    /// Width-constrained rows; the row count falls out of packing.
    #[default]
    Rows,
    /// A fixed number of height-balanced columns.
    Columns { count: NonZeroUsize },
}

/// A snapshot of one layout request.
///
/// Built with [`rows`](Self::rows) or [`columns`](Self::columns) and the
/// builder methods. The measurement accessor is carried along but takes no
/// part in comparisons.
pub struct LayoutRequest<K> {
    items: Arc<[K]>,
    line_spacing: f32,
    item_spacing: f32,
    constraint: f32,
    arrangement: Arrangement,
    measure: Measure<K>,
}

impl<K> Clone for LayoutRequest<K> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            line_spacing: self.line_spacing,
            item_spacing: self.item_spacing,
            constraint: self.constraint,
            arrangement: self.arrangement,
            measure: Arc::clone(&self.measure),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for LayoutRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRequest")
            .field("items", &self.items)
            .field("line_spacing", &self.line_spacing)
            .field("item_spacing", &self.item_spacing)
            .field("constraint", &self.constraint)
            .field("arrangement", &self.arrangement)
            .finish_non_exhaustive()
    }
}

impl<K: ItemKey> LayoutRequest<K> {
    /// Create a request with an explicit arrangement and zeroed spacing.
    pub fn new(items: impl Into<Arc<[K]>>, arrangement: Arrangement, measure: Measure<K>) -> Self {
        Self {
            items: items.into(),
            line_spacing: 0.0,
            item_spacing: 0.0,
            constraint: 0.0,
            arrangement,
            measure,
        }
    }

    /// Create a row-flow request.
    pub fn rows(items: impl Into<Arc<[K]>>, measure: Measure<K>) -> Self {
        Self::new(items, Arrangement::Rows, measure)
    }

    /// Create a balanced-column request.
    pub fn columns(items: impl Into<Arc<[K]>>, count: NonZeroUsize, measure: Measure<K>) -> Self {
        Self::new(items, Arrangement::Columns { count }, measure)
    }

    /// Create a request shaped by a loaded [`GridConfig`].
    pub fn from_config(items: impl Into<Arc<[K]>>, config: &GridConfig, measure: Measure<K>) -> Self {
        Self::new(items, config.arrangement, measure)
            .line_spacing(config.line_spacing)
            .item_spacing(config.item_spacing)
            .constraint(config.constraint)
    }

    /// Set spacing between lanes (rows, or columns).
    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Set spacing between items within a lane.
    pub fn item_spacing(mut self, spacing: f32) -> Self {
        self.item_spacing = spacing;
        self
    }

    /// Set the container extent (width for rows).
    pub fn constraint(mut self, extent: f32) -> Self {
        self.constraint = extent;
        self
    }

    /// A copy of this request with a different container extent.
    pub fn with_constraint(&self, extent: f32) -> Self {
        self.clone().constraint(extent)
    }

    pub fn items(&self) -> &[K] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Spacing as `(between lanes, between items)`.
    pub fn spacing(&self) -> (f32, f32) {
        (self.line_spacing, self.item_spacing)
    }

    pub fn constraint_extent(&self) -> f32 {
        self.constraint
    }

    pub fn arrangement(&self) -> Arrangement {
        self.arrangement
    }

    /// Whether this request can only produce an empty layout.
    ///
    /// True for an empty item set, and for rows whose container has not been
    /// measured yet (zero or NaN width). An infinite width is unbounded, not
    /// unmeasured.
    pub fn is_degenerate(&self) -> bool {
        let unmeasured = self.constraint.is_nan() || self.constraint <= 0.0;
        self.items.is_empty() || (self.arrangement == Arrangement::Rows && unmeasured)
    }

    /// Whether both requests carry the same item identities in the same order.
    pub fn same_items(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items) || self.items[..] == other.items[..]
    }

    /// Run the packing pass this request describes.
    ///
    /// Extents come from `cache`, measuring misses through the request's
    /// accessor. Returns [`Cancelled`] as soon as `cancel` fires; nothing
    /// partial is ever returned.
    pub fn pack(&self, cache: &SharedCache<K>, cancel: &CancelToken) -> Result<LayoutResult<K>, Cancelled> {
        let measure = &*self.measure;
        let extent_of = |key: &K| lock_cache(cache).get_or_measure(key, |key| measure(key));

        match self.arrangement {
            Arrangement::Rows => {
                let params = RowParams {
                    max_extent: self.constraint,
                    item_spacing: self.item_spacing,
                };
                pack_rows(&self.items, extent_of, params, cancel).map(LayoutResult::Rows)
            }
            Arrangement::Columns { count } => {
                let params = ColumnParams {
                    count,
                    item_spacing: self.item_spacing,
                };
                pack_columns(&self.items, extent_of, params, cancel).map(LayoutResult::Columns)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MeasureCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed(extent: f32) -> Measure<u32> {
        Arc::new(move |_: &u32| extent)
    }

    #[test]
    fn test_builder_sets_fields() {
        let request = LayoutRequest::rows(vec![1u32, 2, 3], fixed(10.0))
            .line_spacing(4.0)
            .item_spacing(2.0)
            .constraint(300.0);

        assert_eq!(request.len(), 3);
        assert_eq!(request.spacing(), (4.0, 2.0));
        assert_eq!(request.constraint_extent(), 300.0);
        assert_eq!(request.arrangement(), Arrangement::Rows);
    }

    #[test]
    fn test_degenerate_requests() {
        assert!(LayoutRequest::rows(Vec::<u32>::new(), fixed(1.0)).constraint(100.0).is_degenerate());
        assert!(LayoutRequest::rows(vec![1u32], fixed(1.0)).is_degenerate());
        assert!(LayoutRequest::rows(vec![1u32], fixed(1.0)).constraint(f32::NAN).is_degenerate());
        assert!(!LayoutRequest::rows(vec![1u32], fixed(1.0)).constraint(f32::INFINITY).is_degenerate());

        // Columns do not depend on the container width.
        let count = NonZeroUsize::new(2).unwrap();
        assert!(!LayoutRequest::columns(vec![1u32], count, fixed(1.0)).is_degenerate());
    }

    #[test]
    fn test_with_constraint_shares_items() {
        let request = LayoutRequest::rows(vec![1u32, 2], fixed(1.0)).constraint(100.0);
        let wider = request.with_constraint(200.0);

        assert_eq!(wider.constraint_extent(), 200.0);
        assert!(request.same_items(&wider));
        assert_eq!(request.constraint_extent(), 100.0);
    }

    #[test]
    fn test_pack_measures_through_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let measure: Measure<u32> = Arc::new(move |key: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            *key as f32 * 10.0
        });

        let cache = MeasureCache::shared();
        let request = LayoutRequest::rows(vec![1u32, 2, 3], measure).item_spacing(5.0).constraint(50.0);

        let first = request.pack(&cache, &CancelToken::new()).unwrap();
        let second = request.with_constraint(80.0).pack(&cache, &CancelToken::new()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(first.lane_extents(), vec![35.0, 30.0]);
        // 10 + 5 + 20 + 5 + 30 = 70 fits the wider container.
        assert_eq!(second.lane_extents(), vec![70.0]);
        assert_eq!(lock_cache(&cache).len(), 3);
    }

    #[test]
    fn test_pack_columns_from_config() {
        let config = GridConfig {
            arrangement: Arrangement::Columns { count: NonZeroUsize::new(2).unwrap() },
            item_spacing: 5.0,
            ..GridConfig::default()
        };
        let heights = [30.0, 10.0, 10.0, 10.0];
        let measure: Measure<usize> = Arc::new(move |index: &usize| heights[*index]);

        let request = LayoutRequest::from_config(vec![0usize, 1, 2, 3], &config, measure);
        let result = request.pack(&MeasureCache::shared(), &CancelToken::new()).unwrap();

        assert_eq!(result.lane_extents(), vec![30.0, 40.0]);
    }

    #[test]
    fn test_debug_omits_measure() {
        let request = LayoutRequest::rows(vec![7u32], fixed(1.0));
        let text = format!("{request:?}");
        assert!(text.contains("items: [7]"));
        assert!(!text.contains("measure"));
    }
}
