//! Item identities and the measurement accessor.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// A stable item identity.
///
/// Used both as the measurement cache key and to detect changes in the
/// data set between two requests. Blanket-implemented for every type that
/// satisfies the bounds, so `String`, `u64` or a small newtype all work.
pub trait ItemKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ItemKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Host-supplied measurement accessor: item -> extent on the layout axis.
///
/// Assumed pure and synchronous. It may be expensive, which is why results
/// are memoized per identity in [`MeasureCache`](crate::MeasureCache).
pub type Measure<K> = Arc<dyn Fn(&K) -> f32 + Send + Sync>;

/// Clamp a raw measurement into a usable extent.
///
/// NaN, infinite and negative measurements collapse to zero so a single bad
/// item cannot poison the aggregate extents of its row or column.
pub(crate) fn sanitize_extent<K: Debug>(key: &K, raw: f32) -> f32 {
    if raw.is_finite() && raw >= 0.0 {
        raw
    } else {
        tracing::warn!(?key, raw, "measurement is not a finite non-negative extent, using 0");
        0.0
    }
}
