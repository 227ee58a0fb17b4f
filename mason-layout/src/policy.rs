//! Diff policy - decides how a new request is served.
//!
//! Classification is a pure function of the previous request, the new one,
//! and the configured [`TrackingMode`]:
//!
//! ```text
//! items / spacing / arrangement changed  -> Immediate
//! only the constraint changed            -> Immediate | Deferred | Suppressed (per mode)
//! nothing tracked changed                -> NoOp
//! ```
//!
//! Data changes are always immediate so insertions and removals land in the
//! same render pass as the host's appearance transitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::item::ItemKey;
use crate::request::{Arrangement, LayoutRequest};

/// How container-width changes are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrackingMode {
    /// Re-pack synchronously within the render that saw the new width.
    Immediate,
    /// Serve the stale layout and re-pack in the background.
    #[default]
    Background,
    /// Ignore width changes until they settle for `quiet`, then re-pack in
    /// the background.
    Debounce {
        #[serde(rename = "quiet_ms", with = "millis")]
        quiet: Duration,
    },
}

impl TrackingMode {
    /// Debounce with a quiet interval in milliseconds.
    pub fn debounce_ms(quiet_ms: u64) -> Self {
        Self::Debounce {
            quiet: Duration::from_millis(quiet_ms),
        }
    }
}

/// The update a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Reuse the retained result.
    NoOp,
    /// Re-pack before returning.
    Immediate,
    /// Return the retained result and re-pack in the background.
    Deferred,
    /// Return the retained result; a settled constraint will trigger a
    /// deferred re-pack later.
    Suppressed,
}

/// Which tracked fields differ between two requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestDiff {
    pub items: bool,
    pub spacing: bool,
    pub arrangement: bool,
    pub constraint: bool,
}

impl RequestDiff {
    /// Compare two requests field by field. The measurement accessor is not
    /// compared.
    pub fn between<K: ItemKey>(previous: &LayoutRequest<K>, next: &LayoutRequest<K>) -> Self {
        Self {
            items: !previous.same_items(next),
            spacing: previous.spacing() != next.spacing(),
            arrangement: previous.arrangement() != next.arrangement(),
            constraint: previous.constraint_extent() != next.constraint_extent(),
        }
    }

    /// Whether anything besides the constraint changed.
    pub fn is_structural(&self) -> bool {
        self.items || self.spacing || self.arrangement
    }

    pub fn is_empty(&self) -> bool {
        !self.is_structural() && !self.constraint
    }
}

/// Classify `next` against `previous` under `tracking`.
pub fn classify<K: ItemKey>(
    previous: &LayoutRequest<K>,
    next: &LayoutRequest<K>,
    tracking: TrackingMode,
) -> UpdateMode {
    let diff = RequestDiff::between(previous, next);

    if diff.is_structural() {
        return UpdateMode::Immediate;
    }
    if diff.is_empty() {
        return UpdateMode::NoOp;
    }

    // Column assignment never reads the container width.
    if let Arrangement::Columns { .. } = next.arrangement() {
        return UpdateMode::NoOp;
    }

    match tracking {
        TrackingMode::Immediate => UpdateMode::Immediate,
        TrackingMode::Background => UpdateMode::Deferred,
        TrackingMode::Debounce { .. } => UpdateMode::Suppressed,
    }
}

/// Serde adapter for a `Duration` stored as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
