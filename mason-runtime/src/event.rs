//! Messages flowing back to the coordinator's owning context.

use mason_layout::LayoutResult;

use crate::observer::ConstraintSample;

/// Why the retained layout changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeReason {
    /// A background re-pack finished and its result is now retained.
    Recomputed {
        /// Monotonic scheduling generation of the published re-pack.
        generation: u64,
        /// Container extent the re-pack was scheduled with.
        constraint: f32,
    },

    /// Measurements were invalidated; the next render re-packs from scratch.
    Invalidated,
}

/// Work posted to the coordinator's inbox from off-context tasks.
#[derive(Debug)]
pub(crate) enum Inbox<K> {
    /// The constraint observer went quiet with this sample pending.
    Settled(ConstraintSample),

    /// A background re-pack ran to completion.
    Finished {
        generation: u64,
        constraint: f32,
        result: LayoutResult<K>,
    },
}
