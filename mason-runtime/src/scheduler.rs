//! Recompute scheduler - single-flight background re-packing.
//!
//! A deferred re-pack runs on tokio's blocking pool so an expensive
//! measurement never stalls the owning context. Only one re-pack is ever
//! live: scheduling a new one cancels the previous one first, and a
//! generation number makes sure a superseded re-pack that raced to the
//! finish line is discarded instead of published.

use mason_layout::{CancelToken, Cancelled, ItemKey, LayoutRequest, SharedCache};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::event::Inbox;

/// The re-pack currently in flight.
struct ActiveRecompute {
    generation: u64,
    cancel: CancelToken,
}

/// Schedules background re-packs for one coordinator.
pub(crate) struct RecomputeScheduler<K> {
    /// Runtime the blocking tasks are spawned on.
    runtime: Handle,

    /// Where finished re-packs are posted.
    inbox: mpsc::UnboundedSender<Inbox<K>>,

    /// The live re-pack, if any.
    active: Option<ActiveRecompute>,

    /// Last generation handed out.
    generation: u64,
}

impl<K: ItemKey> RecomputeScheduler<K> {
    pub(crate) fn new(runtime: Handle, inbox: mpsc::UnboundedSender<Inbox<K>>) -> Self {
        Self {
            runtime,
            inbox,
            active: None,
            generation: 0,
        }
    }

    /// Cancel any live re-pack and start a new one for `request`.
    ///
    /// Returns the generation of the new re-pack.
    pub fn schedule(&mut self, request: LayoutRequest<K>, cache: SharedCache<K>) -> u64 {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelToken::new();

        let task_cancel = cancel.clone();
        let inbox = self.inbox.clone();
        tracing::debug!(generation, items = request.len(), "scheduling deferred re-pack");

        // The JoinHandle is dropped: blocking tasks cannot be aborted, they
        // stop at their next per-item cancellation check instead.
        drop(self.runtime.spawn_blocking(move || {
            recompute(generation, request, cache, task_cancel, inbox);
        }));

        self.active = Some(ActiveRecompute { generation, cancel });
        generation
    }

    /// Cancel the live re-pack, if any. Its result will never be published.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(generation = active.generation, "cancelling deferred re-pack");
            active.cancel.cancel();
        }
    }

    /// Whether a re-pack is in flight (running, or finished but not yet
    /// committed by the owner).
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Retire the re-pack with `generation` if it is still the live one.
    ///
    /// Returns false for superseded or cancelled generations, whose results
    /// must be dropped.
    pub(crate) fn complete(&mut self, generation: u64) -> bool {
        match &self.active {
            Some(active) if active.generation == generation => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}

impl<K> Drop for RecomputeScheduler<K> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

/// Body of one background re-pack.
fn recompute<K: ItemKey>(
    generation: u64,
    request: LayoutRequest<K>,
    cache: SharedCache<K>,
    cancel: CancelToken,
    inbox: mpsc::UnboundedSender<Inbox<K>>,
) {
    let constraint = request.constraint_extent();
    match request.pack(&cache, &cancel) {
        Ok(result) => {
            tracing::trace!(generation, lanes = result.lane_count(), "deferred re-pack finished");
            // The owner may already be gone; nothing to publish to then.
            let _ = inbox.send(Inbox::Finished { generation, constraint, result });
        }
        Err(Cancelled) => {
            tracing::trace!(generation, "deferred re-pack cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mason_layout::{LayoutResult, Measure, MeasureCache};
    use std::sync::Arc;

    fn request(width: f32) -> LayoutRequest<u32> {
        let measure: Measure<u32> = Arc::new(|_: &u32| 40.0);
        LayoutRequest::rows(vec![1u32, 2, 3], measure).constraint(width)
    }

    fn finished(message: Inbox<u32>) -> (u64, f32, LayoutResult<u32>) {
        match message {
            Inbox::Finished { generation, constraint, result } => (generation, constraint, result),
            other => panic!("unexpected inbox message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_schedule_posts_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RecomputeScheduler::new(Handle::current(), tx);

        let generation = scheduler.schedule(request(100.0), MeasureCache::shared());
        assert!(scheduler.is_busy());

        let (posted, constraint, result) = finished(rx.recv().await.unwrap());
        assert_eq!(posted, generation);
        assert_eq!(constraint, 100.0);
        assert_eq!(result.lane_extents(), vec![80.0, 40.0]);

        assert!(scheduler.complete(generation));
        assert!(!scheduler.is_busy());
    }

    #[tokio::test]
    async fn test_new_schedule_supersedes_old() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RecomputeScheduler::new(Handle::current(), tx);
        let cache = MeasureCache::shared();

        let first = scheduler.schedule(request(100.0), cache.clone());
        let second = scheduler.schedule(request(200.0), cache);
        assert!(second > first);

        // Whatever the first pass posted, it can no longer be retired.
        assert!(!scheduler.complete(first));

        loop {
            let (generation, _, _) = finished(rx.recv().await.unwrap());
            if generation == second {
                break;
            }
        }
        assert!(scheduler.complete(second));
    }

    #[tokio::test]
    async fn test_cancel_retires_active() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = RecomputeScheduler::new(Handle::current(), tx);

        let generation = scheduler.schedule(request(100.0), MeasureCache::shared());
        scheduler.cancel();

        assert!(!scheduler.is_busy());
        assert!(!scheduler.complete(generation));

        // Generations keep counting up after a cancel.
        let next = scheduler.schedule(request(100.0), MeasureCache::shared());
        assert_eq!(next, generation + 1);
    }
}
