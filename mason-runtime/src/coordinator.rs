//! Coordinator - the owned layout state of one data set.
//!
//! The host calls [`Coordinator::on_render`] on every render and gets a
//! layout back synchronously. Depending on what changed since the previous
//! render, that layout is the retained one, a fresh synchronous re-pack, or
//! the retained one while a re-pack runs in the background.
//!
//! Background work never touches the retained result directly. It posts to
//! the coordinator's inbox, and the owner commits it by draining the inbox
//! with [`pump`](Coordinator::pump) or [`next_change`](Coordinator::next_change).
//! Commits therefore happen in order, on the owner's context, and a result
//! is either fully swapped in or not at all.

use std::sync::Arc;

use mason_layout::{
    CancelToken, ItemKey, LayoutRequest, LayoutResult, MeasureCache, SharedCache, TrackingMode, UpdateMode,
    classify, lock_cache,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::RuntimeError;
use crate::event::{ChangeReason, Inbox};
use crate::observer::{ConstraintObserver, ConstraintSample};
use crate::scheduler::RecomputeScheduler;

/// Callback invoked whenever the retained layout changes.
type ChangeListener = Box<dyn FnMut(ChangeReason) + Send>;

/// Incremental layout state for one data set.
pub struct Coordinator<K: ItemKey> {
    /// How container-width changes are handled.
    tracking: TrackingMode,

    /// Runtime for background re-packs and the observer.
    runtime: Handle,

    /// Item measurements, shared with the background re-pack.
    cache: SharedCache<K>,

    /// The most recent non-degenerate request.
    last_request: Option<LayoutRequest<K>>,

    /// The retained layout.
    result: Option<Arc<LayoutResult<K>>>,

    /// Set by invalidation; forces the next render to re-pack synchronously.
    needs_full_layout: bool,

    /// Bumped by every synchronous re-pack, invalidation and mode switch.
    /// Constraint samples observed under an older epoch are stale.
    epoch: u64,

    scheduler: RecomputeScheduler<K>,

    /// Present only in debounce mode.
    observer: Option<ConstraintObserver>,

    inbox_tx: mpsc::UnboundedSender<Inbox<K>>,
    inbox_rx: mpsc::UnboundedReceiver<Inbox<K>>,

    listener: Option<ChangeListener>,
}

impl<K: ItemKey> Coordinator<K> {
    /// Create a coordinator bound to the current tokio runtime.
    pub fn new(tracking: TrackingMode) -> Result<Self, RuntimeError> {
        Ok(Self::with_runtime(Handle::try_current()?, tracking))
    }

    /// Create a coordinator bound to an explicit runtime.
    pub fn with_runtime(runtime: Handle, tracking: TrackingMode) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let scheduler = RecomputeScheduler::new(runtime.clone(), inbox_tx.clone());

        let mut coordinator = Self {
            tracking,
            runtime,
            cache: MeasureCache::shared(),
            last_request: None,
            result: None,
            needs_full_layout: false,
            epoch: 0,
            scheduler,
            observer: None,
            inbox_tx,
            inbox_rx,
            listener: None,
        };
        coordinator.observer = coordinator.observer_for(tracking);
        coordinator
    }

    /// Register the result-changed sink, replacing any previous one.
    pub fn on_result_changed(&mut self, listener: impl FnMut(ChangeReason) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Switch how container-width changes are tracked.
    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        if mode == self.tracking {
            return;
        }
        tracing::debug!(?mode, "tracking mode changed");
        self.tracking = mode;
        self.epoch += 1;
        self.observer = self.observer_for(mode);
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracking
    }

    /// Serve a render.
    ///
    /// Never blocks on background work and never fails; degenerate requests
    /// (no items, or rows in a zero-width container) produce an empty layout.
    pub fn on_render(&mut self, request: LayoutRequest<K>) -> Arc<LayoutResult<K>> {
        if request.is_degenerate() {
            return Arc::new(LayoutResult::empty(request.arrangement()));
        }

        let mode = match (&self.last_request, &self.result) {
            (Some(previous), Some(_)) if !self.needs_full_layout => classify(previous, &request, self.tracking),
            _ => UpdateMode::Immediate,
        };
        tracing::debug!(?mode, items = request.len(), constraint = request.constraint_extent(), "render");

        let result = match mode {
            UpdateMode::Immediate => self.repack_now(&request),
            UpdateMode::Deferred => {
                self.scheduler.schedule(request.clone(), Arc::clone(&self.cache));
                self.retained(&request)
            }
            UpdateMode::Suppressed => {
                self.observe_constraint(request.constraint_extent());
                self.retained(&request)
            }
            UpdateMode::NoOp => self.retained(&request),
        };

        self.last_request = Some(request);
        result
    }

    /// Feed a container-extent sample to the debounce observer.
    ///
    /// Ignored unless the tracking mode is [`TrackingMode::Debounce`].
    pub fn observe_constraint(&self, extent: f32) {
        if let Some(observer) = &self.observer {
            observer.notify(ConstraintSample { extent, epoch: self.epoch });
        }
    }

    /// Global invalidation: drop every measurement.
    ///
    /// Cancels any background re-pack and makes the next render re-pack
    /// synchronously with fresh measurements.
    pub fn invalidate_measurements(&mut self) {
        self.scheduler.cancel();
        self.supersede_samples();
        lock_cache(&self.cache).invalidate_all();
        self.needs_full_layout = true;
        self.notify(ChangeReason::Invalidated);
    }

    /// Commit everything the inbox holds without waiting.
    ///
    /// Returns true if the retained layout changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.inbox_rx.try_recv() {
            changed |= self.handle(message).is_some();
        }
        changed
    }

    /// Wait until background work changes the retained layout.
    pub async fn next_change(&mut self) -> Option<ChangeReason> {
        loop {
            let message = self.inbox_rx.recv().await?;
            if let Some(reason) = self.handle(message) {
                return Some(reason);
            }
        }
    }

    /// The retained layout, if any render has produced one.
    pub fn result(&self) -> Option<Arc<LayoutResult<K>>> {
        self.result.clone()
    }

    pub fn last_request(&self) -> Option<&LayoutRequest<K>> {
        self.last_request.as_ref()
    }

    /// Whether a background re-pack is in flight.
    pub fn is_recomputing(&self) -> bool {
        self.scheduler.is_busy()
    }

    /// Number of cached measurements.
    pub fn cache_len(&self) -> usize {
        lock_cache(&self.cache).len()
    }

    /// Re-pack synchronously and retain the result.
    fn repack_now(&mut self, request: &LayoutRequest<K>) -> Arc<LayoutResult<K>> {
        // Any background pass or pending width sample is for an older request.
        self.scheduler.cancel();
        self.supersede_samples();
        self.needs_full_layout = false;

        let result = request
            .pack(&self.cache, &CancelToken::new())
            .unwrap_or_else(|_| LayoutResult::empty(request.arrangement()));
        let result = Arc::new(result);
        self.result = Some(Arc::clone(&result));
        result
    }

    /// Start a new epoch, so samples observed before now are never applied.
    fn supersede_samples(&mut self) {
        self.epoch += 1;
        if let Some(observer) = &self.observer {
            observer.clear();
        }
    }

    /// Spawn the debounce observer when `mode` needs one.
    fn observer_for(&self, mode: TrackingMode) -> Option<ConstraintObserver> {
        let TrackingMode::Debounce { quiet } = mode else {
            return None;
        };
        let inbox = self.inbox_tx.clone();
        Some(ConstraintObserver::spawn(&self.runtime, quiet, move |sample| {
            let _ = inbox.send(Inbox::Settled(sample));
        }))
    }

    fn retained(&self, request: &LayoutRequest<K>) -> Arc<LayoutResult<K>> {
        self.result
            .clone()
            .unwrap_or_else(|| Arc::new(LayoutResult::empty(request.arrangement())))
    }

    fn handle(&mut self, message: Inbox<K>) -> Option<ChangeReason> {
        match message {
            Inbox::Settled(sample) => {
                if sample.epoch != self.epoch {
                    tracing::trace!(extent = sample.extent, epoch = sample.epoch, "dropping stale constraint sample");
                    return None;
                }
                let request = self.last_request.as_ref()?.with_constraint(sample.extent);
                if request.is_degenerate() {
                    return None;
                }
                self.scheduler.schedule(request.clone(), Arc::clone(&self.cache));
                self.last_request = Some(request);
                None
            }
            Inbox::Finished { generation, constraint, result } => {
                if !self.scheduler.complete(generation) {
                    tracing::trace!(generation, "dropping superseded re-pack");
                    return None;
                }
                self.result = Some(Arc::new(result));
                let reason = ChangeReason::Recomputed { generation, constraint };
                self.notify(reason);
                Some(reason)
            }
        }
    }

    fn notify(&mut self, reason: ChangeReason) {
        tracing::debug!(?reason, "layout changed");
        if let Some(listener) = self.listener.as_mut() {
            listener(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mason_layout::Measure;

    fn request(items: &[u32], width: f32) -> LayoutRequest<u32> {
        let measure: Measure<u32> = Arc::new(|_: &u32| 50.0);
        LayoutRequest::rows(items.to_vec(), measure).item_spacing(8.0).constraint(width)
    }

    #[tokio::test]
    async fn test_first_render_is_synchronous() {
        let mut coordinator = Coordinator::new(TrackingMode::Background).unwrap();
        let result = coordinator.on_render(request(&[0, 1, 2], 120.0));

        assert_eq!(result.lane_extents(), vec![108.0, 50.0]);
        assert!(!coordinator.is_recomputing());
        assert_eq!(coordinator.cache_len(), 3);
    }

    #[tokio::test]
    async fn test_degenerate_render_keeps_history() {
        let mut coordinator = Coordinator::new(TrackingMode::Background).unwrap();
        coordinator.on_render(request(&[0, 1], 200.0));

        assert!(coordinator.on_render(request(&[0, 1], 0.0)).is_empty());
        assert!(coordinator.on_render(request(&[], 200.0)).is_empty());
        assert_eq!(coordinator.last_request().unwrap().constraint_extent(), 200.0);
    }

    #[tokio::test]
    async fn test_noop_returns_same_arc() {
        let mut coordinator = Coordinator::new(TrackingMode::Background).unwrap();
        let first = coordinator.on_render(request(&[0, 1], 200.0));
        let second = coordinator.on_render(request(&[0, 1], 200.0));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_new_without_runtime_fails() {
        let err = Coordinator::<u32>::new(TrackingMode::Immediate).err().unwrap();
        assert!(matches!(err, RuntimeError::NoRuntime(_)));
    }

    #[tokio::test]
    async fn test_set_tracking_mode_manages_observer() {
        let mut coordinator = Coordinator::<u32>::new(TrackingMode::Background).unwrap();
        assert!(coordinator.observer.is_none());

        coordinator.set_tracking_mode(TrackingMode::debounce_ms(50));
        assert!(coordinator.observer.is_some());
        assert_eq!(coordinator.tracking_mode(), TrackingMode::debounce_ms(50));

        coordinator.set_tracking_mode(TrackingMode::Immediate);
        assert!(coordinator.observer.is_none());
    }
}
