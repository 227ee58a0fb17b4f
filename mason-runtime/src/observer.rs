//! Constraint observer - debounces container-extent samples.
//!
//! Hosts may report the container extent on every layout pass. The observer
//! keeps only the newest sample in a single-slot buffer and restarts a quiet
//! timer on every write; the pending value is delivered once the timer runs
//! out without a new sample. A burst of samples therefore produces exactly
//! one delivery, carrying the last value of the burst.
//!
//! Samples carry the layout epoch they were observed in, so the receiver can
//! tell a sample that settled after a newer synchronous layout from a live one.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A container extent, tagged with the layout epoch it was observed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintSample {
    pub extent: f32,
    pub epoch: u64,
}

/// Debounced stream of container extents.
pub struct ConstraintObserver {
    /// Single-slot buffer holding the newest undelivered sample.
    slot: watch::Sender<Option<ConstraintSample>>,

    /// The debounce loop.
    task: JoinHandle<()>,
}

impl ConstraintObserver {
    /// Spawn the debounce loop on `runtime`, delivering settled samples to
    /// `deliver`.
    pub fn spawn<F>(runtime: &Handle, quiet: Duration, deliver: F) -> Self
    where
        F: FnMut(ConstraintSample) + Send + 'static,
    {
        let (slot, samples) = watch::channel(None);
        let task = runtime.spawn(debounce_loop(samples, quiet, deliver));
        Self { slot, task }
    }

    /// Record a new sample, replacing any pending one and restarting the
    /// quiet timer.
    pub fn notify(&self, sample: ConstraintSample) {
        self.slot.send_replace(Some(sample));
    }

    /// Drop the pending sample, if any. The current burst then ends without
    /// a delivery.
    pub fn clear(&self) {
        self.slot.send_replace(None);
    }
}

impl Drop for ConstraintObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop<F>(mut samples: watch::Receiver<Option<ConstraintSample>>, quiet: Duration, mut deliver: F)
where
    F: FnMut(ConstraintSample),
{
    let quiet_ms = u64::try_from(quiet.as_millis()).unwrap_or(u64::MAX);

    // Wait for the first sample of a burst.
    while samples.changed().await.is_ok() {
        let mut pending = *samples.borrow_and_update();

        // Restart the quiet timer on every further sample. Only a value that
        // survived a full quiet interval is delivered; anything written after
        // the timer fired starts the next burst.
        loop {
            tokio::select! {
                changed = samples.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    pending = *samples.borrow_and_update();
                }
                _ = tokio::time::sleep(quiet) => break,
            }
        }

        if let Some(sample) = pending {
            tracing::debug!(extent = sample.extent, epoch = sample.epoch, quiet_ms, "constraint settled");
            deliver(sample);
        }
    }
}
