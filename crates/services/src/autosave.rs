//! Debounced autosave timer and the save status shown next to a form.
//!
//! The scheduler owns at most one pending timer. Rescheduling aborts the
//! previous timer; a save that has already started runs to completion in its
//! own task.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

pub struct AutosaveScheduler {
    quiet_period: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    #[must_use]
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replaces any pending timer with a new one that calls `fire` once the
    /// quiet period has passed.
    ///
    /// `fire` runs at expiry, not now, so it sees the form as it is when the
    /// user stops typing. Returns `false` when no Tokio runtime is available.
    pub fn schedule<F, Fut>(&self, fire: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime available; autosave skipped");
            return false;
        };

        let quiet_period = self.quiet_period;
        let spawner = handle.clone();
        let timer = handle.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            spawner.spawn(fire());
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
        true
    }

    /// Drops the pending timer, if any. Saves already running are unaffected.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.take() {
            timer.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Visible state of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl SaveStatus {
    #[must_use]
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveStatus::Saving)
    }
}

struct TrackerInner {
    tx: watch::Sender<SaveStatus>,
    generation: AtomicU64,
}

/// Publishes `SaveStatus` changes and reverts `Saved` / `Error` to `Idle`
/// after the display window.
#[derive(Clone)]
pub struct SaveStatusTracker {
    inner: Arc<TrackerInner>,
    display: Duration,
}

impl SaveStatusTracker {
    #[must_use]
    pub fn new(display: Duration) -> Self {
        let (tx, _rx) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(TrackerInner {
                tx,
                generation: AtomicU64::new(0),
            }),
            display,
        }
    }

    #[must_use]
    pub fn current(&self) -> SaveStatus {
        self.inner.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.tx.subscribe()
    }

    pub fn saving(&self) {
        self.transition(SaveStatus::Saving);
    }

    pub fn saved(&self) {
        let generation = self.transition(SaveStatus::Saved);
        self.revert_later(generation);
    }

    pub fn failed(&self, message: impl Into<String>) {
        let generation = self.transition(SaveStatus::Error(message.into()));
        self.revert_later(generation);
    }

    fn transition(&self, status: SaveStatus) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_replace(status);
        generation
    }

    fn revert_later(&self, generation: u64) {
        let Ok(handle) = Handle::try_current() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        let display = self.display;
        handle.spawn(async move {
            tokio::time::sleep(display).await;
            inner.tx.send_if_modified(|status| {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *status = SaveStatus::Idle;
                true
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let read = Arc::clone(&count);
        (count, move || read.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_collapses_to_one_fire() {
        let scheduler = AutosaveScheduler::new(Duration::from_millis(2000));
        let (count, fired) = counter();

        for _ in 0..3 {
            let count = Arc::clone(&count);
            assert!(scheduler.schedule(move || async move {
                count.fetch_add(1, Ordering::SeqCst);
            }));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(scheduler.is_pending());
        assert_eq!(fired(), 0);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(fired(), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let scheduler = AutosaveScheduler::new(Duration::from_millis(100));
        let (count, fired) = counter();
        scheduler.schedule(move || async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired(), 0);
    }

    #[test]
    fn schedule_without_runtime_is_skipped() {
        let scheduler = AutosaveScheduler::new(Duration::from_millis(100));
        assert!(!scheduler.schedule(|| async {}));
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn saved_reverts_to_idle_after_display_window() {
        let tracker = SaveStatusTracker::new(Duration::from_millis(3000));
        let mut rx = tracker.subscribe();

        tracker.saving();
        assert!(tracker.current().is_saving());
        tracker.saved();
        assert_eq!(*rx.borrow_and_update(), SaveStatus::Saved);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(tracker.current(), SaveStatus::Saved);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(tracker.current(), SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_status_is_not_reverted_by_older_timer() {
        let tracker = SaveStatusTracker::new(Duration::from_millis(3000));
        tracker.failed("offline");
        tokio::time::sleep(Duration::from_millis(2000)).await;
        tracker.saving();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(tracker.current(), SaveStatus::Saving);
    }
}
