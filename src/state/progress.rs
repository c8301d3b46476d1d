use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// A snapshot of batch progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Records completed so far (success, not-found, or error alike).
    pub current: usize,
    /// Total records in the batch.
    pub total: usize,
}

/// Tracks batch progress and broadcasts snapshots to subscribers.
///
/// Workers race to report completions, so snapshots are published with a
/// max-guard: an observer never sees `current` decrease even when update
/// messages arrive out of order.
pub struct ProgressTracker {
    current: AtomicUsize,
    total: AtomicUsize,
    tx: watch::Sender<ProgressState>,
    // Kept so broadcasts succeed even with no external subscribers
    _rx: watch::Receiver<ProgressState>,
}

impl ProgressTracker {
    /// Creates a tracker for a batch of `total` records.
    pub fn new(total: usize) -> Self {
        let (tx, rx) = watch::channel(ProgressState { current: 0, total });
        Self {
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
            tx,
            _rx: rx,
        }
    }

    /// Subscribes to progress snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    /// Sets the batch size once it is known and publishes it.
    ///
    /// Called by the coordinator at batch start, before any completions.
    pub fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.tx.send_modify(|state| {
            state.total = total;
        });
    }

    /// Records one completed record and publishes the new snapshot.
    ///
    /// Returns the snapshot as this completion observed it.
    pub fn record_completed(&self) -> ProgressState {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = ProgressState {
            current,
            total: self.total.load(Ordering::SeqCst),
        };
        self.tx.send_modify(|state| {
            if current > state.current {
                state.current = current;
            }
        });
        snapshot
    }

    /// Current progress without subscribing.
    pub fn snapshot(&self) -> ProgressState {
        ProgressState {
            current: self.current.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        }
    }
}
