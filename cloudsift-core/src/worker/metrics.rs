use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use cloudsift_model::PoolMetricsSnapshot;

/// Live counters of a worker pool.
///
/// Independent counters are plain atomics. The execution-time total lives
/// behind a mutex that is also held while the success/failure counters are
/// bumped, so a snapshot always sees an average consistent with
/// `completed_tasks`.
#[derive(Debug, Default)]
pub(crate) struct PoolMetrics {
    total_tasks: AtomicU64,
    completed_tasks: AtomicU64,
    failed_tasks: AtomicU64,
    active_workers: AtomicU64,
    peak_workers: AtomicU64,
    total_execution_ms: Mutex<u64>,
}

impl PoolMetrics {
    pub(crate) fn record_submitted(&self) {
        self.total_tasks.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks a worker as busy and returns the resulting active count.
    pub(crate) fn worker_started(&self) -> u64 {
        let active = self.active_workers.fetch_add(1, Ordering::SeqCst) + 1;
        self.raise_peak(active);
        active
    }

    pub(crate) fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    fn raise_peak(&self, active: u64) {
        let mut peak = self.peak_workers.load(Ordering::SeqCst);
        while active > peak {
            match self.peak_workers.compare_exchange_weak(
                peak,
                active,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
    }

    pub(crate) fn record_finished(&self, elapsed: Duration, success: bool) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut total = self
            .total_execution_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *total = total.saturating_add(elapsed_ms);
        if success {
            self.completed_tasks.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed_tasks.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn snapshot(&self) -> PoolMetricsSnapshot {
        let total = self
            .total_execution_ms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let completed = self.completed_tasks.load(Ordering::SeqCst);

        PoolMetricsSnapshot {
            total_tasks: self.total_tasks.load(Ordering::SeqCst),
            completed_tasks: completed,
            failed_tasks: self.failed_tasks.load(Ordering::SeqCst),
            current_workers: self.active_workers.load(Ordering::SeqCst),
            peak_workers: self.peak_workers.load(Ordering::SeqCst),
            average_execution_ms: *total / completed.max(1),
            total_execution_ms: *total,
        }
    }
}
