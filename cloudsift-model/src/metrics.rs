#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point-in-time view of a worker pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolMetricsSnapshot {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub current_workers: u64,
    pub peak_workers: u64,
    pub average_execution_ms: u64,
    pub total_execution_ms: u64,
}

impl PoolMetricsSnapshot {
    /// Tasks that have finished, successfully or not.
    pub fn finished_tasks(&self) -> u64 {
        self.completed_tasks + self.failed_tasks
    }

    /// Peak concurrency as a percentage of the configured worker count.
    pub fn utilization(&self, max_workers: usize) -> f64 {
        if max_workers == 0 {
            return 0.0;
        }
        self.peak_workers as f64 / max_workers as f64 * 100.0
    }
}
