use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::worker::WorkerPool;

/// Interval between progress reports of a running scan.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// A scanner invocation that has started and not yet finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerProgress {
    pub account_id: String,
    pub account_name: String,
    pub region: String,
    pub scanner: String,
    pub started_at: Instant,
    pub result_count: usize,
}

/// In-flight scanner invocations keyed by `account:region:scanner`.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    running: Mutex<BTreeMap<String, ScannerProgress>>,
}

fn progress_key(account_id: &str, region: &str, scanner: &str) -> String {
    format!("{account_id}:{region}:{scanner}")
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scanner start. The returned guard removes the entry when
    /// dropped.
    pub fn start(
        self: &Arc<Self>,
        account_id: &str,
        account_name: &str,
        region: &str,
        scanner: &str,
    ) -> ProgressGuard {
        let key = progress_key(account_id, region, scanner);
        self.lock().insert(
            key.clone(),
            ScannerProgress {
                account_id: account_id.to_string(),
                account_name: account_name.to_string(),
                region: region.to_string(),
                scanner: scanner.to_string(),
                started_at: Instant::now(),
                result_count: 0,
            },
        );
        ProgressGuard {
            tracker: Arc::clone(self),
            key,
        }
    }

    /// Running scanners ordered by account id, then scanner label.
    pub fn running(&self) -> Vec<ScannerProgress> {
        let mut running: Vec<_> = self.lock().values().cloned().collect();
        running.sort_by(|a, b| {
            a.account_id
                .cmp(&b.account_id)
                .then_with(|| a.scanner.cmp(&b.scanner))
        });
        running
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ScannerProgress>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Keeps a scanner listed as running for as long as it lives.
#[derive(Debug)]
pub struct ProgressGuard {
    tracker: Arc<ProgressTracker>,
    key: String,
}

impl ProgressGuard {
    pub fn set_result_count(&self, count: usize) {
        if let Some(progress) = self.tracker.lock().get_mut(&self.key) {
            progress.result_count = count;
        }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.key);
    }
}

/// Logs running scanners and pool statistics every `every` until `shutdown`
/// is cancelled.
pub fn spawn_reporter(
    tracker: Arc<ProgressTracker>,
    pool: Arc<WorkerPool>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => report(&tracker, &pool),
            }
        }
    })
}

fn report(tracker: &ProgressTracker, pool: &WorkerPool) {
    let running = tracker.running();
    if running.is_empty() {
        return;
    }

    let metrics = pool.metrics();
    let max_workers = pool.max_workers() as u64;
    let active = metrics.current_workers;
    info!(
        target: "scan::progress",
        active,
        idle = max_workers.saturating_sub(active),
        total = max_workers,
        utilization = active * 100 / max_workers.max(1),
        "pending scanners"
    );

    for progress in &running {
        info!(
            target: "scan::progress",
            scanner = %progress.scanner,
            account_id = %progress.account_id,
            account_name = %progress.account_name,
            region = %progress.region,
            results = progress.result_count,
            running_secs = progress.started_at.elapsed().as_secs(),
            "scanner running"
        );
    }

    if metrics.completed_tasks > 0 {
        let seconds = (metrics.total_execution_ms as f64 / 1000.0).max(f64::EPSILON);
        info!(
            target: "scan::progress",
            completed = metrics.completed_tasks,
            failed = metrics.failed_tasks,
            tasks_per_sec = %format!("{:.1}", metrics.completed_tasks as f64 / seconds),
            avg_secs = %format!("{:.1}", metrics.average_execution_ms as f64 / 1000.0),
            "pool stats"
        );
    }
}
