use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use cloudsift_model::{Account, AccountScanResult, PoolMetricsSnapshot};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressTracker, spawn_reporter};
use super::scanner::{GLOBAL_REGION, GLOBAL_SCAN_REGION, ScanOptions, Scanner};
use crate::error::{CoreError, Result};
use crate::worker::{BatchReport, Task, WorkerPool};

/// What to scan: every selected scanner runs in every region of every
/// account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub accounts: Vec<Account>,
    pub regions: Vec<String>,
    pub days_unused: u32,
}

/// Results and execution statistics of one scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Per-account results keyed by account id.
    pub results: BTreeMap<String, AccountScanResult>,
    pub batch: BatchReport,
    pub metrics: PoolMetricsSnapshot,
    pub max_workers: usize,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn resource_count(&self) -> usize {
        self.results
            .values()
            .map(AccountScanResult::resource_count)
            .sum()
    }

    pub fn monthly_cost(&self) -> f64 {
        self.results
            .values()
            .map(AccountScanResult::monthly_cost)
            .sum()
    }
}

type SharedResults = Arc<Mutex<BTreeMap<String, AccountScanResult>>>;

/// Fans a [`ScanPlan`] out over a worker pool and collects the results.
#[derive(Debug)]
pub struct Orchestrator {
    pool: Arc<WorkerPool>,
    progress_interval: Duration,
}

impl Orchestrator {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Runs every scanner × region × account combination of `plan`.
    ///
    /// Fails before submitting anything when there is nothing to scan.
    /// Individual task failures never fail the scan; they are counted in the
    /// returned batch report and leave the remaining results intact.
    pub async fn run(&self, scanners: &[Arc<dyn Scanner>], plan: &ScanPlan) -> Result<ScanOutcome> {
        if scanners.is_empty() {
            return Err(CoreError::InvalidConfig("no scanners selected".to_string()));
        }
        if plan.accounts.is_empty() {
            return Err(CoreError::InvalidConfig("no accounts to scan".to_string()));
        }
        if plan.regions.is_empty() && scanners.iter().any(|scanner| !scanner.is_global()) {
            return Err(CoreError::InvalidConfig("no regions to scan".to_string()));
        }

        let results: SharedResults = Arc::new(Mutex::new(
            plan.accounts
                .iter()
                .map(|account| {
                    (
                        account.id.clone(),
                        AccountScanResult::new(&account.id, &account.name),
                    )
                })
                .collect(),
        ));
        let progress = Arc::new(ProgressTracker::new());

        let tasks = self.build_tasks(scanners, plan, &results, &progress);
        info!(
            target: "scan",
            scanners = ?scanners.iter().map(|s| s.label()).collect::<Vec<_>>(),
            accounts = plan.accounts.len(),
            regions = ?plan.regions,
            tasks = tasks.len(),
            "scan started"
        );

        let started = Instant::now();
        let reporter_shutdown = tokio_util::sync::CancellationToken::new();
        let reporter = spawn_reporter(
            Arc::clone(&progress),
            Arc::clone(&self.pool),
            self.progress_interval,
            reporter_shutdown.clone(),
        );

        let batch = self.pool.execute_tasks(tasks).await;

        reporter_shutdown.cancel();
        if let Err(err) = reporter.await {
            warn!(target: "scan", error = %err, "progress reporter exited abnormally");
        }

        let elapsed = started.elapsed();
        let metrics = self.pool.metrics();
        for (index, failure) in batch.failures() {
            warn!(target: "scan", task = index, outcome = ?failure, "scan task did not complete");
        }
        info!(
            target: "scan",
            total = metrics.total_tasks,
            completed = metrics.completed_tasks,
            failed = metrics.failed_tasks,
            peak_workers = metrics.peak_workers,
            average_ms = metrics.average_execution_ms,
            utilization = %format!("{:.1}%", metrics.utilization(self.pool.max_workers())),
            elapsed_ms = elapsed.as_millis() as u64,
            "scan completed"
        );

        let results = std::mem::take(&mut *results.lock().await);
        Ok(ScanOutcome {
            results,
            batch,
            metrics,
            max_workers: self.pool.max_workers(),
            elapsed,
        })
    }

    fn build_tasks(
        &self,
        scanners: &[Arc<dyn Scanner>],
        plan: &ScanPlan,
        results: &SharedResults,
        progress: &Arc<ProgressTracker>,
    ) -> Vec<Task> {
        let global_regions = [GLOBAL_SCAN_REGION.to_string()];
        let mut tasks = Vec::new();

        for scanner in scanners {
            let regions: &[String] = if scanner.is_global() {
                &global_regions
            } else {
                &plan.regions
            };

            for region in regions {
                for account in &plan.accounts {
                    tasks.push(scan_task(
                        Arc::clone(scanner),
                        region.clone(),
                        account.clone(),
                        plan.days_unused,
                        Arc::clone(results),
                        Arc::clone(progress),
                    ));
                }
            }
        }

        tasks
    }
}

fn scan_task(
    scanner: Arc<dyn Scanner>,
    region: String,
    account: Account,
    days_unused: u32,
    results: SharedResults,
    progress: Arc<ProgressTracker>,
) -> Task {
    Task::new(move |token| async move {
        let label = scanner.label().to_string();
        let reported_region = if scanner.is_global() {
            GLOBAL_REGION.to_string()
        } else {
            region.clone()
        };

        info!(
            target: "scan",
            scanner = %label,
            account_id = %account.id,
            account_name = %account.name,
            region = %reported_region,
            "scanner started"
        );
        let guard = progress.start(&account.id, &account.name, &reported_region, &label);

        let options = ScanOptions {
            region,
            days_unused,
            account_id: account.id.clone(),
        };
        let scanned = tokio::select! {
            _ = token.cancelled() => Err(anyhow!("scan cancelled")),
            scanned = scanner.scan(options) => scanned,
        };

        let mut found = match scanned {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    target: "scan",
                    scanner = %label,
                    account_id = %account.id,
                    region = %reported_region,
                    error = %err,
                    "scanner failed"
                );
                return Err(err.context(format!(
                    "{label} scan of account {} in {reported_region} failed",
                    account.id
                )));
            }
        };
        guard.set_result_count(found.len());

        for result in &mut found {
            result.account_id = account.id.clone();
            result.account_name = account.name.clone();
            result
                .details
                .insert("region".to_string(), reported_region.clone());
        }

        info!(
            target: "scan",
            scanner = %label,
            account_id = %account.id,
            region = %reported_region,
            results = found.len(),
            "scanner completed"
        );

        results
            .lock()
            .await
            .entry(account.id.clone())
            .or_insert_with(|| AccountScanResult::new(&account.id, &account.name))
            .attach(&label, found);
        Ok::<(), anyhow::Error>(())
    })
}
