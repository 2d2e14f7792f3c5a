//! JSON scan reports.
//!
//! Every account gets its own report under
//! `<output_dir>/YYYY/MM/DD/<account_id>/HH-MM-SS.json`; a run summary is
//! written next to the per-account directories of the same day.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cloudsift_model::{AccountScanResult, PoolMetricsSnapshot, ScanResults};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ReportError, Result};
use crate::scan::ScanOutcome;

/// Default directory reports are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Serialize)]
struct AccountReport<'a> {
    generated_at: DateTime<Utc>,
    account_id: &'a str,
    account_name: &'a str,
    resource_count: usize,
    monthly_cost: f64,
    results: &'a BTreeMap<String, ScanResults>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub dropped: usize,
}

/// Totals of one scan run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub generated_at: DateTime<Utc>,
    pub accounts: usize,
    pub resources: usize,
    pub monthly_cost: f64,
    pub elapsed_ms: u64,
    pub tasks: TaskCounts,
    pub pool: PoolMetricsSnapshot,
    pub max_workers: usize,
}

impl ScanSummary {
    pub fn from_outcome(outcome: &ScanOutcome, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            accounts: outcome.results.len(),
            resources: outcome.resource_count(),
            monthly_cost: crate::pricing::calculators::round_cost(outcome.monthly_cost()),
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            tasks: TaskCounts {
                total: outcome.batch.len(),
                completed: outcome.batch.completed(),
                failed: outcome.batch.failed(),
                dropped: outcome.batch.dropped(),
            },
            pool: outcome.metrics,
            max_workers: outcome.max_workers,
        }
    }
}

/// Writes reports below an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn day_dir(&self, at: DateTime<Utc>) -> PathBuf {
        self.output_dir
            .join(at.format("%Y").to_string())
            .join(at.format("%m").to_string())
            .join(at.format("%d").to_string())
    }

    /// Location of the report of `account_id` generated at `at`.
    pub fn account_report_path(&self, account_id: &str, at: DateTime<Utc>) -> PathBuf {
        self.day_dir(at)
            .join(account_id)
            .join(format!("{}.json", at.format("%H-%M-%S")))
    }

    pub fn summary_path(&self, at: DateTime<Utc>) -> PathBuf {
        self.day_dir(at)
            .join(format!("summary-{}.json", at.format("%H-%M-%S")))
    }

    pub async fn write_account(
        &self,
        result: &AccountScanResult,
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let report = AccountReport {
            generated_at: at,
            account_id: &result.account_id,
            account_name: &result.account_name,
            resource_count: result.resource_count(),
            monthly_cost: crate::pricing::calculators::round_cost(result.monthly_cost()),
            results: &result.results,
        };
        let path = self.account_report_path(&result.account_id, at);
        write_json_atomic(&path, &report).await?;
        info!(
            target: "report",
            account_id = %result.account_id,
            resources = report.resource_count,
            path = %path.display(),
            "wrote account report"
        );
        Ok(path)
    }

    pub async fn write_summary(&self, summary: &ScanSummary) -> Result<PathBuf> {
        let path = self.summary_path(summary.generated_at);
        write_json_atomic(&path, summary).await?;
        info!(target: "report", path = %path.display(), "wrote scan summary");
        Ok(path)
    }

    /// Writes one report per account and the run summary. Returns the
    /// written paths, summary last.
    pub async fn write_outcome(&self, outcome: &ScanOutcome, at: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(outcome.results.len() + 1);
        for result in outcome.results.values() {
            written.push(self.write_account(result, at).await?);
        }
        written.push(
            self.write_summary(&ScanSummary::from_outcome(outcome, at))
                .await?,
        );
        Ok(written)
    }
}

async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> std::result::Result<(), ReportError> {
    let encoded = serde_json::to_vec_pretty(value).map_err(ReportError::Encode)?;

    let parent = path.parent().ok_or_else(|| ReportError::NoParent {
        path: path.to_path_buf(),
    })?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!("{file_name}.tmp-{}", Uuid::new_v4().simple()));

    tokio::fs::write(&tmp, &encoded)
        .await
        .map_err(|source| ReportError::Write {
            path: tmp.clone(),
            source,
        })?;
    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(ReportError::Rename {
            from: tmp,
            to: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
