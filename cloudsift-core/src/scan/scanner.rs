use async_trait::async_trait;
use cloudsift_model::ScanResults;

/// Region reported for scanners whose resources are not regional.
pub const GLOBAL_REGION: &str = "global";

/// Region global scanners are executed in.
pub const GLOBAL_SCAN_REGION: &str = "us-east-1";

/// Inputs of a single scanner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub region: String,
    /// Minimum idle period, in days, before a resource is reported.
    pub days_unused: u32,
    pub account_id: String,
}

/// Finds unused resources of one family.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Name used to select the scanner on the command line.
    fn argument_name(&self) -> &str;

    /// Human-readable label, also the key results are grouped under.
    fn label(&self) -> &str;

    /// Global scanners run once per account instead of once per region.
    fn is_global(&self) -> bool {
        false
    }

    async fn scan(&self, options: ScanOptions) -> anyhow::Result<ScanResults>;
}
