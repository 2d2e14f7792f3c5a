use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cloudsift_core::model::Account;
use cloudsift_core::pricing::RateLimitConfig;
use cloudsift_core::scan::IgnoreRules;

use crate::validation::{self, ConfigValidationError, ConfigWarnings};

/// Inventory file read when nothing else is configured.
pub const DEFAULT_INVENTORY_FILE: &str = "inventory.json";
pub const DEFAULT_DAYS_UNUSED: u32 = 90;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_workers: usize,
    pub log_level: String,
    pub log_format: LogFormat,
    pub scan: ScanConfig,
    pub output: OutputConfig,
    pub pricing: PricingConfig,
    pub rate_limit: RateLimitSettings,
    pub metadata: ConfigMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            scan: ScanConfig::default(),
            output: OutputConfig::default(),
            pricing: PricingConfig::default(),
            rate_limit: RateLimitSettings::default(),
            metadata: ConfigMetadata::default(),
        }
    }
}

impl Config {
    /// Checks the hard limits and reports questionable settings.
    pub fn validate(&self) -> Result<ConfigWarnings, ConfigValidationError> {
        validation::validate(self)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        self.rate_limit.to_rate_limit_config()
    }
}

/// Eight workers per CPU; scans spend most of their time waiting on I/O.
pub fn default_max_workers() -> usize {
    num_cpus::get().max(1) * 8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Regions to scan; empty means every region present in the inventory.
    pub regions: Vec<String>,
    /// Scanner argument names; empty selects all registered scanners.
    pub scanners: Vec<String>,
    pub days_unused: u32,
    /// Accounts to scan; empty means every account in the inventory.
    pub accounts: Vec<Account>,
    pub inventory: PathBuf,
    pub ignore_resource_ids: Vec<String>,
    pub ignore_resource_names: Vec<String>,
    pub ignore_resource_tags: BTreeMap<String, String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            scanners: Vec::new(),
            days_unused: DEFAULT_DAYS_UNUSED,
            accounts: Vec::new(),
            inventory: PathBuf::from(DEFAULT_INVENTORY_FILE),
            ignore_resource_ids: Vec::new(),
            ignore_resource_names: Vec::new(),
            ignore_resource_tags: BTreeMap::new(),
        }
    }
}

impl ScanConfig {
    pub fn ignore_rules(&self) -> IgnoreRules {
        IgnoreRules::new(
            self.ignore_resource_ids.iter().cloned(),
            self.ignore_resource_names.iter().cloned(),
            self.ignore_resource_tags.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(cloudsift_core::report::DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    pub cache_file: PathBuf,
    /// Price list gateway. Unset means costs cannot be looked up.
    pub endpoint: Option<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(cloudsift_core::pricing::DEFAULT_CACHE_FILE),
            endpoint: None,
        }
    }
}

/// Throttling of price list lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSettings {
    pub requests_per_second: f64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            requests_per_second: defaults.requests_per_second,
            max_retries: defaults.max_retries,
            base_delay_ms: defaults.base_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl RateLimitSettings {
    pub fn to_rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: self.requests_per_second,
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl ConfigMetadata {
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
