use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    #[serde(default)]
    pub scan: FileScanConfig,
    #[serde(default)]
    pub output: FileOutputConfig,
    #[serde(default)]
    pub pricing: FilePricingConfig,
    #[serde(default)]
    pub rate_limit: FileRateLimitConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileScanConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanners: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_unused: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<FileAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_resource_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_resource_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ignore_resource_tags: BTreeMap<String, String>,
}

/// An account entry; the name defaults to the id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileOutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePricingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRateLimitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

/// Values taken from `CLOUDSIFT_*` environment variables.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub max_workers: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub scan_regions: Option<Vec<String>>,
    pub scan_scanners: Option<Vec<String>>,
    pub scan_days_unused: Option<u32>,
    pub scan_inventory: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub price_cache: Option<PathBuf>,
    pub pricing_endpoint: Option<String>,
    /// Variables that were set but could not be parsed, as `(name, value)`.
    pub unparsed: Vec<(String, String)>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the environment view from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = Self::default();

        env_config.config_path = lookup("CLOUDSIFT_CONFIG").map(PathBuf::from);
        env_config.max_workers = env_config.parse_var(&lookup, "CLOUDSIFT_MAX_WORKERS");
        env_config.log_level = non_empty(lookup("CLOUDSIFT_LOG_LEVEL"));
        env_config.log_format = non_empty(lookup("CLOUDSIFT_LOG_FORMAT"));
        env_config.scan_regions = lookup("CLOUDSIFT_SCAN_REGIONS").map(|raw| split_csv(&raw));
        env_config.scan_scanners = lookup("CLOUDSIFT_SCAN_SCANNERS").map(|raw| split_csv(&raw));
        env_config.scan_days_unused =
            env_config.parse_var(&lookup, "CLOUDSIFT_SCAN_DAYS_UNUSED");
        env_config.scan_inventory = lookup("CLOUDSIFT_SCAN_INVENTORY").map(PathBuf::from);
        env_config.output_dir = lookup("CLOUDSIFT_OUTPUT_DIR").map(PathBuf::from);
        env_config.price_cache = lookup("CLOUDSIFT_PRICE_CACHE").map(PathBuf::from);
        env_config.pricing_endpoint = non_empty(lookup("CLOUDSIFT_PRICING_ENDPOINT"));

        env_config
    }

    fn parse_var<F, T>(&mut self, lookup: &F, name: &str) -> Option<T>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr,
    {
        let raw = lookup(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.unparsed.push((name.to_string(), raw));
                None
            }
        }
    }
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
