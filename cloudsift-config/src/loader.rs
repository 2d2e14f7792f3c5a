use std::fs;
use std::path::PathBuf;

use cloudsift_core::model::Account;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use super::models::{
    Config, ConfigMetadata, DEFAULT_LOG_LEVEL, LogFormat, OutputConfig, PricingConfig,
    RateLimitSettings, ScanConfig, default_max_workers,
};
use super::sources::{EnvConfig, FileConfig};
use super::validation::{ConfigValidationError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("cloudsift.toml"),
        PathBuf::from("config/cloudsift.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Replaces the default config file locations when set.
    pub search_paths: Option<Vec<PathBuf>>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.options.search_paths = Some(paths);
        self
    }

    /// Loads `.env`, reads the process environment and composes the
    /// configuration.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Composes the configuration from `env` instead of the process
    /// environment. No `.env` file is read.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, mut warnings) = compose_config(file_config, env, config_path)?;
        warnings.extend(config.validate()?);

        debug!(
            config_path = ?config.metadata.config_path,
            max_workers = config.max_workers,
            warnings = warnings.len(),
            "configuration loaded"
        );
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            let candidates = self
                .options
                .search_paths
                .as_deref()
                .unwrap_or(DEFAULT_CONFIG_LOCATIONS.as_slice());
            source.default = candidates
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
            path: path.clone(),
            source: err,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No cloudsift.toml detected; using defaults and environment variables",
            "Run `cloudsift init config` or pass --config to pin accounts, regions and ignore rules",
        );
    }
    for (name, value) in &env.unparsed {
        warnings.push(format!("ignoring {name}={value:?}: not a valid number"));
    }

    let FileConfig {
        max_workers: file_max_workers,
        log_level: file_log_level,
        log_format: file_log_format,
        scan: file_scan,
        output: file_output,
        pricing: file_pricing,
        rate_limit: file_rate_limit,
    } = file_config.unwrap_or_default();

    let log_format = match env.log_format.or(file_log_format) {
        Some(raw) => raw
            .parse::<LogFormat>()
            .map_err(|reason| ConfigLoadError::InvalidValue {
                key: "log_format",
                reason,
            })?,
        None => LogFormat::default(),
    };

    let scan_defaults = ScanConfig::default();
    let scan = ScanConfig {
        regions: env
            .scan_regions
            .or(file_scan.regions)
            .unwrap_or_default(),
        scanners: env
            .scan_scanners
            .or(file_scan.scanners)
            .unwrap_or_default(),
        days_unused: env
            .scan_days_unused
            .or(file_scan.days_unused)
            .unwrap_or(scan_defaults.days_unused),
        accounts: file_scan
            .accounts
            .into_iter()
            .map(|account| {
                let name = account.name.unwrap_or_else(|| account.id.clone());
                Account::new(account.id, name)
            })
            .collect(),
        inventory: env
            .scan_inventory
            .or(file_scan.inventory)
            .unwrap_or(scan_defaults.inventory),
        ignore_resource_ids: file_scan.ignore_resource_ids,
        ignore_resource_names: file_scan.ignore_resource_names,
        ignore_resource_tags: file_scan.ignore_resource_tags,
    };

    let output = OutputConfig {
        dir: env
            .output_dir
            .or(file_output.dir)
            .unwrap_or_else(|| OutputConfig::default().dir),
    };

    let pricing_defaults = PricingConfig::default();
    let pricing = PricingConfig {
        cache_file: env
            .price_cache
            .or(file_pricing.cache_file)
            .unwrap_or(pricing_defaults.cache_file),
        endpoint: env
            .pricing_endpoint
            .or(file_pricing.endpoint)
            .or(pricing_defaults.endpoint),
    };

    let rate_defaults = RateLimitSettings::default();
    let rate_limit = RateLimitSettings {
        requests_per_second: file_rate_limit
            .requests_per_second
            .unwrap_or(rate_defaults.requests_per_second),
        max_retries: file_rate_limit
            .max_retries
            .unwrap_or(rate_defaults.max_retries),
        base_delay_ms: file_rate_limit
            .base_delay_ms
            .unwrap_or(rate_defaults.base_delay_ms),
        max_delay_ms: file_rate_limit
            .max_delay_ms
            .unwrap_or(rate_defaults.max_delay_ms),
    };

    let config = Config {
        max_workers: env
            .max_workers
            .or(file_max_workers)
            .unwrap_or_else(default_max_workers),
        log_level: env
            .log_level
            .or(file_log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        log_format,
        scan,
        output,
        pricing,
        rate_limit,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path:?}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        self.default
            .as_ref()
            .map(|path| (path.clone(), ConfigPathProvenance::Default))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(self, Self::Explicit)
    }
}

/// A composed configuration plus everything worth telling the user about it.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
