use cloudsift_core::pricing::{MAX_REQUESTS_PER_SECOND, MIN_REQUESTS_PER_SECOND};
use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("max_workers must be greater than zero")]
    ZeroWorkers,
    #[error("rate_limit.requests_per_second must be between 0.001 and 10000, got {0}")]
    InvalidRequestRate(f64),
    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    /// Adds the warnings of `other` whose message is not already present.
    pub fn merge(&mut self, other: ConfigWarnings) {
        for warning in other.items {
            if !self
                .items
                .iter()
                .any(|existing| existing.message == warning.message)
            {
                self.items.push(warning);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn validate(config: &Config) -> Result<ConfigWarnings, ConfigValidationError> {
    let mut warnings = ConfigWarnings::default();

    if config.max_workers == 0 {
        return Err(ConfigValidationError::ZeroWorkers);
    }

    let rps = config.rate_limit.requests_per_second;
    if !(MIN_REQUESTS_PER_SECOND..=MAX_REQUESTS_PER_SECOND).contains(&rps) {
        return Err(ConfigValidationError::InvalidRequestRate(rps));
    }

    if config
        .pricing
        .endpoint
        .as_deref()
        .is_some_and(|endpoint| endpoint.trim().is_empty())
    {
        return Err(ConfigValidationError::EmptyValue {
            field: "pricing.endpoint",
        });
    }
    if config.scan.inventory.as_os_str().is_empty() {
        return Err(ConfigValidationError::EmptyValue {
            field: "scan.inventory",
        });
    }

    if config.rate_limit.base_delay_ms > config.rate_limit.max_delay_ms {
        warnings.push(format!(
            "rate_limit.base_delay_ms ({}) exceeds max_delay_ms ({}); every backoff will use the maximum",
            config.rate_limit.base_delay_ms, config.rate_limit.max_delay_ms
        ));
    }

    if config.scan.days_unused == 0 {
        warnings.push_with_hint(
            "scan.days_unused is 0; every unattached resource will be reported",
            "Set scan.days_unused to the idle period worth flagging, e.g. 90",
        );
    }

    let cpus = num_cpus::get().max(1);
    if config.max_workers > cpus * 64 {
        warnings.push(format!(
            "max_workers ({}) is far above the {} available CPUs",
            config.max_workers, cpus
        ));
    }

    Ok(warnings)
}
