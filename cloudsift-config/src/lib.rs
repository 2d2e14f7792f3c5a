//! Configuration for cloudsift.
//!
//! Settings come from an optional TOML file, a `.env` file and `CLOUDSIFT_*`
//! environment variables, in increasing order of precedence. The loader
//! returns the composed [`Config`] together with non-fatal
//! [`ConfigWarnings`] for the caller to surface.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod templates;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    Config, ConfigMetadata, LogFormat, OutputConfig, PricingConfig, RateLimitSettings,
    ScanConfig,
};
pub use templates::{STARTER_CONFIG, STARTER_ENV};
pub use validation::{ConfigValidationError, ConfigWarning, ConfigWarnings};
