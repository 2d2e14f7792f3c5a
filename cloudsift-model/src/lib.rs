//! Core data model definitions shared across cloudsift crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod account;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod resource;
pub mod scan;

pub use account::Account;
pub use cost::CostBreakdown;
pub use error::{ModelError, Result as ModelResult};
pub use metrics::PoolMetricsSnapshot;
pub use resource::{ResourceCostConfig, ResourceKind, ResourceSize};
pub use scan::{AccountScanResult, ScanResult, ScanResults};
