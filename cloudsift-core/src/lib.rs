//! Scan execution and cost estimation for cloudsift.
//!
//! - [`worker`]: bounded worker pool the scan tasks run on.
//! - [`pricing`]: cost estimator with its price cache and rate limiter.
//! - [`scan`]: scanners, the scanner registry and the scan orchestrator.
//! - [`report`]: JSON report writer.
#![allow(missing_docs)]

pub mod error;
pub mod pricing;
pub mod report;
pub mod scan;
pub mod worker;

pub use cloudsift_model as model;
pub use error::{CacheError, CoreError, PoolError, PricingError, ReportError, Result};
