use std::path::PathBuf;

use cloudsift_model::{ModelError, ResourceKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("scanner {0} not found")]
    ScannerNotFound(String),

    #[error("failed to load inventory {path:?}: {reason}")]
    Inventory { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Construction and lifecycle errors of the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("max_workers must be greater than 0, got {0}")]
    InvalidWorkerCount(usize),
}

/// Failures of a single cost calculation.
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error(transparent)]
    UnsupportedResourceType(#[from] ModelError),

    #[error("invalid resource size for {kind}: expected {expected}, got {found}")]
    InvalidResourceSize {
        kind: ResourceKind,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{kind} needs at least one instance, got {count}")]
    InvalidInstanceCount { kind: ResourceKind, count: i64 },

    #[error("rate limiter interrupted")]
    RateLimiterCancelled,

    #[error("failed to get pricing: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("no pricing information found")]
    NoPricing,

    #[error("could not find valid price in response")]
    NoValidPrice,
}

/// Persistence errors of the on-disk price cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cache file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cache data in {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to marshal cache data")]
    Encode(#[source] serde_json::Error),

    #[error("failed to create cache directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temp cache file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename temp cache file {from:?} -> {to:?}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors writing scan reports to disk.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report path {path:?} has no parent directory")]
    NoParent { path: PathBuf },

    #[error("failed to encode report")]
    Encode(#[source] serde_json::Error),

    #[error("failed to create report directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temp report {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move report {from:?} -> {to:?}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
