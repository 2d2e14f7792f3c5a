use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;

/// A single unused resource reported by a scanner.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanResult {
    /// Label of the scanner that produced the result.
    pub resource_type: String,
    pub resource_name: String,
    pub resource_id: String,
    pub reason: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub account_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub account_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub details: BTreeMap<String, String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cost: Option<CostBreakdown>,
}

pub type ScanResults = Vec<ScanResult>;

/// Per-account results, keyed by scanner label.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountScanResult {
    pub account_id: String,
    pub account_name: String,
    pub results: BTreeMap<String, ScanResults>,
}

impl AccountScanResult {
    pub fn new(account_id: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            account_name: account_name.into(),
            results: BTreeMap::new(),
        }
    }

    /// Appends results under a scanner label, keeping earlier entries.
    pub fn attach(&mut self, label: &str, results: ScanResults) {
        self.results
            .entry(label.to_string())
            .or_default()
            .extend(results);
    }

    pub fn resource_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    /// Sum of the monthly rates of every costed result.
    pub fn monthly_cost(&self) -> f64 {
        self.results
            .values()
            .flatten()
            .filter_map(|result| result.cost.as_ref())
            .map(|cost| cost.monthly_rate)
            .sum()
    }
}
