use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::{CoreError, Result};

use super::scanner::Scanner;

/// Scanners addressable by their argument name.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: RwLock<BTreeMap<String, Arc<dyn Scanner>>>,
}

impl std::fmt::Debug for ScannerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerRegistry")
            .field("scanners", &self.list())
            .finish()
    }
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scanner, replacing any scanner with the same argument name.
    pub fn register(&self, scanner: Arc<dyn Scanner>) {
        self.scanners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(scanner.argument_name().to_string(), scanner);
    }

    pub fn get(&self, argument_name: &str) -> Result<Arc<dyn Scanner>> {
        self.scanners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(argument_name)
            .cloned()
            .ok_or_else(|| CoreError::ScannerNotFound(argument_name.to_string()))
    }

    /// Registered argument names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.scanners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Scanners for the given argument names, or every scanner when `names`
    /// is empty.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Scanner>>> {
        if names.is_empty() {
            return Ok(self
                .scanners
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .values()
                .cloned()
                .collect());
        }
        names.iter().map(|name| self.get(name.trim())).collect()
    }
}
