//! Scan orchestration.
//!
//! A scan runs every selected [`Scanner`] in every region of every account of
//! a [`ScanPlan`] as one task per combination on a
//! [`WorkerPool`](crate::worker::WorkerPool). Results are merged per account
//! as tasks finish.

mod ignore;
mod inventory;
mod orchestrator;
mod progress;
mod registry;
mod scanner;

pub use ignore::IgnoreRules;
pub use inventory::{
    Inventory, InventoryRecord, InventoryScanner, inventory_scanners, register_inventory_scanners,
};
pub use orchestrator::{Orchestrator, ScanOutcome, ScanPlan};
pub use progress::{
    DEFAULT_PROGRESS_INTERVAL, ProgressGuard, ProgressTracker, ScannerProgress, spawn_reporter,
};
pub use registry::ScannerRegistry;
pub use scanner::{GLOBAL_REGION, GLOBAL_SCAN_REGION, ScanOptions, Scanner};
