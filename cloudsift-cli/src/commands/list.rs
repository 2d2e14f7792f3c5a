use std::sync::Arc;

use cloudsift_config::Config;
use cloudsift_core::pricing::{known_regions, location_for_region};
use cloudsift_core::scan::{Inventory, ScannerRegistry, register_inventory_scanners};

use crate::cli::ListCommand;

pub fn run(command: ListCommand, config: &Config) -> anyhow::Result<()> {
    match command {
        ListCommand::Scanners => {
            for line in scanner_lines(config) {
                println!("{line}");
            }
        }
        ListCommand::Regions => {
            for region in known_regions() {
                let location = location_for_region(region).unwrap_or_default();
                println!("{region:<16} {location}");
            }
        }
    }
    Ok(())
}

/// `argument-name  Label` for every registered scanner, sorted by name.
fn scanner_lines(config: &Config) -> Vec<String> {
    let registry = ScannerRegistry::new();
    register_inventory_scanners(
        &registry,
        Arc::new(Inventory::default()),
        None,
        Arc::new(config.scan.ignore_rules()),
    );

    registry
        .list()
        .into_iter()
        .filter_map(|name| {
            let scanner = registry.get(&name).ok()?;
            Some(format!("{name:<16} {}", scanner.label()))
        })
        .collect()
}
