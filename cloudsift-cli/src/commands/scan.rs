use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use cloudsift_config::Config;
use cloudsift_core::model::Account;
use cloudsift_core::pricing::location_for_region;
use cloudsift_core::report::ReportWriter;
use cloudsift_core::scan::{
    Inventory, Orchestrator, ScanOutcome, ScanPlan, ScannerRegistry, register_inventory_scanners,
};
use cloudsift_core::worker::init_shared_pool;
use tracing::{info, warn};

use super::build_estimator;

pub async fn run(config: Config, skip_cost: bool) -> anyhow::Result<()> {
    let inventory = Arc::new(
        Inventory::load(&config.scan.inventory)
            .await
            .context("failed to load resource inventory")?,
    );
    info!(
        path = %config.scan.inventory.display(),
        resources = inventory.resources.len(),
        "inventory loaded"
    );

    let (estimator, limiter) = if skip_cost {
        (None, None)
    } else {
        let (estimator, limiter) = build_estimator(&config).await?;
        (Some(estimator), Some(limiter))
    };

    let registry = ScannerRegistry::new();
    register_inventory_scanners(
        &registry,
        Arc::clone(&inventory),
        estimator,
        Arc::new(config.scan.ignore_rules()),
    );
    let scanners = registry
        .resolve(&config.scan.scanners)
        .context("failed to select scanners")?;

    let plan = build_plan(&config, &inventory)?;

    let pool = init_shared_pool(config.max_workers).context("failed to start worker pool")?;
    let orchestrator = Orchestrator::new(Arc::clone(&pool));
    let scanned = orchestrator.run(&scanners, &plan).await;

    pool.stop().await;
    if let Some(limiter) = limiter {
        limiter.close();
    }

    let outcome = scanned.context("scan failed")?;
    let written = ReportWriter::new(&config.output.dir)
        .write_outcome(&outcome, Utc::now())
        .await
        .context("failed to write reports")?;

    print_summary(&outcome);
    if let Some(summary) = written.last() {
        println!("Summary written to {}", summary.display());
    }
    Ok(())
}

/// Accounts and regions from the config, falling back to everything in the
/// inventory.
fn build_plan(config: &Config, inventory: &Inventory) -> anyhow::Result<ScanPlan> {
    let accounts: Vec<Account> = if config.scan.accounts.is_empty() {
        inventory.accounts()
    } else {
        config.scan.accounts.clone()
    };
    if accounts.is_empty() {
        bail!("no accounts configured and none found in the inventory");
    }

    let regions = if config.scan.regions.is_empty() {
        inventory.regions()
    } else {
        config.scan.regions.clone()
    };
    for region in &regions {
        if location_for_region(region).is_none() {
            warn!(region = %region, "region has no known price list location; costs will be missing");
        }
    }

    Ok(ScanPlan {
        accounts,
        regions,
        days_unused: config.scan.days_unused,
    })
}

fn print_summary(outcome: &ScanOutcome) {
    println!(
        "Scanned {} account(s) in {:.1}s: {} unused resource(s), ${:.2}/month",
        outcome.results.len(),
        outcome.elapsed.as_secs_f64(),
        outcome.resource_count(),
        outcome.monthly_cost()
    );
    for account in outcome.results.values() {
        println!(
            "  {} ({}): {} resource(s), ${:.2}/month",
            account.account_name,
            account.account_id,
            account.resource_count(),
            account.monthly_cost()
        );
    }
    if outcome.batch.failed() > 0 || outcome.batch.dropped() > 0 {
        println!(
            "  {} task(s) failed, {} dropped; see log for details",
            outcome.batch.failed(),
            outcome.batch.dropped()
        );
    }
}
