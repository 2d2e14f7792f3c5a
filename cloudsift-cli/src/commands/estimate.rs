use anyhow::Context;
use chrono::{DateTime, Utc};
use cloudsift_config::Config;
use cloudsift_core::model::{ResourceCostConfig, ResourceKind, ResourceSize};

use super::build_estimator;
use crate::cli::EstimateArgs;

pub async fn run(config: &Config, args: EstimateArgs) -> anyhow::Result<()> {
    let cost_config = cost_config(&args)?;
    let (estimator, limiter) = build_estimator(config).await?;

    let estimated = estimator.calculate_cost(&cost_config).await;
    limiter.close();
    let breakdown = estimated.with_context(|| {
        format!(
            "failed to estimate {} in {}",
            cost_config.resource_type, cost_config.region
        )
    })?;

    println!(
        "{}",
        serde_json::to_string_pretty(&breakdown).context("failed to encode cost breakdown")?
    );
    Ok(())
}

fn cost_config(args: &EstimateArgs) -> anyhow::Result<ResourceCostConfig> {
    let kind: ResourceKind = args
        .resource_type
        .parse()
        .with_context(|| format!("unknown resource type '{}'", args.resource_type))?;

    let mut config = ResourceCostConfig::new(kind, args.region.clone());
    if let Some(size) = &args.size {
        config = config.with_size(parse_size(size));
    }
    if let Some(volume_type) = &args.volume_type {
        config = config.with_volume_type(volume_type.clone());
    }
    if let Some(lb_type) = &args.lb_type {
        config = config.with_lb_type(lb_type.clone());
    }
    if let Some(count) = args.instance_count {
        config = config.with_instance_count(count);
    }
    if let Some(created) = &args.created_at {
        let created = DateTime::parse_from_rfc3339(created)
            .with_context(|| format!("invalid --created-at '{created}'"))?;
        config = config.with_creation_time(created.with_timezone(&Utc));
    }
    Ok(config)
}

/// Whole numbers are capacities, anything else names a variant.
fn parse_size(raw: &str) -> ResourceSize {
    match raw.trim().parse::<i64>() {
        Ok(capacity) => ResourceSize::Capacity(capacity),
        Err(_) => ResourceSize::Variant(raw.trim().to_string()),
    }
}
