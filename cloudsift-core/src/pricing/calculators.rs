//! Per-family pricing rules.
//!
//! Each [`ResourceKind`] maps to a set of price list filters and a rule that
//! turns the looked-up unit price into an hourly price. Everything else is
//! derived from the hourly price by [`calculate_rates`].

use chrono::{DateTime, Utc};
use cloudsift_model::{CostBreakdown, ResourceCostConfig, ResourceKind, ResourceSize};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Fixed hourly price of an unattached elastic IP.
pub const ELASTIC_IP_HOURLY: f64 = 0.005;

/// Hourly NAT gateway price used when the price list reports zero.
pub const NAT_GATEWAY_FALLBACK_HOURLY: f64 = 0.045;

/// Hours per month used to spread monthly storage prices.
pub const HOURS_PER_MONTH: f64 = 730.0;

pub const DEFAULT_SERVICE_CODE: &str = "AmazonEC2";

/// A single `TERM_MATCH` filter of a price list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingFilter {
    #[serde(rename = "Type")]
    pub filter_type: String,
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl PricingFilter {
    pub fn term_match(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            filter_type: "TERM_MATCH".to_string(),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Service code carried by the `servicecode` filter, if any.
pub fn service_code(filters: &[PricingFilter]) -> &str {
    filters
        .iter()
        .find(|filter| filter.field == "servicecode")
        .map(|filter| filter.value.as_str())
        .unwrap_or(DEFAULT_SERVICE_CODE)
}

pub fn round_cost(cost: f64) -> f64 {
    (cost * 10_000.0).round() / 10_000.0
}

/// Daily, monthly (30 days) and yearly (365 days) rates from an hourly price.
///
/// Every period is rounded from the unrounded hourly price.
pub fn calculate_rates(hourly: f64) -> CostBreakdown {
    let daily = hourly * 24.0;
    CostBreakdown {
        hourly_rate: round_cost(hourly),
        daily_rate: round_cost(daily),
        monthly_rate: round_cost(daily * 30.0),
        yearly_rate: round_cost(daily * 365.0),
        hours_running: None,
        lifetime: None,
    }
}

/// Adds running hours and lifetime cost for a resource created at `created`.
pub fn with_lifetime(
    mut breakdown: CostBreakdown,
    hourly: f64,
    created: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CostBreakdown {
    let hours = ((now - created).num_seconds().max(0) as f64) / 3600.0;
    breakdown.hours_running = Some(round_cost(hours));
    breakdown.lifetime = Some(round_cost(hourly * hours));
    breakdown
}

/// Cache key of the unit price a configuration resolves to.
///
/// Block storage is priced per volume type, everything else per size.
pub fn cache_key(config: &ResourceCostConfig) -> String {
    let discriminator = match config.resource_type {
        ResourceKind::EbsVolume => config.volume_type.clone(),
        _ => config.resource_size.to_string(),
    };
    format!("{}:{}:{}", config.resource_type, config.region, discriminator)
}

fn require_variant(config: &ResourceCostConfig) -> Result<&str, PricingError> {
    config
        .resource_size
        .variant()
        .ok_or_else(|| invalid_size(config.resource_type, "variant", &config.resource_size))
}

fn require_capacity(config: &ResourceCostConfig) -> Result<i64, PricingError> {
    config
        .resource_size
        .capacity()
        .ok_or_else(|| invalid_size(config.resource_type, "capacity", &config.resource_size))
}

fn require_instances(config: &ResourceCostConfig) -> Result<i64, PricingError> {
    if config.instance_count < 1 {
        return Err(PricingError::InvalidInstanceCount {
            kind: config.resource_type,
            count: config.instance_count,
        });
    }
    Ok(config.instance_count)
}

fn invalid_size(kind: ResourceKind, expected: &'static str, found: &ResourceSize) -> PricingError {
    PricingError::InvalidResourceSize {
        kind,
        expected,
        found: found.type_name(),
    }
}

/// Price list filters for a resource in the given pricing location.
pub fn pricing_filters(
    config: &ResourceCostConfig,
    location: &str,
) -> Result<Vec<PricingFilter>, PricingError> {
    let filters = match config.resource_type {
        ResourceKind::Ec2Instance => {
            let instance_type = require_variant(config)?;
            vec![
                PricingFilter::term_match("operatingSystem", "Linux"),
                PricingFilter::term_match("instanceType", instance_type),
                PricingFilter::term_match("location", location),
                PricingFilter::term_match("tenancy", "Shared"),
                PricingFilter::term_match("preInstalledSw", "NA"),
                PricingFilter::term_match("capacityStatus", "Used"),
                PricingFilter::term_match("servicecode", "AmazonEC2"),
                PricingFilter::term_match("productFamily", "Compute Instance"),
            ]
        }
        ResourceKind::EbsVolume => {
            require_capacity(config)?;
            vec![
                PricingFilter::term_match("servicecode", "AmazonEC2"),
                PricingFilter::term_match("productFamily", "Storage"),
                PricingFilter::term_match("volumeApiName", config.volume_type.as_str()),
                PricingFilter::term_match("location", location),
            ]
        }
        ResourceKind::LoadBalancer => vec![
            PricingFilter::term_match("servicecode", "AmazonEC2"),
            PricingFilter::term_match("productFamily", "Load Balancer"),
            PricingFilter::term_match("location", location),
            PricingFilter::term_match("usagetype", "LoadBalancerUsage"),
        ],
        ResourceKind::DynamoDbTable => vec![
            PricingFilter::term_match("servicecode", "AmazonDynamoDB"),
            PricingFilter::term_match("location", location),
            PricingFilter::term_match("group", "DDB-ReadWriteCapacityUnit"),
        ],
        ResourceKind::OpenSearchDomain => {
            let instance_type = require_variant(config)?;
            require_instances(config)?;
            vec![
                PricingFilter::term_match("servicecode", "AmazonES"),
                PricingFilter::term_match("location", location),
                PricingFilter::term_match("instanceType", instance_type),
            ]
        }
        ResourceKind::NatGateway => vec![
            PricingFilter::term_match("servicecode", "AmazonVPC"),
            PricingFilter::term_match("location", location),
            PricingFilter::term_match("operation", "NatGateway"),
            PricingFilter::term_match("productFamily", "NAT Gateway"),
            PricingFilter::term_match("usagetype", "NatGateway-Hours"),
        ],
        ResourceKind::ElasticIp => Vec::new(),
    };
    Ok(filters)
}

/// Unrounded hourly price of a resource given its looked-up unit price.
pub fn hourly_price(config: &ResourceCostConfig, unit_price: f64) -> Result<f64, PricingError> {
    let hourly = match config.resource_type {
        ResourceKind::EbsVolume => {
            let size = require_capacity(config)?;
            size as f64 * unit_price / HOURS_PER_MONTH
        }
        ResourceKind::OpenSearchDomain => unit_price * require_instances(config)? as f64,
        ResourceKind::NatGateway if unit_price == 0.0 => NAT_GATEWAY_FALLBACK_HOURLY,
        ResourceKind::ElasticIp => ELASTIC_IP_HOURLY,
        ResourceKind::Ec2Instance
        | ResourceKind::LoadBalancer
        | ResourceKind::DynamoDbTable
        | ResourceKind::NatGateway => unit_price,
    };
    Ok(hourly)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn rates_round_from_unrounded_hourly() {
        let breakdown = calculate_rates(0.123456);
        assert_eq!(breakdown.hourly_rate, 0.1235);
        assert_eq!(breakdown.daily_rate, round_cost(0.123456 * 24.0));
        assert_eq!(breakdown.monthly_rate, round_cost(0.123456 * 24.0 * 30.0));
        assert_eq!(breakdown.yearly_rate, round_cost(0.123456 * 24.0 * 365.0));
        assert!(breakdown.lifetime.is_none());
    }

    #[test]
    fn storage_spreads_monthly_gb_price() {
        let config = ResourceCostConfig::new(ResourceKind::EbsVolume, "us-east-1")
            .with_size(100)
            .with_volume_type("gp3");
        let hourly = hourly_price(&config, 0.08).unwrap();
        assert!((hourly - 8.0 / 730.0).abs() < 1e-12);
    }

    #[test]
    fn search_cluster_scales_with_node_count() {
        let config = ResourceCostConfig::new(ResourceKind::OpenSearchDomain, "us-east-1")
            .with_size("r6g.large.search")
            .with_instance_count(3);
        assert!((hourly_price(&config, 0.2).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn search_cluster_without_nodes_is_rejected() {
        let config = ResourceCostConfig::new(ResourceKind::OpenSearchDomain, "us-east-1")
            .with_size("r6g.large.search");
        assert!(matches!(
            pricing_filters(&config, "US East (N. Virginia)"),
            Err(PricingError::InvalidInstanceCount { count: 0, .. })
        ));
        assert!(matches!(
            hourly_price(&config, 0.2),
            Err(PricingError::InvalidInstanceCount { count: 0, .. })
        ));

        let config = config.with_instance_count(-2);
        assert!(matches!(
            hourly_price(&config, 0.2),
            Err(PricingError::InvalidInstanceCount { count: -2, .. })
        ));
    }

    #[test]
    fn nat_gateway_zero_price_falls_back() {
        let config = ResourceCostConfig::new(ResourceKind::NatGateway, "us-east-1");
        assert_eq!(hourly_price(&config, 0.0).unwrap(), NAT_GATEWAY_FALLBACK_HOURLY);
        assert_eq!(hourly_price(&config, 0.05).unwrap(), 0.05);
    }

    #[test]
    fn compute_requires_a_variant() {
        let config = ResourceCostConfig::new(ResourceKind::Ec2Instance, "us-east-1").with_size(8);
        let err = pricing_filters(&config, "US East (N. Virginia)").unwrap_err();
        assert!(matches!(
            err,
            PricingError::InvalidResourceSize {
                expected: "variant",
                found: "capacity",
                ..
            }
        ));
    }

    #[test]
    fn storage_cache_key_uses_volume_type() {
        let config = ResourceCostConfig::new(ResourceKind::EbsVolume, "eu-west-1")
            .with_size(500)
            .with_volume_type("gp2");
        assert_eq!(cache_key(&config), "EBSVolumes:eu-west-1:gp2");

        let config =
            ResourceCostConfig::new(ResourceKind::Ec2Instance, "eu-west-1").with_size("t3.micro");
        assert_eq!(cache_key(&config), "EC2:eu-west-1:t3.micro");
    }

    #[test]
    fn service_code_defaults_to_compute() {
        let config = ResourceCostConfig::new(ResourceKind::DynamoDbTable, "us-east-1");
        let filters = pricing_filters(&config, "US East (N. Virginia)").unwrap();
        assert_eq!(service_code(&filters), "AmazonDynamoDB");
        assert_eq!(service_code(&[]), DEFAULT_SERVICE_CODE);
    }

    #[test]
    fn lifetime_covers_hours_since_creation() {
        let now = Utc::now();
        let created = now - Duration::hours(10);
        let breakdown = with_lifetime(calculate_rates(0.5), 0.5, created, now);
        assert_eq!(breakdown.hours_running, Some(10.0));
        assert_eq!(breakdown.lifetime, Some(5.0));
    }
}
