use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use cloudsift_model::{CostBreakdown, ResourceCostConfig, ResourceKind};
use tracing::{debug, warn};

use super::cache::PriceCache;
use super::calculators::{
    self, ELASTIC_IP_HOURLY, cache_key, calculate_rates, hourly_price, pricing_filters,
    service_code,
};
use super::client::{PricingClient, parse_first_price};
use super::rate_limit::RateLimit;
use super::regions::location_for_region;
use crate::error::PricingError;

/// Prices resources from the price list, caching unit prices on disk.
pub struct CostEstimator {
    client: Arc<dyn PricingClient>,
    limiter: Arc<dyn RateLimit>,
    cache: Arc<PriceCache>,
}

impl std::fmt::Debug for CostEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostEstimator")
            .field("cache", &self.cache.path())
            .field("cached_prices", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl CostEstimator {
    pub fn new(
        client: Arc<dyn PricingClient>,
        limiter: Arc<dyn RateLimit>,
        cache: Arc<PriceCache>,
    ) -> Self {
        Self {
            client,
            limiter,
            cache,
        }
    }

    /// Builds an estimator around the cache file at `cache_file`.
    ///
    /// An unreadable or malformed cache file is logged and replaced by an
    /// empty cache.
    pub async fn with_cache_file(
        client: Arc<dyn PricingClient>,
        limiter: Arc<dyn RateLimit>,
        cache_file: impl Into<PathBuf>,
    ) -> Self {
        let cache = PriceCache::new(cache_file);
        if let Err(err) = cache.load().await {
            warn!(target: "pricing", error = %err, "ignoring unusable price cache");
        }
        Self::new(client, limiter, Arc::new(cache))
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub async fn calculate_cost(
        &self,
        config: &ResourceCostConfig,
    ) -> Result<CostBreakdown, PricingError> {
        debug!(
            target: "pricing",
            resource_type = %config.resource_type,
            region = %config.region,
            "calculating cost"
        );

        if config.resource_type == ResourceKind::ElasticIp {
            return Ok(Self::breakdown(config, ELASTIC_IP_HOURLY));
        }

        let location = location_for_region(&config.region)
            .ok_or_else(|| PricingError::UnknownRegion(config.region.clone()))?;

        let key = cache_key(config);
        if let Some(price) = self.cache.get(&key) {
            debug!(target: "pricing", key = %key, price, "price cache hit");
            let hourly = hourly_price(config, price)?;
            return Ok(Self::breakdown(config, hourly));
        }

        let filters = pricing_filters(config, location)?;
        let price = self.fetch_price(&filters).await?;

        self.cache.set(key.clone(), price);
        if let Err(err) = self.cache.save().await {
            warn!(target: "pricing", key = %key, error = %err, "failed to save price cache");
        }

        let hourly = hourly_price(config, price)?;
        Ok(Self::breakdown(config, hourly))
    }

    async fn fetch_price(&self, filters: &[calculators::PricingFilter]) -> Result<f64, PricingError> {
        self.limiter.wait().await?;

        let documents = match self
            .client
            .get_products(service_code(filters), filters)
            .await
        {
            Ok(documents) => {
                self.limiter.on_success();
                documents
            }
            Err(err) => {
                self.limiter.on_failure();
                return Err(PricingError::Upstream(err));
            }
        };

        parse_first_price(&documents)
    }

    fn breakdown(config: &ResourceCostConfig, hourly: f64) -> CostBreakdown {
        let rates = calculate_rates(hourly);
        match config.creation_time {
            Some(created) => calculators::with_lifetime(rates, hourly, created, Utc::now()),
            None => rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use serde_json::json;

    use super::*;
    use crate::pricing::client::MockPricingClient;
    use crate::pricing::rate_limit::MockRateLimit;

    fn price_document(usd: &str) -> serde_json::Value {
        json!({
            "terms": {"OnDemand": {"T": {"priceDimensions": {"D": {"pricePerUnit": {"USD": usd}}}}}}
        })
    }

    fn estimator(
        client: MockPricingClient,
        limiter: MockRateLimit,
        dir: &tempfile::TempDir,
    ) -> CostEstimator {
        CostEstimator::new(
            Arc::new(client),
            Arc::new(limiter),
            Arc::new(PriceCache::new(dir.path().join("costs.json"))),
        )
    }

    fn ec2(region: &str) -> ResourceCostConfig {
        ResourceCostConfig::new(ResourceKind::Ec2Instance, region).with_size("t3.micro")
    }

    #[tokio::test]
    async fn elastic_ip_is_fixed_price() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client.expect_get_products().never();
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().never();

        let estimator = estimator(client, limiter, &dir);
        let cost = estimator
            .calculate_cost(&ResourceCostConfig::new(ResourceKind::ElasticIp, "nowhere-1"))
            .await
            .unwrap();

        assert_eq!(cost.hourly_rate, 0.005);
        assert_eq!(cost.monthly_rate, 3.6);
        assert!(estimator.cache().is_empty());
    }

    #[tokio::test]
    async fn unknown_region_fails_before_any_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client.expect_get_products().never();
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().never();

        let err = estimator(client, limiter, &dir)
            .calculate_cost(&ec2("mars-north-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::UnknownRegion(region) if region == "mars-north-1"));
    }

    #[tokio::test]
    async fn search_cluster_without_nodes_is_never_looked_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client.expect_get_products().never();
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().never();

        let config = ResourceCostConfig::new(ResourceKind::OpenSearchDomain, "us-east-1")
            .with_size("r6g.large.search");
        let estimator = estimator(client, limiter, &dir);
        let err = estimator.calculate_cost(&config).await.unwrap_err();
        assert!(matches!(err, PricingError::InvalidInstanceCount { count: 0, .. }));
        assert!(estimator.cache().is_empty());
    }

    #[tokio::test]
    async fn miss_fetches_once_then_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client
            .expect_get_products()
            .withf(|service, filters| {
                service.to_string() == "AmazonEC2"
                    && filters
                        .iter()
                        .any(|f| f.field == "location" && f.value == "US East (N. Virginia)")
            })
            .times(1)
            .returning(|_, _| Ok(vec![price_document("0.0104")]));
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().times(1).returning(|| Ok(()));
        limiter.expect_on_success().times(1).return_const(());
        limiter.expect_on_failure().never();

        let estimator = estimator(client, limiter, &dir);
        let first = estimator.calculate_cost(&ec2("us-east-1")).await.unwrap();
        let second = estimator.calculate_cost(&ec2("us-east-1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.hourly_rate, 0.0104);
        assert_eq!(estimator.cache().get("EC2:us-east-1:t3.micro"), Some(0.0104));
        assert!(dir.path().join("costs.json").exists());
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_to_limiter() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client
            .expect_get_products()
            .times(1)
            .returning(|_, _| Err(anyhow!("throttled")));
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().times(1).returning(|| Ok(()));
        limiter.expect_on_failure().times(1).return_const(());
        limiter.expect_on_success().never();

        let estimator = estimator(client, limiter, &dir);
        let err = estimator.calculate_cost(&ec2("us-east-1")).await.unwrap_err();

        assert!(matches!(err, PricingError::Upstream(_)));
        assert!(estimator.cache().is_empty());
    }

    #[tokio::test]
    async fn cache_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let mut client = MockPricingClient::new();
        client
            .expect_get_products()
            .returning(|_, _| Ok(vec![price_document("0.0225")]));
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().returning(|| Ok(()));
        limiter.expect_on_success().return_const(());

        let estimator = CostEstimator::new(
            Arc::new(client),
            Arc::new(limiter),
            Arc::new(PriceCache::new(blocker.join("costs.json"))),
        );
        let cost = estimator
            .calculate_cost(&ResourceCostConfig::new(ResourceKind::LoadBalancer, "us-east-1"))
            .await
            .unwrap();

        assert_eq!(cost.hourly_rate, 0.0225);
        assert_eq!(estimator.cache().get("ELB:us-east-1:none"), Some(0.0225));
    }

    #[tokio::test]
    async fn storage_mismatched_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client.expect_get_products().never();
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().never();

        let config = ResourceCostConfig::new(ResourceKind::EbsVolume, "us-east-1")
            .with_size("gp3")
            .with_volume_type("gp3");
        let err = estimator(client, limiter, &dir)
            .calculate_cost(&config)
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidResourceSize { .. }));
    }
}
