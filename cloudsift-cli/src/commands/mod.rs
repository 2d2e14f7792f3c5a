pub mod estimate;
pub mod init;
pub mod list;
pub mod scan;

use std::sync::Arc;

use anyhow::{Context, bail};
use cloudsift_config::Config;
use cloudsift_core::pricing::{CostEstimator, HttpPricingClient, TokenBucketLimiter};

/// A cost estimator wired to the configured price list endpoint, plus the
/// limiter it throttles through so the caller can close it.
pub(crate) async fn build_estimator(
    config: &Config,
) -> anyhow::Result<(Arc<CostEstimator>, Arc<TokenBucketLimiter>)> {
    let Some(endpoint) = config.pricing.endpoint.as_deref() else {
        bail!(
            "pricing.endpoint is not set; point it (or CLOUDSIFT_PRICING_ENDPOINT) at a \
             price list gateway that adds AWS credentials, or pass --skip-cost"
        );
    };
    let client =
        HttpPricingClient::new(endpoint).context("failed to build pricing HTTP client")?;
    let limiter = Arc::new(TokenBucketLimiter::new(config.rate_limit_config()));
    let estimator = CostEstimator::with_cache_file(
        Arc::new(client),
        Arc::clone(&limiter) as _,
        config.pricing.cache_file.clone(),
    )
    .await;
    Ok((Arc::new(estimator), limiter))
}
