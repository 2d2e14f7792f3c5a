//! Cost estimation for unused resources.
//!
//! [`CostEstimator::calculate_cost`] resolves a [`ResourceCostConfig`] to a
//! [`CostBreakdown`]: fixed-price kinds are answered directly, everything else
//! goes through the [`PriceCache`] and, on a miss, a rate-limited price list
//! lookup through a [`PricingClient`].
//!
//! [`ResourceCostConfig`]: cloudsift_model::ResourceCostConfig
//! [`CostBreakdown`]: cloudsift_model::CostBreakdown

pub mod cache;
pub mod calculators;
pub mod client;
pub mod estimator;
pub mod rate_limit;
pub mod regions;

pub use cache::{DEFAULT_CACHE_FILE, PriceCache};
pub use calculators::PricingFilter;
pub use client::{HttpPricingClient, PricingClient};
pub use estimator::CostEstimator;
pub use rate_limit::{
    MAX_REQUESTS_PER_SECOND, MIN_REQUESTS_PER_SECOND, RateLimit, RateLimitConfig, TokenBucketLimiter,
};
pub use regions::{known_regions, location_for_region};
