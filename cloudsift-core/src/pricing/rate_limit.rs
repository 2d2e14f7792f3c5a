use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::PricingError;

const BACKOFF_RESET_AFTER: Duration = Duration::from_secs(5 * 60);
const SUCCESS_RESET_AFTER: Duration = Duration::from_secs(60);

/// Slowest accepted refill rate: one token every 1000 s.
pub const MIN_REQUESTS_PER_SECOND: f64 = 1e-3;
/// Fastest accepted refill rate; also bounds the bucket size.
pub const MAX_REQUESTS_PER_SECOND: f64 = 10_000.0;

/// Throttle in front of the pricing API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimit: Send + Sync {
    /// Waits for the current backoff and then for a request slot.
    async fn wait(&self) -> Result<(), PricingError>;

    fn on_success(&self);

    fn on_failure(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 20.0,
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Default)]
struct BackoffState {
    failures: u32,
    last_failure: Option<Instant>,
}

impl BackoffState {
    fn current_backoff(&self, base: Duration, max: Duration) -> Duration {
        let Some(last_failure) = self.last_failure else {
            return Duration::ZERO;
        };
        if self.failures == 0 || last_failure.elapsed() > BACKOFF_RESET_AFTER {
            return Duration::ZERO;
        }

        let factor = 2f64.powi(self.failures.saturating_sub(1) as i32);
        let backoff = base.as_secs_f64() * factor;
        if backoff >= max.as_secs_f64() {
            max
        } else {
            Duration::from_secs_f64(backoff)
        }
    }
}

/// Token bucket holding `ceil(requests_per_second)` tokens, refilled one at a
/// time every `1 / requests_per_second`, with exponential backoff after
/// reported failures.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    tokens: Arc<Semaphore>,
    capacity: usize,
    config: RateLimitConfig,
    backoff: Mutex<BackoffState>,
}

impl TokenBucketLimiter {
    /// Creates a full bucket and spawns its refill task on the current
    /// runtime. The refill task ends once the limiter is dropped.
    pub fn new(config: RateLimitConfig) -> Self {
        let rps = effective_rate(config.requests_per_second);
        let capacity = rps.ceil() as usize;
        let tokens = Arc::new(Semaphore::new(capacity));
        let interval = Duration::from_secs_f64(1.0 / rps);

        tokio::spawn(refill(Arc::downgrade(&tokens), capacity, interval));

        Self {
            tokens,
            capacity,
            config,
            backoff: Mutex::new(BackoffState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_tokens(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn current_backoff(&self) -> Duration {
        self.lock_backoff()
            .current_backoff(self.config.base_delay, self.config.max_delay)
    }

    pub fn failure_count(&self) -> u32 {
        self.lock_backoff().failures
    }

    /// Fails every pending and future `wait`.
    pub fn close(&self) {
        self.tokens.close();
    }

    fn lock_backoff(&self) -> std::sync::MutexGuard<'_, BackoffState> {
        self.backoff
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Non-finite and non-positive rates fall back to the default, anything else
/// is clamped into `[MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND]`.
fn effective_rate(requested: f64) -> f64 {
    if !requested.is_finite() || requested <= 0.0 {
        return RateLimitConfig::default().requests_per_second;
    }
    requested.clamp(MIN_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_SECOND)
}

async fn refill(tokens: Weak<Semaphore>, capacity: usize, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(tokens) = tokens.upgrade() else {
            break;
        };
        if tokens.is_closed() {
            break;
        }
        if tokens.available_permits() < capacity {
            tokens.add_permits(1);
        }
    }
}

#[async_trait]
impl RateLimit for TokenBucketLimiter {
    async fn wait(&self) -> Result<(), PricingError> {
        let backoff = self.current_backoff();
        if !backoff.is_zero() {
            debug!(
                target: "pricing",
                backoff_ms = backoff.as_millis() as u64,
                "rate limiter applying backoff"
            );
            tokio::time::sleep(backoff).await;
        }

        let permit = self
            .tokens
            .acquire()
            .await
            .map_err(|_| PricingError::RateLimiterCancelled)?;
        permit.forget();
        Ok(())
    }

    fn on_success(&self) {
        let mut state = self.lock_backoff();
        let recovered = state
            .last_failure
            .is_some_and(|last| last.elapsed() > SUCCESS_RESET_AFTER);
        if state.failures > 0 && recovered {
            debug!(
                target: "pricing",
                previous_failures = state.failures,
                "rate limiter backoff reset"
            );
            state.failures = 0;
        }
    }

    fn on_failure(&self) {
        let mut state = self.lock_backoff();
        state.failures = (state.failures + 1).min(self.config.max_retries);
        state.last_failure = Some(Instant::now());
        debug!(
            target: "pricing",
            failures = state.failures,
            backoff_ms = state
                .current_backoff(self.config.base_delay, self.config.max_delay)
                .as_millis() as u64,
            "rate limiter backoff triggered"
        );
    }
}
