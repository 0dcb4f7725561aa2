//! Per-minute request budget shared by outbound clients.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use tracing::{debug, warn};

use crate::config::RateLimitConfig;

type Limiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Allows at most `requests_per_minute` calls in any 60-second window.
///
/// A saturated limiter sleeps once for `saturation_sleep_ms` and checks
/// again. If the budget is still spent, [`acquire`](Self::acquire) gives up.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Limiter>,
    saturation_sleep: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute);
        Self {
            inner: Arc::new(Governor::direct(quota)),
            saturation_sleep: Duration::from_millis(config.saturation_sleep_ms),
        }
    }

    /// Take one slot from the budget. Returns false when none is free
    /// after a single wait.
    pub async fn acquire(&self) -> bool {
        if self.inner.check().is_ok() {
            return true;
        }

        debug!(
            sleep_ms = self.saturation_sleep.as_millis() as u64,
            "Rate limit saturated, waiting"
        );
        tokio::time::sleep(self.saturation_sleep).await;

        if self.inner.check().is_ok() {
            return true;
        }

        warn!("Rate limit exhausted, skipping request");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rpm: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute: rpm,
            saturation_sleep_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_allows_up_to_quota() {
        let limiter = RateLimiter::new(&config(3));
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
    }

    #[tokio::test]
    async fn test_exhausted_after_quota() {
        let limiter = RateLimiter::new(&config(2));
        assert!(limiter.acquire().await);
        assert!(limiter.acquire().await);
        assert!(!limiter.acquire().await);
    }

    #[tokio::test]
    async fn test_zero_quota_falls_back_to_one() {
        let limiter = RateLimiter::new(&config(0));
        assert!(limiter.acquire().await);
        assert!(!limiter.acquire().await);
    }

    #[tokio::test]
    async fn test_clones_share_budget() {
        let limiter = RateLimiter::new(&config(1));
        let other = limiter.clone();
        assert!(limiter.acquire().await);
        assert!(!other.acquire().await);
    }
}
