//! Upload rate limiting.
//!
//! A keyed governor limiter: each client may burst up to the configured number
//! of uploads, refilled evenly across the window. Idle client state is removed
//! only by [`UploadRateLimiter::evict_expired`], which `main` drives from a
//! periodic task.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::debug;

/// Type alias for governor's keyed rate limiter, one bucket per client.
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Returned when a client has used up its allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

pub struct UploadRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    window: Duration,
}

impl UploadRateLimiter {
    /// Allows `max_uploads` per `window` for each client key.
    pub fn new(max_uploads: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_uploads).unwrap_or(NonZeroU32::MIN);
        let window = window.max(Duration::from_millis(1));
        // One upload is replenished every window / burst
        let period = (window / burst.get()).max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_minute(burst));

        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one upload for `key`, or reports how long until it may retry.
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| RateLimited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            })
    }

    /// Drops clients whose bucket has fully refilled. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        let remaining = self.limiter.len();
        let evicted = before.saturating_sub(remaining);
        if evicted > 0 {
            debug!(evicted, remaining, "Evicted idle rate-limit clients");
        }
        evicted
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = UploadRateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("1.2.3.4").is_ok());

        let err = limiter.check("1.2.3.4").unwrap_err();
        assert!(err.retry_after > Duration::ZERO);
        assert!(err.retry_after <= Duration::from_secs(60));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = UploadRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert!(limiter.check("a").is_err());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_allowance_refills_after_window() {
        let limiter = UploadRateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());

        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_evict_expired_only_removes_idle_clients() {
        let limiter = UploadRateLimiter::new(1, Duration::from_millis(50));
        limiter.check("old").unwrap();
        std::thread::sleep(Duration::from_millis(80));
        limiter.check("fresh").unwrap();

        assert_eq!(limiter.evict_expired(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_zero_limit_still_admits_one() {
        let limiter = UploadRateLimiter::new(0, Duration::ZERO);
        assert!(limiter.check("a").is_ok());
    }
}
