//! Rate limiting for the admin bridge

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Admin messages accepted per connection per second
pub const ADMIN_MESSAGE_RATE_LIMIT: u32 = 10;

/// Per-connection admin message limiter
#[derive(Clone)]
pub struct AdminRateLimiter {
    message_limiter: Arc<Limiter>,
}

impl AdminRateLimiter {
    pub fn new() -> Self {
        Self::with_rate(ADMIN_MESSAGE_RATE_LIMIT)
    }

    pub fn with_rate(per_second: u32) -> Self {
        Self {
            message_limiter: create_limiter(per_second),
        }
    }

    /// Check if an admin message is allowed (returns true if allowed)
    pub fn check_message(&self) -> bool {
        self.message_limiter.check().is_ok()
    }
}

impl Default for AdminRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_quota_is_refused() {
        let limiter = AdminRateLimiter::with_rate(3);
        let allowed = (0..10).filter(|_| limiter.check_message()).count();
        assert_eq!(allowed, 3);
    }
}
