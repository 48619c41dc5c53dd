// In crates/api-client/src/rate_limit.rs

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Enforces a minimum spacing between requests sent through one client.
///
/// Callers queue on the lock, so concurrent requests are released one
/// interval apart in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.min_interval.is_zero()
    }

    /// Waits until the next request slot is free.
    pub async fn acquire(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next_slot {
            Some(at) if at > now => at,
            _ => now,
        };
        if slot > now {
            sleep_until(slot).await;
        }
        *next_slot = Some(slot + self.min_interval);
    }
}
