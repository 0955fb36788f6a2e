//! Outbound rate limiting for the upstream provider.
//!
//! One [`RateLimiter`] is shared by every operation that hits the same
//! provider, since the provider enforces a single aggregate quota.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{MapsError, Result};
use crate::token_bucket::TokenBucket;

#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimiter {
    /// `rate_per_second` is the sustained rate, `burst` the number of
    /// permits that can be banked. A burst of 0 is raised to 1, since a
    /// bucket that can never hold a token would never grant a permit.
    pub fn new(rate_per_second: u32, burst: u32) -> Self {
        let burst = burst.max(1);
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(burst, rate_per_second as f64))),
        }
    }

    /// Waits until a permit is available.
    ///
    /// Returns [`MapsError::RateLimitWaitCancelled`] as soon as `cancel` fires,
    /// including when it was already cancelled on entry.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(MapsError::RateLimitWaitCancelled);
            }

            let delay = self.bucket.lock().acquire_or_delay();
            let Some(delay) = delay else {
                return Ok(());
            };

            trace!(delay_ms = delay.as_millis() as u64, "Waiting for rate limit permit");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MapsError::RateLimitWaitCancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Takes a permit only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.bucket.lock().consume(1)
    }

    pub fn available_permits(&self) -> u32 {
        self.bucket.lock().available_tokens()
    }

    pub fn burst(&self) -> u32 {
        self.bucket.lock().capacity()
    }

    pub fn rate_per_second(&self) -> f64 {
        self.bucket.lock().refill_rate()
    }
}
