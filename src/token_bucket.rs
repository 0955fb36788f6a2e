use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    pub fn consume(&mut self, tokens: u32) -> bool {
        self.refill();

        if self.tokens >= tokens as f64 {
            self.tokens -= tokens as f64;
            true
        } else {
            false
        }
    }

    /// Takes one token, or reports how long until one is available.
    pub fn acquire_or_delay(&mut self) -> Option<Duration> {
        if self.consume(1) {
            None
        } else {
            Some(self.time_until_available(1).unwrap_or(Duration::ZERO))
        }
    }

    pub fn available_tokens(&mut self) -> u32 {
        self.refill();
        self.tokens.floor() as u32
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);

        if elapsed >= Duration::from_millis(1) {
            let tokens_to_add = self.refill_rate * elapsed.as_secs_f64();
            self.tokens = (self.tokens + tokens_to_add).min(self.capacity as f64);
            self.last_refill = now;
        }
    }

    pub fn time_until_available(&mut self, required_tokens: u32) -> Option<Duration> {
        self.refill();

        if self.tokens >= required_tokens as f64 {
            return None;
        }

        if self.refill_rate <= 0.0 {
            return Some(Duration::MAX);
        }

        let tokens_needed = required_tokens as f64 - self.tokens;
        let seconds_to_wait = tokens_needed / self.refill_rate;

        // Never ask the caller to sleep for less than the refill granularity.
        Some(Duration::from_secs_f64(seconds_to_wait).max(Duration::from_millis(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_token_bucket_creation() {
        let bucket = TokenBucket::new(20, 10.0);
        assert_eq!(bucket.capacity(), 20);
        assert_eq!(bucket.refill_rate(), 10.0);
    }

    #[test]
    fn test_token_consumption() {
        let mut bucket = TokenBucket::new(10, 2.0);
        assert!(bucket.consume(5));
        assert_eq!(bucket.available_tokens(), 5);
        assert!(bucket.consume(5));
        assert_eq!(bucket.available_tokens(), 0);
        assert!(!bucket.consume(1));
    }

    #[test]
    fn test_capacity_overflow_prevention() {
        let mut bucket = TokenBucket::new(5, 1000.0);
        bucket.consume(3);

        thread::sleep(Duration::from_millis(10));

        assert_eq!(bucket.available_tokens(), 5);
    }

    #[test]
    fn test_delay_matches_refill_rate() {
        let mut bucket = TokenBucket::new(2, 10.0);
        assert_eq!(bucket.acquire_or_delay(), None);
        assert_eq!(bucket.acquire_or_delay(), None);

        let delay = bucket.acquire_or_delay().expect("bucket should be empty");
        assert!(delay <= Duration::from_millis(100));
        assert!(delay >= Duration::from_millis(90));
    }

    #[test]
    fn test_zero_refill_rate_never_refills() {
        let mut bucket = TokenBucket::new(1, 0.0);
        assert!(bucket.consume(1));
        assert_eq!(bucket.time_until_available(1), Some(Duration::MAX));
    }
}
