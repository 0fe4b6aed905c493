//! Destination request throttling.
//!
//! Every destination call acquires a token first. The reconciler processes
//! one record at a time, so a blocking wait (rather than a queue) is
//! sufficient to stay under the destination's documented request ceiling.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token bucket guarding calls against the destination's rate ceiling.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    max_tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Take one token, or report how long until one is available.
    fn try_take(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(needed / self.refill_rate))
        }
    }
}

impl RateLimiter {
    /// Create a limiter with an explicit burst capacity and refill rate.
    #[must_use]
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: f64::from(capacity),
                max_tokens: f64::from(capacity),
                refill_rate: refill_per_sec.max(f64::MIN_POSITIVE),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Create a limiter for N requests per minute.
    #[must_use]
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, f64::from(requests_per_minute) / 60.0)
    }

    /// Try to acquire a token without waiting.
    pub async fn try_acquire(&self) -> bool {
        self.bucket.lock().await.try_take().is_ok()
    }

    /// Acquire a token, waiting if necessary.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.bucket.lock().await.try_take() {
                Ok(()) => return,
                Err(wait) => wait,
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Whole tokens currently available.
    pub async fn available(&self) -> u64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();
        bucket.tokens as u64
    }
}
