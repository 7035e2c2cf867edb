//! Per-client token-bucket rate limiter (C5). Each client id gets its own
//! entry behind a per-entry mutex; the registry itself lives behind a single
//! `tokio::sync::Mutex`-guarded map, mirroring the shape the base repo uses
//! for its per-key cursor response cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct Outcome {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after_secs: f64,
}

pub struct RateLimiter {
    capacity: f64,
    refill_rate_per_sec: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(capacity: f64, refill_rate_per_sec: f64) -> Self {
        RateLimiter {
            capacity,
            refill_rate_per_sec,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Refills then attempts to take one token for `client_id`. Entries are
    /// created lazily on first request.
    pub fn is_allowed(&self, client_id: &str) -> Outcome {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        let bucket = buckets.entry(client_id.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Outcome {
                allowed: true,
                remaining: bucket.tokens.floor() as u64,
                retry_after_secs: 0.0,
            }
        } else {
            let retry_after_secs = (1.0 - bucket.tokens) / self.refill_rate_per_sec;
            Outcome {
                allowed: false,
                remaining: 0,
                retry_after_secs,
            }
        }
    }

    /// Drops entries that have not refilled in `idle_secs`, bounding memory
    /// growth across many distinct clients over the process lifetime.
    pub fn garbage_collect(&self, idle_secs: u64) {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        buckets.retain(|_, b| now.duration_since(b.last_refill).as_secs() < idle_secs);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(
            crate::constants::DEFAULT_RATE_LIMIT_CAPACITY,
            crate::constants::DEFAULT_RATE_LIMIT_REFILL_PER_SEC,
        )
    }
}
