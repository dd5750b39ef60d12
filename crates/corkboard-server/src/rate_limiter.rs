// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by caller identity (client IP here).
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub async fn allow(&self, key: &str, cfg: &RateLimitConfig) -> bool {
        let now = Instant::now();
        let mut lock = self.buckets.lock().await;
        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + (elapsed * cfg.refill_per_sec)).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_drains_then_refuses() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 0.0,
        };
        assert!(limiter.allow("1.2.3.4", &cfg).await);
        assert!(limiter.allow("1.2.3.4", &cfg).await);
        assert!(!limiter.allow("1.2.3.4", &cfg).await);
        // A different caller has its own bucket.
        assert!(limiter.allow("5.6.7.8", &cfg).await);
    }
}
