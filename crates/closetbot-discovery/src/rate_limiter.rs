//! Process-wide token bucket guarding calls into the discovery API.
//!
//! The shared bucket lives in Postgres (`closetbot_db::rate_limit_buckets`),
//! locked with `SELECT ... FOR UPDATE` so concurrent workers consume from one
//! source of truth. If the pool is unreachable the limiter falls back to an
//! in-process bucket guarded by a `tokio::sync::Mutex`, logging a warning —
//! correctness then holds only within this one process.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitOutcome {
    pub granted: bool,
    pub retry_after_secs: u64,
}

struct LocalBucket {
    tokens: f64,
    last_refill: std::time::Instant,
}

pub struct RateLimiter {
    pool: PgPool,
    bucket_key: String,
    capacity: f64,
    window_secs: f64,
    local_fallback: Mutex<LocalBucket>,
}

impl RateLimiter {
    /// `capacity` tokens refill fully every `window_secs` seconds, e.g.
    /// `capacity=180.0, window_secs=3600.0` for 180 tokens/hour.
    #[must_use]
    pub fn new(pool: PgPool, bucket_key: impl Into<String>, capacity: f64, window_secs: f64) -> Self {
        Self {
            pool,
            bucket_key: bucket_key.into(),
            capacity,
            window_secs,
            local_fallback: Mutex::new(LocalBucket { tokens: capacity, last_refill: std::time::Instant::now() }),
        }
    }

    fn refill_per_sec(&self) -> f64 {
        self.capacity / self.window_secs
    }

    /// Attempts to acquire `n` tokens without blocking.
    pub async fn try_acquire(&self, n: f64) -> RateLimitOutcome {
        match closetbot_db::try_acquire_tokens(&self.pool, &self.bucket_key, n, self.capacity, self.refill_per_sec()).await {
            Ok(result) => RateLimitOutcome {
                granted: result.granted,
                retry_after_secs: closetbot_db::seconds_until_available(result.tokens_remaining, n, self.refill_per_sec())
                    .ceil() as u64,
            },
            Err(err) => {
                tracing::warn!(error = %err, "rate limiter store unreachable, falling back to local bucket");
                self.try_acquire_local(n).await
            }
        }
    }

    async fn try_acquire_local(&self, n: f64) -> RateLimitOutcome {
        let mut bucket = self.local_fallback.lock().await;
        let elapsed = bucket.last_refill.elapsed().as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec()).min(self.capacity);
        bucket.last_refill = std::time::Instant::now();

        if bucket.tokens >= n {
            bucket.tokens -= n;
            RateLimitOutcome { granted: true, retry_after_secs: 0 }
        } else {
            let retry_after = ((n - bucket.tokens) / self.refill_per_sec()).ceil() as u64;
            RateLimitOutcome { granted: false, retry_after_secs: retry_after }
        }
    }

    /// Acquires `n` tokens, blocking and retrying until granted or (if
    /// `timeout` is set) the deadline passes. Each retry sleeps
    /// `min(retry_after, 10s)`.
    ///
    /// Returns `false` if the timeout elapsed without acquiring.
    pub async fn acquire_blocking(&self, n: f64, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| std::time::Instant::now() + t);
        loop {
            let outcome = self.try_acquire(n).await;
            if outcome.granted {
                return true;
            }
            if let Some(deadline) = deadline {
                if std::time::Instant::now() >= deadline {
                    return false;
                }
            }
            let sleep_for = Duration::from_secs(outcome.retry_after_secs).min(Duration::from_secs(10));
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_bucket_grants_then_denies_at_capacity() {
        let pool = PgPool::connect_lazy("postgres://invalid-host-for-tests/db").unwrap();
        let limiter = RateLimiter::new(pool, "test:local", 2.0, 3600.0);

        let first = limiter.try_acquire_local(1.0).await;
        assert!(first.granted);
        let second = limiter.try_acquire_local(1.0).await;
        assert!(second.granted);
        let third = limiter.try_acquire_local(1.0).await;
        assert!(!third.granted);
        assert!(third.retry_after_secs > 0);
    }
}
