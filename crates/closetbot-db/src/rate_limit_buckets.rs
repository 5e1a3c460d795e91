//! `rate_limit_buckets`: the atomic, Postgres-backed token bucket.
//!
//! `try_acquire_tokens` is the one place the check-and-consume has to be a
//! true single atomic step rather than a load-then-store race, so it leans on
//! `SELECT ... FOR UPDATE` inside a transaction instead of the
//! status-guard-update pattern the job table uses.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketAcquireResult {
    pub granted: bool,
    pub tokens_remaining: f64,
}

#[derive(sqlx::FromRow)]
struct BucketState {
    tokens: f64,
    updated_at: DateTime<Utc>,
}

/// Attempts to consume `n` tokens from the named bucket, refilling it for
/// elapsed time first. Creates the bucket at full `capacity` on first use.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn try_acquire_tokens(
    pool: &PgPool,
    bucket_key: &str,
    n: f64,
    capacity: f64,
    refill_per_sec: f64,
) -> Result<BucketAcquireResult, DbError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, BucketState>(
        "SELECT tokens, updated_at FROM rate_limit_buckets WHERE bucket_key = $1 FOR UPDATE",
    )
    .bind(bucket_key)
    .fetch_optional(&mut *tx)
    .await?;

    let now = Utc::now();
    let tokens = match existing {
        Some(state) => {
            let elapsed = (now - state.updated_at).num_milliseconds().max(0) as f64 / 1000.0;
            (state.tokens + elapsed * refill_per_sec).min(capacity)
        }
        None => capacity,
    };

    let granted = tokens >= n;
    let tokens_remaining = if granted { tokens - n } else { tokens };

    sqlx::query(
        "INSERT INTO rate_limit_buckets (bucket_key, tokens, capacity, refill_per_sec, updated_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (bucket_key) DO UPDATE SET \
           tokens = EXCLUDED.tokens, capacity = EXCLUDED.capacity, \
           refill_per_sec = EXCLUDED.refill_per_sec, updated_at = EXCLUDED.updated_at",
    )
    .bind(bucket_key)
    .bind(tokens_remaining)
    .bind(capacity)
    .bind(refill_per_sec)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(BucketAcquireResult { granted, tokens_remaining })
}

/// Seconds to wait before `n` tokens would be available, given the bucket's
/// last known state. Used to populate `Retry-After` / backoff delays without
/// taking another lock.
#[must_use]
pub fn seconds_until_available(tokens: f64, n: f64, refill_per_sec: f64) -> f64 {
    if tokens >= n {
        return 0.0;
    }
    if refill_per_sec <= 0.0 {
        return f64::INFINITY;
    }
    ((n - tokens) / refill_per_sec).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_until_available_already_enough() {
        assert_eq!(seconds_until_available(5.0, 2.0, 1.0), 0.0);
    }

    #[test]
    fn seconds_until_available_rounds_up() {
        assert_eq!(seconds_until_available(0.0, 2.0, 0.5), 4.0);
        assert_eq!(seconds_until_available(1.5, 2.0, 1.0), 1.0);
    }

    #[test]
    fn seconds_until_available_zero_refill_never_arrives() {
        assert_eq!(seconds_until_available(0.0, 2.0, 0.0), f64::INFINITY);
    }
}
