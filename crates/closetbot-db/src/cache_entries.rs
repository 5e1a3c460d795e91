//! `cache_entries`: the two-tier cache's Postgres-backed tier.
//!
//! Keys are namespaced by the caller (`ig:profile:<handle>`, `ig:media:<handle>`)
//! — this module treats `cache_key` as an opaque string and doesn't know about
//! namespaces at all.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CacheEntryRow {
    pub cache_key: String,
    pub value: Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Reads a cache entry if present and not expired. Expired rows are treated
/// as a miss rather than eagerly deleted here.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_cache_entry(pool: &PgPool, cache_key: &str) -> Result<Option<Value>, DbError> {
    let row = sqlx::query_as::<_, CacheEntryRow>(
        "SELECT cache_key, value, expires_at, created_at FROM cache_entries \
         WHERE cache_key = $1 AND expires_at > now()",
    )
    .bind(cache_key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.value))
}

/// Inserts or replaces a cache entry with a TTL in seconds.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn upsert_cache_entry(
    pool: &PgPool,
    cache_key: &str,
    value: &Value,
    ttl_seconds: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO cache_entries (cache_key, value, expires_at, created_at) \
         VALUES ($1, $2, now() + make_interval(secs => $3), now()) \
         ON CONFLICT (cache_key) DO UPDATE SET \
           value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
    )
    .bind(cache_key)
    .bind(value)
    .bind(ttl_seconds as f64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deletes a single cache entry, e.g. on explicit invalidation.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn delete_cache_entry(pool: &PgPool, cache_key: &str) -> Result<(), DbError> {
    sqlx::query("DELETE FROM cache_entries WHERE cache_key = $1")
        .bind(cache_key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes every expired row, returning the number removed. Intended for a
/// periodic sweep rather than the request path.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn purge_expired_cache_entries(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Counts live (unexpired) entries whose key starts with `prefix`, e.g.
/// `"ig:profile:"`. Backs the per-namespace cache stats the discovery layer
/// reports.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn count_cache_entries_by_prefix(pool: &PgPool, prefix: &str) -> Result<i64, DbError> {
    let pattern = format!("{prefix}%");
    let count: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM cache_entries WHERE cache_key LIKE $1 AND expires_at > now()",
    )
    .bind(pattern)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
