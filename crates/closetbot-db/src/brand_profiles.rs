//! `brand_profiles`: upsert-by-handle, read-back for the orchestrator and the API.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandProfileRow {
    pub id: Uuid,
    pub ig_username: String,
    pub name: Option<String>,
    pub followers_count: i32,
    pub media_count: i32,
    pub biography: Option<String>,
    pub profile_picture_url: Option<String>,
    pub categories: Value,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct UpsertBrandProfile<'a> {
    pub handle: &'a str,
    pub name: Option<&'a str>,
    pub followers_count: i32,
    pub media_count: i32,
    pub biography: Option<&'a str>,
    pub profile_picture_url: Option<&'a str>,
    pub categories: &'a [String],
    pub retention_days: i64,
}

/// Insert or refresh a brand profile, keyed by the lowercased handle.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn upsert_brand_profile(pool: &PgPool, profile: UpsertBrandProfile<'_>) -> Result<BrandProfileRow, DbError> {
    let categories = serde_json::to_value(profile.categories).unwrap_or(Value::Array(vec![]));
    let handle = profile.handle.trim().to_lowercase();

    Ok(sqlx::query_as::<_, BrandProfileRow>(
        "INSERT INTO brand_profiles \
           (ig_username, name, followers_count, media_count, biography, profile_picture_url, \
            categories, last_fetched_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now() + make_interval(days => $8)) \
         ON CONFLICT (ig_username) DO UPDATE SET \
           name = EXCLUDED.name, \
           followers_count = EXCLUDED.followers_count, \
           media_count = EXCLUDED.media_count, \
           biography = EXCLUDED.biography, \
           profile_picture_url = EXCLUDED.profile_picture_url, \
           categories = EXCLUDED.categories, \
           last_fetched_at = now(), \
           expires_at = now() + make_interval(days => $8) \
         RETURNING id, ig_username, name, followers_count, media_count, biography, \
                   profile_picture_url, categories, last_fetched_at, created_at, expires_at",
    )
    .bind(handle)
    .bind(profile.name)
    .bind(profile.followers_count)
    .bind(profile.media_count)
    .bind(profile.biography)
    .bind(profile.profile_picture_url)
    .bind(categories)
    .bind(profile.retention_days as f64)
    .fetch_one(pool)
    .await?)
}

/// Deletes brand profiles whose retention window has passed.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn delete_expired_brand_profiles(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM brand_profiles WHERE expires_at IS NOT NULL AND expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Look up a brand profile by its lowercased handle.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_brand_profile_by_handle(pool: &PgPool, handle: &str) -> Result<Option<BrandProfileRow>, DbError> {
    let handle = handle.trim().to_lowercase();
    Ok(sqlx::query_as::<_, BrandProfileRow>(
        "SELECT id, ig_username, name, followers_count, media_count, biography, \
                profile_picture_url, categories, last_fetched_at, created_at, expires_at \
         FROM brand_profiles WHERE ig_username = $1",
    )
    .bind(handle)
    .fetch_optional(pool)
    .await?)
}
