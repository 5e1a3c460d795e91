//! `influencer_profiles`: upsert-by-handle, including basis-point engagement rate.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InfluencerProfileRow {
    pub id: Uuid,
    pub ig_username: String,
    pub name: Option<String>,
    pub followers_count: i32,
    pub follows_count: i32,
    pub media_count: i32,
    pub biography: Option<String>,
    pub profile_picture_url: Option<String>,
    pub categories: Value,
    pub avg_engagement_rate: Option<i32>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct UpsertInfluencerProfile<'a> {
    pub handle: &'a str,
    pub name: Option<&'a str>,
    pub followers_count: i32,
    pub follows_count: i32,
    pub media_count: i32,
    pub biography: Option<&'a str>,
    pub profile_picture_url: Option<&'a str>,
    pub categories: &'a [String],
    /// Average engagement rate in integer basis points (e.g. `520` = `5.20%`).
    pub avg_engagement_rate_bps: i32,
    pub retention_days: i64,
}

/// Insert or refresh an influencer profile, keyed by the lowercased handle.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn upsert_influencer_profile(
    pool: &PgPool,
    profile: UpsertInfluencerProfile<'_>,
) -> Result<InfluencerProfileRow, DbError> {
    let categories = serde_json::to_value(profile.categories).unwrap_or(Value::Array(vec![]));
    let handle = profile.handle.trim().to_lowercase();

    Ok(sqlx::query_as::<_, InfluencerProfileRow>(
        "INSERT INTO influencer_profiles \
           (ig_username, name, followers_count, follows_count, media_count, biography, \
            profile_picture_url, categories, avg_engagement_rate, last_fetched_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now() + make_interval(days => $10)) \
         ON CONFLICT (ig_username) DO UPDATE SET \
           name = EXCLUDED.name, \
           followers_count = EXCLUDED.followers_count, \
           follows_count = EXCLUDED.follows_count, \
           media_count = EXCLUDED.media_count, \
           biography = EXCLUDED.biography, \
           profile_picture_url = EXCLUDED.profile_picture_url, \
           categories = EXCLUDED.categories, \
           avg_engagement_rate = EXCLUDED.avg_engagement_rate, \
           last_fetched_at = now(), \
           expires_at = now() + make_interval(days => $10) \
         RETURNING id, ig_username, name, followers_count, follows_count, media_count, biography, \
                   profile_picture_url, categories, avg_engagement_rate, last_fetched_at, created_at, expires_at",
    )
    .bind(handle)
    .bind(profile.name)
    .bind(profile.followers_count)
    .bind(profile.follows_count)
    .bind(profile.media_count)
    .bind(profile.biography)
    .bind(profile.profile_picture_url)
    .bind(categories)
    .bind(profile.avg_engagement_rate_bps)
    .bind(profile.retention_days as f64)
    .fetch_one(pool)
    .await?)
}

/// Deletes influencer profiles whose retention window has passed.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn delete_expired_influencer_profiles(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM influencer_profiles WHERE expires_at IS NOT NULL AND expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Look up an influencer profile by id, for joining against `analysis_results`.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_influencer_profile_by_id(pool: &PgPool, id: Uuid) -> Result<Option<InfluencerProfileRow>, DbError> {
    Ok(sqlx::query_as::<_, InfluencerProfileRow>(
        "SELECT id, ig_username, name, followers_count, follows_count, media_count, biography, \
                profile_picture_url, categories, avg_engagement_rate, last_fetched_at, created_at, expires_at \
         FROM influencer_profiles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

/// Look up an influencer profile by its lowercased handle.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_influencer_profile_by_handle(
    pool: &PgPool,
    handle: &str,
) -> Result<Option<InfluencerProfileRow>, DbError> {
    let handle = handle.trim().to_lowercase();
    Ok(sqlx::query_as::<_, InfluencerProfileRow>(
        "SELECT id, ig_username, name, followers_count, follows_count, media_count, biography, \
                profile_picture_url, categories, avg_engagement_rate, last_fetched_at, created_at, expires_at \
         FROM influencer_profiles WHERE ig_username = $1",
    )
    .bind(handle)
    .fetch_optional(pool)
    .await?)
}
