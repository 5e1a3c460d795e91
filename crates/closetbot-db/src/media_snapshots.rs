//! `media_snapshots`: one row per post seen while fetching a profile,
//! keyed by `(profile_id, profile_type, ig_media_id)` so repeated fetches
//! refresh the same row instead of accumulating duplicates.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::hashtag_aggregates::ProfileType;
use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaSnapshotRow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub profile_type: String,
    pub ig_media_id: String,
    pub caption: Option<String>,
    pub comments_count: i32,
    pub like_count: Option<i32>,
    pub media_type: Option<String>,
    pub permalink: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct NewMediaSnapshot<'a> {
    pub profile_id: Uuid,
    pub profile_type: ProfileType,
    pub ig_media_id: &'a str,
    pub caption: Option<&'a str>,
    pub comments_count: i32,
    pub like_count: Option<i32>,
    pub media_type: Option<&'a str>,
    pub permalink: Option<&'a str>,
    pub posted_at: Option<DateTime<Utc>>,
    pub retention_days: i64,
}

/// Insert or refresh a post snapshot for a profile.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn upsert_media_snapshot(pool: &PgPool, snapshot: NewMediaSnapshot<'_>) -> Result<MediaSnapshotRow, DbError> {
    let profile_type = match snapshot.profile_type {
        ProfileType::Brand => "brand",
        ProfileType::Influencer => "influencer",
    };

    Ok(sqlx::query_as::<_, MediaSnapshotRow>(
        "INSERT INTO media_snapshots \
           (profile_id, profile_type, ig_media_id, caption, comments_count, like_count, \
            media_type, permalink, posted_at, fetched_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now() + make_interval(days => $10)) \
         ON CONFLICT (profile_id, profile_type, ig_media_id) DO UPDATE SET \
           caption = EXCLUDED.caption, \
           comments_count = EXCLUDED.comments_count, \
           like_count = EXCLUDED.like_count, \
           media_type = EXCLUDED.media_type, \
           permalink = EXCLUDED.permalink, \
           posted_at = EXCLUDED.posted_at, \
           fetched_at = now(), \
           expires_at = now() + make_interval(days => $10) \
         RETURNING id, profile_id, profile_type, ig_media_id, caption, comments_count, like_count, \
                   media_type, permalink, posted_at, fetched_at, expires_at",
    )
    .bind(snapshot.profile_id)
    .bind(profile_type)
    .bind(snapshot.ig_media_id)
    .bind(snapshot.caption)
    .bind(snapshot.comments_count)
    .bind(snapshot.like_count)
    .bind(snapshot.media_type)
    .bind(snapshot.permalink)
    .bind(snapshot.posted_at)
    .bind(snapshot.retention_days as f64)
    .fetch_one(pool)
    .await?)
}

/// Lists the snapshots stored for a profile, most recently posted first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn list_media_snapshots_for_profile(
    pool: &PgPool,
    profile_id: Uuid,
    profile_type: ProfileType,
) -> Result<Vec<MediaSnapshotRow>, DbError> {
    let profile_type = match profile_type {
        ProfileType::Brand => "brand",
        ProfileType::Influencer => "influencer",
    };
    Ok(sqlx::query_as::<_, MediaSnapshotRow>(
        "SELECT id, profile_id, profile_type, ig_media_id, caption, comments_count, like_count, \
                media_type, permalink, posted_at, fetched_at, expires_at \
         FROM media_snapshots WHERE profile_id = $1 AND profile_type = $2 \
         ORDER BY posted_at DESC NULLS LAST",
    )
    .bind(profile_id)
    .bind(profile_type)
    .fetch_all(pool)
    .await?)
}

/// Deletes snapshots whose retention window has passed.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn delete_expired_media_snapshots(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM media_snapshots WHERE expires_at IS NOT NULL AND expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
