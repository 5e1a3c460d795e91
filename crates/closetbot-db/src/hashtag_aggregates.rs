//! `hashtag_aggregates`: per-profile, per-hashtag running counts.
//!
//! Present in the schema for forward compatibility; the analysis pipeline does
//! not populate it today (matches the system this spec was distilled from —
//! see the open questions in `DESIGN.md`). Kept here so a future aggregation
//! pass has somewhere to write.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Which kind of profile a hashtag aggregate row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Brand,
    Influencer,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HashtagAggregateRow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub profile_type: String,
    pub hashtag: String,
    pub count: i32,
    pub updated_at: DateTime<Utc>,
}

/// Increments the count for `(profile_id, profile_type, hashtag)` by `delta`,
/// inserting a new row at `delta` if none exists yet.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn upsert_hashtag_aggregate(
    pool: &PgPool,
    profile_id: Uuid,
    profile_type: ProfileType,
    hashtag: &str,
    delta: i32,
) -> Result<HashtagAggregateRow, DbError> {
    let profile_type = match profile_type {
        ProfileType::Brand => "brand",
        ProfileType::Influencer => "influencer",
    };
    Ok(sqlx::query_as::<_, HashtagAggregateRow>(
        "INSERT INTO hashtag_aggregates (profile_id, profile_type, hashtag, count, updated_at) \
         VALUES ($1, $2, $3, $4, now()) \
         ON CONFLICT (profile_id, profile_type, hashtag) \
         DO UPDATE SET count = hashtag_aggregates.count + $4, updated_at = now() \
         RETURNING id, profile_id, profile_type, hashtag, count, updated_at",
    )
    .bind(profile_id)
    .bind(profile_type)
    .bind(hashtag)
    .bind(delta)
    .fetch_one(pool)
    .await?)
}
