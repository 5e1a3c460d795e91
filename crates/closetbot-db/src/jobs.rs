//! `analysis_jobs` rows and the queued -> running -> {done, failed} state machine.
//!
//! Status transitions are guarded with `UPDATE ... WHERE status = $expected` and a
//! `rows_affected() == 0` check, the same pattern the teacher uses for
//! `collection_runs` — it makes the move atomic without a row lock.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub brand_profile_id: Option<Uuid>,
    pub influencer_usernames: Value,
    pub status: String,
    pub api_calls_used: i32,
    pub api_calls_estimated: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct NewJob<'a> {
    pub influencer_handles: &'a [String],
    pub api_calls_estimated: i32,
}

/// Inserts a new `queued` job row with the influencer handle list. The brand
/// handle itself is not a job column — the caller holds onto it to pass to the
/// executor directly, and only the resolved `brand_profile_id` lands on the
/// row, once [`mark_job_done`] links it.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn create_job(pool: &PgPool, new_job: NewJob<'_>) -> Result<JobRow, DbError> {
    let influencer_usernames = serde_json::to_value(new_job.influencer_handles).unwrap_or(Value::Array(vec![]));
    Ok(sqlx::query_as::<_, JobRow>(
        "INSERT INTO analysis_jobs (influencer_usernames, status, api_calls_estimated) \
         VALUES ($1, $3, $2) \
         RETURNING id, brand_profile_id, influencer_usernames, status, api_calls_used, \
                   api_calls_estimated, error_message, started_at, finished_at, created_at, expires_at",
    )
    .bind(influencer_usernames)
    .bind(new_job.api_calls_estimated)
    .bind(JobStatus::Queued)
    .fetch_one(pool)
    .await?)
}

/// Fetch a job by id.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobRow>, DbError> {
    Ok(sqlx::query_as::<_, JobRow>(
        "SELECT id, brand_profile_id, influencer_usernames, status, api_calls_used, \
                api_calls_estimated, error_message, started_at, finished_at, created_at, expires_at \
         FROM analysis_jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?)
}

/// Transitions a job `queued -> running`, setting `started_at`. Returns `false`
/// (no error) if the job was not in `queued` — the caller should treat that as
/// "someone else already claimed it".
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn mark_job_running(pool: &PgPool, job_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE analysis_jobs SET status = $2, started_at = now() \
         WHERE id = $1 AND status = $3",
    )
    .bind(job_id)
    .bind(JobStatus::Running)
    .bind(JobStatus::Queued)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Transitions a job `running -> done`, setting `finished_at` and (optionally)
/// `api_calls_used`, and linking the resolved `brand_profile_id`.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn mark_job_done(
    pool: &PgPool,
    job_id: Uuid,
    brand_profile_id: Uuid,
    api_calls_used: i32,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE analysis_jobs \
         SET status = $2, finished_at = now(), brand_profile_id = $3, api_calls_used = $4 \
         WHERE id = $1 AND status = $5",
    )
    .bind(job_id)
    .bind(JobStatus::Done)
    .bind(brand_profile_id)
    .bind(api_calls_used)
    .bind(JobStatus::Running)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Transitions a job to `failed`, recording a short `error_message`. Works from
/// either `queued` or `running` since a job can fail before the brand fetch ever
/// flips it to `running`.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn mark_job_failed(pool: &PgPool, job_id: Uuid, error_message: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE analysis_jobs SET status = $2, finished_at = now(), error_message = $3 \
         WHERE id = $1 AND (status = $4 OR status = $5)",
    )
    .bind(job_id)
    .bind(JobStatus::Failed)
    .bind(error_message)
    .bind(JobStatus::Queued)
    .bind(JobStatus::Running)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
