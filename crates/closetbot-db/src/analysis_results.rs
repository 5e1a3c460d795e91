//! `analysis_results`: one row per influencer scored within a job.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisResultRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub influencer_profile_id: Uuid,
    pub similarity_score: i32,
    pub engagement_score: i32,
    pub category_score: i32,
    pub final_score: i32,
    pub grade: String,
    pub top_posts: Value,
    pub collab_signals: Value,
    pub common_hashtags: Value,
}

pub struct NewAnalysisResult<'a> {
    pub job_id: Uuid,
    pub influencer_profile_id: Uuid,
    pub similarity_score: i32,
    pub engagement_score: i32,
    pub category_score: i32,
    pub final_score: i32,
    pub grade: &'a str,
    pub top_posts: &'a Value,
    pub collab_signals: &'a Value,
    pub common_hashtags: &'a Value,
}

/// Inserts one scored influencer result for a job.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn insert_analysis_result(
    pool: &PgPool,
    result: NewAnalysisResult<'_>,
) -> Result<AnalysisResultRow, DbError> {
    Ok(sqlx::query_as::<_, AnalysisResultRow>(
        "INSERT INTO analysis_results \
           (job_id, influencer_profile_id, similarity_score, engagement_score, category_score, \
            final_score, grade, top_posts, collab_signals, common_hashtags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id, job_id, influencer_profile_id, similarity_score, engagement_score, \
                   category_score, final_score, grade, top_posts, collab_signals, common_hashtags",
    )
    .bind(result.job_id)
    .bind(result.influencer_profile_id)
    .bind(result.similarity_score)
    .bind(result.engagement_score)
    .bind(result.category_score)
    .bind(result.final_score)
    .bind(result.grade)
    .bind(result.top_posts)
    .bind(result.collab_signals)
    .bind(result.common_hashtags)
    .fetch_one(pool)
    .await?)
}

/// Lists every result for a job, ranked best-first by `final_score`.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn list_analysis_results_for_job(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<AnalysisResultRow>, DbError> {
    Ok(sqlx::query_as::<_, AnalysisResultRow>(
        "SELECT id, job_id, influencer_profile_id, similarity_score, engagement_score, \
                category_score, final_score, grade, top_posts, collab_signals, common_hashtags \
         FROM analysis_results WHERE job_id = $1 ORDER BY final_score DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?)
}
