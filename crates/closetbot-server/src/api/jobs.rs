//! `POST /api/v1/jobs`, `GET /api/v1/jobs/{id}`, `GET /api/v1/jobs/{id}/results`.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use closetbot_db::analysis_results::list_analysis_results_for_job;
use closetbot_db::influencer_profiles::get_influencer_profile_by_id;
use closetbot_db::jobs::{create_job as insert_job, get_job, JobStatus, NewJob};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

const MAX_INFLUENCERS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub brand_username: String,
    pub influencer_usernames: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub estimated_completion_minutes: f64,
}

fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Accepts a new analysis job and hands it to the background dispatcher.
///
/// # Errors
///
/// Returns `validation_error` (400) if `influencer_usernames` is empty or
/// has more than [`MAX_INFLUENCERS`] entries, and `internal_error` (500) if
/// the job row cannot be inserted.
pub async fn create_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<CreateJobResponse>>), ApiError> {
    let brand_handle = normalize_handle(&payload.brand_username);
    let influencer_handles: Vec<String> = payload.influencer_usernames.iter().map(|h| normalize_handle(h)).collect();

    if influencer_handles.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "influencer_usernames must not be empty"));
    }
    if influencer_handles.len() > MAX_INFLUENCERS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("influencer_usernames must not exceed {MAX_INFLUENCERS} entries"),
        ));
    }
    if brand_handle.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "brand_username must not be empty"));
    }

    let api_calls_estimated = i32::try_from(influencer_handles.len() + 1).unwrap_or(i32::MAX);
    let job = insert_job(&state.pool, NewJob { influencer_handles: &influencer_handles, api_calls_estimated })
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    state.dispatcher.spawn(job.id, brand_handle);

    let estimated_completion_minutes = (influencer_handles.len() as f64 + 1.0) * 0.5;

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: CreateJobResponse {
                job_id: job.id,
                status: JobStatus::Queued.as_str(),
                created_at: job.created_at,
                estimated_completion_minutes,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: String,
    pub progress: u8,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

fn synthetic_progress(status: &str) -> u8 {
    if status == JobStatus::Queued.as_str() {
        0
    } else if status == JobStatus::Running.as_str() {
        50
    } else {
        100
    }
}

/// Returns a job's current status with a synthetic progress percentage.
///
/// # Errors
///
/// Returns `not_found` (404) if no job with `job_id` exists.
pub async fn get_job_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let job = get_job(&state.pool, job_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "job not found"))?;

    Ok(Json(ApiResponse {
        data: JobStatusResponse {
            job_id: job.id,
            progress: synthetic_progress(&job.status),
            status: job.status,
            error_message: job.error_message,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub struct JobResultItem {
    pub influencer_username: String,
    pub followers_count: i32,
    pub similarity_score: i32,
    pub engagement_score: i32,
    pub category_score: i32,
    pub final_score: i32,
    pub grade: String,
    pub top_posts: Value,
    pub collab_signals: Value,
    pub common_hashtags: Value,
}

/// Returns a job's ranked results, best match first.
///
/// # Errors
///
/// Returns `not_found` (404) if the job doesn't exist or hasn't finished yet
/// (`status != "done"`).
pub async fn get_job_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<JobResultItem>>>, ApiError> {
    let job = get_job(&state.pool, job_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "job not found"))?;

    if job.status != JobStatus::Done.as_str() {
        return Err(ApiError::new(req_id.0, "not_found", "job has not finished yet"));
    }

    let rows = list_analysis_results_for_job(&state.pool, job_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let influencer = get_influencer_profile_by_id(&state.pool, row.influencer_profile_id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
        let (influencer_username, followers_count) =
            influencer.map_or_else(|| ("unknown".to_string(), 0), |p| (p.ig_username, p.followers_count));

        items.push(JobResultItem {
            influencer_username,
            followers_count,
            similarity_score: row.similarity_score,
            engagement_score: row.engagement_score,
            category_score: row.category_score,
            final_score: row.final_score,
            grade: row.grade,
            top_posts: row.top_posts,
            collab_signals: row.collab_signals,
            common_hashtags: row.common_hashtags,
        });
    }

    Ok(Json(ApiResponse { data: items, meta: ResponseMeta::new(req_id.0) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_progress_maps_known_statuses() {
        assert_eq!(synthetic_progress("queued"), 0);
        assert_eq!(synthetic_progress("running"), 50);
        assert_eq!(synthetic_progress("done"), 100);
        assert_eq!(synthetic_progress("failed"), 100);
    }

    #[test]
    fn normalize_handle_trims_and_lowercases() {
        assert_eq!(normalize_handle("  BrandX "), "brandx");
    }
}
