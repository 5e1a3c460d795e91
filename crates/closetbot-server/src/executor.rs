//! Runs one analysis job end to end: fetch the brand, score each influencer
//! against it, and persist results.
//!
//! Per-influencer failures are partial — a terminal error or an exhausted
//! retry budget on one influencer skips that influencer and the job
//! continues with the rest. Only a failure fetching the brand itself, or a
//! database error while recording outcomes, fails the whole job.

use std::time::Duration;

use closetbot_core::AppConfig;
use closetbot_db::analysis_results::{insert_analysis_result, NewAnalysisResult};
use closetbot_db::brand_profiles::{upsert_brand_profile, UpsertBrandProfile};
use closetbot_db::hashtag_aggregates::ProfileType;
use closetbot_db::influencer_profiles::{upsert_influencer_profile, UpsertInfluencerProfile};
use closetbot_db::jobs::{mark_job_done, mark_job_failed, mark_job_running, JobRow};
use closetbot_db::media_snapshots::{upsert_media_snapshot, NewMediaSnapshot};
use closetbot_db::DbError;
use closetbot_discovery::{Discovery, RetryPolicy};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::orchestrator::{analyze_brand, analyze_influencer, InfluencerAnalysis, MediaSnapshotOut};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
}

/// Runs `job` to completion under its configured wall-clock limit.
///
/// Returns `Ok(())` for every outcome the job status itself can represent —
/// including a failed brand fetch, which is recorded via
/// [`mark_job_failed`] rather than propagated. Only a [`DbError`] while
/// recording that outcome surfaces as [`ExecutorError`], since at that point
/// the job may be stuck `running` and worth a dispatch-level retry.
///
/// # Errors
///
/// Returns [`ExecutorError::Db`] if a database operation fails while
/// transitioning or recording the job's state.
pub async fn execute_job(
    pool: &PgPool,
    discovery: &Discovery,
    config: &AppConfig,
    job: &JobRow,
    brand_handle: &str,
) -> Result<(), ExecutorError> {
    if !mark_job_running(pool, job.id).await? {
        tracing::warn!(job_id = %job.id, "job was not queued, skipping dispatch");
        return Ok(());
    }

    let wall_clock = Duration::from_secs(config.job_wall_clock_limit_secs);
    match tokio::time::timeout(wall_clock, run_job_body(pool, discovery, config, job, brand_handle)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(message)) => {
            mark_job_failed(pool, job.id, &message).await?;
            Ok(())
        }
        Err(_) => {
            tracing::error!(job_id = %job.id, limit_secs = config.job_wall_clock_limit_secs, "job exceeded its wall-clock limit");
            mark_job_failed(pool, job.id, "job exceeded its wall-clock time limit").await?;
            Ok(())
        }
    }
}

async fn run_job_body(
    pool: &PgPool,
    discovery: &Discovery,
    config: &AppConfig,
    job: &JobRow,
    brand_handle: &str,
) -> Result<(), String> {
    let policy = RetryPolicy::profile_fetch();
    let retention_days = i64::from(config.data_retention_days);
    let mut api_calls_used = 0_i32;

    let (brand, brand_live_call) = analyze_brand(discovery, brand_handle, policy)
        .await
        .map_err(|e| format!("brand fetch failed: {e}"))?;
    if brand_live_call {
        api_calls_used += 1;
    }

    let brand_row = upsert_brand_profile(
        pool,
        UpsertBrandProfile {
            handle: &brand.handle,
            name: None,
            followers_count: brand.followers_count,
            media_count: brand.media_count,
            biography: brand.biography.as_deref(),
            profile_picture_url: None,
            categories: &brand.categories,
            retention_days,
        },
    )
    .await
    .map_err(|e| format!("failed to persist brand profile: {e}"))?;

    if let Err(e) = persist_media_snapshots(pool, brand_row.id, ProfileType::Brand, &brand.media_snapshots, retention_days).await {
        tracing::error!(handle = %brand.handle, error = %e, "failed to persist brand media snapshots");
    }

    let influencer_handles: Vec<String> = serde_json::from_value(job.influencer_usernames.clone()).unwrap_or_default();

    for handle in &influencer_handles {
        match analyze_influencer(discovery, handle, &brand, policy).await {
            Ok((analysis, live_call)) => {
                if live_call {
                    api_calls_used += 1;
                }
                if let Err(e) = persist_influencer_result(pool, job.id, &analysis, retention_days).await {
                    tracing::error!(handle, error = %e, "failed to persist influencer result, skipping");
                }
            }
            Err(e) if e.is_terminal() => {
                tracing::warn!(handle, error = %e, "influencer fetch failed terminally, skipping");
            }
            Err(e) => {
                tracing::error!(handle, error = %e, "influencer fetch exhausted retries, skipping");
            }
        }
    }

    mark_job_done(pool, job.id, brand_row.id, api_calls_used)
        .await
        .map_err(|e| format!("failed to mark job done: {e}"))?;

    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
async fn persist_media_snapshots(
    pool: &PgPool,
    profile_id: Uuid,
    profile_type: ProfileType,
    snapshots: &[MediaSnapshotOut],
    retention_days: i64,
) -> Result<(), DbError> {
    for snapshot in snapshots {
        upsert_media_snapshot(
            pool,
            NewMediaSnapshot {
                profile_id,
                profile_type,
                ig_media_id: &snapshot.media_id,
                caption: snapshot.caption.as_deref(),
                comments_count: snapshot.comments_count as i32,
                like_count: snapshot.like_count.map(|v| v as i32),
                media_type: snapshot.media_type.as_deref(),
                permalink: snapshot.permalink.as_deref(),
                posted_at: snapshot.posted_at,
                retention_days,
            },
        )
        .await?;
    }
    Ok(())
}

async fn persist_influencer_result(
    pool: &PgPool,
    job_id: Uuid,
    analysis: &InfluencerAnalysis,
    retention_days: i64,
) -> Result<(), DbError> {
    let avg_rate_bps = (analysis.avg_engagement_rate * 100.0).round() as i32;

    let influencer_row = upsert_influencer_profile(
        pool,
        UpsertInfluencerProfile {
            handle: &analysis.handle,
            name: analysis.name.as_deref(),
            followers_count: analysis.followers_count,
            follows_count: analysis.follows_count,
            media_count: analysis.media_count,
            biography: analysis.biography.as_deref(),
            profile_picture_url: analysis.profile_picture_url.as_deref(),
            categories: &analysis.categories,
            avg_engagement_rate_bps: avg_rate_bps,
            retention_days,
        },
    )
    .await?;

    persist_media_snapshots(pool, influencer_row.id, ProfileType::Influencer, &analysis.media_snapshots, retention_days).await?;

    let top_posts = serde_json::to_value(&analysis.top_posts).unwrap_or(Value::Array(vec![]));
    let collab_signals = serde_json::to_value(&analysis.collab_signals).unwrap_or(Value::Array(vec![]));
    let common_hashtags = serde_json::to_value(&analysis.common_hashtags).unwrap_or(Value::Array(vec![]));

    insert_analysis_result(
        pool,
        NewAnalysisResult {
            job_id,
            influencer_profile_id: influencer_row.id,
            similarity_score: round_score(analysis.similarity_score),
            engagement_score: round_score(analysis.engagement_score),
            category_score: round_score(analysis.category_score),
            final_score: round_score(analysis.final_score),
            grade: analysis.grade.as_str(),
            top_posts: &top_posts,
            collab_signals: &collab_signals,
            common_hashtags: &common_hashtags,
        },
    )
    .await?;

    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn round_score(score: f64) -> i32 {
    score.round() as i32
}
