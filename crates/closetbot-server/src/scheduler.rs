//! Background maintenance scheduler: periodic cache and retention sweeps.
//!
//! Initializes a [`JobScheduler`] at server startup and registers the
//! recurring cleanup jobs. Neither job touches in-flight analysis jobs —
//! only expired cache rows and profiles past their retention window.

use std::sync::Arc;

use closetbot_core::AppConfig;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background maintenance scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialized, a
/// job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool, _config: Arc<AppConfig>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_cache_purge_job(&scheduler, pool.clone()).await?;
    register_retention_sweep_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Runs hourly, dropping expired rows from `cache_entries`.
async fn register_cache_purge_job(scheduler: &JobScheduler, pool: PgPool) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        Box::pin(async move {
            tracing::info!("scheduler: starting hourly cache purge");
            run_cache_purge_job(&pool).await;
            tracing::info!("scheduler: hourly cache purge complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_cache_purge_job(pool: &PgPool) {
    match closetbot_db::purge_expired_cache_entries(pool).await {
        Ok(count) => tracing::info!(purged = count, "scheduler: cache sweep removed expired entries"),
        Err(e) => tracing::error!(error = %e, "scheduler: cache purge failed"),
    }
}

/// Runs daily at 03:00 UTC, dropping brand/influencer profiles past their
/// data-retention window.
async fn register_retention_sweep_job(scheduler: &JobScheduler, pool: PgPool) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        Box::pin(async move {
            tracing::info!("scheduler: starting daily retention sweep");
            run_retention_sweep_job(&pool).await;
            tracing::info!("scheduler: daily retention sweep complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_retention_sweep_job(pool: &PgPool) {
    match closetbot_db::delete_expired_brand_profiles(pool).await {
        Ok(count) => tracing::info!(deleted = count, "scheduler: expired brand profiles swept"),
        Err(e) => tracing::error!(error = %e, "scheduler: brand profile retention sweep failed"),
    }

    match closetbot_db::delete_expired_influencer_profiles(pool).await {
        Ok(count) => tracing::info!(deleted = count, "scheduler: expired influencer profiles swept"),
        Err(e) => tracing::error!(error = %e, "scheduler: influencer profile retention sweep failed"),
    }
}
