//! Background job dispatch: a semaphore-gated worker pool that runs each
//! submitted job through the executor on its own `tokio::spawn`ed task, with
//! a dispatch-level retry distinct from the executor's own per-influencer
//! partial-failure handling — this retry re-runs the *whole* job, and only
//! kicks in when the job is still `queued` (i.e. a database hiccup kept it
//! from ever transitioning, not a discovery failure the executor already
//! recorded as `failed`).

use std::sync::Arc;
use std::time::Duration;

use closetbot_core::AppConfig;
use closetbot_db::jobs::{get_job, JobStatus};
use closetbot_discovery::Discovery;
use sqlx::PgPool;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::executor::execute_job;

/// Bundles what a background job task needs so the `POST /jobs` handler can
/// hand off a newly created job without threading pool/discovery/config
/// through the router by hand.
#[derive(Clone)]
pub struct Dispatcher {
    pool: PgPool,
    discovery: Arc<Discovery>,
    config: Arc<AppConfig>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(pool: PgPool, discovery: Arc<Discovery>, config: Arc<AppConfig>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.job_worker_concurrency.max(1)));
        Self { pool, discovery, config, semaphore }
    }

    /// Spawns a background task that runs `job_id` through the executor,
    /// gated by the worker-pool semaphore (`worker_prefetch = 1`: a permit is
    /// only acquired once this job is actually ready to run). Returns
    /// immediately — the `POST /jobs` handler never waits on job completion.
    pub fn spawn(&self, job_id: Uuid, brand_handle: String) {
        let pool = self.pool.clone();
        let discovery = Arc::clone(&self.discovery);
        let config = Arc::clone(&self.config);
        let semaphore = Arc::clone(&self.semaphore);

        tokio::spawn(async move {
            let Ok(permit) = semaphore.acquire_owned().await else {
                tracing::error!(%job_id, "job worker semaphore closed, dropping job");
                return;
            };

            run_with_retry(&pool, &discovery, &config, job_id, &brand_handle).await;
            drop(permit);
        });
    }
}

async fn run_with_retry(pool: &PgPool, discovery: &Discovery, config: &AppConfig, job_id: Uuid, brand_handle: &str) {
    let cooldown = Duration::from_secs(config.job_dispatch_retry_cooldown_secs);

    for attempt in 0..=config.job_dispatch_max_retries {
        let job = match get_job(pool, job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::error!(%job_id, "job row disappeared before dispatch could run it");
                return;
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "failed to load job for dispatch");
                return;
            }
        };

        if job.status != JobStatus::Queued.as_str() {
            tracing::debug!(%job_id, status = %job.status, "job already left queued state, nothing to dispatch");
            return;
        }

        match execute_job(pool, discovery, config, &job, brand_handle).await {
            Ok(()) => return,
            Err(e) => {
                tracing::error!(%job_id, attempt, error = %e, "job dispatch attempt failed");
                if attempt < config.job_dispatch_max_retries {
                    tokio::time::sleep(cooldown).await;
                }
            }
        }
    }

    tracing::error!(%job_id, retries = config.job_dispatch_max_retries, "job exhausted dispatch retries");
}
