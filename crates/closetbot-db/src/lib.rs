use closetbot_core::AppConfig;
use sqlx::migrate::Migrate;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

// Path relative to crates/closetbot-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("job {id} is not in status '{expected_status}'")]
    InvalidJobTransition { id: uuid::Uuid, expected_status: &'static str },
    #[error(transparent)]
    Config(#[from] closetbot_core::ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` and pool settings from env.
///
/// # Errors
///
/// Returns [`DbError::Config`] if configuration is missing/invalid, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let app_config = closetbot_core::load_app_config_from_env()?;
    let pool_config = PoolConfig::from_app_config(&app_config);
    connect_pool(&app_config.database_url, pool_config)
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let applied_before = {
        let mut conn = pool.acquire().await?;
        conn.ensure_migrations_table().await?;
        conn.list_applied_migrations().await?.len()
    };

    MIGRATOR.run(pool).await?;

    let applied_after = {
        let mut conn = pool.acquire().await?;
        conn.ensure_migrations_table().await?;
        conn.list_applied_migrations().await?.len()
    };

    Ok(applied_after.saturating_sub(applied_before))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

pub mod analysis_results;
pub mod brand_profiles;
pub mod cache_entries;
pub mod category_taxonomy;
pub mod hashtag_aggregates;
pub mod influencer_profiles;
pub mod jobs;
pub mod media_snapshots;
pub mod rate_limit_buckets;

pub use analysis_results::{insert_analysis_result, list_analysis_results_for_job, AnalysisResultRow, NewAnalysisResult};
pub use brand_profiles::{
    delete_expired_brand_profiles, get_brand_profile_by_handle, upsert_brand_profile, BrandProfileRow,
    UpsertBrandProfile,
};
pub use cache_entries::{
    count_cache_entries_by_prefix, delete_cache_entry, get_cache_entry, purge_expired_cache_entries,
    upsert_cache_entry, CacheEntryRow,
};
pub use category_taxonomy::{list_category_taxonomy, seed_category_taxonomy_if_empty, CategoryTaxonomyRow};
pub use hashtag_aggregates::{upsert_hashtag_aggregate, HashtagAggregateRow, ProfileType};
pub use influencer_profiles::{
    delete_expired_influencer_profiles, get_influencer_profile_by_handle, get_influencer_profile_by_id,
    upsert_influencer_profile, InfluencerProfileRow, UpsertInfluencerProfile,
};
pub use jobs::{
    create_job, get_job, mark_job_done, mark_job_failed, mark_job_running, JobRow, JobStatus, NewJob,
};
pub use media_snapshots::{
    delete_expired_media_snapshots, list_media_snapshots_for_profile, upsert_media_snapshot, MediaSnapshotRow,
    NewMediaSnapshot,
};
pub use rate_limit_buckets::{seconds_until_available, try_acquire_tokens, BucketAcquireResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 10);
    }
}
