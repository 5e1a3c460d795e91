//! Instagram business-discovery client: rate limiting, caching, retries, and
//! the typed error surface that the orchestrator sits on top of.

pub mod cache;
pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use cache::{CacheNamespace, CacheStats, DiscoveryCache};
pub use client::DiscoveryClient;
pub use error::DiscoveryError;
pub use rate_limiter::{RateLimitOutcome, RateLimiter};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use types::{AccountValidation, InstagramMedia, InstagramProfile};

use closetbot_core::AppConfig;
use sqlx::PgPool;

/// Everything the orchestrator needs to fetch a profile: the client itself,
/// its rate limiter, and its cache, all wired from one [`AppConfig`].
pub struct Discovery {
    pub client: DiscoveryClient,
    pub rate_limiter: RateLimiter,
    pub cache: DiscoveryCache,
}

impl Discovery {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self, DiscoveryError> {
        let client = DiscoveryClient::new(
            &config.discovery_base_url,
            &config.discovery_business_account_id,
            &config.discovery_access_token,
            config.discovery_request_timeout_secs,
        )?;
        let rate_limiter =
            RateLimiter::new(pool.clone(), "discovery:global", f64::from(config.discovery_hourly_ceiling), 3600.0);
        let cache = DiscoveryCache::new(
            pool,
            i64::try_from(config.cache_profile_ttl_secs).unwrap_or(cache::DEFAULT_PROFILE_TTL_SECS),
            i64::try_from(config.cache_media_ttl_secs).unwrap_or(cache::DEFAULT_MEDIA_TTL_SECS),
        );
        Ok(Self { client, rate_limiter, cache })
    }

    /// Fetches a profile through the cache, falling back to the live client
    /// (gated by the rate limiter) on a miss, and caching the result.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::RateLimited`] if the rate limiter denies the
    /// call and blocking is disabled by the caller's retry policy, or any
    /// error the underlying [`DiscoveryClient`] can return.
    pub async fn fetch_profile_cached(&self, handle: &str, media_limit: u32, policy: RetryPolicy) -> Result<InstagramProfile, DiscoveryError> {
        self.fetch_profile_counted(handle, media_limit, policy).await.map(|(profile, _)| profile)
    }

    /// Same as [`Self::fetch_profile_cached`], but also reports whether the
    /// call actually reached the discovery API (`true`) or was served from
    /// cache (`false`), so callers can track API-call usage.
    ///
    /// `media_limit == 0` is a profile-only fetch and is cached under
    /// [`CacheNamespace::Profile`] (6h TTL); anything else pulls media
    /// alongside the profile and is cached under [`CacheNamespace::Media`]
    /// (1h TTL) instead, since the posts go stale faster than the profile
    /// fields do.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::RateLimited`] if the rate limiter denies the
    /// call and blocking is disabled by the caller's retry policy, or any
    /// error the underlying [`DiscoveryClient`] can return.
    pub async fn fetch_profile_counted(
        &self,
        handle: &str,
        media_limit: u32,
        policy: RetryPolicy,
    ) -> Result<(InstagramProfile, bool), DiscoveryError> {
        let namespace = if media_limit == 0 { CacheNamespace::Profile } else { CacheNamespace::Media };

        if let Some(cached) = self.cache.get::<InstagramProfile>(namespace, handle).await {
            return Ok((cached, false));
        }

        let profile = retry_with_backoff(policy, || async {
            let outcome = self.rate_limiter.try_acquire(1.0).await;
            if !outcome.granted {
                return Err(DiscoveryError::RateLimited { retry_after_secs: outcome.retry_after_secs });
            }
            self.client.fetch_profile(handle, media_limit).await
        })
        .await?;

        self.cache.set(namespace, handle, &profile).await;
        Ok((profile, true))
    }
}
