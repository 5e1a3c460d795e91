//! Two-namespace TTL cache in front of the discovery client.
//!
//! Keys are namespaced `"ig:profile:<handle>"` and `"ig:media:<handle>"`
//! (lowercased). Backed by `closetbot_db::cache_entries`; a connection
//! failure at any call is caught and treated as a miss/no-op rather than
//! propagated, matching the rest of this codebase's failure-of-shared-store
//! handling.

use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;

/// Default TTLs if the caller doesn't override them from config: 6h for
/// profiles, 1h for media.
pub const DEFAULT_PROFILE_TTL_SECS: i64 = 6 * 3600;
pub const DEFAULT_MEDIA_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Profile,
    Media,
}

impl CacheNamespace {
    fn prefix(self) -> &'static str {
        match self {
            CacheNamespace::Profile => "ig:profile:",
            CacheNamespace::Media => "ig:media:",
        }
    }
}

pub struct DiscoveryCache {
    pool: PgPool,
    profile_ttl_secs: i64,
    media_ttl_secs: i64,
}

impl DiscoveryCache {
    #[must_use]
    pub fn new(pool: PgPool, profile_ttl_secs: i64, media_ttl_secs: i64) -> Self {
        Self { pool, profile_ttl_secs, media_ttl_secs }
    }

    fn ttl_secs(&self, namespace: CacheNamespace) -> i64 {
        match namespace {
            CacheNamespace::Profile => self.profile_ttl_secs,
            CacheNamespace::Media => self.media_ttl_secs,
        }
    }

    fn key(namespace: CacheNamespace, handle: &str) -> String {
        format!("{}{}", namespace.prefix(), handle.to_lowercase())
    }

    /// Reads a cached value. Any store error or a miss both surface as `None`.
    pub async fn get<T: DeserializeOwned>(&self, namespace: CacheNamespace, handle: &str) -> Option<T> {
        let key = Self::key(namespace, handle);
        match closetbot_db::get_cache_entry(&self.pool, &key).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, %key, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Writes a value under the namespace's fixed TTL. Failure is swallowed
    /// with a warning — a cache write is never allowed to fail the caller.
    pub async fn set<T: Serialize>(&self, namespace: CacheNamespace, handle: &str, value: &T) {
        let key = Self::key(namespace, handle);
        let Ok(json) = serde_json::to_value(value) else {
            tracing::warn!(%key, "cache value failed to serialize, skipping write");
            return;
        };
        if let Err(err) = closetbot_db::upsert_cache_entry(&self.pool, &key, &json, self.ttl_secs(namespace)).await {
            tracing::warn!(error = %err, %key, "cache write failed");
        }
    }

    /// Removes a single entry.
    pub async fn invalidate(&self, namespace: CacheNamespace, handle: &str) {
        let key = Self::key(namespace, handle);
        if let Err(err) = closetbot_db::delete_cache_entry(&self.pool, &key).await {
            tracing::warn!(error = %err, %key, "cache invalidate failed");
        }
    }

    /// Counts live entries per namespace. A count query failure is treated as
    /// zero for that namespace rather than propagated, matching this cache's
    /// general failure-as-miss handling.
    pub async fn stats(&self) -> CacheStats {
        let profile = self.count_namespace(CacheNamespace::Profile).await;
        let media = self.count_namespace(CacheNamespace::Media).await;
        CacheStats { profile, media }
    }

    async fn count_namespace(&self, namespace: CacheNamespace) -> i64 {
        match closetbot_db::count_cache_entries_by_prefix(&self.pool, namespace.prefix()).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, namespace = ?namespace, "cache stats query failed");
                0
            }
        }
    }
}

/// Live entry counts per namespace, as reported by [`DiscoveryCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub profile: i64,
    pub media: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_namespaces_and_lowercases_handle() {
        assert_eq!(DiscoveryCache::key(CacheNamespace::Profile, "FashionCo"), "ig:profile:fashionco");
        assert_eq!(DiscoveryCache::key(CacheNamespace::Media, "FashionCo"), "ig:media:fashionco");
    }

    #[test]
    fn default_ttls_match_spec() {
        assert_eq!(DEFAULT_PROFILE_TTL_SECS, 21_600);
        assert_eq!(DEFAULT_MEDIA_TTL_SECS, 3_600);
    }
}
