//! Retry with exponential back-off and jitter for any fallible discovery call.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. Terminal errors
//! ([`DiscoveryError::AccountNotFound`], [`DiscoveryError::PrivateAccount`])
//! propagate immediately — the account state won't change on a second
//! attempt. [`DiscoveryError::RateLimited`] is not backed off exponentially;
//! it sleeps for exactly the server-advertised `retry_after`, capped at
//! `max_delay`.

use std::future::Future;
use std::time::Duration;

use crate::error::DiscoveryError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exp_base: f64,
}

impl RetryPolicy {
    /// Default policy for a full profile fetch.
    #[must_use]
    pub fn profile_fetch() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(2), max_delay: Duration::from_secs(60), exp_base: 2.0 }
    }

    /// Default policy for a lightweight account validation call.
    #[must_use]
    pub fn validation() -> Self {
        Self { max_retries: 2, base_delay: Duration::from_secs(1), max_delay: Duration::from_secs(60), exp_base: 2.0 }
    }
}

/// Runs `operation` under `policy`, retrying transient [`DiscoveryError`]s.
///
/// Terminal errors are never retried. A [`DiscoveryError::RateLimited`] sleeps
/// exactly `min(retry_after, max_delay)` rather than the exponential
/// schedule. Any other retryable error backs off as
/// `min(base_delay * exp_base^attempt, max_delay)`, jittered by a uniform
/// random factor in `[0.75, 1.25]`.
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, DiscoveryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DiscoveryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if err.is_terminal() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;

                let delay = match &err {
                    DiscoveryError::RateLimited { retry_after_secs } => {
                        Duration::from_secs(*retry_after_secs).min(policy.max_delay)
                    }
                    _ => {
                        let computed = policy.base_delay.as_secs_f64() * policy.exp_base.powi((attempt - 1) as i32);
                        let capped = computed.min(policy.max_delay.as_secs_f64());
                        let jitter = rand::random::<f64>() * 0.5 + 0.75;
                        Duration::from_secs_f64(capped * jitter)
                    }
                };

                tracing::warn!(attempt, max_retries = policy.max_retries, delay_secs = delay.as_secs_f64(), error = %err, "discovery call failed — retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn zero_delay_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, base_delay: Duration::ZERO, max_delay: Duration::ZERO, exp_base: 2.0 }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(zero_delay_policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, DiscoveryError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_account_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(zero_delay_policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DiscoveryError::AccountNotFound { handle: "ghost".to_string() })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "terminal errors must not be retried");
        assert!(matches!(result, Err(DiscoveryError::AccountNotFound { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_private_account() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(zero_delay_policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DiscoveryError::PrivateAccount { handle: "locked".to_string() })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DiscoveryError::PrivateAccount { .. })));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(zero_delay_policy(3), || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(DiscoveryError::ApiError { message: "transient".to_string(), status: Some(503), code: None })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(zero_delay_policy(2), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DiscoveryError::ApiError { message: "down".to_string(), status: Some(500), code: None })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial attempt plus 2 retries");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rate_limited_sleeps_retry_after_not_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy { max_retries: 1, base_delay: Duration::ZERO, max_delay: Duration::from_millis(5), exp_base: 2.0 };
        let result = retry_with_backoff(policy, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt == 1 {
                    Err::<u32, _>(DiscoveryError::RateLimited { retry_after_secs: 3600 })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7, "rate limit sleep is capped at max_delay, so this completes quickly");
    }
}
