//! Error taxonomy for the business-discovery client and its retry wrapper.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("account '{handle}' not found or inaccessible")]
    AccountNotFound { handle: String },

    #[error("account '{handle}' is private")]
    PrivateAccount { handle: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("discovery api error: {message}")]
    ApiError {
        message: String,
        status: Option<u16>,
        code: Option<i64>,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl DiscoveryError {
    /// Errors the retry wrapper must never retry — the account state itself
    /// won't change on a second attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiscoveryError::AccountNotFound { .. } | DiscoveryError::PrivateAccount { .. })
    }

    /// Anything not terminal is retryable, including rate limiting (which the
    /// retry wrapper handles with its own non-backoff sleep).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.is_terminal()
    }
}
