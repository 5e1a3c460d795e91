use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("CLOSETBOT_API_TOKEN must be set outside development")]
    MissingProductionToken,
}

/// A well-known token accepted in `Environment::Development` so a fresh
/// checkout can hit the protected routes without any `.env` setup. Never
/// accepted outside development.
const DEV_TOKEN: &str = "dev-local-token";

/// Bearer-token auth, compared in constant time.
///
/// In development, a missing configured token falls back to [`DEV_TOKEN`]
/// with a startup warning. In production a token is mandatory.
#[derive(Clone)]
pub struct AuthState {
    expected_token: Arc<String>,
    dev_mode: bool,
}

impl AuthState {
    /// Reads `CLOSETBOT_API_TOKEN` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingProductionToken`] if `is_dev` is `false`
    /// and no token is configured.
    pub fn from_env(is_dev: bool) -> Result<Self, AuthError> {
        let configured = std::env::var("CLOSETBOT_API_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(configured, is_dev)
    }

    /// # Errors
    ///
    /// Returns [`AuthError::MissingProductionToken`] if `is_dev` is `false`
    /// and `configured_token` is `None`.
    pub fn new(configured_token: Option<String>, is_dev: bool) -> Result<Self, AuthError> {
        let expected_token = match (configured_token, is_dev) {
            (Some(token), _) => token,
            (None, true) => {
                tracing::warn!("CLOSETBOT_API_TOKEN not set — accepting the fixed development token");
                DEV_TOKEN.to_string()
            }
            (None, false) => return Err(AuthError::MissingProductionToken),
        };
        Ok(Self { expected_token: Arc::new(expected_token), dev_mode: is_dev })
    }

    fn accepts(&self, presented: &str) -> bool {
        presented.as_bytes().ct_eq(self.expected_token.as_bytes()).into()
    }
}

#[derive(Serialize)]
struct MiddlewareErrorBody<'a> {
    error: MiddlewareErrorDetail<'a>,
    meta: MiddlewareMeta,
}

#[derive(Serialize)]
struct MiddlewareErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct MiddlewareMeta {
    request_id: String,
    timestamp: chrono::DateTime<Utc>,
}

fn middleware_error(req: &Request, status: StatusCode, code: &str, message: &str) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |r| r.0.clone());
    let body = MiddlewareErrorBody {
        error: MiddlewareErrorDetail { code, message },
        meta: MiddlewareMeta { request_id, timestamp: Utc::now() },
    };
    (status, Json(body)).into_response()
}

/// Rejects any request without a valid `Authorization: Bearer <token>` header.
pub async fn require_bearer_auth(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    let presented = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if auth.accepts(token) => next.run(req).await,
        _ => {
            if auth.dev_mode {
                tracing::warn!("rejected request with missing/invalid bearer token (development mode)");
            }
            middleware_error(&req, StatusCode::UNAUTHORIZED, "unauthorized", "missing or invalid bearer token")
        }
    }
}

struct Window {
    started_at: Instant,
    hits: VecDeque<Instant>,
}

/// A single global fixed-window request counter, independent of the
/// discovery API's own token bucket — this one protects the HTTP surface
/// itself from abusive clients.
#[derive(Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<Window>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(Window { started_at: Instant::now(), hits: VecDeque::new() })),
        }
    }

    async fn check(&self) -> bool {
        let mut window = self.state.lock().await;
        let now = Instant::now();
        let cutoff = now.checked_sub(self.window).unwrap_or(window.started_at);
        while window.hits.front().is_some_and(|hit| *hit < cutoff) {
            window.hits.pop_front();
        }
        if window.hits.len() >= self.max_requests {
            return false;
        }
        window.hits.push_back(now);
        true
    }
}

/// Rejects requests once the global request count in the trailing window
/// exceeds [`RateLimitState::new`]'s `max_requests`.
pub async fn enforce_rate_limit(State(limiter): State<RateLimitState>, req: Request, next: Next) -> Response {
    if limiter.check().await {
        next.run(req).await
    } else {
        middleware_error(&req, StatusCode::TOO_MANY_REQUESTS, "rate_limited", "too many requests")
    }
}
