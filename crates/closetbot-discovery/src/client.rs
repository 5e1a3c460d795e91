//! HTTP client for the business-discovery endpoint.
//!
//! One call returns the profile of a named handle and up to `media_limit`
//! recent posts. Non-2xx responses are parsed as JSON where possible to
//! extract `error.code`/`error.message` before being classified into a typed
//! [`DiscoveryError`].

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::DiscoveryError;
use crate::types::{AccountValidation, InstagramMedia, InstagramProfile};

const FIELDS: &str = "business_discovery.username({handle}){username,name,followers_count,follows_count,media_count,biography,profile_picture_url,media.limit({media_limit}){id,caption,comments_count,like_count,media_type,permalink,timestamp}}";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BusinessDiscoveryResponse {
    business_discovery: BusinessDiscoveryBody,
}

#[derive(Debug, Deserialize)]
struct BusinessDiscoveryBody {
    username: String,
    name: Option<String>,
    followers_count: i32,
    follows_count: i32,
    media_count: i32,
    biography: Option<String>,
    profile_picture_url: Option<String>,
    #[serde(default)]
    media: Option<MediaPage>,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    id: String,
    caption: Option<String>,
    #[serde(default)]
    comments_count: i32,
    like_count: Option<i32>,
    media_type: Option<String>,
    permalink: Option<String>,
    timestamp: Option<String>,
}

/// Wraps the third-party business-discovery endpoint behind typed errors.
pub struct DiscoveryClient {
    client: Client,
    base_url: String,
    business_account_id: String,
    access_token: String,
}

impl DiscoveryClient {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        business_account_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(std::time::Duration::from_secs(timeout_secs)).build()?;
        Ok(Self { client, base_url: base_url.into(), business_account_id: business_account_id.into(), access_token: access_token.into() })
    }

    /// Fetches `handle`'s profile with up to `media_limit` recent posts.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::RateLimited`] on HTTP 429,
    /// [`DiscoveryError::AccountNotFound`] on error code `80004`,
    /// [`DiscoveryError::PrivateAccount`] on error code `80001`,
    /// [`DiscoveryError::ApiError`] for any other non-2xx response, and
    /// [`DiscoveryError::Transport`] on a network failure.
    pub async fn fetch_profile(&self, handle: &str, media_limit: u32) -> Result<InstagramProfile, DiscoveryError> {
        let fields = FIELDS.replace("{handle}", handle).replace("{media_limit}", &media_limit.to_string());
        let url = format!("{}/{}", self.base_url, self.business_account_id);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", fields.as_str()), ("access_token", self.access_token.as_str())])
            .send()
            .await?;

        let status = response.status();
        let retry_after_header =
            response.headers().get(reqwest::header::RETRY_AFTER).and_then(|v| v.to_str().ok()).and_then(|s| s.parse::<u64>().ok());
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(Self::classify_error(handle, status.as_u16(), retry_after_header, &body_text));
        }

        let parsed: BusinessDiscoveryResponse = serde_json::from_str(&body_text)
            .map_err(|e| DiscoveryError::ApiError { message: format!("malformed discovery response: {e}"), status: Some(status.as_u16()), code: None })?;

        Ok(Self::to_profile(parsed.business_discovery))
    }

    /// Fetches with `media_limit=0` and reduces the result to a validity
    /// summary: [`DiscoveryError::AccountNotFound`] means the account
    /// doesn't exist, [`DiscoveryError::PrivateAccount`] means it exists but
    /// isn't a business account, and any other error is indeterminate.
    pub async fn validate_account(&self, handle: &str) -> AccountValidation {
        match self.fetch_profile(handle, 0).await {
            Ok(_) => AccountValidation::valid(),
            Err(DiscoveryError::AccountNotFound { .. }) => AccountValidation::not_found(),
            Err(DiscoveryError::PrivateAccount { .. }) => AccountValidation::private_or_non_business(),
            Err(other) => AccountValidation::indeterminate(other.to_string()),
        }
    }

    fn classify_error(handle: &str, status: u16, retry_after_header: Option<u64>, body: &str) -> DiscoveryError {
        let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();

        if status == 429 {
            return DiscoveryError::RateLimited { retry_after_secs: retry_after_header.unwrap_or(3600) };
        }

        if let Some(ApiErrorBody { error }) = &parsed {
            if is_not_found_code(error.code) {
                return DiscoveryError::AccountNotFound { handle: handle.to_string() };
            }
            if is_private_account_code(error.code) {
                return DiscoveryError::PrivateAccount { handle: handle.to_string() };
            }
            return DiscoveryError::ApiError { message: error.message.clone(), status: Some(status), code: error.code };
        }

        DiscoveryError::ApiError { message: format!("discovery api returned {status}"), status: Some(status), code: None }
    }

    fn to_profile(body: BusinessDiscoveryBody) -> InstagramProfile {
        let media = body
            .media
            .map(|page| page.data.into_iter().map(Self::to_media).collect())
            .unwrap_or_default();

        InstagramProfile {
            handle: body.username,
            name: body.name,
            followers_count: body.followers_count,
            follows_count: body.follows_count,
            media_count: body.media_count,
            biography: body.biography,
            profile_picture_url: body.profile_picture_url,
            media,
        }
    }

    fn to_media(node: MediaNode) -> InstagramMedia {
        InstagramMedia {
            id: node.id,
            caption: node.caption,
            comments_count: node.comments_count,
            like_count: node.like_count,
            media_type: node.media_type,
            permalink: node.permalink,
            posted_at: node.timestamp.and_then(|ts| parse_posted_at(&ts)),
        }
    }
}

/// Parses an RFC 3339 timestamp, tolerating a trailing `Z`.
fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

fn is_not_found_code(code: Option<i64>) -> bool {
    code == Some(80_004)
}

fn is_private_account_code(code: Option<i64>) -> bool {
    code == Some(80_001)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
