//! Wire types returned by the business-discovery client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramMedia {
    pub id: String,
    pub caption: Option<String>,
    pub comments_count: i32,
    /// Absent, not zero, when the API omits it — never silently defaulted.
    pub like_count: Option<i32>,
    pub media_type: Option<String>,
    pub permalink: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramProfile {
    pub handle: String,
    pub name: Option<String>,
    pub followers_count: i32,
    pub follows_count: i32,
    pub media_count: i32,
    pub biography: Option<String>,
    pub profile_picture_url: Option<String>,
    pub media: Vec<InstagramMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountValidation {
    pub valid: bool,
    pub exists: bool,
    pub is_business: bool,
    pub error: Option<String>,
}

impl AccountValidation {
    #[must_use]
    pub fn valid() -> Self {
        Self { valid: true, exists: true, is_business: true, error: None }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self { valid: false, exists: false, is_business: false, error: Some("account not found".to_string()) }
    }

    #[must_use]
    pub fn private_or_non_business() -> Self {
        Self { valid: false, exists: true, is_business: false, error: Some("account is private".to_string()) }
    }

    #[must_use]
    pub fn indeterminate(error: String) -> Self {
        Self { valid: false, exists: false, is_business: false, error: Some(error) }
    }
}
