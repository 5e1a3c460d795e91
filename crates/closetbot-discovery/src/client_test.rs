//! Integration tests for `DiscoveryClient::fetch_profile` and `validate_account`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::DiscoveryClient;
use crate::error::DiscoveryError;

async fn test_client(server: &MockServer) -> DiscoveryClient {
    DiscoveryClient::new(server.uri(), "123456", "test-token", 5).expect("failed to build test DiscoveryClient")
}

fn profile_body(username: &str, followers: i32) -> serde_json::Value {
    json!({
        "business_discovery": {
            "username": username,
            "name": "Test Brand",
            "followers_count": followers,
            "follows_count": 200,
            "media_count": 50,
            "biography": "minimal streetwear",
            "profile_picture_url": "https://example.com/pic.jpg",
            "media": {
                "data": [
                    {
                        "id": "m1",
                        "caption": "#ootd new drop",
                        "comments_count": 3,
                        "like_count": 150,
                        "media_type": "IMAGE",
                        "permalink": "https://instagram.com/p/m1",
                        "timestamp": "2026-01-15T10:00:00+0000"
                    },
                    {
                        "id": "m2",
                        "caption": "behind the scenes",
                        "comments_count": 7,
                        "media_type": "VIDEO",
                        "permalink": "https://instagram.com/p/m2",
                        "timestamp": "2026-01-10T08:30:00Z"
                    }
                ]
            }
        }
    })
}

#[tokio::test]
async fn fetch_profile_parses_profile_and_media() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("fashionco", 50_000)))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let profile = client.fetch_profile("fashionco", 20).await.expect("expected Ok");

    assert_eq!(profile.handle, "fashionco");
    assert_eq!(profile.followers_count, 50_000);
    assert_eq!(profile.media.len(), 2);
    assert_eq!(profile.media[0].like_count, Some(150));
    assert_eq!(profile.media[1].like_count, None, "missing like_count must stay absent, not zero");
    assert!(profile.media[0].posted_at.is_some());
    assert!(profile.media[1].posted_at.is_some(), "trailing Z should parse as RFC 3339");
}

#[tokio::test]
async fn fetch_profile_rate_limited_on_429_uses_retry_after_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "120").set_body_json(json!({"error": {"message": "rate limited"}})))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("fashionco", 20).await.expect_err("expected rate limit error");

    assert!(matches!(err, DiscoveryError::RateLimited { retry_after_secs: 120 }));
}

#[tokio::test]
async fn fetch_profile_rate_limited_defaults_retry_after_when_header_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "rate limited"}})))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("fashionco", 20).await.expect_err("expected rate limit error");

    assert!(matches!(err, DiscoveryError::RateLimited { retry_after_secs: 3600 }));
}

#[tokio::test]
async fn fetch_profile_account_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Account not found or not accessible", "code": 80_004}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("ghost", 20).await.expect_err("expected account not found");

    assert!(matches!(err, DiscoveryError::AccountNotFound { handle } if handle == "ghost"));
}

#[tokio::test]
async fn fetch_profile_private_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "private account", "code": 80_001}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("locked", 20).await.expect_err("expected private account error");

    assert!(matches!(err, DiscoveryError::PrivateAccount { handle } if handle == "locked"));
}

#[tokio::test]
async fn fetch_profile_other_error_codes_map_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "internal error", "code": 1}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("fashionco", 20).await.expect_err("expected api error");

    assert!(matches!(err, DiscoveryError::ApiError { status: Some(500), .. }));
}

#[tokio::test]
async fn fetch_profile_non_json_error_body_still_classifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(502).set_body_string("bad gateway")).mount(&server).await;

    let client = test_client(&server).await;
    let err = client.fetch_profile("fashionco", 20).await.expect_err("expected api error");

    assert!(matches!(err, DiscoveryError::ApiError { status: Some(502), .. }));
}

#[tokio::test]
async fn validate_account_not_found_maps_to_validation_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "not found", "code": 80_004}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let validation = client.validate_account("ghost").await;

    assert!(!validation.valid);
    assert!(!validation.exists);
}

#[tokio::test]
async fn validate_account_private_maps_to_exists_but_not_business() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "private", "code": 80_001}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let validation = client.validate_account("locked").await;

    assert!(!validation.valid);
    assert!(validation.exists);
    assert!(!validation.is_business);
}

#[tokio::test]
async fn validate_account_valid_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200).set_body_json(profile_body("fashionco", 1000))).mount(&server).await;

    let client = test_client(&server).await;
    let validation = client.validate_account("fashionco").await;

    assert!(validation.valid);
    assert!(validation.exists);
    assert!(validation.is_business);
}
