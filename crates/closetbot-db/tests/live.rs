//! Live integration tests for closetbot-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/closetbot-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use closetbot_db::hashtag_aggregates::ProfileType;
use closetbot_db::{
    create_job, get_brand_profile_by_handle, get_cache_entry, get_influencer_profile_by_handle,
    get_job, list_category_taxonomy, list_media_snapshots_for_profile, mark_job_done, mark_job_failed,
    mark_job_running, seed_category_taxonomy_if_empty, try_acquire_tokens, upsert_brand_profile,
    upsert_cache_entry, upsert_influencer_profile, upsert_media_snapshot, DbError, NewJob,
    NewMediaSnapshot, UpsertBrandProfile, UpsertInfluencerProfile,
};

fn make_brand(handle: &str) -> UpsertBrandProfile<'_> {
    UpsertBrandProfile {
        handle,
        name: Some("Test Brand"),
        followers_count: 10_000,
        media_count: 120,
        biography: Some("minimal streetwear label"),
        profile_picture_url: None,
        categories: &[],
        retention_days: 7,
    }
}

// ---------------------------------------------------------------------------
// Brand / influencer profile upserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn brand_profile_upsert_is_idempotent_on_handle(pool: sqlx::PgPool) {
    let first = upsert_brand_profile(&pool, make_brand("TestBrand"))
        .await
        .expect("first upsert failed");
    let second = upsert_brand_profile(&pool, make_brand("testbrand"))
        .await
        .expect("second upsert failed");

    assert_eq!(first.id, second.id, "handle match should be case-insensitive");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brand_profiles WHERE ig_username = 'testbrand'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn brand_profile_upsert_refreshes_followers_on_conflict(pool: sqlx::PgPool) {
    upsert_brand_profile(&pool, make_brand("refreshbrand")).await.unwrap();

    let mut second = make_brand("refreshbrand");
    second.followers_count = 55_000;
    upsert_brand_profile(&pool, second).await.unwrap();

    let row = get_brand_profile_by_handle(&pool, "refreshbrand")
        .await
        .unwrap()
        .expect("profile should exist");
    assert_eq!(row.followers_count, 55_000);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_brand_profile_by_handle_returns_none_when_absent(pool: sqlx::PgPool) {
    let result = get_brand_profile_by_handle(&pool, "nosuchbrand").await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn influencer_profile_upsert_stores_basis_point_rate(pool: sqlx::PgPool) {
    let profile = UpsertInfluencerProfile {
        handle: "influencer1",
        name: Some("Inf One"),
        followers_count: 45_000,
        follows_count: 300,
        media_count: 210,
        biography: None,
        profile_picture_url: None,
        categories: &[],
        avg_engagement_rate_bps: 520,
        retention_days: 7,
    };
    upsert_influencer_profile(&pool, profile).await.expect("upsert failed");

    let row = get_influencer_profile_by_handle(&pool, "influencer1")
        .await
        .unwrap()
        .expect("profile should exist");
    assert_eq!(row.avg_engagement_rate, Some(520));
}

// ---------------------------------------------------------------------------
// Media snapshots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn media_snapshot_upsert_is_idempotent_on_media_id(pool: sqlx::PgPool) {
    let brand = upsert_brand_profile(&pool, make_brand("snapshotbrand")).await.unwrap();

    let snapshot = |comments_count: i32| NewMediaSnapshot {
        profile_id: brand.id,
        profile_type: ProfileType::Brand,
        ig_media_id: "post-1",
        caption: Some("Love #fashion"),
        comments_count,
        like_count: Some(100),
        media_type: Some("IMAGE"),
        permalink: Some("https://instagram.com/p/post-1"),
        posted_at: None,
        retention_days: 7,
    };

    upsert_media_snapshot(&pool, snapshot(10)).await.expect("first insert failed");
    upsert_media_snapshot(&pool, snapshot(25)).await.expect("refresh failed");

    let rows = list_media_snapshots_for_profile(&pool, brand.id, ProfileType::Brand)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].comments_count, 25);
}

#[sqlx::test(migrations = "../../migrations")]
async fn media_snapshots_are_isolated_per_profile_type(pool: sqlx::PgPool) {
    let brand = upsert_brand_profile(&pool, make_brand("dualbrand")).await.unwrap();

    upsert_media_snapshot(
        &pool,
        NewMediaSnapshot {
            profile_id: brand.id,
            profile_type: ProfileType::Brand,
            ig_media_id: "shared-id",
            caption: None,
            comments_count: 1,
            like_count: None,
            media_type: None,
            permalink: None,
            posted_at: None,
            retention_days: 7,
        },
    )
    .await
    .unwrap();

    let brand_rows = list_media_snapshots_for_profile(&pool, brand.id, ProfileType::Brand).await.unwrap();
    let influencer_rows = list_media_snapshots_for_profile(&pool, brand.id, ProfileType::Influencer)
        .await
        .unwrap();
    assert_eq!(brand_rows.len(), 1);
    assert!(influencer_rows.is_empty());
}

// ---------------------------------------------------------------------------
// Job lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn job_lifecycle_queued_to_done(pool: sqlx::PgPool) {
    let handles = vec!["influencer1".to_string(), "influencer2".to_string()];
    let job = create_job(
        &pool,
        NewJob { influencer_handles: &handles, api_calls_estimated: 20 },
    )
    .await
    .expect("create_job failed");

    assert_eq!(job.status, "queued");
    assert!(job.started_at.is_none());

    let claimed = mark_job_running(&pool, job.id).await.unwrap();
    assert!(claimed, "job should transition from queued to running");

    let brand = upsert_brand_profile(&pool, make_brand("donebrand")).await.unwrap();
    let done = mark_job_done(&pool, job.id, brand.id, 18).await.unwrap();
    assert!(done);

    let fetched = get_job(&pool, job.id).await.unwrap().expect("job should exist");
    assert_eq!(fetched.status, "done");
    assert_eq!(fetched.api_calls_used, 18);
    assert_eq!(fetched.brand_profile_id, Some(brand.id));
    assert!(fetched.finished_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn job_cannot_be_marked_done_while_still_queued(pool: sqlx::PgPool) {
    let handles = vec!["influencer1".to_string()];
    let job = create_job(&pool, NewJob { influencer_handles: &handles, api_calls_estimated: 10 })
        .await
        .unwrap();

    let brand = upsert_brand_profile(&pool, make_brand("skipbrand")).await.unwrap();
    let done = mark_job_done(&pool, job.id, brand.id, 5).await.unwrap();
    assert!(!done, "marking done from queued (skipping running) must be a no-op");

    let fetched = get_job(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, "queued");
}

#[sqlx::test(migrations = "../../migrations")]
async fn job_mark_failed_works_from_queued_or_running(pool: sqlx::PgPool) {
    let handles = vec!["influencer1".to_string()];
    let queued_job = create_job(&pool, NewJob { influencer_handles: &handles, api_calls_estimated: 10 })
        .await
        .unwrap();
    let failed = mark_job_failed(&pool, queued_job.id, "rate limited").await.unwrap();
    assert!(failed);

    let running_job = create_job(&pool, NewJob { influencer_handles: &handles, api_calls_estimated: 10 })
        .await
        .unwrap();
    mark_job_running(&pool, running_job.id).await.unwrap();
    let failed = mark_job_failed(&pool, running_job.id, "discovery timeout").await.unwrap();
    assert!(failed);

    let fetched = get_job(&pool, running_job.id).await.unwrap().unwrap();
    assert_eq!(fetched.error_message.as_deref(), Some("discovery timeout"));
}

// ---------------------------------------------------------------------------
// Rate limit buckets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn rate_limit_bucket_grants_up_to_capacity_then_denies(pool: sqlx::PgPool) {
    let first = try_acquire_tokens(&pool, "ig:profile", 1.0, 2.0, 0.0).await.unwrap();
    assert!(first.granted);
    let second = try_acquire_tokens(&pool, "ig:profile", 1.0, 2.0, 0.0).await.unwrap();
    assert!(second.granted);
    let third = try_acquire_tokens(&pool, "ig:profile", 1.0, 2.0, 0.0).await.unwrap();
    assert!(!third.granted, "bucket should be exhausted after 2 acquisitions of capacity 2");
}

#[sqlx::test(migrations = "../../migrations")]
async fn rate_limit_bucket_is_isolated_per_key(pool: sqlx::PgPool) {
    try_acquire_tokens(&pool, "bucket-a", 2.0, 2.0, 0.0).await.unwrap();
    let other = try_acquire_tokens(&pool, "bucket-b", 2.0, 2.0, 0.0).await.unwrap();
    assert!(other.granted, "a different bucket key must not share state");
}

// ---------------------------------------------------------------------------
// Cache entries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cache_entry_round_trips_and_respects_ttl(pool: sqlx::PgPool) {
    let value = serde_json::json!({"followers_count": 1000});
    upsert_cache_entry(&pool, "ig:profile:testbrand", &value, 3600).await.unwrap();

    let fetched = get_cache_entry(&pool, "ig:profile:testbrand").await.unwrap();
    assert_eq!(fetched, Some(value));

    // A negative TTL is already expired — exercising the expires_at > now() filter.
    upsert_cache_entry(&pool, "ig:profile:stale", &serde_json::json!({}), -60)
        .await
        .unwrap();
    let stale = get_cache_entry(&pool, "ig:profile:stale").await.unwrap();
    assert!(stale.is_none(), "expired entry should read as a miss");
}

#[sqlx::test(migrations = "../../migrations")]
async fn count_cache_entries_by_prefix_counts_only_live_entries_in_namespace(pool: sqlx::PgPool) {
    upsert_cache_entry(&pool, "ig:profile:alpha", &serde_json::json!({}), 3600).await.unwrap();
    upsert_cache_entry(&pool, "ig:profile:bravo", &serde_json::json!({}), 3600).await.unwrap();
    upsert_cache_entry(&pool, "ig:media:alpha", &serde_json::json!({}), 3600).await.unwrap();
    upsert_cache_entry(&pool, "ig:profile:expired", &serde_json::json!({}), -60).await.unwrap();

    let profile_count = closetbot_db::count_cache_entries_by_prefix(&pool, "ig:profile:").await.unwrap();
    let media_count = closetbot_db::count_cache_entries_by_prefix(&pool, "ig:media:").await.unwrap();

    assert_eq!(profile_count, 2, "expired entry must not be counted");
    assert_eq!(media_count, 1);
}

// ---------------------------------------------------------------------------
// Category taxonomy seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn category_taxonomy_seeds_once(pool: sqlx::PgPool) {
    let inserted = seed_category_taxonomy_if_empty(&pool).await.unwrap();
    assert_eq!(inserted, 10, "all ten fixed categories should be seeded");

    let again = seed_category_taxonomy_if_empty(&pool).await.unwrap();
    assert_eq!(again, 0, "seeding a non-empty table should be a no-op");

    let rows = list_category_taxonomy(&pool).await.unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().any(|r| r.slug == "minimal"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn job_transition_errors_surface_as_db_error_variant(pool: sqlx::PgPool) {
    let handles = vec!["influencer1".to_string()];
    let job = create_job(&pool, NewJob { influencer_handles: &handles, api_calls_estimated: 10 })
        .await
        .unwrap();
    mark_job_running(&pool, job.id).await.unwrap();
    let second_claim = mark_job_running(&pool, job.id).await.unwrap();
    assert!(!second_claim, "a job already running cannot be claimed again");

    // Sanity: DbError still implements std::error::Error via thiserror.
    let _: &dyn std::error::Error = &DbError::NotFound;
}
