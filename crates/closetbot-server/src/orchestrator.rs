//! Turns a cached Instagram profile into the features and scores the job
//! executor persists: hashtag/keyword extraction, fashion-category
//! classification, engagement analysis, and brand-to-influencer scoring.
//!
//! Everything here is synchronous and pure except the two entry points —
//! [`analyze_brand`] and [`analyze_influencer`] — which fetch the profile
//! through [`Discovery::fetch_profile_cached`] and hand the result to a
//! pure builder function underneath, so the scoring logic itself stays as
//! easy to test as the `closetbot-analysis` crate it sits on.

use chrono::{DateTime, Utc};
use serde::Serialize;

use closetbot_analysis::{
    analyze_engagement, calculate_score as score_breakdown, calculate_similarity, category_score,
    classify, detect_collaboration_signals, extract_hashtags, extract_keywords, filter_hashtags,
    top_posts as rank_top_posts, CollaborationSignal, EngagementPost, Grade, ScoreWeights,
};
use closetbot_discovery::{Discovery, DiscoveryError, InstagramProfile, RetryPolicy};

const MEDIA_LIMIT: u32 = 20;
const MIN_HASHTAG_LEN: usize = 2;
const MIN_KEYWORD_LEN: usize = 2;
const TOP_HASHTAGS: usize = 20;
const TOP_KEYWORDS: usize = 20;
const TOP_CATEGORIES: usize = 3;
const TOP_POSTS: usize = 3;
const MAX_COLLAB_SIGNALS: usize = 10;
const TOP_HASHTAG_DISTRIBUTION: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct BrandFeatures {
    pub handle: String,
    pub followers_count: i32,
    pub media_count: i32,
    pub biography: Option<String>,
    pub categories: Vec<String>,
    pub top_hashtags: Vec<String>,
    pub keywords: Vec<String>,
    pub hashtags: Vec<String>,
    pub media_snapshots: Vec<MediaSnapshotOut>,
}

/// A single fetched post, carried alongside the aggregated features so the
/// executor can persist it as its own `media_snapshots` row.
#[derive(Debug, Clone, Serialize)]
pub struct MediaSnapshotOut {
    pub media_id: String,
    pub caption: Option<String>,
    pub comments_count: i64,
    pub like_count: Option<i64>,
    pub media_type: Option<String>,
    pub permalink: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

fn media_snapshots_from(profile: &InstagramProfile) -> Vec<MediaSnapshotOut> {
    profile
        .media
        .iter()
        .map(|m| MediaSnapshotOut {
            media_id: m.id.clone(),
            caption: m.caption.clone(),
            comments_count: i64::from(m.comments_count),
            like_count: m.like_count.map(i64::from),
            media_type: m.media_type.clone(),
            permalink: m.permalink.clone(),
            posted_at: m.posted_at,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPost {
    pub id: String,
    pub caption: Option<String>,
    pub permalink: Option<String>,
    pub like_count: Option<i64>,
    pub comments_count: i64,
    pub posted_at: Option<DateTime<Utc>>,
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollabSignalOut {
    pub is_collaboration: bool,
    pub collaboration_type: Option<String>,
    pub collab_hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

impl From<CollaborationSignal> for CollabSignalOut {
    fn from(signal: CollaborationSignal) -> Self {
        Self {
            is_collaboration: signal.is_collaboration,
            collaboration_type: signal.collaboration_type.map(|t| t.as_str().to_string()),
            collab_hashtags: signal.collab_hashtags,
            mentions: signal.mentions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfluencerAnalysis {
    pub handle: String,
    pub name: Option<String>,
    pub followers_count: i32,
    pub follows_count: i32,
    pub media_count: i32,
    pub biography: Option<String>,
    pub profile_picture_url: Option<String>,
    pub categories: Vec<String>,
    pub avg_engagement_rate: f64,
    pub similarity_score: f64,
    pub engagement_score: f64,
    pub category_score: f64,
    pub final_score: f64,
    pub grade: Grade,
    pub top_posts: Vec<TopPost>,
    pub collab_signals: Vec<CollabSignalOut>,
    pub hashtag_distribution: Vec<(String, usize)>,
    pub common_hashtags: Vec<String>,
    pub media_snapshots: Vec<MediaSnapshotOut>,
}

struct CaptionExtract {
    hashtags: Vec<String>,
    keywords: Vec<String>,
}

fn extract_from_captions<'a>(captions: impl Iterator<Item = &'a str>) -> CaptionExtract {
    let mut hashtags = Vec::new();
    let mut keywords = Vec::new();
    for caption in captions {
        hashtags.extend(extract_hashtags(caption));
        keywords.extend(extract_keywords(caption, MIN_KEYWORD_LEN));
    }
    CaptionExtract { hashtags, keywords }
}

fn dedupe_preserve_order(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
            if out.len() == limit {
                break;
            }
        }
    }
    out
}

fn build_brand_features(profile: &InstagramProfile) -> BrandFeatures {
    let captions = profile.media.iter().filter_map(|m| m.caption.as_deref());
    let extract = extract_from_captions(captions);

    let hashtags = filter_hashtags(&extract.hashtags, MIN_HASHTAG_LEN, true);
    let keywords = dedupe_preserve_order(extract.keywords, TOP_KEYWORDS);
    let top_hashtags = closetbot_analysis::analyze_hashtag_frequency(&hashtags, TOP_HASHTAGS)
        .into_iter()
        .map(|(tag, _)| tag)
        .collect();
    let categories = classify(&hashtags, &keywords, 0.1)
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(slug, _)| slug.to_string())
        .collect();

    BrandFeatures {
        handle: profile.handle.clone(),
        followers_count: profile.followers_count,
        media_count: profile.media_count,
        biography: profile.biography.clone(),
        categories,
        top_hashtags,
        keywords,
        hashtags,
        media_snapshots: media_snapshots_from(profile),
    }
}

fn build_influencer_analysis(profile: &InstagramProfile, brand: &BrandFeatures) -> InfluencerAnalysis {
    let captions = profile.media.iter().filter_map(|m| m.caption.as_deref());
    let extract = extract_from_captions(captions);

    let hashtags = filter_hashtags(&extract.hashtags, MIN_HASHTAG_LEN, true);
    let keywords = dedupe_preserve_order(extract.keywords, TOP_KEYWORDS);
    let categories = classify(&hashtags, &keywords, 0.1)
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(slug, _)| slug.to_string())
        .collect::<Vec<_>>();

    let followers = i64::from(profile.followers_count);
    let engagement_posts: Vec<EngagementPost> = profile
        .media
        .iter()
        .map(|m| EngagementPost { like_count: m.like_count.map(i64::from), comments_count: i64::from(m.comments_count) })
        .collect();
    let engagement = analyze_engagement(&engagement_posts, followers);

    let collab_signals: Vec<CollabSignalOut> = profile
        .media
        .iter()
        .filter_map(|m| m.caption.as_deref())
        .map(detect_collaboration_signals)
        .filter(|s| s.is_collaboration)
        .take(MAX_COLLAB_SIGNALS)
        .map(CollabSignalOut::from)
        .collect();

    let ranked = rank_top_posts(
        &profile.media,
        followers,
        TOP_POSTS,
        |m| m.like_count.map(i64::from),
        |m| i64::from(m.comments_count),
    );
    let top_posts: Vec<TopPost> = ranked
        .into_iter()
        .map(|ranked| TopPost {
            id: ranked.post.id.clone(),
            caption: ranked.post.caption.clone(),
            permalink: ranked.post.permalink.clone(),
            like_count: ranked.post.like_count.map(i64::from),
            comments_count: i64::from(ranked.post.comments_count),
            posted_at: ranked.post.posted_at,
            engagement_rate: ranked.engagement_rate,
        })
        .collect();

    let similarity = calculate_similarity(&brand.hashtags, &brand.keywords, &hashtags, &keywords, 0.7, 0.3);
    let category = category_score(&brand.categories, &categories);
    let engagement_score = closetbot_analysis::scoring::engagement_score(engagement.avg_engagement_rate, followers);
    let breakdown = score_breakdown(similarity.similarity_score, engagement_score, category, ScoreWeights::default());

    let hashtag_distribution = closetbot_analysis::analyze_hashtag_frequency(&hashtags, TOP_HASHTAG_DISTRIBUTION);

    InfluencerAnalysis {
        handle: profile.handle.clone(),
        name: profile.name.clone(),
        followers_count: profile.followers_count,
        follows_count: profile.follows_count,
        media_count: profile.media_count,
        biography: profile.biography.clone(),
        profile_picture_url: profile.profile_picture_url.clone(),
        categories,
        avg_engagement_rate: engagement.avg_engagement_rate,
        similarity_score: breakdown.similarity_score,
        engagement_score: breakdown.engagement_score,
        category_score: breakdown.category_score,
        final_score: breakdown.final_score,
        grade: breakdown.grade,
        top_posts,
        collab_signals,
        hashtag_distribution,
        common_hashtags: similarity.common_hashtags,
        media_snapshots: media_snapshots_from(profile),
    }
}

/// Fetches and analyzes the brand account: its hashtag/keyword vocabulary
/// and its top 3 fashion categories.
///
/// Returns the features alongside whether the fetch reached the discovery
/// API (`true`) or was served from cache (`false`), for `api_calls_used`
/// bookkeeping.
///
/// # Errors
///
/// Returns whatever [`Discovery::fetch_profile_cached`] returns — a
/// terminal [`DiscoveryError::AccountNotFound`]/[`DiscoveryError::PrivateAccount`]
/// fails the whole job; anything else was already exhausted by the retry
/// policy before reaching here.
pub async fn analyze_brand(discovery: &Discovery, handle: &str, policy: RetryPolicy) -> Result<(BrandFeatures, bool), DiscoveryError> {
    let (profile, live_call) = discovery.fetch_profile_counted(handle, MEDIA_LIMIT, policy).await?;
    Ok((build_brand_features(&profile), live_call))
}

/// Fetches and analyzes a single influencer against the brand's features,
/// producing the full scored record the executor persists.
///
/// Returns the analysis alongside whether the fetch reached the discovery
/// API (`true`) or was served from cache (`false`), for `api_calls_used`
/// bookkeeping.
///
/// # Errors
///
/// Returns whatever [`Discovery::fetch_profile_cached`] returns. The
/// executor treats a terminal error here as "skip this influencer", not as
/// a job failure.
pub async fn analyze_influencer(
    discovery: &Discovery,
    handle: &str,
    brand: &BrandFeatures,
    policy: RetryPolicy,
) -> Result<(InfluencerAnalysis, bool), DiscoveryError> {
    let (profile, live_call) = discovery.fetch_profile_counted(handle, MEDIA_LIMIT, policy).await?;
    Ok((build_influencer_analysis(&profile, brand), live_call))
}
