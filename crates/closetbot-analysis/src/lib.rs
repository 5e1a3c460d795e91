//! Pure-function content analysis for influencer discovery: hashtag/keyword
//! extraction, fashion-category classification, engagement scoring, and
//! brand-to-influencer similarity.
//!
//! Nothing here touches the network or a database — every function takes
//! plain data in and returns plain data out, which is what makes the
//! orchestration layer in `closetbot-server` straightforward to test.

pub mod categories;
pub mod engagement;
pub mod scoring;
pub mod similarity;
pub mod text_processor;

pub use categories::{category_name, classify, match_score, primary_category, Category, CategoryScore};
pub use engagement::{
    analyze_engagement, average_metrics, calculate_engagement_rate, follower_tier, quality_score, tier_percentile,
    top_posts, EngagementMetrics, EngagementPost, RankedPost, Tier,
};
pub use scoring::{calculate_score, category_score, rank, Grade, ScoreBreakdown, ScoreWeights};
pub use similarity::{calculate as calculate_similarity, tfidf_similarity, SimilarityResult};
pub use text_processor::{
    analyze_hashtag_frequency, detect_collaboration_signals, extract_hashtags, extract_keywords, extract_mentions,
    filter_hashtags, CollaborationSignal, CollaborationType,
};
