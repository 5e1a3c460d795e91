//! Per-post engagement rate, follower-tier classification, and quality scoring.

/// A minimal post projection engagement math needs. `like_count` is `None` when
/// the discovery API didn't return it (never silently coerced to zero upstream).
#[derive(Debug, Clone)]
pub struct EngagementPost {
    pub like_count: Option<i64>,
    pub comments_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Nano,
    Micro,
    Mid,
    Macro,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Nano => "nano",
            Tier::Micro => "micro",
            Tier::Mid => "mid",
            Tier::Macro => "macro",
        }
    }

    fn benchmark(self) -> Benchmark {
        match self {
            Tier::Nano => Benchmark { low: 3.0, avg: 5.0, high: 8.0 },
            Tier::Micro => Benchmark { low: 2.0, avg: 3.5, high: 6.0 },
            Tier::Mid => Benchmark { low: 1.5, avg: 2.5, high: 4.0 },
            Tier::Macro => Benchmark { low: 1.0, avg: 1.8, high: 3.0 },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Benchmark {
    low: f64,
    avg: f64,
    high: f64,
}

/// Returns the follower tier; `< 1,000` is treated as a synonym of `nano`.
#[must_use]
pub fn follower_tier(followers: i64) -> Tier {
    match followers {
        f if f >= 200_000 => Tier::Macro,
        f if f >= 50_000 => Tier::Mid,
        f if f >= 10_000 => Tier::Micro,
        _ => Tier::Nano,
    }
}

/// Engagement rate for one post: `likes / followers * 100`, falling back to
/// `comments * 3` when `like_count` is absent. `followers = 0` always yields `0.0`.
#[must_use]
pub fn calculate_engagement_rate(like_count: Option<i64>, comments_count: i64, followers: i64) -> f64 {
    if followers == 0 {
        return 0.0;
    }
    let engagement = like_count.unwrap_or(comments_count * 3);
    round2((engagement as f64 / followers as f64) * 100.0)
}

#[derive(Debug, Clone)]
pub struct EngagementMetrics {
    pub avg_engagement_rate: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub posts_analyzed: usize,
    pub tier_percentile: f64,
    pub quality_score: f64,
}

/// Arithmetic mean of per-post rate/likes/comments across `posts`.
#[must_use]
pub fn average_metrics(posts: &[EngagementPost], followers: i64) -> (f64, f64, f64, usize) {
    if posts.is_empty() {
        return (0.0, 0.0, 0.0, 0);
    }

    let mut rate_sum = 0.0;
    let mut likes_sum = 0.0;
    let mut comments_sum = 0.0;

    for post in posts {
        rate_sum += calculate_engagement_rate(post.like_count, post.comments_count, followers);
        likes_sum += post.like_count.unwrap_or(0) as f64;
        comments_sum += post.comments_count as f64;
    }

    let n = posts.len() as f64;
    (
        round2(rate_sum / n),
        (likes_sum / n).round(),
        (comments_sum / n).round(),
        posts.len(),
    )
}

/// Percentile (0-100) of `rate` within its tier's benchmark band.
#[must_use]
pub fn tier_percentile(rate: f64, followers: i64) -> f64 {
    let b = follower_tier(followers).benchmark();
    let percentile = if rate <= b.low {
        (rate / b.low) * 25.0
    } else if rate <= b.avg {
        25.0 + ((rate - b.low) / (b.avg - b.low)) * 25.0
    } else if rate <= b.high {
        50.0 + ((rate - b.avg) / (b.high - b.avg)) * 25.0
    } else {
        (75.0 + ((rate - b.high) / b.high) * 25.0).min(100.0)
    };
    (percentile * 10.0).round() / 10.0
}

/// Engagement quality score (0-100, integer-valued `f64`) for `rate` within its tier.
#[must_use]
pub fn quality_score(rate: f64, followers: i64) -> f64 {
    let b = follower_tier(followers).benchmark();

    let base = if rate >= b.high {
        90.0
    } else if rate >= b.avg {
        let ratio = (rate - b.avg) / (b.high - b.avg);
        60.0 + ratio * 30.0
    } else if rate >= b.low {
        let ratio = (rate - b.low) / (b.avg - b.low);
        30.0 + ratio * 30.0
    } else {
        let ratio = (rate / b.low).min(1.0);
        ratio * 30.0
    };

    base.round().clamp(0.0, 100.0)
}

/// Full engagement analysis: averages plus tier percentile and quality score.
#[must_use]
pub fn analyze_engagement(posts: &[EngagementPost], followers: i64) -> EngagementMetrics {
    let (avg_rate, avg_likes, avg_comments, posts_analyzed) = average_metrics(posts, followers);
    EngagementMetrics {
        avg_engagement_rate: avg_rate,
        avg_likes,
        avg_comments,
        posts_analyzed,
        tier_percentile: tier_percentile(avg_rate, followers),
        quality_score: quality_score(avg_rate, followers),
    }
}

/// A post annotated with its computed engagement rate, for top-N selection.
#[derive(Debug, Clone)]
pub struct RankedPost<P> {
    pub post: P,
    pub engagement_rate: f64,
}

/// Returns the top `n` posts by engagement rate, descending.
pub fn top_posts<P: Clone>(
    posts: &[P],
    followers: i64,
    n: usize,
    like_count: impl Fn(&P) -> Option<i64>,
    comments_count: impl Fn(&P) -> i64,
) -> Vec<RankedPost<P>> {
    let mut ranked: Vec<RankedPost<P>> = posts
        .iter()
        .map(|p| RankedPost {
            post: p.clone(),
            engagement_rate: calculate_engagement_rate(like_count(p), comments_count(p), followers),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.engagement_rate
            .partial_cmp(&a.engagement_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_followers_yields_zero_rate() {
        assert_eq!(calculate_engagement_rate(Some(1000), 50, 0), 0.0);
    }

    #[test]
    fn rate_uses_likes_when_present() {
        let rate = calculate_engagement_rate(Some(1000), 50, 45_000);
        assert_eq!(rate, 2.22);
    }

    #[test]
    fn rate_falls_back_to_comments_times_three_when_likes_absent() {
        let rate = calculate_engagement_rate(None, 50, 45_000);
        assert_eq!(rate, round2((50.0 * 3.0 / 45_000.0) * 100.0));
    }

    #[test]
    fn follower_tier_boundaries() {
        assert_eq!(follower_tier(500).as_str(), "nano");
        assert_eq!(follower_tier(1_000).as_str(), "nano");
        assert_eq!(follower_tier(10_000).as_str(), "micro");
        assert_eq!(follower_tier(50_000).as_str(), "mid");
        assert_eq!(follower_tier(200_000).as_str(), "macro");
    }

    #[test]
    fn quality_score_zero_followers_is_zero() {
        assert_eq!(quality_score(0.0, 0), 0.0);
    }

    #[test]
    fn quality_score_at_high_benchmark_is_ninety() {
        assert_eq!(quality_score(8.0, 5_000), 90.0);
    }

    #[test]
    fn quality_score_below_low_is_partial() {
        let score = quality_score(1.5, 45_000); // micro: low=2.0
        assert!(score > 0.0 && score < 30.0);
    }

    #[test]
    fn average_metrics_empty_posts() {
        let (rate, likes, comments, n) = average_metrics(&[], 10_000);
        assert_eq!((rate, likes, comments, n), (0.0, 0.0, 0.0, 0));
    }

    #[test]
    fn top_posts_sorted_descending_by_rate() {
        let posts = vec![
            EngagementPost { like_count: Some(100), comments_count: 5 },
            EngagementPost { like_count: Some(5000), comments_count: 5 },
            EngagementPost { like_count: Some(500), comments_count: 5 },
        ];
        let ranked = top_posts(&posts, 100_000, 2, |p| p.like_count, |p| p.comments_count);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].engagement_rate >= ranked[1].engagement_rate);
    }
}
