//! Weighted aggregation of component scores into a final score and letter grade.

use std::collections::HashSet;

use crate::engagement::quality_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    D,
    C,
    B,
    A,
}

impl Grade {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }

    /// Lowest `final_score` that still belongs to this band.
    #[must_use]
    pub fn floor(self) -> f64 {
        match self {
            Grade::A => 80.0,
            Grade::B => 60.0,
            Grade::C => 40.0,
            Grade::D => 0.0,
        }
    }

    fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Grade::A
        } else if score >= 60.0 {
            Grade::B
        } else if score >= 40.0 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

/// The three weights `calculate_score` applies to similarity/engagement/category.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub similarity: f64,
    pub engagement: f64,
    pub category: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            similarity: 0.40,
            engagement: 0.35,
            category: 0.25,
        }
    }
}

impl ScoreWeights {
    /// Normalizes the weights to sum to `1.0`, warning if they didn't already.
    /// Falls back to the default split if all three are zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let sum = self.similarity + self.engagement + self.category;
        if sum <= 0.0 {
            tracing::warn!("score weights summed to zero; using defaults");
            return Self::default();
        }
        if (sum - 1.0).abs() > 1e-9 {
            tracing::warn!(sum, "score weights did not sum to 1.0; normalizing");
        }
        Self {
            similarity: self.similarity / sum,
            engagement: self.engagement / sum,
            category: self.category / sum,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub similarity_score: f64,
    pub engagement_score: f64,
    pub category_score: f64,
    pub final_score: f64,
    pub grade: Grade,
}

/// Jaccard similarity of two category-slug sets, scaled to `0..=100`. Either
/// side being empty returns a neutral `50.0` rather than `0.0` — an influencer
/// or brand with no classified category shouldn't be penalized as a mismatch.
#[must_use]
pub fn category_score(brand_categories: &[String], influencer_categories: &[String]) -> f64 {
    if brand_categories.is_empty() || influencer_categories.is_empty() {
        return 50.0;
    }
    let brand: HashSet<&str> = brand_categories.iter().map(String::as_str).collect();
    let infl: HashSet<&str> = influencer_categories.iter().map(String::as_str).collect();
    let union = brand.union(&infl).count();
    if union == 0 {
        return 50.0;
    }
    let jaccard = brand.intersection(&infl).count() as f64 / union as f64;
    (jaccard * 100.0 * 10.0).round() / 10.0
}

/// Delegates to [`crate::engagement::quality_score`].
#[must_use]
pub fn engagement_score(avg_engagement_rate: f64, followers: i64) -> f64 {
    quality_score(avg_engagement_rate, followers)
}

/// Combines the three component scores into a final weighted score and grade.
#[must_use]
pub fn calculate_score(
    similarity_score: f64,
    engagement_score: f64,
    category_score: f64,
    weights: ScoreWeights,
) -> ScoreBreakdown {
    let w = weights.normalized();
    let final_score = similarity_score * w.similarity + engagement_score * w.engagement + category_score * w.category;
    let final_score = (final_score * 10.0).round() / 10.0;

    ScoreBreakdown {
        similarity_score,
        engagement_score,
        category_score,
        final_score,
        grade: Grade::from_score(final_score),
    }
}

/// Filters `results` to those at or above `min_grade`'s floor (if given), then
/// sorts descending by `final_score`.
pub fn rank<T>(mut results: Vec<T>, min_grade: Option<Grade>, final_score: impl Fn(&T) -> f64) -> Vec<T> {
    if let Some(min) = min_grade {
        results.retain(|r| final_score(r) >= min.floor());
    }
    results.sort_by(|a, b| final_score(b).partial_cmp(&final_score(a)).unwrap_or(std::cmp::Ordering::Equal));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_score_empty_side_is_neutral() {
        assert_eq!(category_score(&[], &["minimal".to_string()]), 50.0);
        assert_eq!(category_score(&["minimal".to_string()], &[]), 50.0);
    }

    #[test]
    fn category_score_identical_is_one_hundred() {
        let cats = vec!["minimal".to_string(), "casual".to_string()];
        assert_eq!(category_score(&cats, &cats), 100.0);
    }

    #[test]
    fn grade_bands_are_disjoint_at_boundaries() {
        assert_eq!(Grade::from_score(79.9), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::A);
        assert_eq!(Grade::from_score(59.9), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::B);
        assert_eq!(Grade::from_score(39.9), Grade::D);
        assert_eq!(Grade::from_score(40.0), Grade::C);
        assert_eq!(Grade::from_score(0.0), Grade::D);
    }

    #[test]
    fn calculate_score_matches_worked_example() {
        // sim=90, eng=40, cat=60 with default weights => 36 + 14 + 15 = 65, grade B.
        let breakdown = calculate_score(90.0, 40.0, 60.0, ScoreWeights::default());
        assert_eq!(breakdown.final_score, 65.0);
        assert_eq!(breakdown.grade, Grade::B);
    }

    #[test]
    fn weights_normalize_when_not_summing_to_one() {
        let weights = ScoreWeights {
            similarity: 0.8,
            engagement: 0.7,
            category: 0.5,
        };
        let normalized = weights.normalized();
        let sum = normalized.similarity + normalized.engagement + normalized.category;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_all_zero_falls_back_to_default() {
        let weights = ScoreWeights {
            similarity: 0.0,
            engagement: 0.0,
            category: 0.0,
        };
        let normalized = weights.normalized();
        assert_eq!(normalized.similarity, ScoreWeights::default().similarity);
    }

    #[test]
    fn rank_filters_by_min_grade_and_sorts_descending() {
        let results = vec![30.0, 90.0, 65.0, 45.0];
        let ranked = rank(results, Some(Grade::C), |x: &f64| *x);
        assert_eq!(ranked, vec![90.0, 65.0, 45.0]);
    }
}
