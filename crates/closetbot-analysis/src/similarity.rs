//! Weighted-Jaccard similarity between a brand's and an influencer's hashtags and keywords.

use std::collections::HashSet;

/// Full breakdown returned by [`calculate`].
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    pub similarity_score: f64,
    pub hashtag_similarity: f64,
    pub keyword_similarity: f64,
    pub common_hashtags: Vec<String>,
    pub common_keywords: Vec<String>,
    pub brand_hashtag_count: usize,
    pub influencer_hashtag_count: usize,
    pub overlap_hashtag_count: usize,
}

fn normalize(terms: &[String]) -> HashSet<String> {
    terms.iter().map(|t| t.to_lowercase()).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn common_terms(a: &HashSet<String>, b: &HashSet<String>) -> Vec<String> {
    let mut common: Vec<String> = a.intersection(b).cloned().collect();
    common.sort();
    common
}

/// Weighted hashtag/keyword Jaccard similarity between a brand and an influencer.
/// Inputs are lowercased and deduplicated before comparison. `w_h + w_k` need not
/// sum to `1.0`; callers pass the defaults `0.7`/`0.3` unless overriding.
#[must_use]
pub fn calculate(
    brand_hashtags: &[String],
    brand_keywords: &[String],
    influencer_hashtags: &[String],
    influencer_keywords: &[String],
    w_h: f64,
    w_k: f64,
) -> SimilarityResult {
    let brand_tags = normalize(brand_hashtags);
    let infl_tags = normalize(influencer_hashtags);
    let brand_kws = normalize(brand_keywords);
    let infl_kws = normalize(influencer_keywords);

    let hashtag_similarity = jaccard(&brand_tags, &infl_tags);
    let keyword_similarity = jaccard(&brand_kws, &infl_kws);
    let weighted = hashtag_similarity * w_h + keyword_similarity * w_k;

    SimilarityResult {
        similarity_score: (weighted * 100.0 * 10.0).round() / 10.0,
        hashtag_similarity,
        keyword_similarity,
        common_hashtags: common_terms(&brand_tags, &infl_tags),
        common_keywords: common_terms(&brand_kws, &infl_kws),
        brand_hashtag_count: brand_tags.len(),
        influencer_hashtag_count: infl_tags.len(),
        overlap_hashtag_count: brand_tags.intersection(&infl_tags).count(),
    }
}

/// Per-tag TF-IDF weighted similarity: `sum min(tf*idf) / sum max(tf*idf)` across
/// the union of terms. `idf` defaults to `1.0` for any term absent from the map;
/// computing corpus-derived IDF values is not this crate's concern — callers
/// supply them.
#[must_use]
pub fn tfidf_similarity(
    brand_terms: &std::collections::HashMap<String, f64>,
    influencer_terms: &std::collections::HashMap<String, f64>,
    idf: &std::collections::HashMap<String, f64>,
) -> f64 {
    let union: HashSet<&String> = brand_terms.keys().chain(influencer_terms.keys()).collect();
    if union.is_empty() {
        return 0.0;
    }

    let mut min_sum = 0.0;
    let mut max_sum = 0.0;
    for term in union {
        let weight = *idf.get(term).unwrap_or(&1.0);
        let a = brand_terms.get(term).copied().unwrap_or(0.0) * weight;
        let b = influencer_terms.get(term).copied().unwrap_or(0.0) * weight;
        min_sum += a.min(b);
        max_sum += a.max(b);
    }

    if max_sum == 0.0 {
        0.0
    } else {
        min_sum / max_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn identical_hashtags_and_keywords_score_one_hundred() {
        let tags = vec!["minimal".to_string(), "casual".to_string()];
        let kws = vec!["simple".to_string()];
        let result = calculate(&tags, &kws, &tags, &kws, 0.7, 0.3);
        assert_eq!(result.similarity_score, 100.0);
        assert_eq!(result.hashtag_similarity, 1.0);
        assert_eq!(result.keyword_similarity, 1.0);
    }

    #[test]
    fn disjoint_sets_score_zero() {
        let a = vec!["minimal".to_string()];
        let b = vec!["luxury".to_string()];
        let result = calculate(&a, &[], &b, &[], 0.7, 0.3);
        assert_eq!(result.similarity_score, 0.0);
        assert!(result.common_hashtags.is_empty());
    }

    #[test]
    fn empty_union_is_zero_not_nan() {
        let result = calculate(&[], &[], &[], &[], 0.7, 0.3);
        assert_eq!(result.similarity_score, 0.0);
    }

    #[test]
    fn common_hashtags_case_insensitive() {
        let a = vec!["Minimal".to_string()];
        let b = vec!["minimal".to_string()];
        let result = calculate(&a, &[], &b, &[], 0.7, 0.3);
        assert_eq!(result.common_hashtags, vec!["minimal".to_string()]);
    }

    #[test]
    fn partial_overlap_weighted_correctly() {
        // hashtags: {a,b} vs {a,c} -> J = 1/3; keywords identical -> J = 1.0
        let brand_tags = vec!["a".to_string(), "b".to_string()];
        let infl_tags = vec!["a".to_string(), "c".to_string()];
        let kws = vec!["x".to_string()];
        let result = calculate(&brand_tags, &kws, &infl_tags, &kws, 0.7, 0.3);
        let expected = ((1.0 / 3.0) * 0.7 + 1.0 * 0.3) * 100.0;
        assert_eq!(result.similarity_score, (expected * 10.0).round() / 10.0);
    }

    #[test]
    fn tfidf_similarity_identical_terms_is_one() {
        let mut terms = HashMap::new();
        terms.insert("minimal".to_string(), 2.0);
        let idf = HashMap::new();
        assert_eq!(tfidf_similarity(&terms, &terms, &idf), 1.0);
    }

    #[test]
    fn tfidf_similarity_empty_is_zero() {
        let empty = HashMap::new();
        assert_eq!(tfidf_similarity(&empty, &empty, &empty), 0.0);
    }
}
