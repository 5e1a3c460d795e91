//! Pure text processing over caption strings: hashtag/mention/keyword extraction,
//! stopword and spam filtering, frequency counts, and collaboration-signal detection.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// English common words plus Korean particles and function words, filtered out of
/// keyword extraction. Bilingual because captions in this corpus mix both.
pub static STOPWORDS: LazyLock<std::collections::HashSet<&'static str>> = LazyLock::new(|| {
    [
        // English
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
        "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
        "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now",
        "look", "only", "come", "its", "over", "think", "also", "back", "after", "use", "two",
        "how", "our", "work", "first", "well", "way", "even", "new", "want", "because", "any",
        "these", "give", "day", "most", "us", "is", "was", "are", "were", "been", "has", "had",
        "did", "does", "doing", "done", "am", "being", "having",
        // Korean
        "은", "는", "이", "가", "을", "를", "의", "에", "에서", "로", "으로", "와", "과", "도",
        "만", "이나", "나", "부터", "까지", "에게", "한테", "께", "하고", "이랑", "랑", "으로서",
        "으로써", "같이", "처럼", "만큼", "보다", "더", "덜", "많이", "조금", "아주", "너무",
        "정말", "진짜", "그냥", "무척", "몹시", "매우", "상당히", "약간", "다", "좀", "한", "또",
        "그리고", "하지만", "그래서", "그러나", "그런데", "또는", "혹은", "아니면", "그러면",
        "그렇지만", "그러니까", "오늘", "내일", "어제", "지금", "방금", "곧", "나중에", "먼저",
        "항상", "자주", "가끔", "때때로", "전혀", "결코", "절대",
    ]
    .into_iter()
    .collect()
});

/// Known follow-for-follow / engagement-pod style hashtags to drop from analysis.
///
/// Reproduced verbatim from the source list, including `" gaintrain"` — that entry
/// carries a leading space and so never matches a trimmed, extracted hashtag; kept
/// as-is rather than silently repaired, since filtering is defined over the literal set.
pub static SPAM_HASHTAGS: LazyLock<std::collections::HashSet<&'static str>> = LazyLock::new(|| {
    [
        "fff",
        "f4f",
        "follow4follow",
        "followforfollow",
        "l4l",
        "like4like",
        "likeforlike",
        "tagsforlikes",
        "tflers",
        "followme",
        "followback",
        "pleasefollow",
        "follow4followback",
        "teamfollowback",
        "followall",
        "instafollow",
        "followher",
        "followhim",
        "followforlike",
        "likeback",
        "likes4likes",
        "likesforlikes",
        "spam",
        "spam4spam",
        "recent4recent",
        "r4r",
        "likebackteam",
        "followbackteam",
        " gaintrain",
        "gainpost",
        "sdv",
        "seguidores",
        "followtrick",
        "chuvadelikes",
        "chuvadeseguidores",
        "followmenow",
        "followstagram",
        "followplease",
        "follow4like",
        "instalike",
        "likealways",
        "liketeam",
        "likeall",
        "likebackalways",
        "likeplease",
        "liking",
        "liker",
        "liked",
        "likes",
        "likeme",
    ]
    .into_iter()
    .collect()
});

/// Ordered collaboration hashtags checked in a caption, tested as `#<tag>` substrings.
const COLLAB_TAGS: &[&str] = &[
    "ad",
    "sponsored",
    "partner",
    "partnership",
    "collab",
    "협찬",
    "광고",
    "제품제공",
    "파트너십",
    "협업",
    "유료광고",
    "gifted",
    "pr",
    "review",
    "리뷰",
    "내돈내산",
];

const PAID_TAGS: &[&str] = &["ad", "sponsored", "partner", "partnership", "광고", "유료광고", "파트너십"];
const GIFTED_TAGS: &[&str] = &["gifted", "pr", "제품제공", "review", "리뷰"];
const COLLAB_TYPE_TAGS: &[&str] = &["collab", "협찬", "협업"];

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\w+)").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http[s]?://\S+").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Za-z가-힣]+\b").unwrap());

/// Extracts `#hashtag` occurrences, lowercased and trimmed, dropping empties.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Extracts `@mention` occurrences, lowercased and trimmed, dropping empties.
#[must_use]
pub fn extract_mentions(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    MENTION_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Extracts keyword tokens: strips hashtags/mentions/URLs, tokenizes, lowercases,
/// and drops anything shorter than `min_length` or in [`STOPWORDS`].
#[must_use]
pub fn extract_keywords(text: &str, min_length: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let without_tags = HASHTAG_RE.replace_all(text, "");
    let without_mentions = MENTION_RE.replace_all(&without_tags, "");
    let without_urls = URL_RE.replace_all(&without_mentions, "");

    WORD_RE
        .find_iter(&without_urls)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= min_length && !STOPWORDS.contains(w.as_str()))
        .collect()
}

/// Drops short, purely-numeric, or known-spam hashtags.
#[must_use]
pub fn filter_hashtags(hashtags: &[String], min_length: usize, remove_spam: bool) -> Vec<String> {
    hashtags
        .iter()
        .filter(|tag| tag.chars().count() >= min_length)
        .filter(|tag| !remove_spam || !SPAM_HASHTAGS.contains(tag.as_str()))
        .filter(|tag| !(!tag.is_empty() && tag.chars().all(|c| c.is_ascii_digit())))
        .cloned()
        .collect()
}

/// Returns the `top_n` most frequent hashtags, descending by count.
///
/// Ties break by first-seen order, matching `collections.Counter.most_common`.
#[must_use]
pub fn analyze_hashtag_frequency(hashtags: &[String], top_n: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&String> = Vec::new();
    let mut counts: HashMap<&String, usize> = HashMap::new();
    for tag in hashtags {
        *counts.entry(tag).or_insert_with(|| {
            order.push(tag);
            0
        }) += 1;
    }

    let mut pairs: Vec<(String, usize)> = order
        .into_iter()
        .map(|tag| (tag.clone(), counts[tag]))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.truncate(top_n);
    pairs
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaborationType {
    Paid,
    Gifted,
    Collab,
}

impl CollaborationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::Paid => "paid",
            CollaborationType::Gifted => "gifted",
            CollaborationType::Collab => "collab",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollaborationSignal {
    pub is_collaboration: bool,
    pub collaboration_type: Option<CollaborationType>,
    pub collab_hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

/// Detects collaboration/sponsorship indicators in a single caption.
#[must_use]
pub fn detect_collaboration_signals(text: &str) -> CollaborationSignal {
    let text_lower = text.to_lowercase();

    let found_tags: Vec<String> = COLLAB_TAGS
        .iter()
        .filter(|tag| text_lower.contains(&format!("#{tag}")))
        .map(|tag| (*tag).to_string())
        .collect();

    let mentions = extract_mentions(text);

    let collaboration_type = if found_tags.iter().any(|t| PAID_TAGS.contains(&t.as_str())) {
        Some(CollaborationType::Paid)
    } else if found_tags.iter().any(|t| GIFTED_TAGS.contains(&t.as_str())) {
        Some(CollaborationType::Gifted)
    } else if found_tags
        .iter()
        .any(|t| COLLAB_TYPE_TAGS.contains(&t.as_str()))
    {
        Some(CollaborationType::Collab)
    } else {
        None
    };

    CollaborationSignal {
        is_collaboration: !found_tags.is_empty() || !mentions.is_empty(),
        collaboration_type,
        collab_hashtags: found_tags,
        mentions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_hashtags_lowercases_and_trims() {
        let tags = extract_hashtags("Love #Fashion #MINIMAL and #eco!");
        assert_eq!(tags, vec!["fashion", "minimal", "eco"]);
    }

    #[test]
    fn extract_hashtags_empty_text() {
        assert!(extract_hashtags("").is_empty());
    }

    #[test]
    fn extract_mentions_lowercases() {
        let mentions = extract_mentions("shoutout to @BrandX and @Someone_Else");
        assert_eq!(mentions, vec!["brandx", "someone_else"]);
    }

    #[test]
    fn extract_keywords_strips_tags_mentions_urls() {
        let keywords = extract_keywords(
            "Check out https://example.com/x #fashion @brandx this outfit rocks",
            2,
        );
        assert!(keywords.contains(&"outfit".to_string()));
        assert!(keywords.contains(&"rocks".to_string()));
        assert!(!keywords.iter().any(|k| k == "fashion"));
        assert!(!keywords.iter().any(|k| k.contains("http")));
    }

    #[test]
    fn extract_keywords_drops_stopwords_and_short_tokens() {
        let keywords = extract_keywords("I am the best of all", 2);
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"i".to_string()));
    }

    #[test]
    fn filter_hashtags_drops_spam_and_numeric_and_short() {
        let tags = vec![
            "fashion".to_string(),
            "f4f".to_string(),
            "12345".to_string(),
            "a".to_string(),
            "minimal".to_string(),
        ];
        let filtered = filter_hashtags(&tags, 2, true);
        assert_eq!(filtered, vec!["fashion".to_string(), "minimal".to_string()]);
    }

    #[test]
    fn leading_space_spam_hashtag_never_matches_extracted_tags() {
        // " gaintrain" carries a leading space in the source spam set; a tag
        // extracted from text is always already trimmed, so it can never hit.
        let tags = vec!["gaintrain".to_string()];
        assert_eq!(filter_hashtags(&tags, 2, true), tags);
    }

    #[test]
    fn analyze_hashtag_frequency_sorts_descending() {
        let tags = vec![
            "fashion".to_string(),
            "minimal".to_string(),
            "fashion".to_string(),
            "eco".to_string(),
            "fashion".to_string(),
        ];
        let freq = analyze_hashtag_frequency(&tags, 2);
        assert_eq!(freq[0], ("fashion".to_string(), 3));
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn detect_collaboration_signals_paid() {
        let signal = detect_collaboration_signals("Love this outfit! #ad @brandx");
        assert!(signal.is_collaboration);
        assert_eq!(signal.collaboration_type, Some(CollaborationType::Paid));
        assert_eq!(signal.collab_hashtags, vec!["ad".to_string()]);
        assert_eq!(signal.mentions, vec!["brandx".to_string()]);
    }

    #[test]
    fn detect_collaboration_signals_gifted() {
        let signal = detect_collaboration_signals("Thanks for the #gifted items!");
        assert_eq!(signal.collaboration_type, Some(CollaborationType::Gifted));
    }

    #[test]
    fn detect_collaboration_signals_none() {
        let signal = detect_collaboration_signals("Just a regular caption with no tags");
        assert!(!signal.is_collaboration);
        assert!(signal.collaboration_type.is_none());
    }
}
