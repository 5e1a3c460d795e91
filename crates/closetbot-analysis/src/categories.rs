//! Fixed fashion-category taxonomy and keyword-overlap classification.

use std::collections::HashSet;
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub struct Category {
    pub slug: &'static str,
    pub name: &'static str,
    pub keywords: HashSet<&'static str>,
    pub weight: f64,
    pub parent_slug: Option<&'static str>,
}

macro_rules! category {
    ($slug:expr, $name:expr, [$($kw:expr),+ $(,)?]) => {
        Category {
            slug: $slug,
            name: $name,
            keywords: [$($kw),+].into_iter().collect(),
            weight: 1.0,
            parent_slug: None,
        }
    };
}

/// The ten fixed fashion categories, in canonical order. Mirrors the rows a
/// migration seeds into `category_taxonomy`; kept as static data here so
/// classification never pays for a database round trip.
pub static FASHION_CATEGORIES: LazyLock<Vec<Category>> = LazyLock::new(|| {
    vec![
        category!(
            "minimal",
            "미니멀",
            [
                "minimal", "minimalism", "minimalist", "simple", "clean", "basic", "essentials",
                "classic", "neutral", "simplicity", "understated", "미니멀", "미니멀룩", "심플",
                "클린", "베이직", "미니멀리스트", "미니멀패션", "심플룩", "모던", "깔끔한",
                "단정한", "미니멀스타일",
            ]
        ),
        category!(
            "streetwear",
            "스트리트",
            [
                "streetwear", "street", "urban", "hiphop", "sneakers", "kicks", "hypebeast",
                "supreme", "nike", "adidas", "jordan", "yeezy", "오버핏", "스트릿", "스트리트",
                "힙합", "스니커즈", "스트릿패션", "스트리트패션", "오버사이즈", "레이어드",
                "힙한", "힙스터",
            ]
        ),
        category!(
            "luxury",
            "럭셔리",
            [
                "luxury", "lux", "designer", "highfashion", "highend", "premium", "chanel",
                "gucci", "prada", "lv", "louisvuitton", "hermes", "럭셔리", "명품", "하이엔드",
                "디자이너", "명품패션", "고급스러운", "프리미엄", "럭셔리패션", "명품스타일",
                "우아한", "품격있는",
            ]
        ),
        category!(
            "casual",
            "캐주얼",
            [
                "casual", "daily", "everyday", "comfy", "comfortable", "relaxed", "weekend",
                "laidback", "effortless", "easy", "캐주얼", "데일리", "일상", "편안한", "편한",
                "캐주얼룩", "데일리룩", "일상룩", "편한옷", "캐주얼패션", "일상패션", "휴일룩",
            ]
        ),
        category!(
            "vintage",
            "빈티지",
            [
                "vintage", "retro", "old-school", "secondhand", "thrifted", "thrift", "antique",
                "classic", "heritage", "oldschool", "빈티지", "레트로", "올드스쿨", "중고",
                "빈티지룩", "빈티지패션", "레트로룩", "레트로패션", "고전적인", "클래식", "옛날",
            ]
        ),
        category!(
            "feminine",
            "페미닌",
            [
                "feminine", "girly", "romantic", "elegant", "graceful", "lovely", "chic", "dress",
                "skirt", "floral", "lace", "pink", "페미닌", "여성스러운", "로맨틱", "우아한",
                "귀여운", "러블리", "페미닌룩", "페미닌패션", "원피스", "치마", "레이스", "플로럴",
            ]
        ),
        category!(
            "menswear",
            "남성복",
            [
                "menswear", "mensfashion", "menstyle", "dapper", "gentleman", "suit", "tailored",
                "formal", "business", "남성복", "남성패션", "남자패션", "맨즈웨어", "정장", "수트",
                "신사", "젠틀맨", "맨즈룩", "남친룩", "비즈니스룩", "정장룩",
            ]
        ),
        category!(
            "sportswear",
            "스포츠웨어",
            [
                "sportswear", "athleisure", "athletic", "gym", "workout", "fitness", "activewear",
                "running", "training", "sports", "yoga", "스포츠웨어", "애슬레저", "운동복",
                "헬스복", "요가복", "피트니스", "운동", "헬스", "러닝", "트레이닝", "홈트",
                "애슬레저룩",
            ]
        ),
        category!(
            "bohemian",
            "보헤미안",
            [
                "bohemian", "boho", "hippie", "ethnic", "tribal", "festival", "freespirit",
                "flowy", "maxi", "natural", "earthy", "보헤미안", "보호", "힙피", "에스닉",
                "자유로운", "페스티벌", "보헤미안룩", "보헤미안패션", "맥시", "자연스러운",
                "내추럴",
            ]
        ),
        category!(
            "preppy",
            "프레피",
            [
                "preppy", "ivy", "college", "academic", "classic", "polo", "sweater", "blazer",
                "oxford", "loafer", "plaid", "tartan", "프레피", "아이비", "대학생", "아카데믹",
                "클래식", "폴로", "스웨터", "블레이저", "플레드", "체크", "학생룩", "캠퍼스룩",
            ]
        ),
    ]
});

/// A `(slug, score)` pair as produced by [`classify`].
pub type CategoryScore = (&'static str, f64);

/// Scores every category against the union of hashtags and keywords, keeping
/// only categories at or above `min_score`, sorted descending by score.
#[must_use]
pub fn classify(hashtags: &[String], keywords: &[String], min_score: f64) -> Vec<CategoryScore> {
    let all_terms: HashSet<String> = hashtags
        .iter()
        .chain(keywords.iter())
        .map(|s| s.to_lowercase())
        .collect();

    let mut scores: Vec<CategoryScore> = FASHION_CATEGORIES
        .iter()
        .filter_map(|category| {
            let matches = all_terms
                .iter()
                .filter(|term| category.keywords.contains(term.as_str()))
                .count();
            if matches == 0 {
                return None;
            }
            let score = (matches as f64 / category.keywords.len() as f64) * category.weight;
            (score >= min_score).then_some((category.slug, score))
        })
        .collect();

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

/// Returns the top-scoring category, or `(None, 0.0)` if nothing matched.
#[must_use]
pub fn primary_category(hashtags: &[String], keywords: &[String]) -> (Option<&'static str>, f64) {
    classify(hashtags, keywords, 0.1)
        .into_iter()
        .next()
        .map_or((None, 0.0), |(slug, score)| (Some(slug), score))
}

/// Jaccard similarity between two slug sets; 0.0 if either side is empty.
#[must_use]
pub fn match_score(brand_slugs: &[String], influencer_slugs: &[String]) -> f64 {
    if brand_slugs.is_empty() || influencer_slugs.is_empty() {
        return 0.0;
    }
    let brand: HashSet<&str> = brand_slugs.iter().map(String::as_str).collect();
    let influencer: HashSet<&str> = influencer_slugs.iter().map(String::as_str).collect();
    let union = brand.union(&influencer).count();
    if union == 0 {
        return 0.0;
    }
    brand.intersection(&influencer).count() as f64 / union as f64
}

/// Display name for a slug, or the slug itself if unknown.
#[must_use]
pub fn category_name(slug: &str) -> String {
    FASHION_CATEGORIES
        .iter()
        .find(|c| c.slug == slug)
        .map_or_else(|| slug.to_string(), |c| c.name.to_string())
}
