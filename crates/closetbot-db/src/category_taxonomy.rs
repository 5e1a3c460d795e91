//! `category_taxonomy`: the persisted mirror of `closetbot_analysis::categories::FASHION_CATEGORIES`.
//!
//! Classification itself never touches the database — it runs entirely off
//! the static keyword sets. This table exists so the API can list categories
//! without linking the analysis crate's constants, and so a future admin tool
//! could add categories without a code change. Boot seeds it once if empty.

use serde_json::Value;
use sqlx::PgPool;

use closetbot_analysis::categories::FASHION_CATEGORIES;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryTaxonomyRow {
    pub slug: String,
    pub name: String,
    pub keywords: Value,
    pub weight: i32,
    pub parent_slug: Option<String>,
}

/// Returns every row in `category_taxonomy`, in no particular order.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn list_category_taxonomy(pool: &PgPool) -> Result<Vec<CategoryTaxonomyRow>, DbError> {
    Ok(sqlx::query_as::<_, CategoryTaxonomyRow>(
        "SELECT slug, name, keywords, weight, parent_slug FROM category_taxonomy",
    )
    .fetch_all(pool)
    .await?)
}

/// Inserts the ten fixed categories from [`FASHION_CATEGORIES`] if the table
/// is empty. A no-op on every boot after the first. `weight` is stored as an
/// integer percentage (the in-memory `1.0` becomes `100`).
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn seed_category_taxonomy_if_empty(pool: &PgPool) -> Result<u64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM category_taxonomy")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let mut inserted = 0u64;
    for category in FASHION_CATEGORIES.iter() {
        let keywords: Vec<&str> = category.keywords.iter().copied().collect();
        let keywords = serde_json::to_value(keywords).unwrap_or(Value::Array(vec![]));
        let weight = (category.weight * 100.0).round() as i32;

        sqlx::query(
            "INSERT INTO category_taxonomy (slug, name, keywords, weight, parent_slug) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(category.slug)
        .bind(category.name)
        .bind(keywords)
        .bind(weight)
        .bind(category.parent_slug)
        .execute(pool)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}
