//! Fuzzy product search with similarity scoring.
//!
//! Matching handles typos, partial words, and incomplete queries: an exact
//! substring hit scores highest, otherwise the best Ratcliff-Obershelp
//! similarity against individual words or the whole field must clear a
//! threshold. Field weights favor product ids over titles over descriptions.

use std::str::FromStr;

use serde::Serialize;

use crate::catalog::Product;
use crate::error::ApiError;

const FUZZY_THRESHOLD: f64 = 0.6;

/// Fields a query can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Description,
    ProductId,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [
        SearchField::Title,
        SearchField::Description,
        SearchField::ProductId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Description => "description",
            SearchField::ProductId => "product_id",
        }
    }
}

impl FromStr for SearchField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SearchField::Title),
            "description" => Ok(SearchField::Description),
            "product_id" => Ok(SearchField::ProductId),
            other => Err(ApiError::ConfigError(format!(
                "unknown search field: {} (expected title, description, or product_id)",
                other
            ))),
        }
    }
}

/// One scored search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub product: Product,
    pub search_score: f64,
    pub similarity: f64,
    pub matched_fields: Vec<String>,
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Longest common substring, then recurse on both remainders.
    let mut best_len = 0;
    let mut best_a = 0;
    let mut best_b = 0;
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                row[j + 1] = len;
                if len > best_len {
                    best_len = len;
                    best_a = i + 1 - len;
                    best_b = j + 1 - len;
                }
            }
        }
        prev = row;
    }

    if best_len == 0 {
        return 0;
    }
    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Similarity ratio in `[0, 1]` over lowercased inputs.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Match `query` against `text`: exact substring first, then best word or
/// whole-text similarity above the threshold.
fn fuzzy_match(query: &str, text: &str) -> (bool, f64) {
    let text_lower = text.to_lowercase();
    if text_lower.contains(query) {
        return (true, 1.0);
    }

    let mut best = similarity_ratio(query, &text_lower);
    for word in text_lower.split_whitespace() {
        best = best.max(similarity_ratio(query, word));
    }

    (best >= FUZZY_THRESHOLD, best)
}

fn field_text<'p>(product: &'p Product, field: SearchField) -> &'p str {
    match field {
        SearchField::Title => product.title.as_deref().unwrap_or(""),
        SearchField::Description => product.description.as_deref().unwrap_or(""),
        SearchField::ProductId => &product.product_id,
    }
}

fn field_score(field: SearchField, similarity: f64) -> f64 {
    // Exact matches take the full weight; fuzzy matches scale within it.
    match field {
        SearchField::Title => {
            if similarity == 1.0 {
                3.0
            } else {
                1.0 + 2.0 * similarity
            }
        }
        SearchField::Description => {
            if similarity == 1.0 {
                2.0
            } else {
                0.6 + 1.4 * similarity
            }
        }
        SearchField::ProductId => {
            if similarity == 1.0 {
                5.0
            } else {
                2.0 + 3.0 * similarity
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score `products` against `query`, returning hits sorted by relevance.
pub fn search_products(
    products: Vec<Product>,
    query: &str,
    fields: &[SearchField],
) -> Vec<SearchHit> {
    let query = query.to_lowercase();
    let mut hits = Vec::new();

    for product in products {
        let mut score = 0.0;
        let mut best_similarity = 0.0f64;
        let mut matched_fields = Vec::new();

        for field in fields {
            let text = field_text(&product, *field);
            if text.is_empty() {
                continue;
            }
            let (found, similarity) = fuzzy_match(&query, text);
            if found {
                score += field_score(*field, similarity);
                best_similarity = best_similarity.max(similarity);
                matched_fields.push(field.name().to_string());
            }
        }

        if score > 0.0 {
            hits.push(SearchHit {
                product,
                search_score: round2(score),
                similarity: round2(best_similarity),
                matched_fields,
            });
        }
    }

    hits.sort_by(|a, b| {
        (b.search_score, b.similarity)
            .partial_cmp(&(a.search_score, a.similarity))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits
}
