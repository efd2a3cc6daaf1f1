//! Review Model

use serde::{Deserialize, Serialize};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Review entity with reviewer username joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: i64,
}

/// Create review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

/// Aggregate rating for one product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RatingSummary {
    pub review_count: i64,
    /// `None` when the product has no reviews
    pub average_rating: Option<f64>,
}
