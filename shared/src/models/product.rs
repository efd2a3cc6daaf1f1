//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub brand: String,
    /// Unit price in currency unit
    pub price: f64,
    pub stock: i64,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<String>,
    /// Discount in percentage (e.g., 10 = 10%)
    pub discount_percent: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product with its category name joined in (catalog views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductWithCategory {
    #[cfg_attr(feature = "db", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub category_id: i64,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub stock: i64,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<String>,
    pub discount_percent: Option<f64>,
}

/// Update product payload
///
/// `stock` overwrites the counter (admin correction); relative moves use `adjust_stock`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<String>,
    pub discount_percent: Option<f64>,
    pub is_active: Option<bool>,
}
