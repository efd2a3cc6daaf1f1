//! Cart Model (购物车)

use serde::{Deserialize, Serialize};

use super::OrderLine;

/// Cart line joined with the product it points at
///
/// Unique per (user, product). `final_price` and `subtotal` are filled in by
/// the repository from `price` and `discount_percent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub added_at: i64,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub stock: i64,
    pub image: Option<String>,
    pub discount_percent: f64,

    // -- Computed (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub final_price: f64,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub subtotal: f64,
}

impl CartLine {
    /// Freeze this line into an order line at the current final price
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            product_id: self.product_id,
            name: self.name.clone(),
            price: self.final_price,
            quantity: self.quantity,
            subtotal: self.subtotal,
        }
    }
}
