//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

/// Order status
///
/// ```text
/// pending → processing → shipping → completed
///    └──────────┴────────────┴──────→ cancelled
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipping,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipping => "shipping",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self → next` is an edge of the order state machine
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Processing)
            | (Self::Processing, Self::Shipping)
            | (Self::Shipping, Self::Completed) => true,
            (current, Self::Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    #[serde(rename = "e-wallet")]
    #[cfg_attr(feature = "db", sqlx(rename = "e-wallet"))]
    EWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::EWallet => "e-wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            "e-wallet" => Ok(Self::EWallet),
            other => Err(UnknownVariant::new("payment method", other)),
        }
    }
}

/// One line of a cart snapshot handed to the order engine
///
/// Billed verbatim: the engine never re-reads product prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub name: String,
    /// Unit price the shopper saw (after product discount)
    pub price: f64,
    pub quantity: i64,
    pub subtotal: f64,
}

/// Place-order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user_id: i64,
    pub lines: Vec<OrderLine>,
    pub shipping_address: String,
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    #[serde(default)]
    pub discount_amount: f64,
}

/// Checkout request: the cart supplies the lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkout {
    pub shipping_address: String,
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    #[serde(default)]
    pub discount_amount: f64,
}

impl Checkout {
    /// Bind this checkout to a user and a cart snapshot
    pub fn into_place_order(self, user_id: i64, lines: Vec<OrderLine>) -> PlaceOrder {
        PlaceOrder {
            user_id,
            lines,
            shipping_address: self.shipping_address,
            phone: self.phone,
            payment_method: self.payment_method,
            note: self.note,
            discount_amount: self.discount_amount,
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    /// Σ line subtotals
    pub total_amount: f64,
    pub discount_amount: f64,
    /// total_amount - discount_amount
    pub final_amount: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub phone: String,
    pub note: Option<String>,
    pub order_date: i64,
    pub completed_date: Option<i64>,
}

/// Order with customer info (detail and admin list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderDetail {
    #[cfg_attr(feature = "db", sqlx(flatten))]
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
    pub customer_email: String,
}

/// Order item (frozen copy of the product at purchase time)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipping));
        assert!(OrderStatus::Shipping.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipping));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Shipping.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipping.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("shipping".parse::<OrderStatus>().unwrap(), OrderStatus::Shipping);
        assert!("delivered".parse::<OrderStatus>().is_err());
        assert!("PENDING".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(PaymentMethod::EWallet.as_str(), "e-wallet");
        assert_eq!("e-wallet".parse::<PaymentMethod>().unwrap(), PaymentMethod::EWallet);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::EWallet).unwrap(),
            "\"e-wallet\""
        );
    }
}
