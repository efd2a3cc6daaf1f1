//! Order placement and inventory consistency
//!
//! - **engine**: [`OrderEngine`] - place / checkout / status / cancel
//! - **number**: [`OrderNumberGenerator`] - unique `ORD{YYYYMMDDHHMMSS}{seq}` numbers
//!
//! # Data Flow
//!
//! ```text
//! cart::snapshot → place_order ─┬─ INSERT orders (pending)
//!                               ├─ INSERT order_items (frozen name/price)
//!                               └─ UPDATE products SET stock = stock - q WHERE stock >= q
//!                                        ↓
//!                                  COMMIT (or drop → rollback)
//! ```
//!
//! # Status
//!
//! `pending → processing → shipping → completed`, any non-terminal → `cancelled`.

pub mod engine;
pub mod number;

pub use engine::OrderEngine;
pub use number::OrderNumberGenerator;

/// Default order number prefix
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";
