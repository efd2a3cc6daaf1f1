//! Data models
//!
//! Shared between the storefront engine and its UI collaborators.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps Unix millis.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use cart::*;
pub use category::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;

/// A string did not name any variant of a closed set (status, role, ...)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
