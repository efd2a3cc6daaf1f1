//! Repository Module
//!
//! Free functions over `&SqlitePool` (one statement, autocommit) or
//! `&mut SqliteConnection` (steps of a caller-owned transaction).

// Auth
pub mod user;

// Catalog
pub mod category;
pub mod product;

// Shopping
pub mod cart;
pub mod order;
pub mod review;

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint (username, email, order number, category name)
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Foreign key target missing
    #[error("Referential violation: {0}")]
    Referential(String),

    /// Illegal status transition, CHECK constraint, negative stock
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid discount: discount {discount} exceeds order total {total}")]
    InvalidDiscount { total: f64, discount: f64 },

    #[error("Insufficient stock for product {product_id} (requested {requested})")]
    StockUnavailable { product_id: i64, requested: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    /// Store unreachable or I/O fault
    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl RepoError {
    /// Illegal-state family (transition, stock, discount)
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            RepoError::InvalidState(_)
                | RepoError::InvalidDiscount { .. }
                | RepoError::StockUnavailable { .. }
        )
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(ref db) => match db.kind() {
                ErrorKind::UniqueViolation => RepoError::Duplicate(db.message().to_string()),
                ErrorKind::ForeignKeyViolation => {
                    RepoError::Referential(db.message().to_string())
                }
                ErrorKind::CheckViolation => RepoError::InvalidState(db.message().to_string()),
                ErrorKind::NotNullViolation => RepoError::Validation(db.message().to_string()),
                _ => RepoError::Database(err.to_string()),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepoError::Connectivity(err.to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("guitar"), "%guitar%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_invalid_state_family() {
        assert!(RepoError::InvalidState("x".into()).is_invalid_state());
        assert!(
            RepoError::StockUnavailable {
                product_id: 1,
                requested: 2
            }
            .is_invalid_state()
        );
        assert!(!RepoError::Duplicate("x".into()).is_invalid_state());
    }
}
