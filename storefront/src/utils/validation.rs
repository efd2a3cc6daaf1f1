//! Input validation helpers
//!
//! Centralized text length constants and validation functions used by the
//! repositories before anything reaches SQLite (TEXT has no built-in length
//! enforcement).

use crate::db::repository::{RepoError, RepoResult};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, brand, full name
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, specifications, comments
pub const MAX_NOTE_LEN: usize = 2000;

/// Short identifiers: phone, username
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Text ────────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> RepoResult<()> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(RepoError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &Option<String>, field: &str, max_len: usize) -> RepoResult<()> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(RepoError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Username: starts with a letter or underscore, then letters, digits, `_`, `.`
pub fn validate_username(username: &str) -> RepoResult<()> {
    validate_required_text(username, "username", MAX_SHORT_TEXT_LEN)?;
    let mut chars = username.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return Err(RepoError::Validation(format!(
            "username '{username}' may only contain letters, digits, '_' and '.'"
        )));
    }
    Ok(())
}

/// Minimal shape check: `local@domain.tld`, no whitespace
pub fn validate_email(email: &str) -> RepoResult<()> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        });
    if !valid {
        return Err(RepoError::Validation(format!("invalid email '{email}'")));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> RepoResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(RepoError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(RepoError::Validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

// ── Numbers ─────────────────────────────────────────────────────────

/// Maximum unit price (VND)
pub const MAX_PRICE: f64 = 10_000_000_000.0;

/// Maximum quantity per product, per cart line and per order line
pub const MAX_QUANTITY: i64 = 9999;

/// Maximum units on hand for one product
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Maximum line subtotal (`MAX_PRICE × MAX_QUANTITY`)
pub const MAX_LINE_AMOUNT: f64 = MAX_PRICE * MAX_QUANTITY as f64;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
pub fn require_finite(value: f64, field: &str) -> RepoResult<()> {
    if !value.is_finite() {
        return Err(RepoError::Validation(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate that a monetary amount is finite, non-negative and at most `max`.
pub fn validate_amount(value: f64, field: &str, max: f64) -> RepoResult<()> {
    require_finite(value, field)?;
    if value > max {
        return Err(RepoError::Validation(format!(
            "{field} exceeds maximum allowed ({max}), got {value}"
        )));
    }
    if value < 0.0 {
        return Err(RepoError::Validation(format!(
            "{field} cannot be negative: {value}"
        )));
    }
    Ok(())
}

pub fn validate_discount_percent(value: f64) -> RepoResult<()> {
    validate_amount(value, "discount_percent", 100.0)?;
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> RepoResult<()> {
    if quantity <= 0 {
        return Err(RepoError::Validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(RepoError::Validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("john_doe").is_ok());
        assert!(validate_username("_admin").is_ok());
        assert!(validate_username("user1").is_ok());
        assert!(validate_username("1user").is_err());
        assert!(validate_username("user name").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("admin@musicstore.com").is_ok());
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@musicstore.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.d").is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_amount(0.0, "price", MAX_PRICE).is_ok());
        assert!(validate_amount(MAX_PRICE, "price", MAX_PRICE).is_ok());
        assert!(validate_amount(-0.01, "price", MAX_PRICE).is_err());
        assert!(validate_amount(f64::NAN, "price", MAX_PRICE).is_err());
        assert!(validate_amount(1e20, "price", MAX_PRICE).is_err());
        assert!(validate_discount_percent(100.0).is_ok());
        assert!(validate_discount_percent(100.5).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(10_000_000_000).is_err());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 200 multi-byte chars is still within MAX_NAME_LEN
        let name = "é".repeat(MAX_NAME_LEN);
        assert!(validate_required_text(&name, "name", MAX_NAME_LEN).is_ok());
        let name = "é".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&name, "name", MAX_NAME_LEN).is_err());
    }
}
