//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` (rounded to 2 dp) for storage and serialization.

use crate::db::repository::{RepoError, RepoResult};
use rust_decimal::prelude::*;
use shared::models::OrderLine;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert f64 to Decimal for calculations
///
/// If NaN/Infinity somehow reaches here, logs an error and returns ZERO
/// to avoid silent data corruption in financial calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Strict conversion for billed amounts: a value Decimal cannot hold is an error
pub fn try_to_decimal(value: f64, field: &str) -> RepoResult<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| {
        RepoError::Validation(format!("{field} is not a representable amount: {value}"))
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    let rounded = value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_f64().unwrap_or_else(|| {
        tracing::error!(value = %rounded, "Decimal not representable as f64, defaulting to zero");
        0.0
    })
}

/// Unit price after the product discount: `price × (1 − discount_percent / 100)`
pub fn final_price(price: f64, discount_percent: f64) -> f64 {
    let price = to_decimal(price);
    let discount = to_decimal(discount_percent).clamp(Decimal::ZERO, HUNDRED);
    to_f64(price * (HUNDRED - discount) / HUNDRED)
}

/// `unit_price × quantity`
pub fn line_subtotal(unit_price: f64, quantity: i64) -> RepoResult<f64> {
    try_to_decimal(unit_price, "price")?
        .checked_mul(Decimal::from(quantity))
        .map(to_f64)
        .ok_or_else(|| {
            RepoError::Validation(format!("subtotal overflows: {unit_price} × {quantity}"))
        })
}

/// Σ subtotal over the snapshot lines, as billed
pub fn order_total(lines: &[OrderLine]) -> RepoResult<Decimal> {
    let mut total = Decimal::ZERO;
    for line in lines {
        let subtotal = try_to_decimal(line.subtotal, "subtotal")?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| RepoError::Validation("order total overflows".into()))?;
    }
    Ok(total.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero))
}
