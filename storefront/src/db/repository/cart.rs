//! Cart Repository (购物车)
//!
//! One row per (user, product); adding the same product again merges into the
//! existing row. No stock check happens here, only at order time.

use super::{RepoError, RepoResult};
use crate::order_money::{final_price, line_subtotal};
use crate::utils::validation::{MAX_QUANTITY, validate_quantity};
use shared::models::{CartLine, OrderLine};
use sqlx::SqlitePool;

const CART_LINE_SELECT: &str = "SELECT c.id, c.user_id, c.product_id, c.quantity, c.added_at, p.name, p.brand, p.price, p.stock, p.image, p.discount_percent FROM cart c JOIN products p ON p.id = c.product_id";

/// Add `quantity` of a product, merging with an existing line
///
/// Returns the cart line id. The merged quantity is capped at `MAX_QUANTITY`.
pub async fn add(pool: &SqlitePool, user_id: i64, product_id: i64, quantity: i64) -> RepoResult<i64> {
    validate_quantity(quantity)?;
    let now = shared::util::now_millis();
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO cart (user_id, product_id, quantity, added_at) VALUES (?1, ?2, ?3, ?4) ON CONFLICT(user_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity WHERE quantity + excluded.quantity <= ?5 RETURNING id",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .bind(MAX_QUANTITY)
    .fetch_optional(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Referential(_) => RepoError::Referential(format!(
            "user {user_id} or product {product_id} does not exist"
        )),
        other => other,
    })?;
    // 冲突但合并后超限时不写入，也没有返回行
    let id = id.ok_or_else(|| {
        RepoError::Validation(format!(
            "cart quantity of product {product_id} would exceed {MAX_QUANTITY}"
        ))
    })?;
    tracing::debug!(user_id, product_id, quantity, cart_line_id = id, "Added to cart");
    Ok(id)
}

/// Cart contents with computed prices, newest first
///
/// Lines pointing at soft-deleted products are hidden.
pub async fn list(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartLine>> {
    let sql = format!(
        "{CART_LINE_SELECT} WHERE c.user_id = ? AND p.is_active = 1 ORDER BY c.added_at DESC, c.id DESC"
    );
    let mut lines = sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    for line in &mut lines {
        line.final_price = final_price(line.price, line.discount_percent);
        line.subtotal = line_subtotal(line.final_price, line.quantity)?;
    }
    Ok(lines)
}

pub async fn set_quantity(pool: &SqlitePool, cart_line_id: i64, quantity: i64) -> RepoResult<()> {
    validate_quantity(quantity)?;
    let rows = sqlx::query("UPDATE cart SET quantity = ? WHERE id = ?")
        .bind(quantity)
        .bind(cart_line_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Cart line {cart_line_id} not found")));
    }
    Ok(())
}

pub async fn remove(pool: &SqlitePool, cart_line_id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM cart WHERE id = ?")
        .bind(cart_line_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Cart line {cart_line_id} not found")));
    }
    Ok(())
}

/// Empty the cart; returns the number of lines removed
pub async fn clear(pool: &SqlitePool, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected())
}

/// Freeze the cart into order lines at the current final prices
pub async fn snapshot(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<OrderLine>> {
    Ok(list(pool, user_id)
        .await?
        .iter()
        .map(CartLine::to_order_line)
        .collect())
}
