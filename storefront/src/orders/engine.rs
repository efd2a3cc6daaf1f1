//! Order engine
//!
//! Turns a cart snapshot into a persisted order. The order row, its items and
//! the stock decrements are one transaction: either all of them commit or the
//! transaction is dropped and SQLite rolls everything back.

use super::number::OrderNumberGenerator;
use crate::db::repository::order::{self, OrderTotals};
use crate::db::repository::{RepoError, RepoResult, cart, product};
use crate::order_money::{order_total, to_f64, try_to_decimal};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_LINE_AMOUNT, MAX_NOTE_LEN, MAX_PRICE, MAX_SHORT_TEXT_LEN, require_finite,
    validate_amount, validate_optional_text, validate_quantity, validate_required_text,
};
use rust_decimal::Decimal;
use shared::models::{Checkout, Order, OrderDetail, OrderItem, OrderStatus, PlaceOrder};
use sqlx::SqlitePool;

/// Attempts before giving up on order number collisions
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

pub struct OrderEngine {
    pool: SqlitePool,
    numbers: OrderNumberGenerator,
}

impl OrderEngine {
    pub fn new(pool: SqlitePool, numbers: OrderNumberGenerator) -> Self {
        Self { pool, numbers }
    }

    /// Persist an order from a cart snapshot; returns the new order id
    ///
    /// Lines are billed as given, product prices are not re-read.
    pub async fn place_order(&self, request: PlaceOrder) -> RepoResult<i64> {
        validate_request(&request)?;
        let totals = compute_totals(&request)?;

        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order_number = self.numbers.next();
            match self.insert_order_tx(&order_number, &request, totals).await {
                Ok(order_id) => {
                    tracing::info!(
                        order_id,
                        order_number = %order_number,
                        user_id = request.user_id,
                        lines = request.lines.len(),
                        final_amount = totals.final_amount,
                        "Order placed"
                    );
                    return Ok(order_id);
                }
                // order_number is the only UNIQUE column written here
                Err(RepoError::Duplicate(msg)) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        order_number = %order_number,
                        attempt,
                        error = %msg,
                        "Order number collision, retrying"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        user_id = request.user_id,
                        order_number = %order_number,
                        error = %e,
                        "Order placement failed, rolled back"
                    );
                    return Err(e);
                }
            }
        }
        Err(RepoError::Database(format!(
            "no free order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
        )))
    }

    async fn insert_order_tx(
        &self,
        order_number: &str,
        request: &PlaceOrder,
        totals: OrderTotals,
    ) -> RepoResult<i64> {
        let mut tx = self.pool.begin().await?;
        let now = shared::util::now_millis();

        let order_id = order::insert_order(&mut tx, order_number, request, totals, now).await?;
        for line in &request.lines {
            order::insert_item(&mut tx, order_id, line).await?;
            product::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    /// Snapshot the user's cart, place the order, then empty the cart
    pub async fn checkout(&self, user_id: i64, checkout: Checkout) -> RepoResult<i64> {
        let lines = cart::snapshot(&self.pool, user_id).await?;
        if lines.is_empty() {
            return Err(RepoError::Validation(format!("cart of user {user_id} is empty")));
        }

        let order_id = self
            .place_order(checkout.into_place_order(user_id, lines))
            .await?;

        // 订单已提交，清空购物车失败不影响订单
        if let Err(e) = cart::clear(&self.pool, user_id).await {
            tracing::warn!(user_id, order_id, error = %e, "Failed to clear cart after checkout");
        }
        Ok(order_id)
    }

    /// Move an order along the status machine
    ///
    /// Unknown status names and illegal edges are `InvalidState`.
    pub async fn update_status(&self, order_id: i64, new_status: &str) -> RepoResult<()> {
        let next: OrderStatus = new_status
            .parse()
            .map_err(|e: shared::models::UnknownVariant| RepoError::InvalidState(e.to_string()))?;

        let mut conn = self.pool.acquire().await?;
        let current = order::current_status(&mut conn, order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;
        check_transition(order_id, current, next)?;

        if !order::transition_status(&mut conn, order_id, current, next).await? {
            return Err(RepoError::InvalidState(format!(
                "order {order_id} is no longer {current}"
            )));
        }
        tracing::info!(order_id, from = %current, to = %next, "Order status updated");
        Ok(())
    }

    /// Cancel a non-terminal order, optionally returning its items to stock
    pub async fn cancel_order(&self, order_id: i64, restock: bool) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        let current = order::current_status(&mut tx, order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;
        check_transition(order_id, current, OrderStatus::Cancelled)?;

        if !order::transition_status(&mut tx, order_id, current, OrderStatus::Cancelled).await? {
            return Err(RepoError::InvalidState(format!(
                "order {order_id} is no longer {current}"
            )));
        }
        if restock {
            for item in order::items_in(&mut tx, order_id).await? {
                product::restock(&mut tx, item.product_id, item.quantity).await?;
            }
        }
        tx.commit().await?;

        tracing::info!(order_id, from = %current, restock, "Order cancelled");
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub async fn get_order(&self, order_id: i64) -> RepoResult<Option<OrderDetail>> {
        order::find_detail(&self.pool, order_id).await
    }

    pub async fn list_items(&self, order_id: i64) -> RepoResult<Vec<OrderItem>> {
        order::find_items(&self.pool, order_id).await
    }

    pub async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<Order>> {
        order::find_by_user(&self.pool, user_id).await
    }

    pub async fn list_all(&self, status: Option<OrderStatus>) -> RepoResult<Vec<OrderDetail>> {
        order::find_all(&self.pool, status).await
    }
}

fn check_transition(order_id: i64, current: OrderStatus, next: OrderStatus) -> RepoResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(RepoError::InvalidState(format!(
            "order {order_id} cannot move from {current} to {next}"
        )))
    }
}

fn validate_request(request: &PlaceOrder) -> RepoResult<()> {
    if request.lines.is_empty() {
        return Err(RepoError::Validation(
            "order must contain at least one line".into(),
        ));
    }
    for line in &request.lines {
        validate_quantity(line.quantity)?;
        validate_amount(line.price, "price", MAX_PRICE)?;
        validate_amount(line.subtotal, "subtotal", MAX_LINE_AMOUNT)?;
    }
    validate_required_text(&request.shipping_address, "shipping_address", MAX_ADDRESS_LEN)?;
    validate_required_text(&request.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&request.note, "note", MAX_NOTE_LEN)?;
    require_finite(request.discount_amount, "discount_amount")
}

/// `total = Σ subtotal`, `final = total − discount`
fn compute_totals(request: &PlaceOrder) -> RepoResult<OrderTotals> {
    let total = order_total(&request.lines)?;
    let discount = try_to_decimal(request.discount_amount, "discount_amount")?;
    // |discount| 可能大于 total，checked_sub 防止溢出
    let final_amount = total
        .checked_sub(discount)
        .ok_or_else(|| RepoError::InvalidDiscount {
            total: to_f64(total),
            discount: request.discount_amount,
        })?;
    if discount < Decimal::ZERO || final_amount < Decimal::ZERO {
        return Err(RepoError::InvalidDiscount {
            total: to_f64(total),
            discount: request.discount_amount,
        });
    }
    Ok(OrderTotals {
        total_amount: to_f64(total),
        discount_amount: to_f64(discount),
        final_amount: to_f64(final_amount),
    })
}
