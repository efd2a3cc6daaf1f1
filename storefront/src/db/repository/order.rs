//! Order Repository
//!
//! Write steps take `&mut SqliteConnection` and run inside the order engine's
//! transaction; reads take the pool. Order items are a frozen copy of the
//! product at purchase time and are never joined back to `products`.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderDetail, OrderItem, OrderLine, OrderStatus, PlaceOrder};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.order_number, o.total_amount, o.discount_amount, o.final_amount, o.status, o.payment_method, o.shipping_address, o.phone, o.note, o.order_date, o.completed_date";

const ITEM_SELECT: &str = "SELECT id, order_id, product_id, product_name, product_price, quantity, subtotal FROM order_items";

/// Amounts computed by the engine, rounded to 2 dp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub total_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

// ── Transaction steps ───────────────────────────────────────────────

/// Insert the order header in `pending`; returns the new order id
pub async fn insert_order(
    conn: &mut SqliteConnection,
    order_number: &str,
    request: &PlaceOrder,
    totals: OrderTotals,
    order_date: i64,
) -> RepoResult<i64> {
    let id = sqlx::query(
        "INSERT INTO orders (user_id, order_number, total_amount, discount_amount, final_amount, status, payment_method, shipping_address, phone, note, order_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(request.user_id)
    .bind(order_number)
    .bind(totals.total_amount)
    .bind(totals.discount_amount)
    .bind(totals.final_amount)
    .bind(OrderStatus::Pending)
    .bind(request.payment_method)
    .bind(&request.shipping_address)
    .bind(&request.phone)
    .bind(&request.note)
    .bind(order_date)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Referential(_) => {
            RepoError::Referential(format!("user {} does not exist", request.user_id))
        }
        other => other,
    })?
    .last_insert_rowid();
    Ok(id)
}

/// Copy one snapshot line into `order_items` verbatim
pub async fn insert_item(conn: &mut SqliteConnection, order_id: i64, line: &OrderLine) -> RepoResult<i64> {
    let id = sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, product_price, quantity, subtotal) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.name)
    .bind(line.price)
    .bind(line.quantity)
    .bind(line.subtotal)
    .execute(&mut *conn)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Referential(_) => {
            RepoError::Referential(format!("product {} does not exist", line.product_id))
        }
        other => other,
    })?
    .last_insert_rowid();
    Ok(id)
}

pub async fn current_status(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Option<OrderStatus>> {
    let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(status)
}

/// Conditional status write: only applies while the row is still in `from`
///
/// `completed_date` is stamped when (and only when) entering `completed`.
/// Returns `false` when another writer moved the order first.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let completed_date = (to == OrderStatus::Completed).then(shared::util::now_millis);
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, completed_date = COALESCE(?2, completed_date) WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(completed_date)
    .bind(order_id)
    .bind(from)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn items_in(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

// ── Reads ───────────────────────────────────────────────────────────

/// Order with customer name and email
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}, u.full_name AS customer_name, u.email AS customer_email FROM orders o JOIN users u ON u.id = o.user_id WHERE o.id = ?"
    );
    let detail = sqlx::query_as::<_, OrderDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(detail)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

/// A customer's order history, newest first
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.user_id = ? ORDER BY o.order_date DESC, o.id DESC"
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}

/// Admin view: every order with customer info, newest first
pub async fn find_all(pool: &SqlitePool, status: Option<OrderStatus>) -> RepoResult<Vec<OrderDetail>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS}, u.full_name AS customer_name, u.email AS customer_email FROM orders o JOIN users u ON u.id = o.user_id WHERE (?1 IS NULL OR o.status = ?1) ORDER BY o.order_date DESC, o.id DESC"
    );
    let orders = sqlx::query_as::<_, OrderDetail>(&sql)
        .bind(status)
        .fetch_all(pool)
        .await?;
    Ok(orders)
}
