//! Product Repository
//!
//! Products are soft-deleted (`is_active = 0`) so historical order items keep
//! a valid reference. Stock only moves through conditional writes.

use super::{RepoError, RepoResult, like_pattern};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_PRICE, MAX_STOCK, MAX_URL_LEN, validate_amount, validate_discount_percent,
    validate_optional_text, validate_required_text,
};
use shared::models::{ProductCreate, ProductUpdate, ProductWithCategory};
use sqlx::{SqliteConnection, SqlitePool};

pub use crate::order_money::final_price;

const PRODUCT_WITH_CATEGORY_SELECT: &str = "SELECT p.id, p.category_id, p.name, p.brand, p.price, p.stock, p.image, p.description, p.specifications, p.discount_percent, p.is_active, p.created_at, p.updated_at, c.name AS category_name FROM products p JOIN categories c ON c.id = p.category_id";

/// Catalog listing, newest first
///
/// `active_only = false` includes soft-deleted products.
pub async fn list(
    pool: &SqlitePool,
    category_id: Option<i64>,
    active_only: bool,
) -> RepoResult<Vec<ProductWithCategory>> {
    let sql = format!(
        "{PRODUCT_WITH_CATEGORY_SELECT} WHERE (?1 IS NULL OR p.category_id = ?1) AND (?2 = 0 OR p.is_active = 1) ORDER BY p.created_at DESC, p.id DESC"
    );
    let rows = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(category_id)
        .bind(active_only)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<ProductWithCategory>> {
    let sql = format!("{PRODUCT_WITH_CATEGORY_SELECT} WHERE p.id = ?");
    let row = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Substring search over name, brand and description of active products
pub async fn search(pool: &SqlitePool, keyword: &str) -> RepoResult<Vec<ProductWithCategory>> {
    let pattern = like_pattern(keyword.trim());
    let sql = format!(
        "{PRODUCT_WITH_CATEGORY_SELECT} WHERE p.is_active = 1 AND (p.name LIKE ?1 ESCAPE '\\' OR p.brand LIKE ?1 ESCAPE '\\' OR p.description LIKE ?1 ESCAPE '\\') ORDER BY p.name"
    );
    let rows = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

fn validate_stock(stock: i64) -> RepoResult<()> {
    if stock < 0 {
        return Err(RepoError::Validation(format!(
            "stock cannot be negative: {stock}"
        )));
    }
    if stock > MAX_STOCK {
        return Err(RepoError::Validation(format!(
            "stock exceeds maximum allowed ({MAX_STOCK}), got {stock}"
        )));
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<ProductWithCategory> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.brand, "brand", MAX_NAME_LEN)?;
    validate_optional_text(&data.image, "image", MAX_URL_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.specifications, "specifications", MAX_NOTE_LEN)?;
    validate_amount(data.price, "price", MAX_PRICE)?;
    validate_stock(data.stock)?;
    let discount_percent = data.discount_percent.unwrap_or(0.0);
    validate_discount_percent(discount_percent)?;

    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO products (category_id, name, brand, price, stock, image, description, specifications, discount_percent, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
    )
    .bind(data.category_id)
    .bind(&data.name)
    .bind(&data.brand)
    .bind(data.price)
    .bind(data.stock)
    .bind(&data.image)
    .bind(&data.description)
    .bind(&data.specifications)
    .bind(discount_percent)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Referential(_) => {
            RepoError::Referential(format!("category {} does not exist", data.category_id))
        }
        other => other,
    })?
    .last_insert_rowid();

    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Partial update; only `Some` fields are written
pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<ProductWithCategory> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(brand) = &data.brand {
        validate_required_text(brand, "brand", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.image, "image", MAX_URL_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.specifications, "specifications", MAX_NOTE_LEN)?;
    if let Some(price) = data.price {
        validate_amount(price, "price", MAX_PRICE)?;
    }
    if let Some(stock) = data.stock {
        validate_stock(stock)?;
    }
    if let Some(discount) = data.discount_percent {
        validate_discount_percent(discount)?;
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET category_id = COALESCE(?1, category_id), name = COALESCE(?2, name), brand = COALESCE(?3, brand), price = COALESCE(?4, price), stock = COALESCE(?5, stock), image = COALESCE(?6, image), description = COALESCE(?7, description), specifications = COALESCE(?8, specifications), discount_percent = COALESCE(?9, discount_percent), is_active = COALESCE(?10, is_active), updated_at = ?11 WHERE id = ?12",
    )
    .bind(data.category_id)
    .bind(&data.name)
    .bind(&data.brand)
    .bind(data.price)
    .bind(data.stock)
    .bind(&data.image)
    .bind(&data.description)
    .bind(&data.specifications)
    .bind(data.discount_percent)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Relative stock move; refuses to go below zero instead of clamping
///
/// Returns the new stock level, which stays within `[0, MAX_STOCK]`.
pub async fn adjust_stock(pool: &SqlitePool, id: i64, delta: i64) -> RepoResult<i64> {
    if delta.unsigned_abs() > MAX_STOCK.unsigned_abs() {
        return Err(RepoError::Validation(format!(
            "stock delta exceeds maximum allowed ({MAX_STOCK}), got {delta}"
        )));
    }
    let now = shared::util::now_millis();
    let new_stock: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3 AND stock + ?1 BETWEEN 0 AND ?4 RETURNING stock",
    )
    .bind(delta)
    .bind(now)
    .bind(id)
    .bind(MAX_STOCK)
    .fetch_optional(pool)
    .await?;

    match new_stock {
        Some(stock) => {
            tracing::debug!(product_id = id, delta, stock, "Stock adjusted");
            Ok(stock)
        }
        None if !exists(pool, id).await? => {
            Err(RepoError::NotFound(format!("Product {id} not found")))
        }
        None if delta < 0 => Err(RepoError::StockUnavailable {
            product_id: id,
            requested: -delta,
        }),
        None => Err(RepoError::Validation(format!(
            "stock of product {id} would exceed {MAX_STOCK}"
        ))),
    }
}

/// Soft delete; returns `false` when already inactive
pub async fn soft_delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 && !exists(pool, id).await? {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(rows.rows_affected() > 0)
}

async fn exists<'e, E>(executor: E, id: i64) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

// ── Transaction steps (run on the caller's connection) ─────────────

/// Take `quantity` units out of stock inside an open transaction
///
/// `StockUnavailable` when the product has fewer units, `Referential` when it
/// does not exist.
pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 1 {
        return Ok(());
    }
    if exists(&mut *conn, id).await? {
        Err(RepoError::StockUnavailable {
            product_id: id,
            requested: quantity,
        })
    } else {
        Err(RepoError::Referential(format!("product {id} does not exist")))
    }
}

/// Put `quantity` units back (order cancellation)
pub async fn restock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Referential(format!("product {id} does not exist")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_category, seed_product, test_pool};

    #[tokio::test]
    async fn test_create_joins_category_name() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let id = seed_product(&pool, guitar, "Yamaha F310 Acoustic Guitar", 3_500_000.0, 15, 10.0).await;

        let product = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(product.category_name, "Guitar");
        assert_eq!(product.product.stock, 15);
        assert_eq!(
            final_price(product.product.price, product.product.discount_percent),
            3_150_000.0
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let base = ProductCreate {
            category_id: guitar,
            name: "Fender Stratocaster".into(),
            brand: "Fender".into(),
            price: 12_000_000.0,
            stock: 8,
            image: None,
            description: None,
            specifications: None,
            discount_percent: Some(5.0),
        };

        let mut bad = base.clone();
        bad.price = -1.0;
        assert!(matches!(create(&pool, bad).await, Err(RepoError::Validation(_))));

        let mut bad = base.clone();
        bad.discount_percent = Some(101.0);
        assert!(matches!(create(&pool, bad).await, Err(RepoError::Validation(_))));

        let mut bad = base.clone();
        bad.price = 1e20;
        assert!(matches!(create(&pool, bad).await, Err(RepoError::Validation(_))));

        let mut bad = base.clone();
        bad.stock = MAX_STOCK + 1;
        assert!(matches!(create(&pool, bad).await, Err(RepoError::Validation(_))));

        let mut bad = base.clone();
        bad.category_id = 999;
        assert!(matches!(create(&pool, bad).await, Err(RepoError::Referential(_))));

        assert!(create(&pool, base).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let piano = seed_category(&pool, "Piano").await;
        let a = seed_product(&pool, guitar, "Gibson Les Paul", 35_000_000.0, 3, 0.0).await;
        let b = seed_product(&pool, guitar, "Ibanez RG", 8_500_000.0, 10, 8.0).await;
        seed_product(&pool, piano, "Yamaha P-45", 11_000_000.0, 5, 0.0).await;

        assert_eq!(list(&pool, None, true).await.unwrap().len(), 3);
        let guitars = list(&pool, Some(guitar), true).await.unwrap();
        // newest first
        assert_eq!(guitars[0].product.id, b);
        assert_eq!(guitars[1].product.id, a);

        assert!(soft_delete(&pool, a).await.unwrap());
        assert_eq!(list(&pool, Some(guitar), true).await.unwrap().len(), 1);
        assert_eq!(list(&pool, Some(guitar), false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_escapes_wildcards() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        seed_product(&pool, guitar, "Fender Stratocaster", 12_000_000.0, 8, 5.0).await;
        seed_product(&pool, guitar, "Yamaha F310", 3_500_000.0, 15, 10.0).await;
        let hidden = seed_product(&pool, guitar, "Fender Telecaster", 14_000_000.0, 2, 0.0).await;
        soft_delete(&pool, hidden).await.unwrap();

        let hits = search(&pool, "fender").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.name, "Fender Stratocaster");

        // brand column matches too (seed brand is Yamaha)
        assert_eq!(search(&pool, "YAMAHA").await.unwrap().len(), 2);
        // "%" matches literally, not everything
        assert!(search(&pool, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_partial() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let id = seed_product(&pool, guitar, "Yamaha F310", 3_500_000.0, 15, 10.0).await;

        let updated = update(
            &pool,
            id,
            ProductUpdate {
                price: Some(3_200_000.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.product.price, 3_200_000.0);
        assert_eq!(updated.product.stock, 15);
        assert_eq!(updated.product.discount_percent, 10.0);

        let err = update(
            &pool,
            id,
            ProductUpdate {
                stock: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        assert!(matches!(
            update(&pool, 999, ProductUpdate::default()).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let id = seed_product(&pool, guitar, "Yamaha F310", 3_500_000.0, 5, 0.0).await;

        assert_eq!(adjust_stock(&pool, id, -3).await.unwrap(), 2);
        assert_eq!(adjust_stock(&pool, id, 10).await.unwrap(), 12);

        let err = adjust_stock(&pool, id, -13).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::StockUnavailable {
                product_id,
                requested: 13
            } if product_id == id
        ));
        assert_eq!(get(&pool, id).await.unwrap().unwrap().product.stock, 12);

        assert!(matches!(
            adjust_stock(&pool, 999, 1).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_extreme_deltas() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let id = seed_product(&pool, guitar, "Yamaha F310", 3_500_000.0, 5, 0.0).await;

        for delta in [i64::MIN, i64::MAX, MAX_STOCK + 1] {
            assert!(matches!(
                adjust_stock(&pool, id, delta).await,
                Err(RepoError::Validation(_))
            ));
        }
        assert!(matches!(
            adjust_stock(&pool, id, MAX_STOCK).await,
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            adjust_stock(&pool, id, -MAX_STOCK).await,
            Err(RepoError::StockUnavailable {
                requested: MAX_STOCK,
                ..
            })
        ));
        assert_eq!(get(&pool, id).await.unwrap().unwrap().product.stock, 5);
    }

    #[tokio::test]
    async fn test_decrement_inside_transaction() {
        let pool = test_pool().await;
        let guitar = seed_category(&pool, "Guitar").await;
        let id = seed_product(&pool, guitar, "Yamaha F310", 3_500_000.0, 2, 0.0).await;

        let mut tx = pool.begin().await.unwrap();
        decrement_stock(&mut tx, id, 2).await.unwrap();
        let err = decrement_stock(&mut tx, id, 1).await.unwrap_err();
        assert!(matches!(err, RepoError::StockUnavailable { .. }));
        let err = decrement_stock(&mut tx, 999, 1).await.unwrap_err();
        assert!(matches!(err, RepoError::Referential(_)));
        drop(tx);

        // rolled back
        assert_eq!(get(&pool, id).await.unwrap().unwrap().product.stock, 2);
    }
}
