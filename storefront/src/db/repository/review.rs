//! Review Repository

use super::{RepoError, RepoResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::models::{MAX_RATING, MIN_RATING, RatingSummary, Review, ReviewCreate};
use sqlx::SqlitePool;

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.comment, r.created_at FROM reviews r JOIN users u ON u.id = r.user_id";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE r.id = ?");
    let review = sqlx::query_as::<_, Review>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(review)
}

pub async fn create(pool: &SqlitePool, data: ReviewCreate) -> RepoResult<Review> {
    if !(MIN_RATING..=MAX_RATING).contains(&data.rating) {
        return Err(RepoError::Validation(format!(
            "rating must be within [{MIN_RATING}, {MAX_RATING}], got {}",
            data.rating
        )));
    }
    validate_optional_text(&data.comment, "comment", MAX_NOTE_LEN)?;

    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO reviews (product_id, user_id, rating, comment, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(data.product_id)
    .bind(data.user_id)
    .bind(data.rating)
    .bind(&data.comment)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Referential(_) => RepoError::Referential(format!(
            "user {} or product {} does not exist",
            data.user_id, data.product_id
        )),
        other => other,
    })?
    .last_insert_rowid();

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create review".into()))
}

/// Reviews of one product, newest first
pub async fn list_for_product(pool: &SqlitePool, product_id: i64) -> RepoResult<Vec<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE r.product_id = ? ORDER BY r.created_at DESC, r.id DESC");
    let reviews = sqlx::query_as::<_, Review>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await?;
    Ok(reviews)
}

pub async fn rating_summary(pool: &SqlitePool, product_id: i64) -> RepoResult<RatingSummary> {
    let summary = sqlx::query_as::<_, RatingSummary>(
        "SELECT COUNT(*) AS review_count, AVG(rating) AS average_rating FROM reviews WHERE product_id = ?",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_category, seed_product, seed_user, test_pool};

    fn review(product_id: i64, user_id: i64, rating: i64) -> ReviewCreate {
        ReviewCreate {
            product_id,
            user_id,
            rating,
            comment: Some("Âm thanh rất hay".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_summary() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let cat = seed_category(&pool, "Guitar").await;
        let p = seed_product(&pool, cat, "Yamaha F310", 3_500_000.0, 15, 10.0).await;

        let empty = rating_summary(&pool, p).await.unwrap();
        assert_eq!(empty.review_count, 0);
        assert_eq!(empty.average_rating, None);

        create(&pool, review(p, alice, 5)).await.unwrap();
        let second = create(&pool, review(p, bob, 4)).await.unwrap();
        assert_eq!(second.username, "bob");

        let summary = rating_summary(&pool, p).await.unwrap();
        assert_eq!(summary.review_count, 2);
        assert_eq!(summary.average_rating, Some(4.5));

        let reviews = list_for_product(&pool, p).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].id, second.id);
    }

    #[tokio::test]
    async fn test_rating_bounds_and_references() {
        let pool = test_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let cat = seed_category(&pool, "Guitar").await;
        let p = seed_product(&pool, cat, "Yamaha F310", 3_500_000.0, 15, 10.0).await;

        assert!(matches!(create(&pool, review(p, alice, 0)).await, Err(RepoError::Validation(_))));
        assert!(matches!(create(&pool, review(p, alice, 6)).await, Err(RepoError::Validation(_))));
        assert!(matches!(
            create(&pool, review(999, alice, 5)).await,
            Err(RepoError::Referential(_))
        ));
    }
}
