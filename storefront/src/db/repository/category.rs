//! Category Repository

use super::{RepoError, RepoResult};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use shared::models::{Category, CategoryCreate};
use sqlx::SqlitePool;

pub async fn list(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, icon, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, icon, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.icon, "icon", MAX_SHORT_TEXT_LEN)?;

    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO categories (name, description, icon, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.icon)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("category '{}' already exists", data.name))
        }
        other => other,
    })?
    .last_insert_rowid();

    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    fn category(name: &str, icon: &str) -> CategoryCreate {
        CategoryCreate {
            name: name.to_string(),
            description: Some(format!("{name} instruments")),
            icon: Some(icon.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_sorted_by_name() {
        let pool = test_pool().await;
        create(&pool, category("Piano", "🎹")).await.unwrap();
        let guitar = create(&pool, category("Guitar", "🎸")).await.unwrap();
        create(&pool, category("Drums", "🥁")).await.unwrap();

        let names: Vec<_> = list(&pool).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Drums", "Guitar", "Piano"]);

        let fetched = get(&pool, guitar.id).await.unwrap().unwrap();
        assert_eq!(fetched.icon.as_deref(), Some("🎸"));
        assert!(get(&pool, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let pool = test_pool().await;
        create(&pool, category("Guitar", "🎸")).await.unwrap();
        let err = create(&pool, category("Guitar", "🎸")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(ref m) if m.contains("Guitar")));
    }
}
