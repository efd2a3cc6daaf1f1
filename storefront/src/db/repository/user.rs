//! User Repository (credential store)
//!
//! Users are never hard-deleted; `deactivate` flips `is_active`.

use super::{RepoError, RepoResult};
use crate::auth::password::{hash_password, verify_password};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_email, validate_optional_text,
    validate_password, validate_required_text, validate_username,
};
use shared::models::{User, UserCreate, UserRole, UserUpdate};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, username, password_hash, email, full_name, phone, address, role, is_active, created_at, updated_at FROM users";

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE username = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// All users, newest first, optionally restricted to one role
pub async fn list(pool: &SqlitePool, role: Option<UserRole>) -> RepoResult<Vec<User>> {
    let users = match role {
        Some(role) => {
            let sql = format!("{USER_SELECT} WHERE role = ? ORDER BY created_at DESC, id DESC");
            sqlx::query_as::<_, User>(&sql)
                .bind(role)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{USER_SELECT} ORDER BY created_at DESC, id DESC");
            sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?
        }
    };
    Ok(users)
}

/// Register a new user
///
/// The clear password is hashed here and never stored.
pub async fn register(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    validate_username(&data.username)?;
    validate_email(&data.email)?;
    validate_password(&data.password)?;
    validate_required_text(&data.full_name, "full_name", MAX_NAME_LEN)?;
    validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.address, "address", MAX_ADDRESS_LEN)?;

    if get_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "username '{}' already exists",
            data.username
        )));
    }
    let email_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&data.email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Err(RepoError::Duplicate(format!(
            "email '{}' already exists",
            data.email
        )));
    }

    let UserCreate {
        username,
        password,
        email,
        full_name,
        phone,
        address,
        role,
    } = data;
    let password_hash = hash_password(&password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
    drop(password);

    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO users (username, password_hash, email, full_name, phone, address, role, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
    )
    .bind(&username)
    .bind(&password_hash)
    .bind(&email)
    .bind(&full_name)
    .bind(&phone)
    .bind(&address)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::info!(user_id = id, username = %username, role = %role, "User registered");
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Check credentials
///
/// Returns the user only when it exists, is active and the password matches.
/// A malformed stored hash is logged and treated as a mismatch.
pub async fn verify(pool: &SqlitePool, username: &str, password: &str) -> RepoResult<Option<User>> {
    let Some(user) = get_by_username(pool, username).await? else {
        return Ok(None);
    };
    if !user.is_active {
        tracing::debug!(username = %username, "Credential check on disabled account");
        return Ok(None);
    }
    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is malformed");
            Ok(None)
        }
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    if let Some(email) = &data.email {
        validate_email(email)?;
    }
    if let Some(full_name) = &data.full_name {
        validate_required_text(full_name, "full_name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.address, "address", MAX_ADDRESS_LEN)?;

    if data.is_empty() {
        return get_by_id(pool, id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")));
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET email = COALESCE(?1, email), full_name = COALESCE(?2, full_name), phone = COALESCE(?3, phone), address = COALESCE(?4, address), is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.email)
    .bind(&data.full_name)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn change_password(pool: &SqlitePool, id: i64, new_password: &str) -> RepoResult<()> {
    validate_password(new_password)?;
    let password_hash = hash_password(new_password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;

    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    tracing::info!(user_id = id, "Password changed");
    Ok(())
}

/// Soft delete; returns `false` when the user was already inactive
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 && get_by_id(pool, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_user, test_pool};

    fn new_user(username: &str, email: &str) -> UserCreate {
        UserCreate {
            username: username.to_string(),
            password: "customer123".to_string(),
            email: email.to_string(),
            full_name: "Nguyễn Văn A".to_string(),
            phone: Some("0912345678".to_string()),
            address: Some("Đà Nẵng, Việt Nam".to_string()),
            role: UserRole::Customer,
        }
    }

    #[tokio::test]
    async fn test_register_and_verify_round_trip() {
        let pool = test_pool().await;
        let user = register(&pool, new_user("customer", "customer@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "customer123");

        let verified = verify(&pool, "customer", "customer123").await.unwrap();
        assert_eq!(verified.map(|u| u.id), Some(user.id));
        assert!(verify(&pool, "customer", "wrong-pass").await.unwrap().is_none());
        assert!(verify(&pool, "nobody", "customer123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_hash_not_serialized() {
        let pool = test_pool().await;
        let user = register(&pool, new_user("customer", "customer@example.com"))
            .await
            .unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "customer");
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let pool = test_pool().await;
        register(&pool, new_user("customer", "customer@example.com"))
            .await
            .unwrap();

        let err = register(&pool, new_user("customer", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(ref m) if m.contains("username")));

        let err = register(&pool, new_user("other", "customer@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(ref m) if m.contains("email")));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let pool = test_pool().await;
        let mut short = new_user("customer", "customer@example.com");
        short.password = "123".into();
        assert!(matches!(
            register(&pool, short).await,
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            register(&pool, new_user("bad name", "x@example.com")).await,
            Err(RepoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_verify() {
        let pool = test_pool().await;
        let id = seed_user(&pool, "alice").await;

        assert!(deactivate(&pool, id).await.unwrap());
        assert!(!deactivate(&pool, id).await.unwrap());
        assert!(verify(&pool, "alice", "secret123").await.unwrap().is_none());
        // still readable, never hard-deleted
        assert!(!get_by_id(&pool, id).await.unwrap().unwrap().is_active);
        assert!(matches!(
            deactivate(&pool, 999).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_change_password() {
        let pool = test_pool().await;
        let id = seed_user(&pool, "alice").await;

        let updated = update(
            &pool,
            id,
            UserUpdate {
                phone: Some("0934567890".into()),
                address: Some("Hải Phòng".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("0934567890"));
        assert_eq!(updated.email, "alice@example.com");

        change_password(&pool, id, "n3w-secret").await.unwrap();
        assert!(verify(&pool, "alice", "secret123").await.unwrap().is_none());
        assert!(verify(&pool, "alice", "n3w-secret").await.unwrap().is_some());

        assert!(matches!(
            update(&pool, 999, UserUpdate { full_name: Some("X".into()), ..Default::default() }).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let pool = test_pool().await;
        seed_user(&pool, "alice").await;
        let mut admin = new_user("admin", "admin@musicstore.com");
        admin.role = UserRole::Admin;
        register(&pool, admin).await.unwrap();

        assert_eq!(list(&pool, None).await.unwrap().len(), 2);
        let admins = list(&pool, Some(UserRole::Admin)).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert!(admins[0].is_admin());
    }
}
