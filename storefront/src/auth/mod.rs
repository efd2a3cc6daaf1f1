//! 认证模块
//!
//! - [`password`] - Argon2 哈希与校验
//! - [`authenticate`] - 登录：用户名 + 密码 → 用户
//! - [`require_admin`] - 管理员权限检查

pub mod password;

use crate::db::repository::user;
use crate::utils::{AppError, AppResult};
use shared::models::User;
use sqlx::SqlitePool;

/// Authenticate a user by username and password
///
/// Unknown user, disabled account and wrong password all produce the same
/// [`AppError::invalid_credentials`] so callers cannot probe for usernames.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> AppResult<User> {
    match user::verify(pool, username, password).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in successfully");
            Ok(user)
        }
        None => {
            tracing::warn!(username = %username, "Login failed - invalid credentials");
            Err(AppError::invalid_credentials())
        }
    }
}

/// 仅 admin 角色可用
pub fn require_admin(user: &User) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user '{}' is not an administrator",
            user.username
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_user, test_pool};

    #[tokio::test]
    async fn test_authenticate_success() {
        let pool = test_pool().await;
        seed_user(&pool, "alice").await;

        let user = authenticate(&pool, "alice", "secret123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(require_admin(&user).is_err());
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_uniform() {
        let pool = test_pool().await;
        seed_user(&pool, "alice").await;

        let wrong = authenticate(&pool, "alice", "nope-nope").await.unwrap_err();
        let unknown = authenticate(&pool, "bob", "secret123").await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }
}
