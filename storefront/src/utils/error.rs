//! 统一错误处理
//!
//! Application-level error type returned by services and the store
//! bootstrap. Repository functions return [`RepoError`] and are lifted into
//! [`AppError`] with `?`.
//!
//! # 错误码规范
//!
//! | 前缀 | 分类 | 示例 |
//! |------|------|------|
//! | E1xxx | 认证错误 | E1001 用户名或密码错误 |
//! | E0xxx | 业务错误 | E0003 资源不存在 |
//! | E9xxx | 系统错误 | E9002 数据库错误 |

use crate::db::repository::RepoError;
use tracing::error;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 ==========
    #[error("Invalid username or password")]
    /// 用户名或密码错误 (never says which one)
    InvalidCredentials,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== 业务逻辑错误 ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== 系统错误 ==========
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create an invalid credentials error with unified message
    /// Used to prevent username enumeration during login
    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable error code for UI collaborators
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "E1001",
            AppError::Forbidden(_) => "E2001",
            AppError::Validation(_) => "E0002",
            AppError::NotFound(_) => "E0003",
            AppError::Conflict(_) => "E0004",
            AppError::BusinessRule(_) => "E0005",
            AppError::Internal(_) => "E9001",
            AppError::Database(_) => "E9002",
            AppError::Unavailable(_) => "E9003",
        }
    }

    /// Message safe to show to an end user
    ///
    /// System errors are logged here and replaced by a generic text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal error".to_string()
            }
            AppError::Unavailable(msg) => {
                error!(target: "database", error = %msg, "Storage unavailable");
                "Storage unavailable, please retry".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Connectivity(msg) => AppError::Unavailable(msg),
            RepoError::Database(msg) => AppError::Database(msg),
            e @ (RepoError::Referential(_)
            | RepoError::InvalidState(_)
            | RepoError::InvalidDiscount { .. }
            | RepoError::StockUnavailable { .. }) => AppError::BusinessRule(e.to_string()),
        }
    }
}
