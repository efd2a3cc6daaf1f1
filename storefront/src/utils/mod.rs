//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`AppResult`] - 应用错误类型
//! - 日志初始化
//! - 输入校验

pub mod error;
pub mod logger;
pub mod validation;

pub use error::AppError;

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
