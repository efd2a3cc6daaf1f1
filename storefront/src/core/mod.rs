//! 核心模块 - 配置与应用状态
//!
//! # 模块结构
//!
//! - [`Config`] - 应用配置 (环境变量)
//! - [`AppState`] - 应用状态 (数据库 + 订单引擎)

pub mod config;
pub mod state;

pub use config::{Config, DatabaseConfig};
pub use state::AppState;
