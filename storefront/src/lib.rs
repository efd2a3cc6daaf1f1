//! Storefront - 乐器商店数据引擎
//!
//! # 架构概述
//!
//! 本 crate 是乐器商店的数据层，UI 层作为外部协作者调用：
//!
//! - **订单引擎** (`orders`): 购物车快照 → 订单，原子扣减库存
//! - **数据库** (`db`): 嵌入式 SQLite，迁移、统一执行接口、仓储
//! - **认证** (`auth`): Argon2 密码哈希与登录
//! - **金额** (`order_money`): rust_decimal 精确计算
//! - **示例数据** (`seed`): 重置并写入演示数据
//!
//! # 模块结构
//!
//! ```text
//! storefront/src/
//! ├── core/          # 配置、应用状态
//! ├── auth/          # 密码哈希、登录
//! ├── db/            # 连接池、gateway、repository
//! ├── order_money/   # 金额计算
//! ├── orders/        # 订单引擎、订单号
//! ├── seed.rs        # 示例数据
//! └── utils/         # 错误、日志、校验
//! ```

pub mod auth;
pub mod core;
pub mod db;
pub mod order_money;
pub mod orders;
pub mod seed;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{AppState, Config, DatabaseConfig};
pub use db::repository::{RepoError, RepoResult};
pub use db::{DbService, Fetch, Outcome};
pub use orders::{OrderEngine, OrderNumberGenerator};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 `.env`，初始化日志
///
/// 返回加载后的配置
pub fn setup_environment() -> Config {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}
