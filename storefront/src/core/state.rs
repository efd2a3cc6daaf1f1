use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::orders::{OrderEngine, OrderNumberGenerator};
use crate::utils::AppResult;

/// 应用状态 - 持有数据库与订单引擎
///
/// 由入口 (CLI / UI 宿主) 创建后显式传递，不使用全局单例。
/// Clone 成本很低 (内部均为 Arc / 连接池句柄)。
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,
    /// 数据库服务 (SQLite)
    pub db: DbService,
    /// 订单引擎 (唯一的多语句写事务入口)
    pub orders: Arc<OrderEngine>,
}

impl AppState {
    /// 初始化应用状态
    ///
    /// 打开数据库、执行迁移并创建订单引擎
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::open(&config.database).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    /// 使用已打开的数据库构造 (测试场景)
    pub fn with_db(config: Config, db: DbService) -> Self {
        let numbers = OrderNumberGenerator::new(config.order_number_prefix.clone());
        let orders = Arc::new(OrderEngine::new(db.pool.clone(), numbers));
        Self { config, db, orders }
    }

    /// 获取连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
