/// 存储配置 - storefront 的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_PATH | data/music_store.db | SQLite 数据库文件 |
/// | DB_MAX_CONNECTIONS | 1 | 连接数上限 (1 = 串行访问) |
/// | DB_BUSY_TIMEOUT_MS | 5000 | 写冲突等待时间(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (none) | 日志目录，设置后写入滚动日志文件 |
/// | ORDER_NUMBER_PREFIX | ORD | 订单号前缀 |
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub order_number_prefix: String,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path of the SQLite file, or `:memory:`
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    const DEFAULT_PATH: &'static str = "data/music_store.db";
    const DEFAULT_MAX_CONNECTIONS: u32 = 1;
    const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

    pub fn from_env() -> Self {
        Self {
            path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| Self::DEFAULT_PATH.into()),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(Self::DEFAULT_MAX_CONNECTIONS),
            busy_timeout_ms: std::env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Self::DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Private in-memory database (tests, dry runs)
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".into(),
            max_connections: 1,
            busy_timeout_ms: Self::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::from_env()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            order_number_prefix: std::env::var("ORDER_NUMBER_PREFIX")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| crate::orders::DEFAULT_ORDER_PREFIX.into()),
        }
    }

    /// 使用自定义数据库覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_database(database: DatabaseConfig) -> Self {
        let mut config = Self::from_env();
        config.database = database;
        config
    }
}
