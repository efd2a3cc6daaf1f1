//! Database Module
//!
//! Handles the SQLite connection pool, migrations and the seeding-tool
//! maintenance operations (reset, row counts).

pub mod gateway;
pub mod repository;

use crate::core::config::DatabaseConfig;
use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub use gateway::{Fetch, Outcome};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Tables in dependency order (parents first)
pub const TABLES: [&str; 7] = [
    "users",
    "categories",
    "products",
    "orders",
    "order_items",
    "cart",
    "reviews",
];

/// Database service — owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the database described by `config` and apply migrations
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
        } else {
            if let Some(parent) = Path::new(&config.path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::database(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))
                .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // busy_timeout: 写冲突时等待而非立即失败
        let options = options
            .pragma("foreign_keys", "ON")
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // 内存库随最后一个连接消失，连接必须常驻
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(
            path = %config.path,
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout_ms,
            "Database connection established"
        );

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self, AppError> {
        Self::open(&DatabaseConfig::in_memory()).await
    }

    /// Drop every table and recreate the schema
    pub async fn reset(&self) -> Result<(), AppError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        for table in TABLES.iter().rev().chain(std::iter::once(&"_sqlx_migrations")) {
            sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
                .execute(&mut *conn)
                .await
                .map_err(|e| AppError::database(format!("Failed to drop {table}: {e}")))?;
        }
        drop(conn);

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::warn!("Database reset: all tables dropped and recreated");
        Ok(())
    }

    /// Row count per table, in [`TABLES`] order
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, AppError> {
        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            let sql = format!("SELECT COUNT(*) AS n FROM {table}");
            let count = gateway::execute(&self.pool, &sql, &[], Fetch::One)
                .await
                .map_err(|e| AppError::database(format!("Failed to count {table}: {e}")))?
                .into_rows()
                .first()
                .and_then(|row| row.get("n"))
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            counts.push((table, count));
        }
        Ok(counts)
    }
}
