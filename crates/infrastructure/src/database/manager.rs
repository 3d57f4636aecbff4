use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use profiler_config::StorageConfig;
use profiler_errors::{ProfilerError, ProfilerResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// SQLite 连接池管理器
///
/// 负责建立连接池并初始化表结构。嵌入式部署，单文件数据库。
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &StorageConfig) -> ProfilerResult<Self> {
        let options = if config.db_path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(ProfilerError::Database)?
        } else {
            if let Some(parent) = Path::new(&config.db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        ProfilerError::storage_error(format!(
                            "创建数据库目录失败: {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            SqliteConnectOptions::new()
                .filename(&config.db_path)
                .create_if_missing(true)
        };

        // 内存库的每个连接各自独立，连接池必须收敛到单连接
        let max_connections = if config.db_path == ":memory:" {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(ProfilerError::Database)?;

        let manager = Self { pool };
        manager.initialize_schema().await?;

        info!("数据库初始化完成: {}", config.db_path);
        Ok(manager)
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn health_check(&self) -> ProfilerResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(ProfilerError::Database)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn initialize_schema(&self) -> ProfilerResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bundles (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                duration_secs   INTEGER NOT NULL,
                profile_kinds   TEXT NOT NULL,
                requested_kinds TEXT NOT NULL,
                targets_count   TEXT NOT NULL,
                created_at      DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                bundle_id          INTEGER NOT NULL,
                target_ip          TEXT NOT NULL,
                target_port        INTEGER NOT NULL,
                target_status_port INTEGER NOT NULL,
                component_kind     TEXT NOT NULL,
                kind               TEXT NOT NULL,
                state              TEXT NOT NULL,
                progress           REAL NOT NULL DEFAULT 0,
                error              TEXT,
                data               BLOB,
                started_at         DATETIME NOT NULL,
                finished_at        DATETIME
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(ProfilerError::Database)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_bundle_id ON profiles(bundle_id)")
            .execute(&self.pool)
            .await
            .map_err(ProfilerError::Database)?;

        Ok(())
    }
}
