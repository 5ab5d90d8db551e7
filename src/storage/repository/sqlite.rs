// SQLite 存储实现 - 每个集合一行

use super::StorageBackend;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

/// SQLite 存储实现
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// 创建新的 SQLite 数据库连接
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("初始化 SQLite 数据库: {}", db_path);

        // 确保数据库文件的目录存在
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await?;

        Self::with_pool(pool).await
    }

    /// 仅存在于内存中的数据库（测试用）
    pub async fn in_memory() -> Result<Self> {
        // 内存库与连接绑定，只能使用单个连接
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let backend = Self { pool };
        backend.initialize_tables().await?;
        Ok(backend)
    }

    /// 初始化表结构
    async fn initialize_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn load(&self, collection: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT payload FROM collections WHERE name = ?1")
            .bind(collection)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>("payload")))
    }

    async fn save(&self, collection: &str, payload: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collections (name, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(collection)
        .bind(payload)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn backend_type(&self) -> &str {
        "sqlite"
    }
}
