// Repository 抽象层 - 定义集合持久化接口
//
// 核心只需要"整体读取 / 整体写入"一个集合的语义，具体存储引擎由实现决定

pub mod json_file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::config::StorageConfig;

/// 集合存储接口 - 所有存储后端必须实现此 trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// 读取集合的 JSON 内容，不存在时返回 None
    async fn load(&self, collection: &str) -> Result<Option<String>>;

    /// 整体写入集合的 JSON 内容
    async fn save(&self, collection: &str, payload: &str) -> Result<()>;

    /// 获取后端类型标识
    fn backend_type(&self) -> &str;
}

/// 根据配置创建存储后端
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config {
        StorageConfig::JsonFiles { data_dir } => {
            Arc::new(json_file::JsonFileBackend::new(data_dir).await?)
        }
        StorageConfig::SQLite { db_path } => Arc::new(sqlite::SqliteBackend::new(db_path).await?),
        StorageConfig::Memory => Arc::new(memory::MemoryBackend::new()),
    };

    tracing::info!("存储后端已就绪: {}", backend.backend_type());
    Ok(backend)
}
