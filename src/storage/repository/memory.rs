// 内存存储实现 - 测试与临时账本使用

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StorageBackend;

/// 内存存储，进程退出即丢失
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的集合数量
    pub async fn collection_count(&self) -> usize {
        self.collections.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self, collection: &str) -> Result<Option<String>> {
        Ok(self.collections.read().await.get(collection).cloned())
    }

    async fn save(&self, collection: &str, payload: &str) -> Result<()> {
        self.collections
            .write()
            .await
            .insert(collection.to_string(), payload.to_string());
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}
