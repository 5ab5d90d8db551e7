// JSON 文件存储实现 - 每个集合一个文件

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use super::StorageBackend;

/// JSON 文件存储：`<data_dir>/<collection>.json`
pub struct JsonFileBackend {
    data_dir: PathBuf,
}

impl JsonFileBackend {
    /// 创建存储目录（如不存在）
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        info!("初始化 JSON 文件存储: {:?}", data_dir);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("无法创建数据目录: {:?}", data_dir))?;

        Ok(Self { data_dir })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn load(&self, collection: &str) -> Result<Option<String>> {
        let path = self.collection_path(collection);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("读取集合文件失败: {:?}", path)),
        }
    }

    async fn save(&self, collection: &str, payload: &str) -> Result<()> {
        let path = self.collection_path(collection);
        // 先写临时文件再重命名，避免写到一半的文件
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, payload)
            .await
            .with_context(|| format!("写入临时文件失败: {:?}", tmp_path))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("替换集合文件失败: {:?}", path))?;

        debug!("集合 {} 已写入 {:?} ({} 字节)", collection, path, payload.len());
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "json"
    }
}
