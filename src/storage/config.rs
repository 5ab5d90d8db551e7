// 存储配置定义

use serde::{Deserialize, Serialize};

/// 存储后端配置类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// JSON 文件配置（每个集合一个文件）
    #[serde(rename = "json")]
    JsonFiles {
        /// 数据目录
        data_dir: String,
    },
    /// SQLite 配置
    #[serde(rename = "sqlite")]
    SQLite {
        /// 数据库文件路径
        db_path: String,
    },
    /// 仅内存，不落盘
    #[serde(rename = "memory")]
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::JsonFiles {
            data_dir: "data/ledger".to_string(),
        }
    }
}
