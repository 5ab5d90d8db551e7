// 数据模型模块 - 账本配置结构

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::storage::StorageConfig;

// 重新导出其他模块的类型
pub use crate::report::{PeriodReport, ShareContent, ShareCounts};
pub use crate::storage::{Call, ServiceRecord, Visit};

/// 配置补丁 - 只有 `Some` 的字段会被更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 存储后端
    pub storage: Option<StorageConfig>,
    /// 标签覆盖项（整体替换）
    pub labels: Option<HashMap<String, String>>,
    /// 日志级别（trace/debug/info/warn/error），下次启动生效
    pub log_level: Option<String>,
    /// 日志目录，下次启动生效
    pub log_dir: Option<String>,
}

/// 持久化的账本配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLedgerConfig {
    /// 存储后端
    #[serde(default)]
    pub storage: StorageConfig,
    /// 标签覆盖项，未覆盖的键使用内置英文标签
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志目录，为空时使用平台默认目录
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PersistedLedgerConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            labels: HashMap::new(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}
