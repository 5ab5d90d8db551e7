use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::{LedgerConfig, PersistedLedgerConfig};

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedLedgerConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedLedgerConfig>(&bytes).unwrap_or_else(|e| {
                    warn!("配置文件无法解析，使用默认配置: {}", e);
                    PersistedLedgerConfig::default()
                })
            }
            _ => {
                let default = PersistedLedgerConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub async fn get(&self) -> PersistedLedgerConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: LedgerConfig) -> Result<PersistedLedgerConfig> {
        let mut config = self.data.write().await;

        if let Some(storage) = update.storage {
            config.storage = storage;
        }
        if let Some(labels) = update.labels {
            config.labels = labels;
        }
        if let Some(level) = update.log_level {
            config.log_level = level;
        }
        if let Some(dir) = update.log_dir {
            config.log_dir = Some(dir);
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedLedgerConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
