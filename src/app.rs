//! 账本初始化和启动
//!
//! 负责核心组件的组装，包括：
//! - 配置加载
//! - 日志系统初始化
//! - 存储后端创建
//! - 持久化 Actor 启动
//! - 集合加载
//! - 报告领域初始化

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;

use crate::actors::{PersistHandle, PersistenceActor};
use crate::domains::{RecordDomain, ReportDomain};
use crate::event_bus::EventBus;
use crate::logger;
use crate::models::{LedgerConfig, PersistedLedgerConfig};
use crate::report::{LabelSet, Labels, Period, PeriodReport};
use crate::settings::SettingsManager;
use crate::storage::{open_backend, StorageBackend};

/// 账本应用 - 各组件的唯一所有者
pub struct LedgerApp {
    records: RecordDomain,
    reports: ReportDomain,
    events: Arc<EventBus>,
    persistence: PersistHandle,
    settings: Option<SettingsManager>,
    log_level: Level,
    _log_guard: Option<WorkerGuard>,
}

impl LedgerApp {
    /// 按配置目录启动账本
    ///
    /// 1. 读取（或创建）`settings.json`
    /// 2. 按配置的级别和目录初始化日志
    /// 3. 根据存储配置打开后端
    /// 4. 启动持久化 Actor
    /// 5. 加载三个集合
    pub async fn bootstrap(config_dir: &Path) -> Result<Self> {
        let settings = SettingsManager::new(config_dir.join("settings.json")).await?;
        let config = settings.get().await;

        let log_level = logger::parse_level(&config.log_level);
        let log_dir = config
            .log_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(logger::default_log_dir);
        // 全局订阅器只能注册一次，已存在时沿用
        let log_guard = match logger::init(&log_dir, log_level) {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("沿用已有的日志配置: {:#}", e);
                None
            }
        };

        info!("初始化活动账本: {:?}", config_dir);
        let backend = open_backend(&config.storage).await?;

        let mut app = Self::from_parts(backend, Arc::new(LabelSet::new(config.labels))).await?;
        app.settings = Some(settings);
        app.log_level = log_level;
        app._log_guard = log_guard;
        Ok(app)
    }

    /// 用给定后端和标签组装账本（不读取配置文件）
    pub async fn from_parts(
        backend: Arc<dyn StorageBackend>,
        labels: Arc<dyn Labels>,
    ) -> Result<Self> {
        let events = Arc::new(EventBus::new(256));

        let (actor, persistence) = PersistenceActor::new(backend.clone(), events.clone());
        tokio::spawn(actor.run());

        let records = RecordDomain::load(backend.as_ref(), persistence.clone(), &events).await?;
        info!(
            "账本已加载: {} 个联系人, {} 次拜访, {} 条服务记录",
            records.calls().len(),
            records.visits().len(),
            records.service_records().len()
        );

        Ok(Self {
            records,
            reports: ReportDomain::new(labels),
            events,
            persistence,
            settings: None,
            log_level: Level::INFO,
            _log_guard: None,
        })
    }

    pub fn records(&self) -> &RecordDomain {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut RecordDomain {
        &mut self.records
    }

    pub fn reports(&self) -> &ReportDomain {
        &self.reports
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// 启动时生效的日志级别
    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// 当前记录的周期报告
    pub fn period_report(&self, period: &Period) -> PeriodReport {
        self.reports.period_report(&self.records.snapshot(), period)
    }

    /// 当前记录的年度报告
    pub fn annual_report(&self, year: i32) -> PeriodReport {
        self.reports.annual_report(&self.records.snapshot(), year)
    }

    /// 等待所有已提交的写入完成
    pub async fn flush(&self) -> bool {
        self.persistence.flush().await
    }

    /// 更新配置；标签变化立即生效，存储后端和日志变化在下次启动时生效
    pub async fn update_settings(&mut self, update: LedgerConfig) -> Result<PersistedLedgerConfig> {
        let Some(settings) = &self.settings else {
            anyhow::bail!("账本未通过配置目录启动，无法更新配置");
        };

        let config = settings.update(update).await?;
        self.reports = ReportDomain::new(Arc::new(LabelSet::new(config.labels.clone())));
        self.events.publish(crate::event_bus::LedgerEvent::ConfigUpdated);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Call, ServiceRecord, Visit};
    use crate::report::DefaultLabels;
    use crate::storage::{MemoryBackend, StorageConfig};
    use chrono::{Local, TimeZone, Utc};
    use std::collections::HashMap;

    fn local_noon(year: i32, month: u32, day: u32) -> chrono::DateTime<Utc> {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_records_survive_restart() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());

        {
            let mut app = LedgerApp::from_parts(backend.clone(), Arc::new(DefaultLabels))
                .await
                .unwrap();
            let mut call = Call::new("C1");
            call.is_study = true;
            app.records_mut().calls_mut().upsert(call.clone());

            let mut visit = Visit::new(&call.id, local_noon(2024, 3, 2));
            visit.placement = Some("Magazine".to_string());
            app.records_mut().add_visit(visit).unwrap();

            let mut record = ServiceRecord::new(local_noon(2024, 3, 15), 2 * 3600 * 1000);
            record.placements = 1;
            app.records_mut().service_records_mut().upsert(record);

            assert!(app.flush().await);
        }

        let app = LedgerApp::from_parts(backend, Arc::new(DefaultLabels))
            .await
            .unwrap();
        let report = app.period_report(&Period::month(2, 2024).unwrap());

        assert_eq!(report.hours, 2);
        assert_eq!(report.placements, 2);
        assert_eq!(report.return_visits, 0);
        assert_eq!(report.studies, Some(1));
    }

    #[tokio::test]
    async fn test_bootstrap_with_json_storage_and_label_update() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        tokio::fs::write(
            dir.path().join("settings.json"),
            serde_json::to_string(&PersistedLedgerConfig {
                storage: StorageConfig::JsonFiles {
                    data_dir: data_dir.to_string_lossy().into_owned(),
                },
                log_level: "debug".to_string(),
                log_dir: Some(dir.path().join("logs").to_string_lossy().into_owned()),
                ..Default::default()
            })
            .unwrap(),
        )
        .await
        .unwrap();

        let mut app = LedgerApp::bootstrap(dir.path()).await.unwrap();
        assert_eq!(app.log_level(), Level::DEBUG);
        app.records_mut().calls_mut().upsert(Call::new("Ana"));
        assert!(app.flush().await);
        assert!(data_dir.join("calls.json").exists());

        app.update_settings(LedgerConfig {
            labels: Some(HashMap::from([("report".to_string(), "Informe".to_string())])),
            ..Default::default()
        })
        .await
        .unwrap();

        let report = app.period_report(&Period::year(2024));
        assert_eq!(report.share.unwrap().title, "2024 Informe");
    }

    #[tokio::test]
    async fn test_update_settings_requires_bootstrap() {
        let mut app = LedgerApp::from_parts(Arc::new(MemoryBackend::new()), Arc::new(DefaultLabels))
            .await
            .unwrap();

        assert!(app.update_settings(LedgerConfig::default()).await.is_err());
    }
}
