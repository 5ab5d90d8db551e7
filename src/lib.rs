// 活动账本核心 - 联系人/拜访/服务记录的存储与周期报告

pub mod actors;
pub mod app;
pub mod domains;
pub mod event_bus;
pub mod logger;
pub mod models;
pub mod report;
pub mod settings;
pub mod storage;
pub mod utils;

pub use app::LedgerApp;
pub use domains::{RecordDomain, RecordSnapshot, ReportDomain};
pub use event_bus::{EventBus, LedgerEvent};
pub use report::{
    compute_annual_report, compute_period_report, format_for_sharing, in_period, DefaultLabels,
    LabelSet, Labels, Period, PeriodReport, ShareContent, ShareCounts,
};
pub use settings::SettingsManager;
pub use storage::{
    Address, Call, CallPatch, Collection, Coordinate, InterestLevel, NextVisit, Record,
    ServiceRecord, ServiceRecordPatch, StorageBackend, StorageConfig, Visit, VisitPatch,
};
