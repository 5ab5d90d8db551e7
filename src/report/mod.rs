//! 报告模块 - 周期判断、汇总、年度汇总与分享文本
//!
//! 所有函数都是纯计算：只借用集合快照，从不修改，也不缓存结果

pub mod aggregator;
pub mod annual;
pub mod labels;
pub mod period;
pub mod share;

pub use aggregator::{
    compute_period_counts, compute_period_report, report_title, PeriodReport, ReportCounts,
};
pub use annual::{
    compute_annual_report, compute_annual_report_as_of, compute_monthly_reports_as_of,
};
pub use labels::{DefaultLabels, LabelSet, Labels};
pub use period::{in_period, Period};
pub use share::{format_for_sharing, ShareContent, ShareCounts};
