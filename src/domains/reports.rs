// 报告领域管理器
//
// 基于记录快照生成月报和年报，每次请求都重新计算

use std::sync::Arc;

use chrono::NaiveDate;

use super::records::RecordSnapshot;
use crate::report::{self, Labels, Period, PeriodReport};

/// 报告领域管理器 - 持有标签
#[derive(Clone)]
pub struct ReportDomain {
    labels: Arc<dyn Labels>,
}

impl ReportDomain {
    pub fn new(labels: Arc<dyn Labels>) -> Self {
        Self { labels }
    }

    /// 周期报告
    pub fn period_report(&self, records: &RecordSnapshot, period: &Period) -> PeriodReport {
        report::compute_period_report(
            &records.calls,
            &records.visits,
            &records.service_records,
            period,
            self.labels.as_ref(),
        )
    }

    /// 年度报告（以当前日期判断当年截止月份）
    pub fn annual_report(&self, records: &RecordSnapshot, year: i32) -> PeriodReport {
        report::compute_annual_report(
            &records.calls,
            &records.visits,
            &records.service_records,
            year,
            self.labels.as_ref(),
        )
    }

    /// 全年各月报告
    pub fn monthly_reports(
        &self,
        records: &RecordSnapshot,
        year: i32,
        today: NaiveDate,
    ) -> Vec<PeriodReport> {
        report::compute_monthly_reports_as_of(
            &records.calls,
            &records.visits,
            &records.service_records,
            year,
            today,
            self.labels.as_ref(),
        )
    }
}
