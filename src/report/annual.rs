// 年度汇总 - 由各月报告逐项相加得到全年报告

use chrono::{Datelike, Local, NaiveDate};

use super::aggregator::{attach_share, compute_period_report, PeriodReport};
use super::labels::Labels;
use super::period::Period;
use crate::storage::{Call, ServiceRecord, Visit};

/// 需要生成月报的月份：当年只到本月，过去的年份 12 个月，未来的年份没有
pub fn months_to_materialize(year: i32, today: NaiveDate) -> Vec<u32> {
    match year.cmp(&today.year()) {
        std::cmp::Ordering::Less => (0..12).collect(),
        std::cmp::Ordering::Equal => (0..=today.month0()).collect(),
        std::cmp::Ordering::Greater => Vec::new(),
    }
}

/// 以给定日期为"今天"生成全年各月报告
pub fn compute_monthly_reports_as_of(
    calls: &[Call],
    visits: &[Visit],
    records: &[ServiceRecord],
    year: i32,
    today: NaiveDate,
    labels: &dyn Labels,
) -> Vec<PeriodReport> {
    months_to_materialize(year, today)
        .into_iter()
        .map(|month| {
            let period = Period::month_unchecked(month, year);
            compute_period_report(calls, visits, records, &period, labels)
        })
        .collect()
}

/// 以给定日期为"今天"计算年度报告
///
/// 小时、书刊、视频、续访逐月相加；学习只在月报中统计，年报中为 None
pub fn compute_annual_report_as_of(
    calls: &[Call],
    visits: &[Visit],
    records: &[ServiceRecord],
    year: i32,
    today: NaiveDate,
    labels: &dyn Labels,
) -> PeriodReport {
    let monthly = compute_monthly_reports_as_of(calls, visits, records, year, today, labels);

    let mut annual = PeriodReport {
        hours: 0,
        placements: 0,
        video_placements: 0,
        return_visits: 0,
        studies: None,
        month: None,
        year,
        share: None,
    };

    for month in &monthly {
        annual.hours = annual.hours.saturating_add(month.hours);
        annual.placements = annual.placements.saturating_add(month.placements);
        annual.video_placements = annual.video_placements.saturating_add(month.video_placements);
        annual.return_visits = annual.return_visits.saturating_add(month.return_visits);
    }

    attach_share(&mut annual, &Period::year(year), labels);
    annual
}

/// 以本地日期为准计算年度报告
pub fn compute_annual_report(
    calls: &[Call],
    visits: &[Visit],
    records: &[ServiceRecord],
    year: i32,
    labels: &dyn Labels,
) -> PeriodReport {
    let today = Local::now().date_naive();
    compute_annual_report_as_of(calls, visits, records, year, today, labels)
}
