// 周期汇总 - 把联系人、拜访和服务记录折叠为一份周期报告
//
// 报告 = 自动统计（来自拜访历史）+ 手动偏移（来自服务记录）
// 每次调用都从头计算，不做缓存

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::labels::{month_key, Labels, REPORT_KEY};
use super::period::Period;
use super::share::{build_share, ShareContent, ShareCounts};
use crate::storage::{Call, ServiceRecord, Visit};
use crate::utils::whole_hours;

/// 周期报告（派生数据，不持久化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub hours: u64,
    pub placements: u32,
    pub video_placements: u32,
    pub return_visits: u32,
    /// 月报为 Some，年报为 None
    pub studies: Option<u32>,
    /// 0-11，年报为 None
    pub month: Option<u32>,
    pub year: i32,
    pub share: Option<ShareContent>,
}

impl PeriodReport {
    pub fn counts(&self) -> ShareCounts {
        ShareCounts {
            hours: self.hours,
            placements: self.placements,
            video_placements: self.video_placements,
            return_visits: self.return_visits,
            studies: self.studies,
        }
    }
}

/// 周期内的原始统计，自动部分与手动部分分开保存
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCounts {
    pub total_time_ms: u64,
    pub record_placements: u32,
    pub record_video_placements: u32,
    pub return_visit_offset: u32,
    pub study_offset: u32,
    pub auto_placements: u32,
    pub auto_video_placements: u32,
    pub auto_return_visits: u32,
    pub auto_studies: u32,
}

impl ReportCounts {
    pub fn hours(&self) -> u64 {
        whole_hours(self.total_time_ms)
    }

    pub fn placements(&self) -> u32 {
        self.auto_placements.saturating_add(self.record_placements)
    }

    pub fn video_placements(&self) -> u32 {
        self.auto_video_placements
            .saturating_add(self.record_video_placements)
    }

    pub fn return_visits(&self) -> u32 {
        self.auto_return_visits.saturating_add(self.return_visit_offset)
    }

    pub fn studies(&self) -> u32 {
        self.auto_studies.saturating_add(self.study_offset)
    }
}

/// 按联系人分组并按日期升序排列拜访
///
/// 只保留指向已存在联系人的拜访，悬空引用不参与按联系人统计
pub fn visits_by_call<'a>(calls: &[Call], visits: &'a [Visit]) -> HashMap<String, Vec<&'a Visit>> {
    let mut grouped: HashMap<String, Vec<&'a Visit>> = calls
        .iter()
        .map(|call| (call.id.clone(), Vec::new()))
        .collect();

    for visit in visits {
        if let Some(history) = grouped.get_mut(&visit.call.id) {
            history.push(visit);
        }
    }

    for history in grouped.values_mut() {
        // 稳定排序，同一时刻的拜访保持插入顺序
        history.sort_by_key(|visit| visit.date);
    }
    grouped
}

fn saturating_count<I: Iterator>(items: I) -> u32 {
    u32::try_from(items.count()).unwrap_or(u32::MAX)
}

/// 计算周期内的各项统计
///
/// 拜访上的 `do_not_include_in_monthly_report` / `do_not_count_towards_study`
/// 只随记录保存，不影响统计
pub fn compute_period_counts(
    calls: &[Call],
    visits: &[Visit],
    records: &[ServiceRecord],
    period: &Period,
) -> ReportCounts {
    let mut counts = ReportCounts::default();

    // 1. 手动记录
    for record in records.iter().filter(|r| period.contains(&r.date)) {
        counts.total_time_ms = counts.total_time_ms.saturating_add(record.time);
        counts.record_placements = counts.record_placements.saturating_add(record.placements);
        counts.record_video_placements = counts
            .record_video_placements
            .saturating_add(record.video_placements);
        counts.return_visit_offset = counts
            .return_visit_offset
            .saturating_add(record.return_visit_offset);
        counts.study_offset = counts.study_offset.saturating_add(record.study_offset);
    }

    // 2. 拜访中的书刊与视频
    let in_period: Vec<&Visit> = visits.iter().filter(|v| period.contains(&v.date)).collect();
    counts.auto_placements = saturating_count(in_period.iter().filter(|v| v.has_placement()));
    counts.auto_video_placements =
        saturating_count(in_period.iter().filter(|v| v.has_video_placement()));

    let histories = visits_by_call(calls, visits);

    // 3. 续访：每个联系人的第一次拜访不算
    counts.auto_return_visits = saturating_count(
        histories
            .values()
            .flat_map(|history| history.iter().skip(1))
            .filter(|v| period.contains(&v.date)),
    );

    // 4. 学习：每个联系人每个周期最多计 1
    counts.auto_studies = saturating_count(calls.iter().filter(|call| call.is_study).filter(|call| {
        histories
            .get(&call.id)
            .is_some_and(|history| history.iter().any(|v| period.contains(&v.date)))
    }));

    debug!("周期 {:?} 统计结果: {:?}", period, counts);
    counts
}

/// 报告标题："<月份> <年份> <报告>" 或 "<年份> <报告>"
pub fn report_title(period: &Period, labels: &dyn Labels) -> String {
    let report = labels.label(REPORT_KEY);
    match period.month_index() {
        Some(month) => format!(
            "{} {} {}",
            labels.label(&month_key(month)),
            period.year_value(),
            report
        ),
        None => format!("{} {}", period.year_value(), report),
    }
}

/// 计算某个周期的完整报告
pub fn compute_period_report(
    calls: &[Call],
    visits: &[Visit],
    records: &[ServiceRecord],
    period: &Period,
    labels: &dyn Labels,
) -> PeriodReport {
    let counts = compute_period_counts(calls, visits, records, period);

    let mut report = PeriodReport {
        hours: counts.hours(),
        placements: counts.placements(),
        video_placements: counts.video_placements(),
        return_visits: counts.return_visits(),
        studies: Some(counts.studies()),
        month: period.month_index(),
        year: period.year_value(),
        share: None,
    };
    attach_share(&mut report, period, labels);
    report
}

/// 根据报告当前的计数生成标题与分享文本
pub fn attach_share(report: &mut PeriodReport, period: &Period, labels: &dyn Labels) {
    let title = report_title(period, labels);
    report.share = Some(build_share(&title, &report.counts(), labels));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::labels::DefaultLabels;
    use crate::utils::ms_from_hours_minutes;
    use chrono::{DateTime, Local, TimeZone, Utc};

    fn local_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn march_2024() -> Period {
        Period::month(2, 2024).unwrap()
    }

    fn study_call(name: &str) -> Call {
        let mut call = Call::new(name);
        call.is_study = true;
        call
    }

    #[test]
    fn test_march_2024_scenario() {
        let call = study_call("C1");

        let mut first = Visit::new(&call.id, local_noon(2024, 3, 2));
        first.placement = Some("Magazine".to_string());
        let mut second = Visit::new(&call.id, local_noon(2024, 3, 20));
        second.placement = Some("Brochure".to_string());

        let mut record = ServiceRecord::new(local_noon(2024, 3, 15), 2 * 3600 * 1000);
        record.placements = 1;

        let report = compute_period_report(
            &[call],
            &[first, second],
            &[record],
            &march_2024(),
            &DefaultLabels,
        );

        assert_eq!(report.hours, 2);
        assert_eq!(report.placements, 3);
        assert_eq!(report.return_visits, 1);
        assert_eq!(report.studies, Some(1));
        assert_eq!(report.month, Some(2));
        assert_eq!(report.year, 2024);

        let share = report.share.unwrap();
        assert_eq!(share.title, "March 2024 Service Report");
        assert!(share.message.contains("Placements: 3"));
        assert!(share.message.ends_with("Studies: 1"));
    }

    #[test]
    fn test_empty_inputs_yield_zero_report() {
        let report = compute_period_report(&[], &[], &[], &march_2024(), &DefaultLabels);

        assert_eq!(report.hours, 0);
        assert_eq!(report.placements, 0);
        assert_eq!(report.video_placements, 0);
        assert_eq!(report.return_visits, 0);
        assert_eq!(report.studies, Some(0));
        assert!(report.share.is_some());
    }

    #[test]
    fn test_single_visit_is_not_a_return_visit() {
        let call = Call::new("Ana");
        let visit = Visit::new(&call.id, local_noon(2024, 3, 10));

        let counts = compute_period_counts(&[call], &[visit], &[], &march_2024());
        assert_eq!(counts.auto_return_visits, 0);
    }

    #[test]
    fn test_first_visit_in_earlier_month_makes_march_visit_a_return() {
        let call = Call::new("Ana");
        // 插入顺序与日期顺序相反
        let march = Visit::new(&call.id, local_noon(2024, 3, 10));
        let february = Visit::new(&call.id, local_noon(2024, 2, 10));

        let visits = [march, february];
        let calls = [call];
        let in_march = compute_period_counts(&calls, &visits, &[], &march_2024());
        let in_february =
            compute_period_counts(&calls, &visits, &[], &Period::month(1, 2024).unwrap());

        assert_eq!(in_march.auto_return_visits, 1);
        assert_eq!(in_february.auto_return_visits, 0);
    }

    #[test]
    fn test_study_capped_at_one_per_call() {
        let call = study_call("Ana");
        let visits: Vec<Visit> = [3, 12, 25]
            .iter()
            .map(|&day| Visit::new(&call.id, local_noon(2024, 3, day)))
            .collect();

        let counts = compute_period_counts(&[call], &visits, &[], &march_2024());
        assert_eq!(counts.auto_studies, 1);
        assert_eq!(counts.auto_return_visits, 2);
    }

    #[test]
    fn test_study_without_visits_counts_nothing() {
        let call = study_call("Ana");
        let counts = compute_period_counts(&[call], &[], &[], &march_2024());

        assert_eq!(counts.auto_studies, 0);
        assert_eq!(counts.auto_return_visits, 0);
    }

    #[test]
    fn test_dangling_visits_only_count_placements() {
        let mut orphan_a = Visit::new("deleted-call", local_noon(2024, 3, 1));
        orphan_a.video_placement = Some("Video".to_string());
        let orphan_b = Visit::new("deleted-call", local_noon(2024, 3, 2));

        let counts = compute_period_counts(&[], &[orphan_a, orphan_b], &[], &march_2024());
        assert_eq!(counts.auto_video_placements, 1);
        assert_eq!(counts.auto_return_visits, 0);
        assert_eq!(counts.auto_studies, 0);
    }

    #[test]
    fn test_manual_offsets_add_to_automatic_counts() {
        let call = study_call("Ana");
        let visits = [
            Visit::new(&call.id, local_noon(2024, 3, 1)),
            Visit::new(&call.id, local_noon(2024, 3, 8)),
        ];

        let mut record = ServiceRecord::new(local_noon(2024, 3, 9), ms_from_hours_minutes(1, 45));
        record.return_visit_offset = 2;
        record.study_offset = 1;
        record.video_placements = 4;
        let mut other = ServiceRecord::new(local_noon(2024, 3, 30), ms_from_hours_minutes(0, 20));
        other.ldc = true;
        let outside = ServiceRecord::new(local_noon(2024, 4, 1), ms_from_hours_minutes(5, 0));

        let report = compute_period_report(
            &[call],
            &visits,
            &[record, other, outside],
            &march_2024(),
            &DefaultLabels,
        );

        // 1h45m + 20m = 2h05m，向下取整
        assert_eq!(report.hours, 2);
        assert_eq!(report.return_visits, 3);
        assert_eq!(report.studies, Some(2));
        assert_eq!(report.video_placements, 4);
    }

    #[test]
    fn test_visit_flags_do_not_change_counts() {
        let call = study_call("Ana");
        let mut first = Visit::new(&call.id, local_noon(2024, 3, 1));
        first.do_not_count_towards_study = true;
        let mut second = Visit::new(&call.id, local_noon(2024, 3, 5));
        second.do_not_include_in_monthly_report = true;
        second.do_not_count_towards_study = true;
        second.placement = Some("Tract".to_string());

        let counts = compute_period_counts(&[call], &[first, second], &[], &march_2024());
        assert_eq!(counts.auto_placements, 1);
        assert_eq!(counts.auto_return_visits, 1);
        assert_eq!(counts.auto_studies, 1);
    }

    #[test]
    fn test_large_offsets_saturate() {
        let mut record = ServiceRecord::new(local_noon(2024, 3, 1), u64::MAX);
        record.placements = u32::MAX;
        record.return_visit_offset = u32::MAX;
        let mut again = ServiceRecord::new(local_noon(2024, 3, 2), u64::MAX);
        again.placements = 5;
        again.return_visit_offset = 5;
        let call = Call::new("Ana");
        let visits = [
            Visit::new(&call.id, local_noon(2024, 3, 3)),
            Visit::new(&call.id, local_noon(2024, 3, 4)),
        ];

        let report =
            compute_period_report(&[call], &visits, &[record, again], &march_2024(), &DefaultLabels);
        assert_eq!(report.placements, u32::MAX);
        assert_eq!(report.return_visits, u32::MAX);
        assert_eq!(report.hours, u64::MAX / 3_600_000);
    }

    #[test]
    fn test_annual_title() {
        assert_eq!(
            report_title(&Period::year(2023), &DefaultLabels),
            "2023 Service Report"
        );
    }
}
