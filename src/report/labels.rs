// 本地化标签 - 报告标题与分享文本使用的文案查找

use std::collections::HashMap;

/// 标签查找接口，缺失的键原样返回
pub trait Labels: Send + Sync {
    fn label(&self, key: &str) -> String;
}

pub const REPORT_KEY: &str = "report";
pub const SHARE_HOURS_KEY: &str = "share.hours";
pub const SHARE_PLACEMENTS_KEY: &str = "share.placements";
pub const SHARE_VIDEO_PLACEMENTS_KEY: &str = "share.videoPlacements";
pub const SHARE_RETURN_VISITS_KEY: &str = "share.returnVisits";
pub const SHARE_STUDIES_KEY: &str = "share.studies";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// 月份标签键（0-11）
pub fn month_key(month: u32) -> String {
    format!("month.{}", month)
}

/// 内置英文标签
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLabels;

impl Labels for DefaultLabels {
    fn label(&self, key: &str) -> String {
        if let Some(index) = key.strip_prefix("month.") {
            if let Some(name) = index.parse::<usize>().ok().and_then(|i| MONTH_NAMES.get(i)) {
                return name.to_string();
            }
        }

        let text = match key {
            REPORT_KEY => "Service Report",
            SHARE_HOURS_KEY => "Hours: {{count}}",
            SHARE_PLACEMENTS_KEY => "Placements: {{count}}",
            SHARE_VIDEO_PLACEMENTS_KEY => "Video Placements: {{count}}",
            SHARE_RETURN_VISITS_KEY => "Return Visits: {{count}}",
            SHARE_STUDIES_KEY => "Studies: {{count}}",
            other => other,
        };
        text.to_string()
    }
}

/// 带覆盖项的标签（来自配置），未覆盖的键回退到内置标签
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    overrides: HashMap<String, String>,
}

impl LabelSet {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }
}

impl Labels for LabelSet {
    fn label(&self, key: &str) -> String {
        match self.overrides.get(key) {
            Some(text) => text.clone(),
            None => DefaultLabels.label(key),
        }
    }
}
