// 分享格式化 - 把报告计数转换为可直接粘贴到短信中的纯文本
//
// 输出只依赖计数与标签，同样的输入总是得到完全相同的文本

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::labels::*;

/// 分享文本使用的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCounts {
    pub hours: u64,
    pub placements: u32,
    pub video_placements: u32,
    pub return_visits: u32,
    /// None 时整行省略
    pub studies: Option<u32>,
}

/// 分享内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareContent {
    pub title: String,
    pub message: String,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("占位符正则无效"))
}

/// 用 `{{count}}` 占位符渲染一行，未知占位符替换为空
fn render_line(template: &str, count: &str) -> String {
    let rendered = placeholder_pattern().replace_all(template, |caps: &regex::Captures| {
        if &caps[1] == "count" {
            count.to_string()
        } else {
            String::new()
        }
    });

    strip_markup(&rendered)
}

/// 去掉 `{ } " ,`，保证文本可以直接粘贴
fn strip_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '{' | '}' | '"' | ','))
        .collect()
}

/// 每个指标一行：小时、书刊、视频、续访，学习（有值时）
pub fn format_for_sharing(counts: &ShareCounts, labels: &dyn Labels) -> String {
    let mut lines = vec![
        render_line(&labels.label(SHARE_HOURS_KEY), &counts.hours.to_string()),
        render_line(&labels.label(SHARE_PLACEMENTS_KEY), &counts.placements.to_string()),
        render_line(
            &labels.label(SHARE_VIDEO_PLACEMENTS_KEY),
            &counts.video_placements.to_string(),
        ),
        render_line(
            &labels.label(SHARE_RETURN_VISITS_KEY),
            &counts.return_visits.to_string(),
        ),
    ];

    if let Some(studies) = counts.studies {
        lines.push(render_line(&labels.label(SHARE_STUDIES_KEY), &studies.to_string()));
    }

    lines.join("\n")
}

/// 标题 + 正文
pub fn build_share(title: &str, counts: &ShareCounts, labels: &dyn Labels) -> ShareContent {
    ShareContent {
        title: title.to_string(),
        message: format!(
            "{}\n{}",
            strip_markup(title),
            format_for_sharing(counts, labels)
        ),
    }
}
