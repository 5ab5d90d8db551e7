// 数据模型定义 - 持久化实体结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 生成新的实体ID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 创建/更新时间戳（所有实体共用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

// ========== 联系人 ==========

/// 兴趣程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterestLevel {
    NotInterested,
    LittleInterest,
    Interested,
    VeryInterested,
}

/// 地理坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// 结构化地址
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

/// 联系人（Call）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub interest_level: Option<InterestLevel>,
    #[serde(default)]
    pub is_study: bool,
    #[serde(default)]
    pub is_return_visit: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Call {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            address: None,
            note: None,
            interest_level: None,
            is_study: false,
            is_return_visit: false,
            timestamps: Timestamps::default(),
        }
    }
}

/// 联系人补丁 - 只有 `Some` 的字段会覆盖现有值
///
/// 嵌套对象（如 `address`）整体替换，不做深度合并
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPatch {
    pub name: Option<String>,
    pub address: Option<Address>,
    pub note: Option<String>,
    pub interest_level: Option<InterestLevel>,
    pub is_study: Option<bool>,
    pub is_return_visit: Option<bool>,
}

// ========== 拜访 ==========

/// 拜访对联系人的反向引用（不表示所有权）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRef {
    pub id: String,
}

/// 计划中的下次拜访
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextVisit {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notify_me: bool,
    #[serde(default)]
    pub linked_topic: Option<String>,
    #[serde(default)]
    pub linked_scripture: Option<String>,
    #[serde(default)]
    pub linked_note: Option<String>,
}

/// 拜访（Visit）- 与某个联系人的一次带日期的互动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub call: CallRef,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub video_placement: Option<String>,
    #[serde(default)]
    pub partners: Option<String>,
    #[serde(default)]
    pub next_visit: Option<NextVisit>,
    #[serde(default)]
    pub do_not_include_in_monthly_report: bool,
    #[serde(default)]
    pub do_not_count_towards_study: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Visit {
    pub fn new(call_id: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            call: CallRef { id: call_id.into() },
            date,
            topic: None,
            note: None,
            placement: None,
            video_placement: None,
            partners: None,
            next_visit: None,
            do_not_include_in_monthly_report: false,
            do_not_count_towards_study: false,
            timestamps: Timestamps::default(),
        }
    }

    /// 是否留下了书刊
    pub fn has_placement(&self) -> bool {
        is_filled(&self.placement)
    }

    /// 是否播放/留下了视频
    pub fn has_video_placement(&self) -> bool {
        is_filled(&self.video_placement)
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// 拜访补丁
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPatch {
    pub date: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub note: Option<String>,
    pub placement: Option<String>,
    pub video_placement: Option<String>,
    pub partners: Option<String>,
    pub next_visit: Option<NextVisit>,
    pub do_not_include_in_monthly_report: Option<bool>,
    pub do_not_count_towards_study: Option<bool>,
}

// ========== 服务记录 ==========

/// 服务记录（ServiceRecord）- 手动记录的时间与计数偏移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    /// 仅用于归入月份/年份
    pub date: DateTime<Utc>,
    /// 时长（毫秒）
    pub time: u64,
    #[serde(default)]
    pub ldc: bool,
    #[serde(default)]
    pub placements: u32,
    #[serde(default)]
    pub video_placements: u32,
    #[serde(default)]
    pub return_visit_offset: u32,
    #[serde(default)]
    pub study_offset: u32,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl ServiceRecord {
    /// `time_ms` 必须已经换算为毫秒，见 `utils::duration`
    pub fn new(date: DateTime<Utc>, time_ms: u64) -> Self {
        Self {
            id: new_id(),
            date,
            time: time_ms,
            ldc: false,
            placements: 0,
            video_placements: 0,
            return_visit_offset: 0,
            study_offset: 0,
            timestamps: Timestamps::default(),
        }
    }
}

/// 服务记录补丁
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecordPatch {
    pub date: Option<DateTime<Utc>>,
    pub time: Option<u64>,
    pub ldc: Option<bool>,
    pub placements: Option<u32>,
    pub video_placements: Option<u32>,
    pub return_visit_offset: Option<u32>,
    pub study_offset: Option<u32>,
}
