// 报告周期 - 判断某个时刻是否落在 月+年 或 整年 区间内
//
// 所有汇总都通过 Period::contains 判断归属，保证 12 个月的划分与整年的划分一致

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::utils::validate_month;

/// 报告周期：月份为 None 时表示整年
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    month: Option<u32>,
    year: i32,
}

impl Period {
    /// 创建周期，年份缺省为当前年份
    pub fn new(month: Option<u32>, year: Option<i32>) -> Result<Self> {
        if let Some(month) = month {
            validate_month(month)?;
        }
        Ok(Self {
            month,
            year: year.unwrap_or_else(|| Local::now().year()),
        })
    }

    /// 指定月份（0-11）
    pub fn month(month: u32, year: i32) -> Result<Self> {
        Self::new(Some(month), Some(year))
    }

    /// 调用方保证 month < 12
    pub(crate) fn month_unchecked(month: u32, year: i32) -> Self {
        debug_assert!(month < 12);
        Self {
            month: Some(month),
            year,
        }
    }

    /// 整年
    pub fn year(year: i32) -> Self {
        Self { month: None, year }
    }

    /// 当前所在月份
    pub fn current_month() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// 包含给定日期的月份周期
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: Some(date.month0()),
            year: date.year(),
        }
    }

    pub fn month_index(&self) -> Option<u32> {
        self.month
    }

    pub fn year_value(&self) -> i32 {
        self.year
    }

    pub fn is_annual(&self) -> bool {
        self.month.is_none()
    }

    /// 时刻是否落在本周期内（按本地时区的日历年/月）
    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        let local = date.with_timezone(&Local);
        if local.year() != self.year {
            return false;
        }
        match self.month {
            Some(month) => local.month0() == month,
            None => true,
        }
    }
}

/// 判断时刻是否落在周期内，月份越界时返回错误
pub fn in_period(date: &DateTime<Utc>, month: Option<u32>, year: Option<i32>) -> Result<bool> {
    Ok(Period::new(month, year)?.contains(date))
}
