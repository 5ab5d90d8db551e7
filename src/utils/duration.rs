//! 时长换算工具
//!
//! 服务记录的 `time` 字段统一以毫秒存储，分钟/小时输入在入库前换算

pub const MS_PER_MINUTE: u64 = 60 * 1000;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// 分钟 -> 毫秒
pub fn ms_from_minutes(minutes: u64) -> u64 {
    minutes * MS_PER_MINUTE
}

/// 小时 + 分钟 -> 毫秒
pub fn ms_from_hours_minutes(hours: u64, minutes: u64) -> u64 {
    hours * MS_PER_HOUR + ms_from_minutes(minutes)
}

/// 毫秒 -> 整小时（向下取整）
pub fn whole_hours(ms: u64) -> u64 {
    ms / MS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(ms_from_minutes(90), 5_400_000);
        assert_eq!(ms_from_hours_minutes(2, 0), 2 * 3600 * 1000);
        assert_eq!(whole_hours(ms_from_hours_minutes(1, 59)), 1);
    }
}
