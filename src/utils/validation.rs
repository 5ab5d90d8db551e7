//! 输入验证工具函数

use anyhow::{bail, Result};

/// 验证月份（0-11）
///
/// 超出范围属于调用方的编程错误，直接返回错误而不是截断
pub fn validate_month(month: u32) -> Result<()> {
    if month > 11 {
        bail!("无效的月份: {} (应为 0-11)", month);
    }
    Ok(())
}

/// 验证实体ID非空
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("实体 ID 不能为空");
    }
    Ok(())
}
