//! 时间工具模块
//!
//! 后端返回的时间字符串格式不一（RFC 3339、RFC 2822、无时区的 SQL 格式），
//! 这里统一解析为 `DateTime<FixedOffset>`，并提供图表/表格使用的日期标签。

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// 解析后端时间字符串
///
/// 无时区信息的时间按 UTC 处理。返回 None 如果所有格式都无法解析。
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// `M/D/YYYY` 格式的日期标签
pub fn date_label(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%-m/%-d/%Y").to_string()
}

/// 解析并格式化；无法解析时原样返回
pub fn display_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| date_label(&dt))
        .unwrap_or_else(|| raw.to_string())
}

/// 用于排序的毫秒时间戳
pub fn timestamp_millis(raw: &str) -> Option<i64> {
    parse_timestamp(raw).map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// 一天中的时段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// 5-11 上午，12-17 下午，18-21 傍晚，其余为夜间
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn salutation(&self) -> &'static str {
        match self {
            Self::Morning => "Good morning",
            Self::Afternoon => "Good afternoon",
            Self::Evening => "Good evening",
            Self::Night => "Good night",
        }
    }
}

/// 仪表盘问候语，如 `Good morning, Ana!`
pub fn greeting(first_name: &str, hour: u32) -> String {
    let name = first_name.trim();
    let name = if name.is_empty() { "Guest" } else { name };
    format!("{}, {}!", DayPeriod::from_hour(hour).salutation(), name)
}
