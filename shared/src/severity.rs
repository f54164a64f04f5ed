//! 严重程度等级表
//!
//! 所有页面共用同一张序数/颜色映射，避免各组件各写一份字符串比较。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 严重程度等级
///
/// 映射是全函数：无法识别的标签保留原文，排序按 `Mild` 处理。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeverityLevel {
    Clear,
    Mild,
    Moderate,
    Severe,
    HighSevere,
    Unrecognized(String),
}

impl SeverityLevel {
    /// 已知等级，按序数排列
    pub const KNOWN: [SeverityLevel; 5] = [
        Self::Clear,
        Self::Mild,
        Self::Moderate,
        Self::Severe,
        Self::HighSevere,
    ];

    pub const MAX_RANK: u8 = 4;

    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "clear" | "no acne" | "no eczema" | "no psoriasis" => Self::Clear,
            "mild" => Self::Mild,
            "moderate" => Self::Moderate,
            "severe" => Self::Severe,
            "high severe" | "high_severe" | "very severe" => Self::HighSevere,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Clear => "Clear",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::HighSevere => "High Severe",
            Self::Unrecognized(label) => label,
        }
    }

    /// 序数：Clear=0, Mild=1, Moderate=2, Severe=3, High Severe=4，其余为 1
    pub fn rank(&self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Mild | Self::Unrecognized(_) => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
            Self::HighSevere => 4,
        }
    }

    pub fn tone(&self) -> SeverityTone {
        match self {
            Self::Clear => SeverityTone::Green,
            Self::Mild | Self::Unrecognized(_) => SeverityTone::Amber,
            Self::Moderate => SeverityTone::Orange,
            Self::Severe => SeverityTone::Red,
            Self::HighSevere => SeverityTone::Purple,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for SeverityLevel {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for SeverityLevel {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<SeverityLevel> for String {
    fn from(level: SeverityLevel) -> Self {
        level.label().to_string()
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 按序数排序，序数相同时按标签排序，保证结果稳定
pub fn sort_by_rank(scores: &mut [(SeverityLevel, f64)]) {
    scores.sort_by(|(a, _), (b, _)| {
        a.rank()
            .cmp(&b.rank())
            .then_with(|| a.is_known().cmp(&b.is_known()).reverse())
            .then_with(|| a.label().cmp(b.label()))
    });
}

/// 等级配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTone {
    Green,
    Amber,
    Orange,
    Red,
    Purple,
}

impl SeverityTone {
    /// 徽章样式（背景 + 文字）
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Green => "bg-green-100 text-green-700",
            Self::Amber => "bg-amber-100 text-amber-700",
            Self::Orange => "bg-orange-100 text-orange-700",
            Self::Red => "bg-red-100 text-red-700",
            Self::Purple => "bg-purple-100 text-purple-700",
        }
    }

    pub fn text_class(&self) -> &'static str {
        match self {
            Self::Green => "text-green-500",
            Self::Amber => "text-amber-500",
            Self::Orange => "text-orange-500",
            Self::Red => "text-red-600",
            Self::Purple => "text-purple-700",
        }
    }

    /// 进度条填充色
    pub fn bar_class(&self) -> &'static str {
        match self {
            Self::Green => "bg-green-500",
            Self::Amber => "bg-amber-500",
            Self::Orange => "bg-orange-500",
            Self::Red => "bg-red-500",
            Self::Purple => "bg-purple-700",
        }
    }

    /// 图表线条颜色
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Green => "#4caf50",
            Self::Amber => "#ffb300",
            Self::Orange => "#ff9800",
            Self::Red => "#f44336",
            Self::Purple => "#7b1fa2",
        }
    }
}
