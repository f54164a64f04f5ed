//! 结果可视化映射
//!
//! 把检测记录转换为图表数据点，并提供 SVG 折线图的坐标投影。
//! 组件只负责绘制，不再自己做日期排序或等级换算。

use crate::date::{display_date, timestamp_millis};
use crate::severity::SeverityLevel;
use crate::{ConditionKind, EntityId, TestRecord};

/// 图表上的一个点（对应一条检测记录）
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub record_id: EntityId,
    /// X 轴标签，`M/D/YYYY`
    pub date_label: String,
    /// 排序用时间戳，无法解析时为 None
    pub timestamp: Option<i64>,
    /// 主等级图的 Y 值
    pub rank: u8,
    pub level: SeverityLevel,
    pub confidence: f64,
    /// 各等级得分曲线的取值
    pub scores: Vec<(SeverityLevel, f64)>,
}

impl ChartPoint {
    pub fn score_for(&self, level: &SeverityLevel) -> Option<f64> {
        self.scores
            .iter()
            .find(|(l, _)| l == level)
            .map(|(_, score)| *score)
    }
}

/// 每条记录生成一个点，按 createdAt 稳定升序排列；无法解析日期的记录按输入顺序排在最后
pub fn chart_points(records: &[TestRecord]) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = records.iter().map(to_point).collect();
    points.sort_by_key(|p| (p.timestamp.is_none(), p.timestamp));
    points
}

fn to_point(record: &TestRecord) -> ChartPoint {
    let outcome = &record.outcome;
    let level = outcome.primary_level();
    let scores = match &outcome.severity {
        Some(severity) if !severity.scores.is_empty() => severity.scores.clone(),
        // 只有等级没有分布时，用等级置信度作为该等级的得分；两者都没有则不画点
        Some(severity) if severity.confidence > 0.0 => {
            vec![(severity.level.clone(), severity.confidence)]
        }
        _ => Vec::new(),
    };
    ChartPoint {
        record_id: record.id.clone(),
        date_label: display_date(&record.created_at),
        timestamp: timestamp_millis(&record.created_at),
        rank: level.rank(),
        level,
        confidence: outcome.confidence,
        scores,
    }
}

/// 时间线上的结果文案
pub fn result_text(record: &TestRecord) -> String {
    let name = record.test_type_label();
    match (&record.outcome.severity, record.outcome.detected) {
        (Some(severity), _) => format!("{} - {}", name, severity.level),
        (None, Some(true)) => format!("{} Detected", name),
        (None, Some(false)) => format!("No {} Detected", name),
        (None, None) => "Results Pending".to_string(),
    }
}

/// 检测页的结果摘要
pub fn detection_summary(condition: ConditionKind, detected: bool) -> String {
    if detected {
        format!("{} detected in the image", condition.display_name())
    } else {
        format!("No significant {} detected", condition.slug())
    }
}

/// 出现在任一点得分中的等级；已知等级按序数排列，无法识别的按首次出现顺序追加
pub fn active_levels(points: &[ChartPoint]) -> Vec<SeverityLevel> {
    let present = |level: &SeverityLevel| points.iter().any(|p| p.score_for(level).is_some());
    let mut levels: Vec<SeverityLevel> = SeverityLevel::KNOWN
        .into_iter()
        .filter(|l| present(l))
        .collect();
    for point in points {
        for (level, _) in &point.scores {
            if !level.is_known() && !levels.contains(level) {
                levels.push(level.clone());
            }
        }
    }
    levels
}

// =========================================================
// SVG 投影
// =========================================================

/// 折线图的绘图区域与 Y 轴范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartFrame {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartFrame {
    /// 得分趋势图：0-100%
    pub fn percent(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: 32.0,
            y_min: 0.0,
            y_max: 100.0,
        }
    }

    /// 主等级图：0 到最高序数
    pub fn rank(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: 32.0,
            y_min: 0.0,
            y_max: f64::from(SeverityLevel::MAX_RANK),
        }
    }

    /// 第 `index` 个类目（共 `count` 个）的 X 坐标；只有一个点时居中
    pub fn x_at(&self, index: usize, count: usize) -> f64 {
        let inner = (self.width - 2.0 * self.padding).max(0.0);
        if count <= 1 {
            return self.padding + inner / 2.0;
        }
        self.padding + inner * index as f64 / (count - 1) as f64
    }

    /// 值到 Y 坐标（SVG 坐标系 Y 轴向下），超出范围的值贴边
    pub fn y_for(&self, value: f64) -> f64 {
        let inner = (self.height - 2.0 * self.padding).max(0.0);
        let span = self.y_max - self.y_min;
        let ratio = if span > 0.0 {
            ((value - self.y_min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.padding + inner * (1.0 - ratio)
    }
}

/// 把一列取值映射为 SVG 坐标；缺失的值保持为 None（折线在此断开）
pub fn project(values: &[Option<f64>], frame: &ChartFrame) -> Vec<Option<(f64, f64)>> {
    let count = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| v.map(|value| (frame.x_at(i, count), frame.y_for(value))))
        .collect()
}

/// 生成 SVG `path` 的 `d` 属性，遇到缺失点时重新 `M`
pub fn svg_path(coords: &[Option<(f64, f64)>]) -> String {
    let mut d = String::new();
    let mut pen_down = false;
    for coord in coords {
        match coord {
            Some((x, y)) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                if !d.is_empty() {
                    d.push(' ');
                }
                d.push_str(&format!("{}{:.1},{:.1}", cmd, x, y));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::SeverityTone;
    use serde_json::json;

    fn record(id: i64, created_at: &str, results: serde_json::Value) -> TestRecord {
        serde_json::from_value(json!({
            "id": id,
            "testType": "acne",
            "createdAt": created_at,
            "testResults": results
        }))
        .unwrap()
    }

    fn with_level(id: i64, created_at: &str, level: &str) -> TestRecord {
        record(
            id,
            created_at,
            json!({"detected": true, "confidence": 90, "severity": {"level": level, "confidence": 70}}),
        )
    }

    #[test]
    fn test_three_levels_ascend() {
        let records = vec![
            with_level(1, "2024-01-01T10:00:00Z", "Mild"),
            with_level(2, "2024-02-01T10:00:00Z", "Moderate"),
            with_level(3, "2024-03-01T10:00:00Z", "Severe"),
        ];
        let points = chart_points(&records);
        assert_eq!(points.len(), 3);
        assert_eq!(points.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            points.iter().map(|p| p.level.tone()).collect::<Vec<_>>(),
            vec![SeverityTone::Amber, SeverityTone::Orange, SeverityTone::Red]
        );
        assert_eq!(points[0].date_label, "1/1/2024");
    }

    #[test]
    fn test_points_sorted_by_created_at() {
        let records = vec![
            with_level(1, "2024-03-01", "Mild"),
            with_level(2, "garbage", "Mild"),
            with_level(3, "2024-01-01", "Mild"),
            with_level(4, "", "Mild"),
            with_level(5, "2024-02-01 08:00:00", "Mild"),
        ];
        let points = chart_points(&records);
        let ids: Vec<&str> = points.iter().map(|p| p.record_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "5", "1", "2", "4"]);
        assert_eq!(points[3].date_label, "garbage");
    }

    #[test]
    fn test_record_without_severity() {
        let points = chart_points(&[
            record(1, "2024-01-01", json!({"detected": true, "confidence": 80})),
            record(2, "2024-01-02", json!({"detected": false, "confidence": 95})),
        ]);
        assert_eq!(points[0].level, SeverityLevel::Mild);
        assert_eq!(points[1].level, SeverityLevel::Clear);
        assert!(points[0].scores.is_empty());
    }

    #[test]
    fn test_label_only_severity_has_no_score() {
        let points = chart_points(&[
            record(1, "2024-01-01", json!({"detected": true, "confidence": 80, "severity": "Mild"})),
            with_level(2, "2024-01-02", "Moderate"),
        ]);
        assert_eq!(points[0].level, SeverityLevel::Mild);
        assert!(points[0].scores.is_empty());
        assert_eq!(points[1].scores, vec![(SeverityLevel::Moderate, 70.0)]);
    }

    #[test]
    fn test_score_series_and_active_levels() {
        let points = chart_points(&[
            record(
                1,
                "2024-01-01",
                json!({"detected": true, "confidence": 80,
                       "severity": {"level": "Moderate", "confidence": 60},
                       "severity_scores": {"Moderate": 60.0, "Mild": 30.0, "Scarring": 10.0}}),
            ),
            with_level(2, "2024-01-05", "Severe"),
        ]);
        assert_eq!(points[0].score_for(&SeverityLevel::Mild), Some(30.0));
        assert_eq!(points[1].score_for(&SeverityLevel::Severe), Some(70.0));
        assert_eq!(
            active_levels(&points),
            vec![
                SeverityLevel::Mild,
                SeverityLevel::Moderate,
                SeverityLevel::Severe,
                SeverityLevel::parse("Scarring"),
            ]
        );
    }

    #[test]
    fn test_result_text_variants() {
        let graded = with_level(1, "", "Moderate");
        let positive = record(2, "", json!({"detected": true, "confidence": 50}));
        let negative = record(3, "", json!({"detected": false, "confidence": 50}));
        let pending = record(4, "", json!({}));
        assert_eq!(result_text(&graded), "Acne - Moderate");
        assert_eq!(result_text(&positive), "Acne Detected");
        assert_eq!(result_text(&negative), "No Acne Detected");
        assert_eq!(result_text(&pending), "Results Pending");
    }

    #[test]
    fn test_detection_summary() {
        assert_eq!(detection_summary(ConditionKind::Acne, true), "Acne detected in the image");
        assert_eq!(detection_summary(ConditionKind::Acne, false), "No significant acne detected");
    }

    #[test]
    fn test_project_and_path() {
        let frame = ChartFrame {
            width: 264.0,
            height: 164.0,
            padding: 32.0,
            y_min: 0.0,
            y_max: 100.0,
        };
        let coords = project(&[Some(0.0), None, Some(100.0)], &frame);
        assert_eq!(coords, vec![Some((32.0, 132.0)), None, Some((232.0, 32.0))]);
        assert_eq!(svg_path(&coords), "M32.0,132.0 M232.0,32.0");

        let single = project(&[Some(150.0)], &frame);
        assert_eq!(single, vec![Some((132.0, 32.0))]);
        assert_eq!(svg_path(&project(&[Some(50.0), Some(50.0)], &frame)), "M32.0,82.0 L232.0,82.0");
    }
}
