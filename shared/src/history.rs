//! 病历模块
//!
//! `/api/patient-results/:id` 返回的历史检测记录。旧数据中的 `testResults`
//! 可能是 JSON 编码后的字符串，反序列化时统一归一化为 `TestOutcome`。

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::protocol::{RawSeverity, severity_result};
use crate::severity::SeverityLevel;
use crate::{ConditionKind, EntityId, Patient, SeverityResult, clamp_percent};

/// 一次历史检测的结果（归一化后）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestOutcome {
    /// 是否检出；`None` 表示结果尚未产出
    pub detected: Option<bool>,
    pub confidence: f64,
    pub severity: Option<SeverityResult>,
}

impl TestOutcome {
    /// 图表使用的主等级：有严重程度取其等级，否则按检出与否取 Mild / Clear
    pub fn primary_level(&self) -> SeverityLevel {
        match (&self.severity, self.detected) {
            (Some(severity), _) => severity.level.clone(),
            (None, Some(true)) => SeverityLevel::Mild,
            _ => SeverityLevel::Clear,
        }
    }
}

/// 一条历史检测记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTestRecord")]
pub struct TestRecord {
    pub id: EntityId,
    pub test_type: String,
    pub image_url: String,
    pub body_part: Option<String>,
    pub created_at: String,
    pub outcome: TestOutcome,
}

impl TestRecord {
    pub fn condition(&self) -> Option<ConditionKind> {
        ConditionKind::from_slug(&self.test_type)
    }

    /// 首字母大写的检测类型，如 `acne` -> `Acne`
    pub fn test_type_label(&self) -> String {
        match self.condition() {
            Some(condition) => condition.display_name().to_string(),
            None => {
                let mut chars = self.test_type.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// 单个患者的资料与全部检测记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientHistory {
    pub patient: Patient,
    #[serde(default)]
    pub test_results: Vec<TestRecord>,
}

impl PatientHistory {
    /// 按检测类型筛选，保持后端返回顺序
    pub fn records_for(&self, condition: ConditionKind) -> Vec<TestRecord> {
        self.test_results
            .iter()
            .filter(|r| r.condition() == Some(condition))
            .cloned()
            .collect()
    }

    /// 该患者做过的检测类型
    pub fn conditions(&self) -> Vec<ConditionKind> {
        ConditionKind::ALL
            .into_iter()
            .filter(|c| self.test_results.iter().any(|r| r.condition() == Some(*c)))
            .collect()
    }
}

// =========================================================
// 原始结构 (Wire Shapes)
// =========================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTestRecord {
    #[serde(default)]
    id: EntityId,
    #[serde(default)]
    test_type: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    body_part: Option<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    test_results: Option<RawResultsField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResultsField {
    Structured(RawResults),
    Encoded(String),
}

#[derive(Default, Deserialize)]
struct RawResults {
    #[serde(default)]
    detected: Option<bool>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    severity: Option<RawSeverity>,
    #[serde(default)]
    severity_scores: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    body_part: Option<String>,
}

impl RawResultsField {
    fn into_results(self) -> RawResults {
        match self {
            RawResultsField::Structured(results) => results,
            // 旧数据：整段结果被编码为字符串；无法解析时视为待出结果
            RawResultsField::Encoded(text) => serde_json::from_str(&text).unwrap_or_default(),
        }
    }
}

impl From<RawTestRecord> for TestRecord {
    fn from(raw: RawTestRecord) -> Self {
        let results = raw
            .test_results
            .map(RawResultsField::into_results)
            .unwrap_or_default();

        let severity = results
            .severity
            .as_ref()
            .map(|s| severity_result(s, results.severity_scores.clone()));

        let body_part = raw
            .body_part
            .filter(|p| !p.trim().is_empty())
            .or(results.body_part);

        TestRecord {
            id: raw.id,
            test_type: raw.test_type.trim().to_ascii_lowercase(),
            image_url: raw.image_url,
            body_part,
            created_at: raw.created_at,
            outcome: TestOutcome {
                detected: results.detected,
                confidence: clamp_percent(results.confidence.unwrap_or_default()),
                severity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_record() {
        let record: TestRecord = serde_json::from_value(json!({
            "id": 1,
            "testType": "acne",
            "imageUrl": "/uploads/1.jpg",
            "bodyPart": "Face",
            "createdAt": "2024-03-01T09:00:00Z",
            "testResults": {
                "detected": true,
                "confidence": 87.5,
                "severity": {"level": "Moderate", "confidence": 66.0},
                "severity_scores": {"Mild": 20.0, "Moderate": 66.0}
            }
        }))
        .unwrap();
        assert_eq!(record.condition(), Some(ConditionKind::Acne));
        assert_eq!(record.outcome.detected, Some(true));
        let severity = record.outcome.severity.unwrap();
        assert_eq!(severity.level, SeverityLevel::Moderate);
        assert_eq!(severity.scores.len(), 2);
    }

    #[test]
    fn test_severity_confidence_falls_back_to_level_score() {
        let record: TestRecord = serde_json::from_value(json!({
            "id": 5,
            "testType": "eczema",
            "createdAt": "2024-04-01",
            "testResults": {
                "detected": true,
                "confidence": 77,
                "severity": {"level": "Moderate"},
                "severity_scores": {"Moderate": 60.0, "Mild": 40.0}
            }
        }))
        .unwrap();
        let severity = record.outcome.severity.unwrap();
        assert_eq!(severity.confidence, 60.0);
        assert_eq!(
            severity.scores,
            vec![(SeverityLevel::Mild, 40.0), (SeverityLevel::Moderate, 60.0)]
        );
    }

    #[test]
    fn test_encoded_record() {
        let encoded = json!({"detected": false, "confidence": 93, "body_part": "Back"}).to_string();
        let record: TestRecord = serde_json::from_value(json!({
            "id": "r-2",
            "testType": "Eczema",
            "imageUrl": "",
            "bodyPart": "",
            "createdAt": "2024-03-01 09:00:00",
            "testResults": encoded
        }))
        .unwrap();
        assert_eq!(record.test_type, "eczema");
        assert_eq!(record.outcome.detected, Some(false));
        assert_eq!(record.outcome.confidence, 93.0);
        assert_eq!(record.body_part.as_deref(), Some("Back"));
        assert_eq!(record.outcome.primary_level(), SeverityLevel::Clear);
    }

    #[test]
    fn test_unreadable_results_are_pending() {
        let record: TestRecord = serde_json::from_value(json!({
            "id": 3,
            "testType": "psoriasis",
            "createdAt": "2024-03-01",
            "testResults": "{broken"
        }))
        .unwrap();
        assert_eq!(record.outcome, TestOutcome::default());
    }

    #[test]
    fn test_history_filters_by_condition() {
        let history: PatientHistory = serde_json::from_value(json!({
            "patient": {"firstName": "Ana", "lastName": "Lima", "email": "a@b.com"},
            "testResults": [
                {"id": 1, "testType": "acne", "createdAt": "2024-01-01", "testResults": {"confidence": 50}},
                {"id": 2, "testType": "psoriasis", "createdAt": "2024-01-02", "testResults": {"confidence": 50}},
                {"id": 3, "testType": "acne", "createdAt": "2024-01-03", "testResults": {"confidence": 50}}
            ]
        }))
        .unwrap();
        let acne = history.records_for(ConditionKind::Acne);
        assert_eq!(acne.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(
            history.conditions(),
            vec![ConditionKind::Acne, ConditionKind::Psoriasis]
        );
        assert_eq!(history.patient.full_name(), "Ana Lima");
    }

    #[test]
    fn test_type_label_for_unknown_type() {
        let record: TestRecord =
            serde_json::from_value(json!({"id": 4, "testType": "rosacea", "createdAt": ""})).unwrap();
        assert_eq!(record.test_type_label(), "Rosacea");
        assert_eq!(record.outcome.primary_level(), SeverityLevel::Clear);
    }
}
