//! DermaScope 共享领域层
//!
//! 与浏览器无关的纯逻辑，前端和测试共用：
//! - `protocol`: 后端接口定义与响应归一化
//! - `session`: 会话存储（持久化 + 订阅）
//! - `upload`: 单张图片的上传/推理状态机
//! - `severity` / `chart`: 结果可视化映射
//! - `history` / `roster`: 病历与医生端患者列表

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod chart;
pub mod date;
pub mod error;
pub mod history;
pub mod protocol;
pub mod roster;
pub mod session;
pub mod severity;
pub mod upload;

pub use error::{ApiError, SessionError, UploadError};
pub use history::{PatientHistory, TestOutcome, TestRecord};
pub use session::{Session, SessionStorage, SessionStore, SessionToken};
pub use severity::{SeverityLevel, SeverityTone};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const STORAGE_TOKEN_KEY: &str = "token";
pub const STORAGE_USER_KEY: &str = "user";
pub const STORAGE_API_BASE_KEY: &str = "api_base_url";
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

// =========================================================
// 标识符 (Identifiers)
// =========================================================

/// 后端实体 ID
///
/// 后端有时返回数字、有时返回字符串，这里统一按字符串保存。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Float(n) if n.fract() == 0.0 => Self(format!("{}", n as i64)),
            RawId::Float(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// =========================================================
// 用户 (Users)
// =========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Patient,
    Doctor,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Patient => "patient",
            UserType::Doctor => "doctor",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 会话中的用户资料
///
/// 序列化格式与 LocalStorage 中 `user` 键保持一致（camelCase）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<EntityId>,
    #[serde(default)]
    pub user_type: UserType,
}

impl UserProfile {
    pub fn patient(user_id: impl Into<EntityId>, first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            user_id: Some(user_id.into()),
            doctor_id: None,
            user_type: UserType::Patient,
        }
    }

    pub fn doctor(doctor_id: impl Into<EntityId>, first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            user_id: None,
            doctor_id: Some(doctor_id.into()),
            user_type: UserType::Doctor,
        }
    }
}

// =========================================================
// 检测类别 (Conditions)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Acne,
    Eczema,
    Psoriasis,
}

/// 推理流水线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// 先检测，再按 resultId 评估严重程度
    Staged,
    /// 旧版单次预测接口
    SingleShot,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 3] = [Self::Acne, Self::Eczema, Self::Psoriasis];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Acne => "acne",
            Self::Eczema => "eczema",
            Self::Psoriasis => "psoriasis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Acne => "Acne",
            Self::Eczema => "Eczema",
            Self::Psoriasis => "Psoriasis",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(slug.trim()))
    }

    pub fn pipeline(&self) -> Pipeline {
        match self {
            Self::Acne | Self::Psoriasis => Pipeline::Staged,
            Self::Eczema => Pipeline::SingleShot,
        }
    }

    /// 检测前是否必须选择身体部位
    pub fn requires_body_part(&self) -> bool {
        self.pipeline() == Pipeline::Staged
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Face,
    Neck,
    Chest,
    Back,
    Arms,
    Legs,
    Other,
}

impl BodyPart {
    pub const ALL: [BodyPart; 7] = [
        Self::Face,
        Self::Neck,
        Self::Chest,
        Self::Back,
        Self::Arms,
        Self::Legs,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Face => "Face",
            Self::Neck => "Neck",
            Self::Chest => "Chest",
            Self::Back => "Back",
            Self::Arms => "Arms",
            Self::Legs => "Legs",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

// =========================================================
// 推理结果 (Inference Results)
// =========================================================

/// 检测结果，置信度已限制在 [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub result_id: Option<EntityId>,
    pub is_detected: bool,
    pub confidence: f64,
}

/// 严重程度评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub level: SeverityLevel,
    pub confidence: f64,
    /// 按严重程度排序的各级得分（百分比，不保证总和为 100）
    pub scores: Vec<(SeverityLevel, f64)>,
}

/// 归一化后的推理结果，所有下游渲染只依赖此结构
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inference {
    pub detection: Option<DetectionResult>,
    pub severity: Option<SeverityResult>,
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// =========================================================
// 患者 (Patients)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: EntityId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub test_count: u32,
    #[serde(default)]
    pub latest_test_date: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_value(json!([42, "abc", 7.0])).unwrap();
        assert_eq!(ids, vec![EntityId::from(42), EntityId::from("abc"), EntityId::from(7)]);
    }

    #[test]
    fn test_stored_user_without_type_is_patient() {
        let user: UserProfile =
            serde_json::from_value(json!({"firstName": "Ana", "userId": 3})).unwrap();
        assert_eq!(user.user_type, UserType::Patient);
        assert_eq!(user.user_id, Some(EntityId::from(3)));
    }

    #[test]
    fn test_doctor_profile_ids() {
        let user = UserProfile::doctor(9, "House");
        assert_eq!(user.doctor_id, Some(EntityId::from(9)));
        assert!(user.user_id.is_none());
    }

    #[test]
    fn test_condition_slugs() {
        assert_eq!(ConditionKind::from_slug("Eczema"), Some(ConditionKind::Eczema));
        assert_eq!(ConditionKind::from_slug("rosacea"), None);
        assert!(ConditionKind::Acne.requires_body_part());
        assert!(!ConditionKind::Eczema.requires_body_part());
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(120.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }
}
