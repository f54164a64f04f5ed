use crate::history::PatientHistory;
use crate::severity::{SeverityLevel, sort_by_rank};
use crate::{
    ApiError, BodyPart, ConditionKind, DetectionResult, EntityId, Inference, Patient,
    SeverityResult, UserProfile, UserType, clamp_percent,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// No body (GET).
    Empty,
    /// JSON-serialized request struct.
    Json,
    /// `multipart/form-data` with an `image` file plus `form_fields()`.
    Multipart,
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest {
    /// The wire shape returned by this endpoint.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// How the body is encoded.
    const BODY: BodyKind;
    /// The URL path, relative to the API base.
    fn path(&self) -> String;
    /// Text fields sent next to the image for multipart requests.
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Decode a response body into the endpoint's wire shape.
pub fn decode_response<R: ApiRequest>(body: &str) -> Result<R::Response, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Encode a JSON request body.
pub fn encode_body<T: Serialize>(request: &T) -> Result<String, ApiError> {
    serde_json::to_string(request).map_err(|e| ApiError::Decode(e.to_string()))
}

// =========================================================
// Authentication
// =========================================================

/// Sign in as patient or doctor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

impl ApiRequest for SignInRequest {
    type Response = AccountResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const BODY: BodyKind = BodyKind::Json;

    fn path(&self) -> String {
        match self.user_type {
            UserType::Patient => "/api/signin".to_string(),
            UserType::Doctor => "/api/doctor/signin".to_string(),
        }
    }
}

/// Create a patient or doctor account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

impl ApiRequest for SignUpRequest {
    type Response = AccountResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const BODY: BodyKind = BodyKind::Json;

    fn path(&self) -> String {
        match self.user_type {
            UserType::Patient => "/api/signup".to_string(),
            UserType::Doctor => "/api/doctor/signup".to_string(),
        }
    }
}

/// Shared response of sign-in and sign-up: `{userId|doctorId, firstName, token?}` or `{error}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: Option<EntityId>,
    pub doctor_id: Option<EntityId>,
    pub first_name: Option<String>,
    pub token: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// A signed-in identity, normalized from `AccountResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub user: UserProfile,
    /// Credential issued by the backend, when it issues one.
    pub token: Option<String>,
}

impl AccountResponse {
    /// Normalize into an account. The role follows the sign-in form; its own
    /// id field is preferred and the other one is accepted as a fallback.
    pub fn into_account(self, requested: UserType) -> Result<Account, ApiError> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(ApiError::Rejected(error));
        }
        let first_name = self.first_name.unwrap_or_default();
        let id = match requested {
            UserType::Doctor => self.doctor_id.or(self.user_id),
            UserType::Patient => self.user_id.or(self.doctor_id),
        };
        let Some(id) = id else {
            let detail = self
                .message
                .unwrap_or_else(|| "response carried no user id".to_string());
            return Err(ApiError::Decode(detail));
        };
        let user = match requested {
            UserType::Doctor => UserProfile::doctor(id, first_name),
            UserType::Patient => UserProfile::patient(id, first_name),
        };
        let token = self.token.filter(|t| !t.trim().is_empty());
        Ok(Account { user, token })
    }
}

// =========================================================
// Inference
// =========================================================

/// Staged detection: multipart `image, userId, bodyPart`
#[derive(Debug, Clone)]
pub struct DetectRequest {
    pub condition: ConditionKind,
    pub user_id: EntityId,
    pub body_part: Option<BodyPart>,
}

impl ApiRequest for DetectRequest {
    type Response = InferenceResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const BODY: BodyKind = BodyKind::Multipart;

    fn path(&self) -> String {
        format!("/api/detect/{}", self.condition.slug())
    }

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("userId", self.user_id.to_string())];
        if let Some(part) = self.body_part {
            fields.push(("bodyPart", part.as_str().to_string()));
        }
        fields
    }
}

/// Staged severity assessment: multipart `image, resultId`
#[derive(Debug, Clone)]
pub struct AssessSeverityRequest {
    pub condition: ConditionKind,
    pub result_id: EntityId,
}

impl ApiRequest for AssessSeverityRequest {
    type Response = InferenceResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const BODY: BodyKind = BodyKind::Multipart;

    fn path(&self) -> String {
        format!("/api/assess/{}_severity", self.condition.slug())
    }

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![("resultId", self.result_id.to_string())]
    }
}

/// Legacy single-shot prediction: multipart `image`
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub condition: ConditionKind,
}

impl ApiRequest for PredictRequest {
    type Response = InferenceResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const BODY: BodyKind = BodyKind::Multipart;

    fn path(&self) -> String {
        match self.condition {
            ConditionKind::Acne => "/api/predict_acne".to_string(),
            other => format!("/api/predict/{}/detect", other.slug()),
        }
    }
}

/// `severity` arrives either as `{level, confidence}` or as a bare label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSeverity {
    Detailed {
        level: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
    Label(String),
}

impl RawSeverity {
    fn level(&self) -> SeverityLevel {
        match self {
            RawSeverity::Detailed { level, .. } | RawSeverity::Label(level) => {
                SeverityLevel::parse(level)
            }
        }
    }

    fn confidence(&self) -> Option<f64> {
        match self {
            RawSeverity::Detailed { confidence, .. } => *confidence,
            RawSeverity::Label(_) => None,
        }
    }
}

/// `predicted_class` is `"2"` on some deployments and `2` on others.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawClass {
    Number(i64),
    Text(String),
}

impl RawClass {
    fn index(&self) -> Option<i64> {
        match self {
            RawClass::Number(n) => Some(*n),
            RawClass::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Every inference endpoint's response, discriminated by which fields are present.
///
/// Variant order matters for `untagged`: the richest shape is tried first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    /// Detection and severity in one body.
    Combined {
        #[serde(rename = "resultId", default)]
        result_id: Option<EntityId>,
        detected: bool,
        confidence: f64,
        severity: RawSeverity,
        #[serde(default)]
        severity_scores: Option<BTreeMap<String, f64>>,
    },
    /// `/api/detect/<condition>`
    Detection {
        #[serde(rename = "resultId", default)]
        result_id: Option<EntityId>,
        detected: bool,
        confidence: f64,
    },
    /// `/api/predict/<condition>/detect` (class index)
    LegacyClass {
        predicted_class: RawClass,
        #[serde(default)]
        prediction: Option<String>,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        severity: Option<RawSeverity>,
    },
    /// `/api/predict_acne` (class label)
    LegacyLabel {
        prediction: String,
        #[serde(default)]
        confidence: Option<f64>,
        #[serde(default)]
        severity: Option<RawSeverity>,
    },
    /// `/api/assess/<condition>_severity`
    Severity {
        #[serde(rename = "resultId", default)]
        result_id: Option<EntityId>,
        severity: RawSeverity,
        #[serde(default)]
        severity_scores: Option<BTreeMap<String, f64>>,
    },
}

impl InferenceResponse {
    /// Collapse any wire shape into the one internal representation.
    pub fn normalize(self) -> Result<Inference, ApiError> {
        match self {
            InferenceResponse::Combined {
                result_id,
                detected,
                confidence,
                severity,
                severity_scores,
            } => Ok(Inference {
                detection: Some(detection(result_id, detected, confidence)),
                severity: Some(severity_result(&severity, severity_scores)),
            }),
            InferenceResponse::Detection {
                result_id,
                detected,
                confidence,
            } => Ok(Inference {
                detection: Some(detection(result_id, detected, confidence)),
                severity: None,
            }),
            InferenceResponse::Severity {
                severity,
                severity_scores,
                ..
            } => Ok(Inference {
                detection: None,
                severity: Some(severity_result(&severity, severity_scores)),
            }),
            InferenceResponse::LegacyClass {
                predicted_class,
                prediction,
                confidence,
                severity,
            } => legacy(prediction.as_deref(), Some(&predicted_class), confidence, severity),
            InferenceResponse::LegacyLabel {
                prediction,
                confidence,
                severity,
            } => legacy(Some(&prediction), None, confidence, severity),
        }
    }
}

fn legacy(
    prediction: Option<&str>,
    class: Option<&RawClass>,
    confidence: Option<f64>,
    severity: Option<RawSeverity>,
) -> Result<Inference, ApiError> {
    let detected = legacy_detected(prediction, class).ok_or_else(|| {
        ApiError::Rejected(
            "Unable to determine the condition. Please try again with a clearer image.".to_string(),
        )
    })?;
    Ok(Inference {
        detection: Some(detection(None, detected, confidence.unwrap_or_default())),
        // 未检出时忽略旧接口附带的严重程度
        severity: severity.filter(|_| detected).map(|s| severity_result(&s, None)),
    })
}

fn detection(result_id: Option<EntityId>, detected: bool, confidence: f64) -> DetectionResult {
    DetectionResult {
        result_id,
        is_detected: detected,
        confidence: clamp_percent(confidence),
    }
}

pub(crate) fn severity_result(
    raw: &RawSeverity,
    scores: Option<BTreeMap<String, f64>>,
) -> SeverityResult {
    let level = raw.level();
    let mut scores: Vec<(SeverityLevel, f64)> = scores
        .unwrap_or_default()
        .into_iter()
        .map(|(label, score)| (SeverityLevel::parse(&label), clamp_percent(score)))
        .collect();
    sort_by_rank(&mut scores);
    // 缺少置信度时取该等级在分布中的得分
    let confidence = raw
        .confidence()
        .or_else(|| scores.iter().find(|(l, _)| *l == level).map(|(_, s)| *s))
        .map(clamp_percent)
        .unwrap_or_default();
    SeverityResult {
        level,
        confidence,
        scores,
    }
}

/// Class `2` means found, class `0` / a "No …" label means nothing was found.
/// Any other class index is undecidable.
fn legacy_detected(prediction: Option<&str>, class: Option<&RawClass>) -> Option<bool> {
    if let Some(index) = class.and_then(RawClass::index) {
        return match index {
            0 => Some(false),
            2 => Some(true),
            _ => None,
        };
    }
    let label = prediction?.trim();
    if label.is_empty() {
        return None;
    }
    let lower = label.to_ascii_lowercase();
    Some(!(lower.starts_with("no ") || lower == "clear" || lower == "normal" || lower == "healthy"))
}

// =========================================================
// Doctor views
// =========================================================

/// List patients visible to the signed-in doctor
#[derive(Debug, Clone)]
pub struct ListPatientsRequest;

impl ApiRequest for ListPatientsRequest {
    type Response = Vec<Patient>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const BODY: BodyKind = BodyKind::Empty;

    fn path(&self) -> String {
        "/api/doctor/patients".to_string()
    }
}

/// One patient's profile and test history
#[derive(Debug, Clone)]
pub struct PatientHistoryRequest {
    pub patient_id: EntityId,
}

impl ApiRequest for PatientHistoryRequest {
    type Response = PatientHistory;
    const METHOD: HttpMethod = HttpMethod::Get;
    const BODY: BodyKind = BodyKind::Empty;

    fn path(&self) -> String {
        format!("/api/patient-results/{}", self.patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Inference {
        serde_json::from_value::<InferenceResponse>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_paths() {
        let detect = DetectRequest {
            condition: ConditionKind::Acne,
            user_id: EntityId::from(7),
            body_part: Some(BodyPart::Face),
        };
        assert_eq!(detect.path(), "/api/detect/acne");
        assert_eq!(
            detect.form_fields(),
            vec![("userId", "7".to_string()), ("bodyPart", "Face".to_string())]
        );

        let assess = AssessSeverityRequest {
            condition: ConditionKind::Acne,
            result_id: EntityId::from(11),
        };
        assert_eq!(assess.path(), "/api/assess/acne_severity");
        assert_eq!(assess.form_fields(), vec![("resultId", "11".to_string())]);

        assert_eq!(
            PredictRequest { condition: ConditionKind::Eczema }.path(),
            "/api/predict/eczema/detect"
        );
        assert_eq!(PredictRequest { condition: ConditionKind::Acne }.path(), "/api/predict_acne");
        assert_eq!(
            PatientHistoryRequest { patient_id: EntityId::from(42) }.path(),
            "/api/patient-results/42"
        );
    }

    #[test]
    fn test_sign_in_body_and_path() {
        let req = SignInRequest {
            email: "a@b.com".to_string(),
            password: "x".to_string(),
            user_type: UserType::Doctor,
        };
        assert_eq!(req.path(), "/api/doctor/signin");
        let body: serde_json::Value = serde_json::from_str(&encode_body(&req).unwrap()).unwrap();
        assert_eq!(body, json!({"email": "a@b.com", "password": "x", "userType": "doctor"}));
    }

    #[test]
    fn test_account_patient() {
        let res: AccountResponse =
            serde_json::from_value(json!({"userId": 5, "firstName": "Ana"})).unwrap();
        let account = res.into_account(UserType::Patient).unwrap();
        assert_eq!(account.user, UserProfile::patient(5, "Ana"));
        assert!(account.token.is_none());
    }

    #[test]
    fn test_account_doctor_with_token() {
        let res: AccountResponse = serde_json::from_value(
            json!({"doctorId": "d-1", "firstName": "Greg", "token": "abc"}),
        )
        .unwrap();
        let account = res.into_account(UserType::Doctor).unwrap();
        assert_eq!(account.user.user_type, UserType::Doctor);
        assert_eq!(account.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_account_role_follows_sign_in_form() {
        let res: AccountResponse =
            serde_json::from_value(json!({"userId": 11, "firstName": "Greg"})).unwrap();
        let account = res.into_account(UserType::Doctor).unwrap();
        assert_eq!(account.user, UserProfile::doctor(11, "Greg"));

        let res: AccountResponse =
            serde_json::from_value(json!({"userId": 4, "doctorId": 8, "firstName": "Ana"})).unwrap();
        let account = res.into_account(UserType::Patient).unwrap();
        assert_eq!(account.user, UserProfile::patient(4, "Ana"));
    }

    #[test]
    fn test_account_error_body() {
        let res: AccountResponse =
            serde_json::from_value(json!({"error": "Invalid credentials"})).unwrap();
        assert_eq!(
            res.into_account(UserType::Patient),
            Err(ApiError::Rejected("Invalid credentials".to_string()))
        );
    }

    #[test]
    fn test_account_without_ids_is_decode_error() {
        let res: AccountResponse = serde_json::from_value(json!({"firstName": "Ana"})).unwrap();
        assert!(matches!(res.into_account(UserType::Patient), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_detection_only() {
        let inference = decode(json!({"resultId": 3, "detected": false, "confidence": 92}));
        let detection = inference.detection.unwrap();
        assert!(!detection.is_detected);
        assert_eq!(detection.confidence, 92.0);
        assert_eq!(detection.result_id, Some(EntityId::from(3)));
        assert!(inference.severity.is_none());
    }

    #[test]
    fn test_severity_only() {
        let inference = decode(json!({
            "resultId": 3,
            "severity": {"level": "Moderate", "confidence": 71.5},
            "severity_scores": {"Severe": 8.0, "Clear": 1.5, "Moderate": 71.5, "Mild": 19.0}
        }));
        assert!(inference.detection.is_none());
        let severity = inference.severity.unwrap();
        assert_eq!(severity.level, SeverityLevel::Moderate);
        assert_eq!(severity.confidence, 71.5);
        let order: Vec<&str> = severity.scores.iter().map(|(l, _)| l.label()).collect();
        assert_eq!(order, vec!["Clear", "Mild", "Moderate", "Severe"]);
    }

    #[test]
    fn test_combined() {
        let inference = decode(json!({
            "resultId": 9,
            "detected": true,
            "confidence": 88,
            "severity": "Severe"
        }));
        assert!(inference.detection.unwrap().is_detected);
        let severity = inference.severity.unwrap();
        assert_eq!(severity.level, SeverityLevel::Severe);
        assert_eq!(severity.confidence, 0.0);
    }

    #[test]
    fn test_legacy_class_string() {
        let inference = decode(json!({"predicted_class": "0", "confidence": 97}));
        assert!(!inference.detection.unwrap().is_detected);

        let inference = decode(json!({"predicted_class": 2, "confidence": 64.2}));
        assert!(inference.detection.unwrap().is_detected);
    }

    #[test]
    fn test_legacy_prediction_label_with_severity() {
        let inference = decode(json!({
            "prediction": "Acne",
            "confidence": 81,
            "severity": "Mild"
        }));
        assert!(inference.detection.unwrap().is_detected);
        assert_eq!(inference.severity.unwrap().level, SeverityLevel::Mild);

        let inference = decode(json!({"prediction": "No Acne", "confidence": 90, "severity": "Mild"}));
        assert!(!inference.detection.unwrap().is_detected);
        assert!(inference.severity.is_none());
    }

    #[test]
    fn test_legacy_other_class_is_rejected() {
        let raw: InferenceResponse =
            serde_json::from_value(json!({"predicted_class": "1", "confidence": 70})).unwrap();
        assert!(matches!(raw.normalize(), Err(ApiError::Rejected(_))));

        let raw: InferenceResponse =
            serde_json::from_value(json!({"predicted_class": 3, "prediction": "Acne"})).unwrap();
        assert!(matches!(raw.normalize(), Err(ApiError::Rejected(_))));
    }

    #[test]
    fn test_legacy_unknown_class_is_rejected() {
        let raw: InferenceResponse =
            serde_json::from_value(json!({"predicted_class": "unknown"})).unwrap();
        assert!(matches!(raw.normalize(), Err(ApiError::Rejected(_))));
    }

    #[test]
    fn test_confidence_clamped() {
        let inference = decode(json!({"detected": true, "confidence": 140}));
        assert_eq!(inference.detection.unwrap().confidence, 100.0);
    }

    #[test]
    fn test_decode_response_error() {
        let result = decode_response::<ListPatientsRequest>("{\"oops\": true}");
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
