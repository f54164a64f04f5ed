use super::*;
use crate::severity::SeverityLevel;
use crate::{EntityId, SeverityResult, UserProfile};

// =========================================================
// 辅助函数
// =========================================================

fn png(size: u64) -> ImageMeta {
    ImageMeta {
        name: "skin.png".to_string(),
        mime_type: "image/png".to_string(),
        size,
    }
}

fn patient() -> UserProfile {
    UserProfile::patient(7, "Ana")
}

fn detected(result_id: i64, is_detected: bool, confidence: f64) -> Inference {
    Inference {
        detection: Some(DetectionResult {
            result_id: Some(EntityId::from(result_id)),
            is_detected,
            confidence,
        }),
        severity: None,
    }
}

fn severity(level: SeverityLevel) -> Inference {
    Inference {
        detection: None,
        severity: Some(SeverityResult {
            level: level.clone(),
            confidence: 80.0,
            scores: vec![(level, 80.0)],
        }),
    }
}

/// 已选择图片和身体部位的痤疮流程
fn ready_flow() -> UploadFlow<u32> {
    let mut flow = UploadFlow::new(ConditionKind::Acne);
    flow.select_image(png(1024), 1, SelectionSource::Picker).unwrap();
    flow.set_body_part(Some(BodyPart::Face));
    flow
}

fn detected_flow() -> UploadFlow<u32> {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();
    assert!(flow.complete(submission.ticket, Ok(detected(11, true, 88.0))));
    flow
}

// =========================================================
// 文件校验测试
// =========================================================

#[test]
fn test_validate_image_rules() {
    assert!(validate_image(&png(MAX_IMAGE_BYTES)).is_ok());
    assert_eq!(validate_image(&png(MAX_IMAGE_BYTES + 1)), Err(UploadError::InvalidFile));

    let gif = ImageMeta {
        mime_type: "image/gif".to_string(),
        ..png(10)
    };
    assert_eq!(validate_image(&gif), Err(UploadError::InvalidFile));

    let jpeg = ImageMeta {
        mime_type: "image/jpeg".to_string(),
        ..png(10)
    };
    assert!(validate_image(&jpeg).is_ok());
}

#[test]
fn test_oversized_png_rejected_on_both_paths() {
    let thirty_mb = 30 * 1024 * 1024;
    let mut picked = UploadFlow::new(ConditionKind::Acne);
    let mut dropped = UploadFlow::new(ConditionKind::Acne);

    assert_eq!(
        picked.select_image(png(thirty_mb), 1u32, SelectionSource::Picker),
        Err(UploadError::InvalidFile)
    );
    assert_eq!(
        dropped.select_image(png(thirty_mb), 1u32, SelectionSource::Drop),
        Err(UploadError::InvalidFile)
    );

    assert_eq!(picked.error(), dropped.error());
    assert!(picked.error().unwrap().starts_with("Invalid file"));
    assert_eq!(picked.phase(), FlowPhase::Idle);
    assert!(picked.image().is_none());
    // 没有图片就无法发出请求
    assert_eq!(
        picked.begin_detection(Some(&patient())).unwrap_err(),
        UploadError::MissingImageOrUser
    );
}

#[test]
fn test_invalid_selection_keeps_current_image() {
    let mut flow = detected_flow();
    let before = flow.prediction().clone();
    assert!(flow.select_image(png(u64::MAX), 2, SelectionSource::Drop).is_err());
    assert_eq!(flow.image().map(|i| i.handle), Some(1));
    assert_eq!(flow.prediction(), &before);
    assert_eq!(flow.phase(), FlowPhase::Detected);
}

#[test]
fn test_select_nothing_reports_error() {
    let mut flow: UploadFlow<u32> = UploadFlow::new(ConditionKind::Eczema);
    assert_eq!(flow.select_nothing(), UploadError::NoFileSelected);
    assert_eq!(flow.error(), Some("No file selected."));
}

#[test]
fn test_new_selection_clears_prediction_and_error() {
    let mut flow = detected_flow();
    flow.select_nothing();
    flow.select_image(png(10), 2, SelectionSource::Drop).unwrap();
    assert_eq!(flow.phase(), FlowPhase::ImageSelected);
    assert_eq!(flow.prediction(), &Inference::default());
    assert_eq!(flow.error(), None);
    assert_eq!(flow.image().map(|i| i.source), Some(SelectionSource::Drop));
}

// =========================================================
// 检测前置条件测试
// =========================================================

#[test]
fn test_detection_requires_user_id() {
    let mut flow = ready_flow();
    let doctor = UserProfile::doctor(3, "Lee");
    assert_eq!(flow.begin_detection(None).unwrap_err(), UploadError::MissingImageOrUser);
    assert_eq!(flow.begin_detection(Some(&doctor)).unwrap_err(), UploadError::MissingImageOrUser);
    assert_eq!(flow.error(), Some("Please upload an image and ensure you are logged in."));
    assert_eq!(flow.phase(), FlowPhase::ImageSelected);
}

#[test]
fn test_staged_detection_requires_body_part() {
    let mut flow = ready_flow();
    flow.set_body_part(None);
    assert_eq!(
        flow.begin_detection(Some(&patient())).unwrap_err(),
        UploadError::MissingBodyPart
    );
    assert_eq!(flow.error(), Some("Please select a body part."));
}

#[test]
fn test_detection_builds_staged_request() {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();
    assert_eq!(submission.ticket.stage(), Stage::Detection);
    assert_eq!(flow.phase(), FlowPhase::Detecting);
    assert!(flow.is_busy());
    match submission.call {
        FlowCall::Detect(req) => {
            assert_eq!(req.user_id, EntityId::from(7));
            assert_eq!(req.body_part, Some(BodyPart::Face));
        }
        other => panic!("unexpected call: {:?}", other),
    }
}

#[test]
fn test_single_shot_skips_body_part() {
    let mut flow: UploadFlow<u32> = UploadFlow::new(ConditionKind::Eczema);
    flow.select_image(png(10), 1, SelectionSource::Picker).unwrap();
    let submission = flow.begin_detection(Some(&patient())).unwrap();
    assert!(matches!(submission.call, FlowCall::Predict(_)));

    let mut combined = detected(5, true, 71.0);
    combined.severity = severity(SeverityLevel::Moderate).severity;
    assert!(flow.complete(submission.ticket, Ok(combined)));
    assert_eq!(flow.phase(), FlowPhase::Assessed);
    assert!(!flow.can_assess());
}

#[test]
fn test_second_request_while_busy_is_rejected() {
    let mut flow = ready_flow();
    flow.begin_detection(Some(&patient())).unwrap();
    assert_eq!(flow.begin_detection(Some(&patient())).unwrap_err(), UploadError::Busy);
    assert_eq!(flow.begin_assessment().unwrap_err(), UploadError::Busy);
}

// =========================================================
// 响应处理测试
// =========================================================

#[test]
fn test_negative_detection_disables_assessment() {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();
    let response = Inference {
        detection: Some(DetectionResult {
            result_id: None,
            is_detected: false,
            confidence: 92.0,
        }),
        severity: None,
    };
    assert!(flow.complete(submission.ticket, Ok(response)));

    assert_eq!(flow.phase(), FlowPhase::Detected);
    assert!(!flow.can_assess());
    assert_eq!(flow.begin_assessment().unwrap_err(), UploadError::SeverityUnavailable);
    assert_eq!(flow.error(), Some("Missing required information for severity assessment."));
}

#[test]
fn test_positive_detection_then_assessment() {
    let mut flow = detected_flow();
    assert!(flow.can_assess());

    let submission = flow.begin_assessment().unwrap();
    assert_eq!(flow.phase(), FlowPhase::AssessingSeverity);
    assert!(!flow.can_assess());
    match &submission.call {
        FlowCall::Assess(req) => assert_eq!(req.result_id, EntityId::from(11)),
        other => panic!("unexpected call: {:?}", other),
    }

    assert!(flow.complete(submission.ticket, Ok(severity(SeverityLevel::Severe))));
    assert_eq!(flow.phase(), FlowPhase::Assessed);
    let prediction = flow.prediction();
    assert!(prediction.detection.as_ref().unwrap().is_detected);
    assert_eq!(prediction.severity.as_ref().unwrap().level, SeverityLevel::Severe);
}

#[test]
fn test_detection_failure_rolls_back() {
    let mut flow = detected_flow();
    let before = flow.prediction().clone();

    let submission = flow.begin_detection(Some(&patient())).unwrap();
    assert_eq!(flow.prediction(), &Inference::default());
    let err = ApiError::Server {
        status: 500,
        message: None,
    };
    assert!(flow.complete(submission.ticket, Err(err)));

    assert_eq!(flow.phase(), FlowPhase::Error);
    assert_eq!(flow.error(), Some(DETECTION_FALLBACK));
    assert_eq!(flow.prediction(), &before);
    assert!(flow.image().is_some());
    assert!(!flow.is_busy());
}

#[test]
fn test_assessment_failure_uses_server_message() {
    let mut flow = detected_flow();
    let submission = flow.begin_assessment().unwrap();
    let err = ApiError::from_status(422, r#"{"error": "Image too blurry"}"#);
    assert!(flow.complete(submission.ticket, Err(err)));

    assert_eq!(flow.error(), Some("Image too blurry"));
    assert!(flow.prediction().severity.is_none());
    // 可以重试
    assert!(flow.can_assess());
}

#[test]
fn test_missing_stage_payload_is_an_error() {
    let mut flow = detected_flow();
    let submission = flow.begin_assessment().unwrap();
    assert!(flow.complete(submission.ticket, Ok(detected(11, true, 50.0))));
    assert_eq!(flow.phase(), FlowPhase::Error);
    assert_eq!(flow.error(), Some(ASSESSMENT_FALLBACK));
}

// =========================================================
// 过期响应测试
// =========================================================

#[test]
fn test_replaced_image_discards_late_response() {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();

    flow.select_image(png(10), 2, SelectionSource::Drop).unwrap();
    assert!(!flow.is_busy());
    assert!(!flow.complete(submission.ticket, Ok(detected(1, true, 99.0))));
    assert_eq!(flow.phase(), FlowPhase::ImageSelected);
    assert_eq!(flow.prediction(), &Inference::default());
}

#[test]
fn test_removed_image_discards_late_response() {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();

    let removed = flow.remove_image();
    assert_eq!(removed.map(|i| i.handle), Some(1));
    assert_eq!(flow.phase(), FlowPhase::Idle);
    assert!(!flow.complete(submission.ticket, Err(ApiError::Network("aborted".into()))));
    assert_eq!(flow.error(), None);
}

#[test]
fn test_ticket_completes_once() {
    let mut flow = ready_flow();
    let submission = flow.begin_detection(Some(&patient())).unwrap();
    assert!(flow.complete(submission.ticket, Ok(detected(1, true, 60.0))));
    assert!(!flow.complete(submission.ticket, Ok(detected(2, false, 60.0))));
    assert_eq!(flow.detection().unwrap().result_id, Some(EntityId::from(1)));
}

#[test]
fn test_cancel_restores_previous_phase() {
    let mut flow = detected_flow();
    let before = flow.prediction().clone();
    let submission = flow.begin_detection(Some(&patient())).unwrap();

    assert!(flow.cancel());
    assert_eq!(flow.phase(), FlowPhase::Detected);
    assert_eq!(flow.prediction(), &before);
    assert!(!flow.complete(submission.ticket, Ok(detected(2, false, 1.0))));
    assert!(!flow.cancel());
}

#[test]
fn test_cancelled_assessment_can_be_retried() {
    let mut flow = detected_flow();
    let submission = flow.begin_assessment().unwrap();
    assert_eq!(submission.ticket.stage(), Stage::Severity);
    assert!(flow.is_busy());

    assert!(flow.cancel());
    assert!(!flow.is_busy());
    assert!(flow.can_assess());
    assert!(!flow.complete(submission.ticket, Ok(severity(SeverityLevel::Severe))));

    let retry = flow.begin_assessment().unwrap();
    assert!(flow.complete(retry.ticket, Ok(severity(SeverityLevel::Mild))));
    assert_eq!(flow.prediction().severity.as_ref().unwrap().level, SeverityLevel::Mild);
}
