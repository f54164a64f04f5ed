//! 上传与推理流程
//!
//! 每个检测页面持有一个 `UploadFlow`，管理单张图片从选择到结果的完整生命周期：
//!
//! ```text
//! Idle -> ImageSelected -> Detecting -> Detected -> AssessingSeverity -> Assessed
//!                              \                          \
//!                               +-------> Error <----------+
//! ```
//!
//! 同一时间最多一个请求在途。替换或移除图片会开启新的一代（generation），
//! 旧一代的响应在 `complete` 时被丢弃。

use crate::error::{ApiError, UploadError};
use crate::protocol::{AssessSeverityRequest, DetectRequest, PredictRequest};
use crate::{BodyPart, ConditionKind, DetectionResult, Inference, Pipeline, UserProfile};

/// 允许的最大图片大小（25 MB）
pub const MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// 允许的 MIME 类型
pub const ACCEPTED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

pub const DETECTION_FALLBACK: &str = "Error during detection.";
pub const ASSESSMENT_FALLBACK: &str = "Error during severity assessment.";

/// 待上传文件的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// 图片来源：文件选择器或拖拽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Picker,
    Drop,
}

/// 校验 MIME 类型与大小；两种来源共用同一规则与文案
pub fn validate_image(meta: &ImageMeta) -> Result<(), UploadError> {
    let accepted = ACCEPTED_TYPES.contains(&meta.mime_type.as_str());
    if accepted && meta.size <= MAX_IMAGE_BYTES {
        Ok(())
    } else {
        Err(UploadError::InvalidFile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    ImageSelected,
    Detecting,
    Detected,
    AssessingSeverity,
    Assessed,
    Error,
}

impl FlowPhase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Detecting | Self::AssessingSeverity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detection,
    Severity,
}

impl Stage {
    fn fallback(&self) -> &'static str {
        match self {
            Stage::Detection => DETECTION_FALLBACK,
            Stage::Severity => ASSESSMENT_FALLBACK,
        }
    }
}

/// 请求凭据，响应返回时用于判断是否仍然有效
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    sequence: u64,
    stage: Stage,
}

impl Ticket {
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// 本次需要发出的后端调用
#[derive(Debug, Clone)]
pub enum FlowCall {
    Detect(DetectRequest),
    Predict(PredictRequest),
    Assess(AssessSeverityRequest),
}

/// `begin_*` 的返回值：凭据 + 待发送的请求
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub call: FlowCall,
}

#[derive(Debug, Clone)]
pub struct SelectedImage<I> {
    pub meta: ImageMeta,
    pub handle: I,
    pub source: SelectionSource,
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    snapshot: Inference,
    resume: FlowPhase,
}

/// 单张图片的上传/推理状态机
///
/// `I` 为平台相关的文件句柄（浏览器中为 `web_sys::File`），状态机本身不读取它。
#[derive(Debug, Clone)]
pub struct UploadFlow<I> {
    condition: ConditionKind,
    image: Option<SelectedImage<I>>,
    body_part: Option<BodyPart>,
    prediction: Inference,
    phase: FlowPhase,
    error: Option<String>,
    generation: u64,
    sequence: u64,
    in_flight: Option<InFlight>,
}

impl<I> UploadFlow<I> {
    pub fn new(condition: ConditionKind) -> Self {
        Self {
            condition,
            image: None,
            body_part: None,
            prediction: Inference::default(),
            phase: FlowPhase::Idle,
            error: None,
            generation: 0,
            sequence: 0,
            in_flight: None,
        }
    }

    // =========================================================
    // 访问器
    // =========================================================

    pub fn condition(&self) -> ConditionKind {
        self.condition
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn image(&self) -> Option<&SelectedImage<I>> {
        self.image.as_ref()
    }

    pub fn body_part(&self) -> Option<BodyPart> {
        self.body_part
    }

    pub fn prediction(&self) -> &Inference {
        &self.prediction
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.prediction.detection.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 仅当图片存在、无在途请求、且检测结果为阳性并带有 resultId 时可评估严重程度
    pub fn can_assess(&self) -> bool {
        self.condition.pipeline() == Pipeline::Staged
            && self.image.is_some()
            && !self.is_busy()
            && self
                .detection()
                .is_some_and(|d| d.is_detected && d.result_id.is_some())
    }

    // =========================================================
    // 图片选择
    // =========================================================

    /// 选择新图片
    ///
    /// 校验失败时保持当前状态，只设置错误信息；成功时清空之前的预测与错误，
    /// 并开启新的一代。
    pub fn select_image(
        &mut self,
        meta: ImageMeta,
        handle: I,
        source: SelectionSource,
    ) -> Result<(), UploadError> {
        if let Err(err) = validate_image(&meta) {
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.start_generation();
        self.image = Some(SelectedImage {
            meta,
            handle,
            source,
        });
        self.phase = FlowPhase::ImageSelected;
        Ok(())
    }

    /// 文件选择器触发但没有选中文件
    pub fn select_nothing(&mut self) -> UploadError {
        let err = UploadError::NoFileSelected;
        self.error = Some(err.to_string());
        err
    }

    /// 移除图片，回到 Idle 并丢弃预测结果
    pub fn remove_image(&mut self) -> Option<SelectedImage<I>> {
        self.start_generation();
        self.phase = FlowPhase::Idle;
        self.image.take()
    }

    pub fn set_body_part(&mut self, part: Option<BodyPart>) {
        self.body_part = part;
    }

    fn start_generation(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.prediction = Inference::default();
        self.error = None;
    }

    // =========================================================
    // 请求
    // =========================================================

    /// 开始检测
    ///
    /// 需要图片、已登录患者的 userId，以及（分阶段流水线下）身体部位。
    pub fn begin_detection(&mut self, user: Option<&UserProfile>) -> Result<Submission, UploadError> {
        if self.is_busy() {
            return Err(UploadError::Busy);
        }
        let user_id = user
            .and_then(|u| u.user_id.clone())
            .filter(|_| self.image.is_some());
        let Some(user_id) = user_id else {
            return self.reject(UploadError::MissingImageOrUser);
        };

        let call = match self.condition.pipeline() {
            Pipeline::Staged => {
                let Some(part) = self.body_part else {
                    return self.reject(UploadError::MissingBodyPart);
                };
                FlowCall::Detect(DetectRequest {
                    condition: self.condition,
                    user_id,
                    body_part: Some(part),
                })
            }
            Pipeline::SingleShot => FlowCall::Predict(PredictRequest {
                condition: self.condition,
            }),
        };

        // 新的检测结果替换整个预测，先清空并保留快照用于失败回滚
        let snapshot = std::mem::take(&mut self.prediction);
        let ticket = self.dispatch(Stage::Detection, snapshot, FlowPhase::Detecting);
        Ok(Submission { ticket, call })
    }

    /// 开始严重程度评估，前提见 `can_assess`
    pub fn begin_assessment(&mut self) -> Result<Submission, UploadError> {
        if self.is_busy() {
            return Err(UploadError::Busy);
        }
        let result_id = self
            .detection()
            .filter(|d| d.is_detected)
            .and_then(|d| d.result_id.clone());
        let (true, Some(result_id)) = (self.can_assess(), result_id) else {
            return self.reject(UploadError::SeverityUnavailable);
        };

        let call = FlowCall::Assess(AssessSeverityRequest {
            condition: self.condition,
            result_id,
        });
        let snapshot = self.prediction.clone();
        let ticket = self.dispatch(Stage::Severity, snapshot, FlowPhase::AssessingSeverity);
        Ok(Submission { ticket, call })
    }

    fn dispatch(&mut self, stage: Stage, snapshot: Inference, phase: FlowPhase) -> Ticket {
        self.sequence += 1;
        let ticket = Ticket {
            generation: self.generation,
            sequence: self.sequence,
            stage,
        };
        self.in_flight = Some(InFlight {
            ticket,
            snapshot,
            resume: self.phase,
        });
        self.error = None;
        self.phase = phase;
        ticket
    }

    fn reject<T>(&mut self, err: UploadError) -> Result<T, UploadError> {
        self.error = Some(err.to_string());
        Err(err)
    }

    /// 应用响应
    ///
    /// 过期凭据返回 false 且不改变任何状态。失败时进入 Error，保留图片，
    /// 预测回滚到请求前的快照。
    pub fn complete(&mut self, ticket: Ticket, result: Result<Inference, ApiError>) -> bool {
        let current = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.ticket == ticket && ticket.generation == self.generation);
        if !current {
            return false;
        }
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };

        let applied = result.and_then(|inference| self.merge(ticket.stage, inference));
        match applied {
            Ok(phase) => {
                self.phase = phase;
                self.error = None;
            }
            Err(err) => {
                self.prediction = in_flight.snapshot;
                self.phase = FlowPhase::Error;
                self.error = Some(err.user_message(ticket.stage.fallback()));
            }
        }
        true
    }

    /// 放弃在途请求（页面卸载或请求被中止），恢复到请求前的状态
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                self.prediction = in_flight.snapshot;
                self.phase = in_flight.resume;
                true
            }
            None => false,
        }
    }

    fn merge(&mut self, stage: Stage, inference: Inference) -> Result<FlowPhase, ApiError> {
        match stage {
            Stage::Detection => {
                let Some(detection) = inference.detection else {
                    return Err(ApiError::Decode("detection result missing".to_string()));
                };
                let assessed = inference.severity.is_some();
                self.prediction = Inference {
                    detection: Some(detection),
                    severity: inference.severity,
                };
                Ok(if assessed {
                    FlowPhase::Assessed
                } else {
                    FlowPhase::Detected
                })
            }
            Stage::Severity => {
                let Some(severity) = inference.severity else {
                    return Err(ApiError::Decode("severity result missing".to_string()));
                };
                self.prediction.severity = Some(severity);
                Ok(FlowPhase::Assessed)
            }
        }
    }
}

#[cfg(test)]
mod tests;
