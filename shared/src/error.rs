//! 错误类型
//!
//! 每个错误都能直接展示给用户（Display 即提示文案），作用域限于触发它的页面。

use serde::Deserialize;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const INVALID_FILE_MESSAGE: &str =
    "Invalid file. Please upload a .jpg or .png file under 25 MB.";

// =========================================================
// API 错误
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 请求未能到达服务器（fetch 抛出异常、被中止等）
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(String),

    /// 非 2xx 响应；`message` 为服务端提供的错误信息
    #[error("{}", status_text(.status, .message))]
    Server { status: u16, message: Option<String> },

    /// 2xx 响应但业务上被拒绝（如 `{"error": "Invalid credentials"}`）
    #[error("{0}")]
    Rejected(String),

    /// 响应体无法解析为预期结构
    #[error("Unexpected response from the server.")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    /// 从非 2xx 响应构造错误，优先使用服务端提供的错误信息
    pub fn from_status(status: u16, body: &str) -> Self {
        ApiError::Server {
            status,
            message: server_message(body),
        }
    }

    /// 服务端提供的信息（如果有），否则使用调用方给出的通用提示
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401 | 403, .. })
    }
}

fn status_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status {}", status),
    }
}

/// 从错误响应体中提取 `error` / `message` / `detail`
pub fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    [parsed.error, parsed.message, parsed.detail]
        .into_iter()
        .flatten()
        .map(|m| m.trim().to_string())
        .find(|m| !m.is_empty())
}

// =========================================================
// 上传流程错误
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// 文件类型或大小不符合要求（文件选择和拖拽共用同一文案）
    #[error("{}", INVALID_FILE_MESSAGE)]
    InvalidFile,

    #[error("No file selected.")]
    NoFileSelected,

    #[error("Please upload an image and ensure you are logged in.")]
    MissingImageOrUser,

    #[error("Please select a body part.")]
    MissingBodyPart,

    #[error("Missing required information for severity assessment.")]
    SeverityUnavailable,

    #[error("Please wait for the current analysis to finish.")]
    Busy,
}

// =========================================================
// 会话错误
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 标记为已认证时必须同时提供 token 和用户资料
    #[error("Sign-in requires both a session token and a user profile")]
    IncompleteCredentials,

    #[error("Failed to write session to storage: {0}")]
    Storage(String),

    #[error("Failed to encode user profile: {0}")]
    Encode(String),
}
