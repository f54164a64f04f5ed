//! 后端 API 网关
//!
//! 每个端点由 `dermascope_shared::protocol` 中的 `ApiRequest` 类型描述，
//! 这里只负责拼接 URL、附加认证头、发送请求并把结果转换为 `ApiError`。

use dermascope_shared::protocol::{
    Account, ApiRequest, BodyKind, SignInRequest, SignUpRequest, decode_response, encode_body,
};
use dermascope_shared::upload::FlowCall;
use dermascope_shared::{ApiError, HEADER_AUTHORIZATION, Inference};
use leptos::logging::{log, warn};
use leptos::prelude::*;
use serde::Serialize;
use web_sys::{AbortController, AbortSignal, File};

use crate::config::ApiConfig;
use crate::web::{HttpClient, HttpError, HttpRequestBuilder};

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ResponseParseFailed(detail) => ApiError::Decode(detail),
            other => ApiError::Network(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DermaScopeApi {
    base_url: String,
    /// 仅后端签发的令牌；本地会话标记不会出现在这里
    bearer: Option<String>,
    signal: Option<AbortSignal>,
}

impl DermaScopeApi {
    pub fn new(config: &ApiConfig, bearer: Option<String>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer,
            signal: None,
        }
    }

    /// 绑定页面级取消信号
    pub fn scoped(mut self, scope: &RequestScope) -> Self {
        self.signal = scope.signal();
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn builder<R: ApiRequest>(&self, request: &R) -> HttpRequestBuilder {
        let mut builder = HttpClient::request(R::METHOD, &self.url(&request.path()))
            .abort_signal(self.signal.clone());
        if let Some(token) = &self.bearer {
            builder = builder.header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
        }
        builder
    }

    /// 发送并解码响应；非 2xx 时提取服务端错误信息
    async fn dispatch<R: ApiRequest>(
        &self,
        request: &R,
        builder: HttpRequestBuilder,
    ) -> Result<R::Response, ApiError> {
        let path = request.path();
        let response = builder.send().await.map_err(|e| {
            warn!("[Api] {} failed: {}", path, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let ok = response.ok();
        let body = response.text().await?;
        if !ok {
            warn!("[Api] {} returned {}", path, status);
            return Err(ApiError::from_status(status, &body));
        }
        decode_response::<R>(&body).inspect_err(|e| warn!("[Api] {} decode error: {:?}", path, e))
    }

    /// GET 或 JSON 请求
    pub async fn call<R: ApiRequest + Serialize>(&self, request: &R) -> Result<R::Response, ApiError> {
        let builder = match R::BODY {
            BodyKind::Json => self
                .builder(request)
                .header("Content-Type", "application/json")
                .body(encode_body(request)?),
            BodyKind::Empty | BodyKind::Multipart => self.builder(request),
        };
        self.dispatch(request, builder).await
    }

    /// 仅 GET 请求（无需序列化请求体）
    pub async fn fetch<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError> {
        let builder = self.builder(request);
        self.dispatch(request, builder).await
    }

    /// multipart 上传：`image` + `form_fields()`
    pub async fn upload<R: ApiRequest>(&self, request: &R, image: &File) -> Result<R::Response, ApiError> {
        let builder = self
            .builder(request)
            .multipart("image", image.clone(), request.form_fields());
        self.dispatch(request, builder).await
    }

    // =========================================================
    // 业务调用
    // =========================================================

    pub async fn sign_in(&self, request: SignInRequest) -> Result<Account, ApiError> {
        let user_type = request.user_type;
        let account = self.call(&request).await?.into_account(user_type)?;
        log!("[Api] Signed in as {}", account.user.user_type);
        Ok(account)
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Account, ApiError> {
        let user_type = request.user_type;
        self.call(&request).await?.into_account(user_type)
    }

    /// 执行上传流程给出的调用，返回归一化的推理结果
    pub async fn infer(&self, call: &FlowCall, image: &File) -> Result<Inference, ApiError> {
        let response = match call {
            FlowCall::Detect(request) => self.upload(request, image).await?,
            FlowCall::Predict(request) => self.upload(request, image).await?,
            FlowCall::Assess(request) => self.upload(request, image).await?,
        };
        response.normalize()
    }
}

/// 页面级请求作用域
///
/// 创建时绑定当前 Owner，组件卸载时中止所有仍在途的请求。
#[derive(Clone, Copy)]
pub struct RequestScope {
    controller: StoredValue<Option<AbortController>, LocalStorage>,
}

impl RequestScope {
    pub fn new() -> Self {
        let controller = StoredValue::new_local(AbortController::new().ok());
        on_cleanup(move || {
            controller.try_with_value(|c| {
                if let Some(c) = c {
                    c.abort();
                }
            });
        });
        Self { controller }
    }

    fn signal(&self) -> Option<AbortSignal> {
        self.controller
            .try_with_value(|c| c.as_ref().map(AbortController::signal))
            .flatten()
    }
}
