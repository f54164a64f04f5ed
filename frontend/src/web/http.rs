//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 提供简洁的 HTTP 客户端接口，支持 JSON 文本体、
//! `multipart/form-data` 表单体以及 `AbortSignal` 取消。

use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, File, FormData, Headers, Request, RequestInit, Response};

/// HTTP 请求方法
#[derive(Debug, Clone, Copy)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl From<dermascope_shared::protocol::HttpMethod> for HttpMethod {
    fn from(method: dermascope_shared::protocol::HttpMethod) -> Self {
        match method {
            dermascope_shared::protocol::HttpMethod::Get => HttpMethod::Get,
            dermascope_shared::protocol::HttpMethod::Post => HttpMethod::Post,
        }
    }
}

/// HTTP 错误类型
#[derive(Debug, Error)]
pub enum HttpError {
    /// 请求构建失败
    #[error("请求构建失败: {0}")]
    RequestBuildFailed(String),
    /// 网络请求失败（包括被中止）
    #[error("网络错误: {0}")]
    NetworkError(String),
    /// 响应解析失败
    #[error("响应解析失败: {0}")]
    ResponseParseFailed(String),
}

/// HTTP 响应封装
pub struct HttpResponse {
    inner: Response,
}

impl HttpResponse {
    /// 获取 HTTP 状态码
    pub fn status(&self) -> u16 {
        self.inner.status()
    }

    /// 检查响应是否成功 (2xx)
    pub fn ok(&self) -> bool {
        self.inner.ok()
    }

    /// 获取响应体文本
    pub async fn text(self) -> Result<String, HttpError> {
        let promise = self
            .inner
            .text()
            .map_err(|e| HttpError::ResponseParseFailed(format!("{:?}", e)))?;

        let text = JsFuture::from(promise)
            .await
            .map_err(|e| HttpError::ResponseParseFailed(format!("{:?}", e)))?;

        text.as_string()
            .ok_or_else(|| HttpError::ResponseParseFailed("无法转换为字符串".to_string()))
    }
}

/// 请求体
enum RequestBody {
    Text(String),
    /// 图片文件 + 文本字段
    Multipart {
        file_field: &'static str,
        file: File,
        fields: Vec<(&'static str, String)>,
    },
}

/// HTTP 请求构建器
pub struct HttpRequestBuilder {
    url: String,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    signal: Option<AbortSignal>,
}

impl HttpRequestBuilder {
    fn new(url: String, method: HttpMethod) -> Self {
        Self {
            url,
            method,
            headers: Vec::new(),
            body: None,
            signal: None,
        }
    }

    /// 添加请求头
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// 设置文本请求体
    pub fn body(mut self, body: String) -> Self {
        self.body = Some(RequestBody::Text(body));
        self
    }

    /// 设置 multipart 请求体
    ///
    /// 不设置 Content-Type，由浏览器补充 boundary。
    pub fn multipart(
        mut self,
        file_field: &'static str,
        file: File,
        fields: Vec<(&'static str, String)>,
    ) -> Self {
        self.body = Some(RequestBody::Multipart {
            file_field,
            file,
            fields,
        });
        self
    }

    /// 绑定取消信号
    pub fn abort_signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }

    /// 发送请求
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        let headers = Headers::new()
            .map_err(|e| HttpError::RequestBuildFailed(format!("创建 Headers 失败: {:?}", e)))?;

        for (key, value) in &self.headers {
            headers
                .set(key, value)
                .map_err(|e| HttpError::RequestBuildFailed(format!("设置 Header 失败: {:?}", e)))?;
        }

        let opts = RequestInit::new();
        opts.set_method(self.method.as_str());
        opts.set_headers(&headers.into());
        if let Some(signal) = &self.signal {
            opts.set_signal(Some(signal));
        }

        match &self.body {
            Some(RequestBody::Text(body)) => opts.set_body(&JsValue::from_str(body)),
            Some(RequestBody::Multipart {
                file_field,
                file,
                fields,
            }) => {
                let form = build_form(file_field, file, fields)?;
                opts.set_body(&form.into());
            }
            None => {}
        }

        let request = Request::new_with_str_and_init(&self.url, &opts)
            .map_err(|e| HttpError::RequestBuildFailed(format!("{:?}", e)))?;

        let window = web_sys::window()
            .ok_or_else(|| HttpError::NetworkError("无法获取 window 对象".to_string()))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| HttpError::NetworkError(format!("{:?}", e)))?;

        let response: Response = resp_value.dyn_into().map_err(|e| {
            HttpError::ResponseParseFailed(format!("Response 类型转换失败: {:?}", e))
        })?;

        Ok(HttpResponse { inner: response })
    }
}

fn build_form(
    file_field: &str,
    file: &File,
    fields: &[(&'static str, String)],
) -> Result<FormData, HttpError> {
    let form = FormData::new()
        .map_err(|e| HttpError::RequestBuildFailed(format!("创建 FormData 失败: {:?}", e)))?;
    form.append_with_blob_and_filename(file_field, file, &file.name())
        .map_err(|e| HttpError::RequestBuildFailed(format!("添加文件失败: {:?}", e)))?;
    for (key, value) in fields {
        form.append_with_str(key, value)
            .map_err(|e| HttpError::RequestBuildFailed(format!("添加字段失败: {:?}", e)))?;
    }
    Ok(form)
}

/// 轻量级 HTTP 客户端
pub struct HttpClient;

impl HttpClient {
    /// 创建指定方法的请求
    pub fn request(method: impl Into<HttpMethod>, url: &str) -> HttpRequestBuilder {
        HttpRequestBuilder::new(url.to_string(), method.into())
    }
}
