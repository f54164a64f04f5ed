//! 运行时配置
//!
//! API 地址优先级：LocalStorage `api_base_url` > 编译期 `DERMASCOPE_API_URL` > 默认值。

use dermascope_shared::{DEFAULT_API_BASE, STORAGE_API_BASE_KEY};

use crate::web::LocalStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn resolve() -> Self {
        let stored = LocalStorage::get(STORAGE_API_BASE_KEY);
        Self::from_sources(stored.as_deref(), option_env!("DERMASCOPE_API_URL"))
    }

    fn from_sources(stored: Option<&str>, compiled: Option<&str>) -> Self {
        let base_url = [stored, compiled]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();
        Self { base_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(
            ApiConfig::from_sources(Some("https://qa.example/"), Some("https://prod.example")).base_url,
            "https://qa.example"
        );
        assert_eq!(
            ApiConfig::from_sources(Some("  "), Some("https://prod.example")).base_url,
            "https://prod.example"
        );
        assert_eq!(ApiConfig::from_sources(None, None).base_url, "http://localhost:5000");
    }
}
