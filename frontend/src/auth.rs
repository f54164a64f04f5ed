//! 认证模块
//!
//! 管理会话状态，与路由系统解耦。
//! 路由服务通过注入的角色信号来检查认证状态；视图只通过 `AuthContext`
//! 读写会话，不直接访问 LocalStorage。

use dermascope_shared::protocol::Account;
use dermascope_shared::{
    ApiError, Session, SessionError, SessionStore, SessionToken, UserProfile, UserType,
};
use leptos::logging::{error, log, warn};
use leptos::prelude::*;

use crate::api::DermaScopeApi;
use crate::config::ApiConfig;
use crate::web::LocalStorage;

/// 认证上下文
///
/// 包含会话信号与会话存储，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    /// 会话状态（只读）
    pub session: ReadSignal<Session>,
    /// 会话存储：唯一的修改入口
    store: StoredValue<SessionStore<LocalStorage>>,
    /// API 配置（启动时解析一次）
    config: StoredValue<ApiConfig>,
}

impl AuthContext {
    /// 创建新的认证上下文
    ///
    /// 从 LocalStorage 恢复会话，并订阅会话变化以驱动信号更新。
    pub fn new() -> Self {
        let mut store = SessionStore::rehydrate(LocalStorage);
        let (session, set_session) = signal(store.session().clone());
        store.subscribe(move |s| set_session.set(s.clone()));

        if session.get_untracked().is_authenticated() {
            log!("[Auth] Session restored from storage");
        }

        Self {
            session,
            store: StoredValue::new(store),
            config: StoredValue::new(ApiConfig::resolve()),
        }
    }

    /// 当前用户角色信号（用于路由服务注入）
    pub fn viewer_signal(&self) -> Signal<Option<UserType>> {
        let session = self.session;
        Signal::derive(move || session.with(Session::user_type))
    }

    /// 当前用户资料（响应式）
    pub fn user(&self) -> Option<UserProfile> {
        self.session.with(|s| s.user().cloned())
    }

    /// 当前用户资料（非响应式）
    pub fn user_untracked(&self) -> Option<UserProfile> {
        self.session.with_untracked(|s| s.user().cloned())
    }

    /// 构建 API 客户端；本地会话标记不会作为 Bearer 发送
    pub fn api(&self) -> DermaScopeApi {
        let bearer = self
            .session
            .with_untracked(|s| s.token().and_then(SessionToken::bearer).map(str::to_string));
        let config = self.config.get_value();
        DermaScopeApi::new(&config, bearer)
    }

    /// 登录成功后写入会话
    ///
    /// 后端未签发令牌时生成本地会话标记。
    pub fn sign_in(&self, account: Account) -> Result<(), SessionError> {
        let token = account
            .token
            .map(SessionToken::issued)
            .unwrap_or_else(SessionToken::mint_local);
        let result = self
            .store
            .try_update_value(|store| store.sign_in(token, account.user))
            .unwrap_or_else(|| Err(SessionError::Storage("session store disposed".to_string())));
        match &result {
            Ok(()) => log!("[Auth] Signed in"),
            Err(e) => error!("[Auth] Failed to persist session: {}", e),
        }
        result
    }

    /// 注销并清除状态
    ///
    /// 导航将由路由服务的会话监听自动处理。
    pub fn logout(&self) {
        self.store.update_value(|store| store.logout());
        log!("[Auth] Logged out");
    }

    /// 受保护接口返回 401/403 时视为会话失效并注销
    pub fn handle_error(&self, err: &ApiError) {
        if err.is_unauthorized() && self.session.with_untracked(Session::is_authenticated) {
            warn!("[Auth] Session rejected by server: {}", err);
            self.logout();
        }
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}
