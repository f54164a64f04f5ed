//! 会话存储
//!
//! 会话状态的唯一修改入口：启动时从持久化存储恢复一次，之后只能通过
//! `sign_in` / `set_authenticated` / `logout` 修改，修改后通知所有订阅者。

use uuid::Uuid;

use crate::{STORAGE_TOKEN_KEY, STORAGE_USER_KEY, SessionError, UserProfile, UserType};

/// 本地生成的会话标记前缀，此类标记不会发送给后端
pub const LOCAL_TOKEN_PREFIX: &str = "local-";

/// 持久化存储抽象（浏览器中为 LocalStorage）
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn delete(&self, key: &str) -> bool;
}

/// 不透明的会话令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// 后端签发的令牌
    pub fn issued(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 后端未签发令牌时，本地生成一个会话标记
    pub fn mint_local() -> Self {
        Self(format!("{}{}", LOCAL_TOKEN_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 可作为 `Authorization: Bearer` 发送的凭据；本地标记返回 None
    pub fn bearer(&self) -> Option<&str> {
        if self.0.starts_with(LOCAL_TOKEN_PREFIX) {
            None
        } else {
            Some(&self.0)
        }
    }
}

/// 会话状态
///
/// 已认证时 token 与 user 必然同时存在。
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        token: SessionToken,
        user: UserProfile,
    },
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            Session::Authenticated { token, .. } => Some(token),
            Session::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Session::Authenticated { user, .. } => Some(user),
            Session::Anonymous => None,
        }
    }

    /// 当前角色，未登录时为 None（路由守卫使用）
    pub fn user_type(&self) -> Option<UserType> {
        self.user().map(|u| u.user_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Session) + Send + Sync>;

/// 会话存储：内存状态 + 持久化 + 订阅通知
pub struct SessionStore<S: SessionStorage> {
    storage: S,
    session: Session,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl<S: SessionStorage> SessionStore<S> {
    /// 从持久化存储恢复会话
    ///
    /// 没有 token 视为未登录；有 token 但用户资料缺失或损坏时清除两个键。
    pub fn rehydrate(storage: S) -> Self {
        let session = match storage.get(STORAGE_TOKEN_KEY) {
            None => Session::Anonymous,
            Some(token) => {
                let user = storage
                    .get(STORAGE_USER_KEY)
                    .and_then(|raw| serde_json::from_str::<UserProfile>(&raw).ok());
                match user {
                    Some(user) if !token.trim().is_empty() => Session::Authenticated {
                        token: SessionToken(token),
                        user,
                    },
                    _ => {
                        storage.delete(STORAGE_TOKEN_KEY);
                        storage.delete(STORAGE_USER_KEY);
                        Session::Anonymous
                    }
                }
            }
        };
        Self {
            storage,
            session,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    /// `value == true` 时必须同时提供 token 和用户资料；
    /// `value == false` 时无论其他参数如何都清空会话。
    pub fn set_authenticated(
        &mut self,
        value: bool,
        token: Option<SessionToken>,
        user: Option<UserProfile>,
    ) -> Result<(), SessionError> {
        if !value {
            self.storage.delete(STORAGE_TOKEN_KEY);
            self.storage.delete(STORAGE_USER_KEY);
            self.replace(Session::Anonymous);
            return Ok(());
        }

        let (Some(token), Some(user)) = (token, user) else {
            return Err(SessionError::IncompleteCredentials);
        };

        let encoded =
            serde_json::to_string(&user).map_err(|e| SessionError::Encode(e.to_string()))?;
        if !self.storage.set(STORAGE_TOKEN_KEY, token.as_str()) {
            return Err(SessionError::Storage(STORAGE_TOKEN_KEY.to_string()));
        }
        if !self.storage.set(STORAGE_USER_KEY, &encoded) {
            // 两个键必须一起写入
            self.storage.delete(STORAGE_TOKEN_KEY);
            return Err(SessionError::Storage(STORAGE_USER_KEY.to_string()));
        }

        self.replace(Session::Authenticated { token, user });
        Ok(())
    }

    pub fn sign_in(&mut self, token: SessionToken, user: UserProfile) -> Result<(), SessionError> {
        self.set_authenticated(true, Some(token), Some(user))
    }

    pub fn logout(&mut self) {
        // 注销不会失败
        let _ = self.set_authenticated(false, None, None);
    }

    /// 订阅会话变化，回调在每次修改后以新状态调用
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn replace(&mut self, session: Session) {
        self.session = session;
        for (_, listener) in &self.listeners {
            listener(&self.session);
        }
    }
}
