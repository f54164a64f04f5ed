//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由、访问权限以及守卫决策。

use std::fmt::Display;

use dermascope_shared::{ConditionKind, EntityId, UserType};

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 首页 (默认路由)
    #[default]
    Home,
    /// 登录 / 注册
    Auth,
    /// 患者面板
    Dashboard,
    /// 医生面板
    DoctorDashboard,
    /// 检测页面
    Detection(ConditionKind),
    /// 某位患者的检测历史（医生）
    PatientResults(EntityId),
    /// 页面未找到
    NotFound,
}

/// 守卫决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(AppRoute),
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/auth" => Self::Auth,
            "/dashboard" => Self::Dashboard,
            "/doctor-dashboard" => Self::DoctorDashboard,
            _ => {
                if let Some(id) = trimmed.strip_prefix("/patient-results/") {
                    if !id.is_empty() && !id.contains('/') {
                        return Self::PatientResults(EntityId::new(id));
                    }
                    return Self::NotFound;
                }
                trimmed
                    .strip_prefix('/')
                    .and_then(|p| p.strip_suffix("-detection"))
                    .and_then(|slug| {
                        ConditionKind::ALL
                            .into_iter()
                            .find(|c| c.slug() == slug)
                    })
                    .map(Self::Detection)
                    .unwrap_or(Self::NotFound)
            }
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::DoctorDashboard => "/doctor-dashboard".to_string(),
            Self::Detection(condition) => format!("/{}-detection", condition.slug()),
            Self::PatientResults(id) => format!("/patient-results/{}", id),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// 是否需要登录
    pub fn requires_auth(&self) -> bool {
        self.required_role().is_some()
    }

    /// 只允许某一角色访问的路由
    pub fn required_role(&self) -> Option<UserType> {
        match self {
            Self::Dashboard | Self::Detection(_) => Some(UserType::Patient),
            Self::DoctorDashboard | Self::PatientResults(_) => Some(UserType::Doctor),
            Self::Home | Self::Auth | Self::NotFound => None,
        }
    }

    /// 已登录用户是否应该离开此路由
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Home | Self::Auth)
    }

    /// 认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Auth
    }

    /// 角色对应的面板
    pub fn dashboard_for(role: UserType) -> Self {
        match role {
            UserType::Patient => Self::Dashboard,
            UserType::Doctor => Self::DoctorDashboard,
        }
    }

    /// **核心守卫逻辑**
    ///
    /// 纯函数：只依赖目标路由和当前用户角色，每次导航都重新计算。
    pub fn guard(&self, viewer: Option<UserType>) -> GuardDecision {
        match viewer {
            None if self.requires_auth() => GuardDecision::Redirect(Self::auth_failure_redirect()),
            None => GuardDecision::Allow,
            Some(role) if self.should_redirect_when_authenticated() => {
                GuardDecision::Redirect(Self::dashboard_for(role))
            }
            Some(role) => match self.required_role() {
                Some(required) if required != role => {
                    GuardDecision::Redirect(Self::dashboard_for(role))
                }
                _ => GuardDecision::Allow,
            },
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/auth"), AppRoute::Auth);
        assert_eq!(AppRoute::from_path("/dashboard/"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/doctor-dashboard"), AppRoute::DoctorDashboard);
        assert_eq!(
            AppRoute::from_path("/psoriasis-detection"),
            AppRoute::Detection(ConditionKind::Psoriasis)
        );
        assert_eq!(
            AppRoute::from_path("/patient-results/42?tab=acne"),
            AppRoute::PatientResults(EntityId::from(42))
        );
        assert_eq!(AppRoute::from_path("/patient-results/"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/rosacea-detection"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn test_paths_round_trip() {
        let routes = [
            AppRoute::Home,
            AppRoute::Auth,
            AppRoute::Dashboard,
            AppRoute::DoctorDashboard,
            AppRoute::Detection(ConditionKind::Acne),
            AppRoute::Detection(ConditionKind::Eczema),
            AppRoute::PatientResults(EntityId::from("p-9")),
        ];
        for route in routes {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_anonymous_guard() {
        assert_eq!(
            AppRoute::Dashboard.guard(None),
            GuardDecision::Redirect(AppRoute::Auth)
        );
        assert_eq!(
            AppRoute::PatientResults(EntityId::from(42)).guard(None),
            GuardDecision::Redirect(AppRoute::Auth)
        );
        assert_eq!(AppRoute::Home.guard(None), GuardDecision::Allow);
        assert_eq!(AppRoute::Auth.guard(None), GuardDecision::Allow);
        assert_eq!(AppRoute::NotFound.guard(None), GuardDecision::Allow);
    }

    #[test]
    fn test_signed_in_leaves_public_routes() {
        assert_eq!(
            AppRoute::Auth.guard(Some(UserType::Patient)),
            GuardDecision::Redirect(AppRoute::Dashboard)
        );
        assert_eq!(
            AppRoute::Home.guard(Some(UserType::Doctor)),
            GuardDecision::Redirect(AppRoute::DoctorDashboard)
        );
    }

    #[test]
    fn test_role_restrictions() {
        let detection = AppRoute::Detection(ConditionKind::Acne);
        assert_eq!(detection.guard(Some(UserType::Patient)), GuardDecision::Allow);
        assert_eq!(
            detection.guard(Some(UserType::Doctor)),
            GuardDecision::Redirect(AppRoute::DoctorDashboard)
        );

        let results = AppRoute::PatientResults(EntityId::from(42));
        assert_eq!(results.guard(Some(UserType::Doctor)), GuardDecision::Allow);
        assert_eq!(
            results.guard(Some(UserType::Patient)),
            GuardDecision::Redirect(AppRoute::Dashboard)
        );
        assert_eq!(
            AppRoute::NotFound.guard(Some(UserType::Doctor)),
            GuardDecision::Allow
        );
    }
}
