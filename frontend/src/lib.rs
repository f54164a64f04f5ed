//! DermaScope 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义与守卫（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 会话状态管理
//! - `api`: 后端接口调用
//! - `components`: UI 组件层
//!
//! 与浏览器无关的业务逻辑都在 `dermascope_shared` 中。

mod api;
mod auth;
mod components {
    pub mod auth_page;
    mod charts;
    pub mod dashboard;
    pub mod detection;
    pub mod doctor_dashboard;
    pub mod home;
    mod icons;
    pub mod navbar;
    pub mod patient_results;
}
mod config;

use crate::auth::AuthContext;
use crate::components::auth_page::AuthPage;
use crate::components::dashboard::DashboardPage;
use crate::components::detection::DetectionPage;
use crate::components::doctor_dashboard::DoctorDashboardPage;
use crate::components::home::HomePage;
use crate::components::navbar::Navbar;
use crate::components::patient_results::PatientResultsPage;

use leptos::prelude::*;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod storage;

    pub use http::{HttpClient, HttpError, HttpRequestBuilder};
    pub use storage::LocalStorage;
}

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Auth => view! { <AuthPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::DoctorDashboard => view! { <DoctorDashboardPage /> }.into_any(),
        AppRoute::Detection(condition) => view! { <DetectionPage condition=condition /> }.into_any(),
        AppRoute::PatientResults(patient_id) => {
            view! { <PatientResultsPage patient_id=patient_id /> }.into_any()
        }
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center space-y-4">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl">"Page not found"</p>
                    <Link to=AppRoute::Home class="btn btn-primary">"Back to Home"</Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建会话上下文（从 LocalStorage 恢复）
    let auth_ctx = AuthContext::new();
    provide_context(auth_ctx);

    // 2. 获取当前角色信号，用于注入路由服务（解耦！）
    let viewer = auth_ctx.viewer_signal();

    view! {
        // 3. 路由器组件：注入角色信号实现守卫
        <Router viewer=viewer>
            <Navbar />
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
