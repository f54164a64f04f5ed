//! 路由服务模块 - 核心引擎
//!
//! 所有对 window.history 的操作都集中在此模块。
//! 每一次路由变化（首次加载、站内跳转、后退/前进、会话变化）都经过同一个
//! 守卫入口 `RouterService::commit`，不缓存任何判定结果。

use dermascope_shared::UserType;
use leptos::logging::log;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, GuardDecision};

/// History 写入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
    /// 浏览器已经更新了地址栏（popstate），无需写入
    Keep,
}

fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn write_history(path: &str, mode: HistoryMode) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let _ = match mode {
        HistoryMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(path)),
        HistoryMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", Some(path)),
        HistoryMode::Keep => Ok(()),
    };
}

/// 对目标路由执行守卫，返回最终应显示的路由
fn admit(target: AppRoute, viewer: Option<UserType>, cause: &str) -> (AppRoute, bool) {
    match target.guard(viewer) {
        GuardDecision::Allow => (target, false),
        GuardDecision::Redirect(redirect) => {
            log!("[Router] {}: {} not allowed for {:?}, redirecting to {}", cause, target, viewer, redirect);
            (redirect, true)
        }
    }
}

/// 路由器服务
///
/// 通过 Signal 驱动界面更新；当前角色以信号形式注入，与认证模块解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    /// 当前用户角色，未登录为 None
    viewer: Signal<Option<UserType>>,
}

impl RouterService {
    fn new(viewer: Signal<Option<UserType>>) -> Self {
        // 直接打开受保护地址时替换为重定向目标
        let (initial, redirected) = admit(
            AppRoute::from_path(&current_path()),
            viewer.get_untracked(),
            "initial load",
        );
        if redirected {
            write_history(&initial.to_path(), HistoryMode::Replace);
        }
        let (current_route, set_route) = signal(initial);

        Self {
            current_route,
            set_route,
            viewer,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 站内跳转（pushState）
    pub fn navigate(&self, target: AppRoute) {
        self.commit(target, HistoryMode::Push, "navigate");
    }

    /// 守卫 -> 写入 History -> 更新信号
    ///
    /// 被重定向的 popstate 需要改写地址栏，因此改用 replaceState。
    fn commit(&self, target: AppRoute, mode: HistoryMode, cause: &str) {
        let (route, redirected) = admit(target, self.viewer.get_untracked(), cause);
        let mode = match mode {
            HistoryMode::Keep if redirected => HistoryMode::Replace,
            other => other,
        };
        write_history(&route.to_path(), mode);
        self.set_route.set(route);
    }

    /// 浏览器后退/前进
    fn listen_popstate(self) {
        let closure = Closure::<dyn Fn()>::new(move || {
            self.commit(AppRoute::from_path(&current_path()), HistoryMode::Keep, "popstate");
        });

        if let Some(window) = web_sys::window() {
            let _ = window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 监听器与应用同寿命
        closure.forget();
    }

    /// 会话变化时重新检查当前页面
    ///
    /// 登录后离开首页/登录页，登出后离开受保护页面，角色不符时回到对应面板。
    fn watch_session(self) {
        Effect::new(move |_| {
            let viewer = self.viewer.get();
            let route = self.current_route.get_untracked();
            if let GuardDecision::Redirect(_) = route.guard(viewer) {
                self.commit(route, HistoryMode::Push, "session change");
            }
        });
    }
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件，应在 App 根部使用
#[component]
pub fn Router(
    /// 当前用户角色信号
    viewer: Signal<Option<UserType>>,
    children: Children,
) -> impl IntoView {
    let router = RouterService::new(viewer);
    router.listen_popstate();
    router.watch_session();
    provide_context(router);

    children()
}

/// 路由出口：按当前路由渲染页面
#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();
    move || matcher(router.current_route().get())
}

/// 站内链接，拦截点击改为 History 导航
#[component]
pub fn Link(
    to: AppRoute,
    #[prop(into, optional)]
    class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let href = to.to_path();

    let on_click = move |ev: web_sys::MouseEvent| {
        // 保留新标签页打开等浏览器默认行为
        if ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        router.navigate(to.clone());
    };

    view! {
        <a href=href class=class on:click=on_click>
            {children()}
        </a>
    }
}
