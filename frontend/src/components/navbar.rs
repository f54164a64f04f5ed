use dermascope_shared::UserType;
use leptos::prelude::*;

use crate::auth::use_auth;
use crate::components::icons::{LogOut, Menu};
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 顶部导航栏
///
/// 已登录：首页、角色面板、注销；未登录：登录/注册。小屏下折叠为菜单按钮。
#[component]
pub fn Navbar() -> impl IntoView {
    let auth = use_auth();
    let (menu_open, set_menu_open) = signal(false);

    let viewer = auth.viewer_signal();
    let dashboard = move || viewer.get().map(AppRoute::dashboard_for);
    let dashboard_label = move || match viewer.get() {
        Some(UserType::Doctor) => "Patients",
        _ => "Dashboard",
    };

    let on_logout = move |_| {
        set_menu_open.set(false);
        auth.logout();
    };

    let links = move || {
        view! {
            <li><Link to=AppRoute::Home>"Home"</Link></li>
            {move || match dashboard() {
                Some(route) => view! {
                    <li><Link to=route>{dashboard_label}</Link></li>
                    <li>
                        <button class="text-error" on:click=on_logout>
                            <LogOut attr:class="h-4 w-4" /> "Log out"
                        </button>
                    </li>
                }
                .into_any(),
                None => view! {
                    <li><Link to=AppRoute::Auth>"Login / Register"</Link></li>
                }
                .into_any(),
            }}
        }
    };

    view! {
        <div class="navbar bg-base-100 shadow-md fixed top-0 z-40">
            <div class="flex-1">
                <Link to=AppRoute::Home class="btn btn-ghost text-xl font-bold text-primary">
                    "DermaScope"
                </Link>
            </div>
            <div class="flex-none hidden md:flex">
                <ul class="menu menu-horizontal px-1 gap-1">{links}</ul>
            </div>
            <div class="flex-none md:hidden">
                <button
                    class="btn btn-ghost btn-square"
                    aria-label="Toggle menu"
                    on:click=move |_| set_menu_open.update(|open| *open = !*open)
                >
                    <Menu attr:class="h-6 w-6" />
                </button>
            </div>
            <Show when=move || menu_open.get()>
                <ul
                    class="menu bg-base-100 rounded-box shadow-lg absolute right-2 top-16 w-52 md:hidden"
                    on:click=move |_| set_menu_open.set(false)
                >
                    {links}
                </ul>
            </Show>
        </div>
    }
}
