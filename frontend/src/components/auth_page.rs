use dermascope_shared::UserType;
use dermascope_shared::protocol::{SignInRequest, SignUpRequest};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::RequestScope;
use crate::auth::use_auth;
use crate::components::icons::{AlertCircle, Stethoscope, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    SignIn,
    SignUp,
    Forgot,
}

impl AuthMode {
    fn title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Welcome Back",
            AuthMode::SignUp => "Create your account",
            AuthMode::Forgot => "Reset your password",
        }
    }

    /// 卡片底部可切换到的模式
    fn links(self) -> &'static [(AuthMode, &'static str)] {
        match self {
            AuthMode::SignIn => &[
                (AuthMode::Forgot, "Forgot your password?"),
                (AuthMode::SignUp, "Create new account"),
            ],
            AuthMode::SignUp | AuthMode::Forgot => &[(AuthMode::SignIn, "Back to sign in")],
        }
    }
}

/// 登录 / 注册 / 找回密码页
///
/// 成功后只写入会话，跳转交给路由守卫。
#[component]
pub fn AuthPage() -> impl IntoView {
    let (mode, set_mode) = signal(AuthMode::SignIn);

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">{move || mode.get().title()}</h1>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    {move || match mode.get() {
                        AuthMode::SignIn => view! { <SignInForm /> }.into_any(),
                        AuthMode::SignUp => view! { <SignUpForm /> }.into_any(),
                        AuthMode::Forgot => view! { <ForgotPasswordForm /> }.into_any(),
                    }}
                    <div class="px-8 pb-6 text-sm flex justify-between">
                        {move || mode
                            .get()
                            .links()
                            .iter()
                            .map(|&(target, label)| view! {
                                <button class="link link-primary" on:click=move |_| set_mode.set(target)>
                                    {label}
                                </button>
                            })
                            .collect_view()}
                    </div>
                </div>
            </div>
        </div>
    }
}

/// 患者 / 医生切换标签
#[component]
fn RoleTabs(role: ReadSignal<UserType>, set_role: WriteSignal<UserType>) -> impl IntoView {
    let tab_class = move |target: UserType| {
        if role.get() == target {
            "tab tab-active gap-2"
        } else {
            "tab gap-2"
        }
    };

    view! {
        <div role="tablist" class="tabs tabs-boxed">
            <a role="tab" class=move || tab_class(UserType::Patient) on:click=move |_| set_role.set(UserType::Patient)>
                <User attr:class="h-4 w-4" /> "Patient"
            </a>
            <a role="tab" class=move || tab_class(UserType::Doctor) on:click=move |_| set_role.set(UserType::Doctor)>
                <Stethoscope attr:class="h-4 w-4" /> "Doctor"
            </a>
        </div>
    }
}

#[component]
fn ErrorAlert(message: ReadSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some()>
            <div role="alert" class="alert alert-error text-sm py-2">
                <AlertCircle attr:class="stroke-current shrink-0 h-5 w-5" />
                <span>{move || message.get().unwrap_or_default()}</span>
            </div>
        </Show>
    }
}

#[component]
fn SignInForm() -> impl IntoView {
    let auth = use_auth();
    let scope = RequestScope::new();

    let (role, set_role) = signal(UserType::Patient);
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        if email.get().trim().is_empty() || password.get().is_empty() {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let request = SignInRequest {
            email: email.get().trim().to_string(),
            password: password.get(),
            user_type: role.get(),
        };
        let api = auth.api().scoped(&scope);
        spawn_local(async move {
            let outcome = api.sign_in(request).await;
            // 页面可能已卸载
            let _ = set_is_submitting.try_set(false);
            match outcome {
                Ok(account) => {
                    if let Err(e) = auth.sign_in(account) {
                        let _ = set_error_msg.try_set(Some(e.to_string()));
                    }
                }
                Err(e) => {
                    let _ = set_error_msg.try_set(Some(e.user_message("Sign in failed. Please try again.")));
                }
            }
        });
    };

    view! {
        <form class="card-body" on:submit=on_submit>
            <RoleTabs role=role set_role=set_role />
            <ErrorAlert message=error_msg />

            <div class="form-control">
                <label class="label" for="signin-email">
                    <span class="label-text">"Email address"</span>
                </label>
                <input
                    id="signin-email"
                    type="email"
                    autocomplete="email"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                    class="input input-bordered"
                    required
                />
            </div>
            <div class="form-control">
                <label class="label" for="signin-password">
                    <span class="label-text">"Password"</span>
                </label>
                <input
                    id="signin-password"
                    type="password"
                    autocomplete="current-password"
                    placeholder="••••••••"
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    prop:value=password
                    class="input input-bordered"
                    required
                />
            </div>
            <div class="form-control mt-6">
                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                    {move || if is_submitting.get() {
                        view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                    } else {
                        view! {
                            "Sign in as "
                            {move || match role.get() {
                                UserType::Patient => "Patient",
                                UserType::Doctor => "Doctor",
                            }}
                        }
                        .into_any()
                    }}
                </button>
            </div>
        </form>
    }
}

#[component]
fn SignUpForm() -> impl IntoView {
    let auth = use_auth();
    let scope = RequestScope::new();

    let (role, set_role) = signal(UserType::Patient);
    let (first_name, set_first_name) = signal(String::new());
    let (last_name, set_last_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let fields = [first_name.get(), last_name.get(), email.get(), password.get()];
        if fields.iter().any(|f| f.trim().is_empty()) {
            set_error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let [first_name, last_name, email, password] = fields;
        let request = SignUpRequest {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            password,
            user_type: role.get(),
        };
        let api = auth.api().scoped(&scope);
        spawn_local(async move {
            let outcome = api.sign_up(request).await;
            let _ = set_is_submitting.try_set(false);
            match outcome {
                Ok(account) => {
                    if let Err(e) = auth.sign_in(account) {
                        let _ = set_error_msg.try_set(Some(e.to_string()));
                    }
                }
                Err(e) => {
                    let _ = set_error_msg.try_set(Some(e.user_message("Sign up failed. Please try again.")));
                }
            }
        });
    };

    let text_input = move |id: &'static str, label: &'static str, kind: &'static str, value: ReadSignal<String>, set: WriteSignal<String>| {
        view! {
            <div class="form-control">
                <label class="label" for=id>
                    <span class="label-text">{label}</span>
                </label>
                <input
                    id=id
                    type=kind
                    on:input=move |ev| set.set(event_target_value(&ev))
                    prop:value=value
                    class="input input-bordered"
                    required
                />
            </div>
        }
    };

    view! {
        <form class="card-body" on:submit=on_submit>
            <RoleTabs role=role set_role=set_role />
            <ErrorAlert message=error_msg />
            <div class="grid grid-cols-2 gap-2">
                {text_input("signup-first", "First name", "text", first_name, set_first_name)}
                {text_input("signup-last", "Last name", "text", last_name, set_last_name)}
            </div>
            {text_input("signup-email", "Email address", "email", email, set_email)}
            {text_input("signup-password", "Password", "password", password, set_password)}
            <div class="form-control mt-6">
                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                    {move || if is_submitting.get() {
                        view! { <span class="loading loading-spinner"></span> "Creating account..." }.into_any()
                    } else {
                        "Create account".into_any()
                    }}
                </button>
            </div>
        </form>
    }
}

/// 找回密码
///
/// 后端没有重置接口，提交后只提示联系支持人员，不发送任何请求。
#[component]
fn ForgotPasswordForm() -> impl IntoView {
    let (email, set_email) = signal(String::new());
    let (submitted, set_submitted) = signal(false);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        if !email.get().trim().is_empty() {
            set_submitted.set(true);
        }
    };

    view! {
        <form class="card-body" on:submit=on_submit>
            <Show when=move || submitted.get()>
                <div role="alert" class="alert alert-info text-sm py-2">
                    <AlertCircle attr:class="stroke-current shrink-0 h-5 w-5" />
                    <span>"Password reset is not available online yet. Please contact support to regain access."</span>
                </div>
            </Show>
            <div class="form-control">
                <label class="label" for="forgot-email">
                    <span class="label-text">"Email address"</span>
                </label>
                <input
                    id="forgot-email"
                    type="email"
                    autocomplete="email"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                    class="input input-bordered"
                    required
                />
            </div>
            <div class="form-control mt-6">
                <button class="btn btn-primary">"Send reset instructions"</button>
            </div>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_links_to_forgot_and_sign_up() {
        let targets: Vec<AuthMode> = AuthMode::SignIn.links().iter().map(|(m, _)| *m).collect();
        assert_eq!(targets, vec![AuthMode::Forgot, AuthMode::SignUp]);
    }

    #[test]
    fn test_forgot_returns_to_sign_in() {
        assert_eq!(AuthMode::Forgot.links(), &[(AuthMode::SignIn, "Back to sign in")]);
        assert_eq!(AuthMode::Forgot.title(), "Reset your password");
    }
}
