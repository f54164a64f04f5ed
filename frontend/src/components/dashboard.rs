use chrono::{Local, Timelike};
use dermascope_shared::ConditionKind;
use dermascope_shared::date::greeting;
use leptos::prelude::*;

use crate::auth::use_auth;
use crate::components::icons::Activity;
use crate::web::route::AppRoute;
use crate::web::router::Link;

fn condition_blurb(condition: ConditionKind) -> &'static str {
    match condition {
        ConditionKind::Acne => "Detect acne and grade its severity from a face or body photo.",
        ConditionKind::Eczema => "Screen a patch of irritated skin for signs of eczema.",
        ConditionKind::Psoriasis => "Check scaly plaques for psoriasis and assess severity.",
    }
}

/// 患者面板：问候语 + 三种检测入口
#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    // 按本地时间计算问候语
    let greeting_text = move || {
        let name = auth.user().map(|u| u.first_name).unwrap_or_default();
        greeting(&name, Local::now().hour())
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 pt-24 md:pt-24 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                <div>
                    <h1 class="text-3xl font-bold">{greeting_text}</h1>
                    <p class="text-base-content/70 mt-1">"Choose a screening to get started."</p>
                </div>

                <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                    {ConditionKind::ALL
                        .into_iter()
                        .map(|condition| {
                            view! {
                                <div class="card bg-base-100 shadow-xl">
                                    <div class="card-body">
                                        <div class="p-3 bg-primary/10 rounded-2xl text-primary w-fit">
                                            <Activity attr:class="h-6 w-6" />
                                        </div>
                                        <h2 class="card-title">{format!("{} Detection", condition.display_name())}</h2>
                                        <p class="text-base-content/70 text-sm">{condition_blurb(condition)}</p>
                                        <div class="card-actions justify-end">
                                            <Link to=AppRoute::Detection(condition) class="btn btn-primary btn-sm">
                                                "Start"
                                            </Link>
                                        </div>
                                    </div>
                                </div>
                            }
                        })
                        .collect_view()}
                </div>
            </div>
        </div>
    }
}
