use dermascope_shared::ConditionKind;
use leptos::prelude::*;

use crate::web::route::AppRoute;
use crate::web::router::use_router;

#[component]
pub fn HomePage() -> impl IntoView {
    let router = use_router();

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content text-center">
                <div class="max-w-2xl space-y-6">
                    <h1 class="text-5xl font-bold">"Know your skin."</h1>
                    <p class="text-lg text-base-content/70">
                        "Upload a photo and DermaScope screens it for common skin conditions, \
                         estimates severity, and keeps a history your doctor can follow over time."
                    </p>
                    <div class="flex flex-wrap justify-center gap-2">
                        {ConditionKind::ALL
                            .into_iter()
                            .map(|c| view! { <span class="badge badge-outline badge-lg">{c.display_name()}</span> })
                            .collect_view()}
                    </div>
                    <button
                        class="btn btn-primary btn-lg"
                        on:click=move |_| router.navigate(AppRoute::Auth)
                    >
                        "Get Started"
                    </button>
                </div>
            </div>
        </div>
    }
}
