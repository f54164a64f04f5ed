//! 患者病历页（医生端）
//!
//! 顶部为患者资料卡片，下方按检测类型分标签展示趋势图和时间线。

use dermascope_shared::chart::{chart_points, result_text};
use dermascope_shared::date::display_date;
use dermascope_shared::protocol::PatientHistoryRequest;
use dermascope_shared::{ConditionKind, EntityId, PatientHistory, SeverityTone, TestRecord};
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::RequestScope;
use crate::auth::use_auth;
use crate::components::charts::{PrimaryLevelChart, ScoreBreakdown, ScoreTrendChart, SeverityBadge};
use crate::components::icons::{Activity, ArrowLeft, Calendar, FileText, Mail, User};
use crate::web::route::AppRoute;
use crate::web::router::Link;

const LOAD_FALLBACK: &str = "Failed to load patient data. Please try again later.";

fn condition_tag_class(condition: ConditionKind) -> &'static str {
    match condition {
        ConditionKind::Acne => "badge badge-sm bg-blue-100 text-blue-800 border-0",
        ConditionKind::Eczema => "badge badge-sm bg-green-100 text-green-800 border-0",
        ConditionKind::Psoriasis => "badge badge-sm bg-purple-100 text-purple-800 border-0",
    }
}

#[component]
pub fn PatientResultsPage(patient_id: EntityId) -> impl IntoView {
    let auth = use_auth();
    let scope = RequestScope::new();

    let (history, set_history) = signal(Option::<PatientHistory>::None);
    let (is_loading, set_is_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (tab, set_tab) = signal(ConditionKind::Acne);

    let api = auth.api().scoped(&scope);
    let request = PatientHistoryRequest { patient_id };
    spawn_local(async move {
        let outcome = api.fetch(&request).await;
        let _ = set_is_loading.try_set(false);
        match outcome {
            Ok(data) => {
                let _ = set_history.try_set(Some(data));
            }
            Err(e) => {
                warn!("[Patient] Failed to load history for {}: {:?}", request.patient_id, e);
                auth.handle_error(&e);
                let _ = set_error_msg.try_set(Some(e.user_message(LOAD_FALLBACK)));
            }
        }
    });

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 pt-24 md:pt-24 font-sans">
            <div class="max-w-5xl mx-auto space-y-6">
                {move || {
                    if is_loading.get() {
                        return view! {
                            <div class="flex justify-center py-16">
                                <span class="loading loading-spinner loading-lg text-primary"></span>
                            </div>
                        }
                        .into_any();
                    }
                    if let Some(message) = error_msg.get() {
                        return view! { <div class="p-4 text-error text-lg font-medium">{message}</div> }.into_any();
                    }
                    match history.get() {
                        Some(data) => view! { <HistoryView data=data tab=tab set_tab=set_tab /> }.into_any(),
                        None => ().into_any(),
                    }
                }}
            </div>
        </div>
    }
}

#[component]
fn HistoryView(
    data: PatientHistory,
    tab: ReadSignal<ConditionKind>,
    set_tab: WriteSignal<ConditionKind>,
) -> impl IntoView {
    let patient = data.patient.clone();
    let conditions = data.conditions();
    let total = data.test_results.len();

    view! {
        <div class="flex flex-wrap items-center justify-between gap-4">
            <h1 class="flex items-center gap-3 text-xl font-bold">
                <User attr:class="h-5 w-5 text-primary" />
                {format!("Patient History - {} {}", patient.first_name, patient.last_name)}
            </h1>
            <Link to=AppRoute::DoctorDashboard class="btn btn-primary btn-sm">
                <ArrowLeft attr:class="h-4 w-4" />
                "Back to Dashboard"
            </Link>
        </div>

        <div class="card bg-base-100 shadow-md">
            <div class="card-body space-y-6">
                <div class="grid grid-cols-1 md:grid-cols-3 gap-4 p-4 bg-base-200 rounded-box">
                    <div class="flex items-center gap-2">
                        <div class="p-2 bg-emerald-200 rounded-full"><Mail attr:class="h-4 w-4" /></div>
                        <div>
                            <p class="text-xs text-base-content/60">"Email"</p>
                            <p class="text-sm font-medium">{patient.email.clone()}</p>
                        </div>
                    </div>
                    <div class="flex items-center gap-2">
                        <div class="p-2 bg-emerald-200 rounded-full"><FileText attr:class="h-4 w-4" /></div>
                        <div>
                            <p class="text-xs text-base-content/60">"Total Tests"</p>
                            <p class="text-sm font-medium">{total}</p>
                        </div>
                    </div>
                    <div class="flex items-center gap-2">
                        <div class="p-2 bg-emerald-200 rounded-full"><Activity attr:class="h-4 w-4" /></div>
                        <div>
                            <p class="text-xs text-base-content/60">"Conditions"</p>
                            <div class="flex flex-wrap gap-1">
                                {conditions
                                    .into_iter()
                                    .map(|c| view! { <span class=condition_tag_class(c)>{c.display_name()}</span> })
                                    .collect_view()}
                            </div>
                        </div>
                    </div>
                </div>

                <div role="tablist" class="tabs tabs-bordered">
                    {ConditionKind::ALL
                        .into_iter()
                        .map(|c| view! {
                            <a
                                role="tab"
                                class=move || if tab.get() == c { "tab tab-active" } else { "tab" }
                                on:click=move |_| set_tab.set(c)
                            >
                                {c.display_name()}
                            </a>
                        })
                        .collect_view()}
                </div>

                {move || {
                    let condition = tab.get();
                    view! { <ConditionTab condition=condition records=data.records_for(condition) /> }
                }}
            </div>
        </div>
    }
}

/// 单个检测类型：趋势图 + 主等级图 + 时间线
#[component]
fn ConditionTab(condition: ConditionKind, records: Vec<TestRecord>) -> impl IntoView {
    let name = condition.display_name();
    if records.is_empty() {
        return view! {
            <div class="text-center py-8 text-base-content/60">{format!("No {} test results found", name)}</div>
        }
        .into_any();
    }

    let points = chart_points(&records);

    view! {
        <div class="space-y-6">
            <div>
                <p class="text-sm font-medium mb-2">{format!("{} Severity Trends Over Time", name)}</p>
                <ScoreTrendChart points=points.clone() />
            </div>
            <div>
                <p class="text-sm font-medium mb-2">{format!("{} Primary Severity Level", name)}</p>
                <PrimaryLevelChart points=points />
            </div>
            <ul class="timeline timeline-vertical timeline-compact">
                {records
                    .into_iter()
                    .map(|record| view! {
                        <li>
                            <div class="timeline-middle"><div class="w-3 h-3 rounded-full bg-primary"></div></div>
                            <div class="timeline-end mb-6 w-full"><TimelineItem record=record /></div>
                            <hr />
                        </li>
                    })
                    .collect_view()}
            </ul>
        </div>
    }
    .into_any()
}

#[component]
fn TimelineItem(record: TestRecord) -> impl IntoView {
    let outcome = record.outcome.clone();
    let result_class = if outcome.detected == Some(true) {
        format!("font-semibold {}", SeverityTone::Amber.text_class())
    } else {
        format!("font-semibold {}", SeverityTone::Green.text_class())
    };

    view! {
        <div class="p-4 bg-base-200 rounded-box shadow-sm">
            <div class="flex items-center justify-between mb-3">
                <div class="flex items-center gap-2">
                    <Calendar attr:class="h-4 w-4" />
                    <span class="font-semibold">{display_date(&record.created_at)}</span>
                </div>
                <div class="flex items-center gap-1 text-base-content/70">
                    <Activity attr:class="h-4 w-4" />
                    <span class="text-sm font-medium">{format!("Confidence: {}%", outcome.confidence)}</span>
                </div>
            </div>
            <div class="grid grid-cols-2 gap-4">
                <img src=record.image_url.clone() alt="Test image" class="rounded-box w-full" />
                <div class="space-y-2 text-sm">
                    <p class="flex items-center gap-2 font-medium">
                        <FileText attr:class="h-3.5 w-3.5" />
                        {format!("Test Type: {}", record.test_type_label())}
                    </p>
                    <p class="flex items-center gap-2">
                        <Activity attr:class="h-3.5 w-3.5" />
                        {format!("Body Part: {}", record.body_part.clone().unwrap_or_else(|| "N/A".to_string()))}
                    </p>
                    <p class="flex items-center gap-2">
                        <Activity attr:class="h-3.5 w-3.5" />
                        "Result: "
                        <span class=result_class>{result_text(&record)}</span>
                    </p>
                    {outcome.severity.map(|severity| {
                        let has_scores = !severity.scores.is_empty();
                        view! {
                            <p class="flex items-center gap-2">
                                <Activity attr:class="h-3.5 w-3.5" />
                                "Severity: "
                                <SeverityBadge level=severity.level />
                            </p>
                            <Show when=move || has_scores>
                                <p class="font-medium mt-2">"Severity Breakdown:"</p>
                            </Show>
                            <ScoreBreakdown scores=severity.scores />
                        }
                    })}
                </div>
            </div>
        </div>
    }
}
