use dermascope_shared::Patient;
use dermascope_shared::protocol::ListPatientsRequest;
use dermascope_shared::roster::{
    PAGE_SIZE, SortColumn, SortDirection, SortOrder, latest_test_label, paginate, sorted,
    toggle_sort,
};
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::RequestScope;
use crate::auth::use_auth;
use crate::components::icons::{AlertCircle, ChevronUpDown, FileText};
use crate::web::route::AppRoute;
use crate::web::router::Link;

const LOAD_FALLBACK: &str = "Failed to load patients. Please try again later.";

/// 医生面板：患者列表（可排序、分页）
#[component]
pub fn DoctorDashboardPage() -> impl IntoView {
    let auth = use_auth();
    let scope = RequestScope::new();

    let (patients, set_patients) = signal(Vec::<Patient>::new());
    let (is_loading, set_is_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (order, set_order) = signal(Option::<SortOrder>::None);
    let (page, set_page) = signal(1usize);

    let api = auth.api().scoped(&scope);
    spawn_local(async move {
        let outcome = api.fetch(&ListPatientsRequest).await;
        let _ = set_is_loading.try_set(false);
        match outcome {
            Ok(list) => {
                let _ = set_patients.try_set(list);
            }
            Err(e) => {
                warn!("[Doctor] Failed to load patients: {:?}", e);
                auth.handle_error(&e);
                let _ = set_error_msg.try_set(Some(e.user_message(LOAD_FALLBACK)));
            }
        }
    });

    let current_page = Memo::new(move |_| {
        let rows = patients.with(|p| sorted(p, order.get()));
        paginate(&rows, page.get(), PAGE_SIZE)
    });

    let on_sort = move |column: SortColumn| {
        set_order.update(|o| *o = toggle_sort(*o, column));
        set_page.set(1);
    };

    let sort_marker = move |column: SortColumn| match order.get() {
        Some(SortOrder { column: c, direction }) if c == column => match direction {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        },
        _ => "",
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 pt-24 md:pt-24 font-sans">
            <div class="max-w-7xl mx-auto space-y-6">
                <div>
                    <h1 class="text-3xl font-bold">"Patient Records"</h1>
                    <p class="text-base-content/70 mt-1">
                        {move || format!("You have access to {} patient records", patients.with(Vec::len))}
                    </p>
                </div>

                <Show when=move || error_msg.get().is_some()>
                    <div role="alert" class="alert alert-error">
                        <AlertCircle attr:class="h-5 w-5" />
                        <span>{move || error_msg.get().unwrap_or_default()}</span>
                    </div>
                </Show>

                <Show
                    when=move || !is_loading.get()
                    fallback=|| view! {
                        <div class="flex justify-center py-16">
                            <span class="loading loading-spinner loading-lg text-primary"></span>
                        </div>
                    }
                >
                    <div class="card bg-base-100 shadow-xl overflow-x-auto">
                        <table class="table">
                            <thead>
                                <tr>
                                    {SortColumn::ALL
                                        .into_iter()
                                        .map(|column| view! {
                                            <th>
                                                <button class="flex items-center gap-1" on:click=move |_| on_sort(column)>
                                                    {column.title()}
                                                    <ChevronUpDown attr:class="h-3 w-3 opacity-50" />
                                                    <span>{move || sort_marker(column)}</span>
                                                </button>
                                            </th>
                                        })
                                        .collect_view()}
                                    <th>"Actions"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || current_page.with(|p| p.items.is_empty())>
                                    <tr>
                                        <td colspan="5" class="text-center text-base-content/60 py-8">
                                            "No patients found"
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || current_page.get().items
                                    key=|p| p.id.clone()
                                    let:patient
                                >
                                    <tr class="hover">
                                        <td class="font-medium">{patient.full_name()}</td>
                                        <td>{patient.email.clone()}</td>
                                        <td>{patient.test_count}</td>
                                        <td>{latest_test_label(&patient)}</td>
                                        <td>
                                            <Link
                                                to=AppRoute::PatientResults(patient.id.clone())
                                                class="btn btn-ghost btn-xs text-primary"
                                            >
                                                <FileText attr:class="h-4 w-4" />
                                                "View History"
                                            </Link>
                                        </td>
                                    </tr>
                                </For>
                            </tbody>
                        </table>
                    </div>

                    <div class="flex items-center justify-between">
                        <span class="text-sm text-base-content/70">
                            {move || current_page.with(|p| format!("Page {} of {} · {} patients", p.number, p.total_pages, p.total_items))}
                        </span>
                        <div class="join">
                            <button
                                class="join-item btn btn-sm"
                                disabled=move || !current_page.with(|p| p.has_prev())
                                on:click=move |_| set_page.set(current_page.with_untracked(|p| p.number) - 1)
                            >
                                "Previous"
                            </button>
                            <button
                                class="join-item btn btn-sm"
                                disabled=move || !current_page.with(|p| p.has_next())
                                on:click=move |_| set_page.set(current_page.with_untracked(|p| p.number) + 1)
                            >
                                "Next"
                            </button>
                        </div>
                    </div>
                </Show>
            </div>
        </div>
    }
}
