//! 检测页面
//!
//! 三种检测共用同一个页面组件，流程状态全部由 `UploadFlow` 管理，
//! 这里只负责把浏览器事件转换为状态机调用并渲染结果。

use dermascope_shared::chart::detection_summary;
use dermascope_shared::upload::{
    FlowPhase, ImageMeta, SelectionSource, Stage, UploadFlow, validate_image,
};
use dermascope_shared::{BodyPart, ConditionKind, Pipeline, SeverityTone};
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::{File, HtmlInputElement, Url};

use crate::api::RequestScope;
use crate::auth::use_auth;
use crate::components::charts::{ConfidenceBar, ScoreBreakdown, SeverityBadge};
use crate::components::icons::{Activity, AlertCircle, CheckCircle, UploadCloud, X};

/// 已选择的图片：文件本身 + 预览用的 Object URL
#[derive(Clone)]
struct PickedImage {
    file: File,
    preview_url: String,
}

fn revoke(url: &str) {
    if !url.is_empty() {
        let _ = Url::revoke_object_url(url);
    }
}

#[component]
pub fn DetectionPage(condition: ConditionKind) -> impl IntoView {
    let auth = use_auth();
    let scope = RequestScope::new();
    let flow = RwSignal::new_local(UploadFlow::<PickedImage>::new(condition));

    // 卸载时释放预览 URL
    on_cleanup(move || {
        flow.try_with_untracked(|f| {
            if let Some(image) = f.image() {
                revoke(&image.handle.preview_url);
            }
        });
    });

    // =========================================================
    // 图片选择
    // =========================================================

    let accept = move |file: Option<File>, source: SelectionSource| {
        let Some(file) = file else {
            flow.update(|f| {
                f.select_nothing();
            });
            return;
        };
        let meta = ImageMeta {
            name: file.name(),
            mime_type: file.type_(),
            size: file.size() as u64,
        };
        // 只为通过校验的文件创建预览
        let preview_url = if validate_image(&meta).is_ok() {
            Url::create_object_url_with_blob(&file).unwrap_or_default()
        } else {
            String::new()
        };
        let previous = flow.with_untracked(|f| f.image().map(|i| i.handle.preview_url.clone()));
        let picked = PickedImage { file, preview_url };
        match flow.try_update(|f| f.select_image(meta, picked, source)) {
            Some(Ok(())) => {
                if let Some(url) = previous {
                    revoke(&url);
                }
            }
            Some(Err(e)) => warn!("[Detection] Rejected {:?} selection: {}", source, e),
            None => {}
        }
    };

    let on_file_change = move |ev: leptos::ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let file = input.files().and_then(|files| files.get(0));
        accept(file, SelectionSource::Picker);
        // 允许再次选择同一文件
        input.set_value("");
    };

    let on_drop = move |ev: leptos::ev::DragEvent| {
        ev.prevent_default();
        let file = ev
            .data_transfer()
            .and_then(|dt| dt.files())
            .and_then(|files| files.get(0));
        accept(file, SelectionSource::Drop);
    };

    let on_remove = move |_| {
        if let Some(Some(image)) = flow.try_update(|f| f.remove_image()) {
            revoke(&image.handle.preview_url);
        }
    };

    // =========================================================
    // 推理请求
    // =========================================================

    let run = move |stage: Stage| {
        let user = auth.user_untracked();
        let file = flow.with_untracked(|f| f.image().map(|i| i.handle.file.clone()));
        let submission = flow.try_update(|f| match stage {
            Stage::Detection => f.begin_detection(user.as_ref()),
            Stage::Severity => f.begin_assessment(),
        });
        let (Some(Ok(submission)), Some(file)) = (submission, file) else {
            return;
        };

        let api = auth.api().scoped(&scope);
        spawn_local(async move {
            let ticket = submission.ticket;
            let result = api.infer(&submission.call, &file).await;
            if let Err(e) = &result {
                warn!("[Detection] {:?} request failed: {:?}", ticket.stage(), e);
                auth.handle_error(e);
            }
            // 页面已卸载、请求已取消或图片已更换时丢弃
            match flow.try_update(|f| f.complete(ticket, result)) {
                Some(true) => {}
                _ => log!("[Detection] Discarded stale {:?} response", ticket.stage()),
            }
        });
    };

    let on_cancel = move |_| {
        if let Some(true) = flow.try_update(|f| f.cancel()) {
            log!("[Detection] Request cancelled by user");
        }
    };

    // =========================================================
    // 派生状态
    // =========================================================

    let preview = move || flow.with(|f| f.image().map(|i| i.handle.preview_url.clone()));
    let has_image = move || flow.with(|f| f.image().is_some());
    let is_busy = move || flow.with(|f| f.is_busy());
    let can_assess = move || flow.with(|f| f.can_assess());
    let error = move || flow.with(|f| f.error().map(str::to_string));
    let detection = move || flow.with(|f| f.detection().cloned());
    let severity = move || flow.with(|f| f.prediction().severity.clone());
    let scan_label = move || match flow.with(|f| f.phase()) {
        FlowPhase::AssessingSeverity => "Assessing Severity...".to_string(),
        _ => format!("Detecting {}...", condition.display_name()),
    };
    let staged = condition.pipeline() == Pipeline::Staged;

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 pt-24 md:pt-24 font-sans">
            <div class="max-w-xl mx-auto space-y-6">
                <div class="text-center">
                    <h1 class="text-2xl font-bold">
                        {if staged {
                            format!("{} Detection & Severity Assessment", condition.display_name())
                        } else {
                            format!("{} Detection", condition.display_name())
                        }}
                    </h1>
                    <p class="text-base-content/70 mt-1">
                        {format!("Upload an image for {} detection", condition.slug())}
                    </p>
                </div>

                // 上传区域
                <div
                    class="card bg-base-100 shadow-md"
                    on:drop=on_drop
                    on:dragover=move |ev: leptos::ev::DragEvent| ev.prevent_default()
                >
                    <div class="card-body">
                        <label
                            for="imageUpload"
                            class="border-2 border-dashed border-base-300 rounded-box p-6 text-center cursor-pointer hover:border-primary"
                        >
                            <UploadCloud attr:class="h-8 w-8 mx-auto text-base-content/50" />
                            <span class="block text-sm mt-2">"Choose or drag and drop an image"</span>
                            <span class="block text-xs text-base-content/50">
                                "Format: .jpg, .png & Max file size: 25 MB"
                            </span>
                        </label>
                        <input
                            id="imageUpload"
                            type="file"
                            accept="image/jpeg, image/png"
                            class="hidden"
                            on:change=on_file_change
                        />
                        <Show when=move || error().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <AlertCircle attr:class="h-5 w-5" />
                                <span>{move || error().unwrap_or_default()}</span>
                            </div>
                        </Show>
                    </div>
                </div>

                // 预览
                {move || preview().map(|url| view! {
                    <div class="relative">
                        <img src=url alt="Uploaded preview" class="rounded-box shadow-md w-full" />
                        <Show when=is_busy>
                            <div class="absolute inset-0 bg-info/10 rounded-box flex items-center justify-center">
                                <div class="bg-base-100/90 px-4 py-2 rounded-full flex items-center gap-2 text-info">
                                    <Activity attr:class="h-5 w-5 animate-pulse" />
                                    <span class="font-medium">{scan_label}</span>
                                </div>
                            </div>
                        </Show>
                        <button
                            class="btn btn-circle btn-error btn-xs absolute top-2 right-2"
                            aria-label="Remove image"
                            on:click=on_remove
                        >
                            <X attr:class="h-3 w-3" />
                        </button>
                    </div>
                })}

                // 身体部位
                <Show when=move || staged && has_image()>
                    <label class="form-control w-full">
                        <div class="label">
                            <span class="label-text">"Select Body Part"</span>
                        </div>
                        <select
                            class="select select-bordered"
                            prop:value=move || flow.with(|f| f.body_part().map(|p| p.as_str()).unwrap_or_default().to_string())
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                flow.update(|f| f.set_body_part(BodyPart::parse(&value)));
                            }
                        >
                            <option value="">"Select a body part"</option>
                            {BodyPart::ALL
                                .into_iter()
                                .map(|part| view! { <option value=part.as_str()>{part.as_str()}</option> })
                                .collect_view()}
                        </select>
                    </label>
                </Show>

                // 操作按钮
                <div class="flex justify-center gap-4">
                    <button
                        class="btn btn-primary"
                        disabled=move || !has_image() || is_busy()
                        on:click=move |_| run(Stage::Detection)
                    >
                        {format!("Detect {}", condition.display_name())}
                    </button>
                    <Show when=move || staged>
                        <button
                            class="btn btn-secondary"
                            disabled=move || !can_assess()
                            on:click=move |_| run(Stage::Severity)
                        >
                            "Assess Severity"
                        </button>
                    </Show>
                    <Show when=is_busy>
                        <button class="btn btn-ghost" on:click=on_cancel>"Cancel"</button>
                    </Show>
                </div>

                // 检测结果
                {move || detection().map(|d| {
                    let (tone, icon) = if d.is_detected {
                        (SeverityTone::Amber, view! { <AlertCircle attr:class="text-amber-500 w-6 h-6 mt-1" /> }.into_any())
                    } else {
                        (SeverityTone::Green, view! { <CheckCircle attr:class="text-green-500 w-6 h-6 mt-1" /> }.into_any())
                    };
                    view! {
                        <div class="card bg-base-100 shadow-lg">
                            <div class="card-body">
                                <div class="flex items-start gap-4">
                                    {icon}
                                    <div>
                                        <h3 class="card-title">"Detection Results"</h3>
                                        <p class="text-base-content/70">{detection_summary(condition, d.is_detected)}</p>
                                    </div>
                                </div>
                                <ConfidenceBar label="Confidence" value=d.confidence tone=tone />
                            </div>
                        </div>
                    }
                })}

                // 严重程度
                {move || severity().map(|s| {
                    let has_scores = !s.scores.is_empty();
                    let tone = s.level.tone();
                    view! {
                        <div class="card bg-base-100 shadow-lg">
                            <div class="card-body space-y-4">
                                <h3 class="card-title">"Severity Assessment"</h3>
                                <div class="flex items-center justify-between">
                                    <span class="text-base-content/70">"Severity Level"</span>
                                    <SeverityBadge level=s.level />
                                </div>
                                <ConfidenceBar label="Confidence" value=s.confidence tone=tone />
                                <Show when=move || has_scores>
                                    <h4 class="font-bold">"Detailed Analysis"</h4>
                                </Show>
                                <ScoreBreakdown scores=s.scores />
                            </div>
                        </div>
                    }
                })}
            </div>
        </div>
    }
}
