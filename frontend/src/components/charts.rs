//! 结果可视化组件：置信度条、等级徽章、SVG 折线图
//!
//! 所有数据映射（排序、序数、配色、坐标）都在 `dermascope_shared::chart` 中完成。

use dermascope_shared::chart::{ChartFrame, ChartPoint, active_levels, project, svg_path};
use dermascope_shared::{SeverityLevel, SeverityTone};
use leptos::prelude::*;

const CHART_WIDTH: f64 = 640.0;
const TREND_HEIGHT: f64 = 240.0;
const LEVEL_HEIGHT: f64 = 180.0;
const NEUTRAL_STROKE: &str = "#6366f1";

#[component]
pub fn SeverityBadge(level: SeverityLevel) -> impl IntoView {
    let class = format!("badge border-0 font-semibold {}", level.tone().badge_class());
    view! { <span class=class>{level.label().to_string()}</span> }
}

/// 水平进度条，`value` 为 0-100 的百分比
#[component]
pub fn ConfidenceBar(
    #[prop(into)] label: String,
    value: f64,
    tone: SeverityTone,
) -> impl IntoView {
    let width = format!("width: {:.1}%", value.clamp(0.0, 100.0));
    let bar = format!("h-2 rounded-full {}", tone.bar_class());
    view! {
        <div class="space-y-1">
            <div class="flex justify-between text-xs">
                <span>{label}</span>
                <span class="font-medium">{format!("{:.1}%", value)}</span>
            </div>
            <div class="w-full h-2 bg-base-300 rounded-full">
                <div class=bar style=width></div>
            </div>
        </div>
    }
}

/// 各等级得分分布
#[component]
pub fn ScoreBreakdown(scores: Vec<(SeverityLevel, f64)>) -> impl IntoView {
    view! {
        <div class="space-y-2">
            {scores
                .into_iter()
                .map(|(level, score)| {
                    let tone = level.tone();
                    view! { <ConfidenceBar label={level.label().to_string()} value=score tone=tone /> }
                })
                .collect_view()}
        </div>
    }
}

/// X 轴日期标签与网格
fn x_axis(points: &[ChartPoint], frame: &ChartFrame) -> impl IntoView + use<> {
    let count = points.len();
    let baseline = frame.y_for(frame.y_min);
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = frame.x_at(i, count);
            view! {
                <g>
                    <line x1=x y1={frame.padding} x2=x y2=baseline stroke="#e5e7eb" stroke-dasharray="3 3" />
                    <text x=x y={baseline + 18.0} font-size="11" text-anchor="middle" fill="#666">
                        {p.date_label.clone()}
                    </text>
                </g>
            }
        })
        .collect_view()
}

/// 单条折线及其数据点
fn series(values: &[Option<f64>], frame: &ChartFrame, color: &'static str) -> impl IntoView + use<> {
    let coords = project(values, frame);
    let d = svg_path(&coords);
    let dots = coords
        .into_iter()
        .flatten()
        .map(|(x, y)| view! { <circle cx=x cy=y r="4" fill=color /> })
        .collect_view();
    view! {
        <g>
            <path d=d fill="none" stroke=color stroke-width="2" />
            {dots}
        </g>
    }
}

/// 各等级得分随时间的变化（0-100%）
#[component]
pub fn ScoreTrendChart(points: Vec<ChartPoint>) -> impl IntoView {
    let frame = ChartFrame::percent(CHART_WIDTH, TREND_HEIGHT);
    let levels = active_levels(&points);

    let y_ticks = [0.0, 25.0, 50.0, 75.0, 100.0]
        .into_iter()
        .map(|v| {
            let y = frame.y_for(v);
            view! {
                <g>
                    <line x1={frame.padding} y1=y x2={CHART_WIDTH - frame.padding} y2=y stroke="#e5e7eb" />
                    <text x={frame.padding - 6.0} y={y + 4.0} font-size="11" text-anchor="end" fill="#666">
                        {format!("{}", v)}
                    </text>
                </g>
            }
        })
        .collect_view();

    let lines = levels
        .iter()
        .map(|level| {
            let values: Vec<Option<f64>> = points.iter().map(|p| p.score_for(level)).collect();
            series(&values, &frame, level.tone().hex())
        })
        .collect_view();

    let legend = levels
        .into_iter()
        .map(|level| {
            let style = format!("background-color: {}", level.tone().hex());
            view! {
                <span class="flex items-center gap-1 text-xs">
                    <span class="inline-block w-3 h-3 rounded-full" style=style></span>
                    {level.label().to_string()}
                </span>
            }
        })
        .collect_view();

    view! {
        <div class="w-full">
            <svg viewBox={format!("0 0 {} {}", CHART_WIDTH, TREND_HEIGHT)} class="w-full h-64">
                {y_ticks}
                {x_axis(&points, &frame)}
                {lines}
            </svg>
            <div class="flex flex-wrap justify-center gap-4 mt-2">{legend}</div>
        </div>
    }
}

/// 主等级序数随时间的变化
#[component]
pub fn PrimaryLevelChart(points: Vec<ChartPoint>) -> impl IntoView {
    let frame = ChartFrame::rank(CHART_WIDTH, LEVEL_HEIGHT);

    let y_ticks = SeverityLevel::KNOWN
        .into_iter()
        .map(|level| {
            let y = frame.y_for(f64::from(level.rank()));
            view! {
                <g>
                    <line x1={frame.padding} y1=y x2={CHART_WIDTH - frame.padding} y2=y stroke="#e5e7eb" />
                    <text x={frame.padding - 6.0} y={y + 4.0} font-size="11" text-anchor="end" fill="#666">
                        {level.label().to_string()}
                    </text>
                </g>
            }
        })
        .collect_view();

    let ranks: Vec<Option<f64>> = points.iter().map(|p| Some(f64::from(p.rank))).collect();
    let coords = project(&ranks, &frame);
    let d = svg_path(&coords);
    // 数据点按等级着色
    let dots = coords
        .into_iter()
        .zip(points.iter())
        .filter_map(|(coord, point)| coord.map(|(x, y)| (x, y, point.level.tone().hex())))
        .map(|(x, y, color)| view! { <circle cx=x cy=y r="5" fill=color /> })
        .collect_view();

    view! {
        <svg viewBox={format!("0 0 {} {}", CHART_WIDTH, LEVEL_HEIGHT)} class="w-full h-44">
            {y_ticks}
            {x_axis(&points, &frame)}
            <path d=d fill="none" stroke=NEUTRAL_STROKE stroke-width="2" />
            {dots}
        </svg>
    }
}
