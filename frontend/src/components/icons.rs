//! 内联 SVG 图标（Lucide 风格），通过 `attr:class` 控制尺寸与颜色

use leptos::prelude::*;

macro_rules! icon {
    ($name:ident, $($path:literal),+ $(,)?) => {
        #[component]
        pub fn $name() -> impl IntoView {
            view! {
                <svg
                    xmlns="http://www.w3.org/2000/svg"
                    viewBox="0 0 24 24"
                    fill="none"
                    stroke="currentColor"
                    stroke-width="2"
                    stroke-linecap="round"
                    stroke-linejoin="round"
                >
                    $(<path d=$path />)+
                </svg>
            }
        }
    };
}

icon!(Activity, "M22 12h-4l-3 9L9 3l-3 9H2");
icon!(
    AlertCircle,
    "M12 22a10 10 0 1 0 0-20 10 10 0 0 0 0 20z",
    "M12 8v4",
    "M12 16h.01"
);
icon!(
    CheckCircle,
    "M22 11.08V12a10 10 0 1 1-5.93-9.14",
    "M22 4 12 14.01l-3-3"
);
icon!(ArrowLeft, "m12 19-7-7 7-7", "M19 12H5");
icon!(
    UploadCloud,
    "M4 14.9A7 7 0 1 1 15.7 8h1.8a4.5 4.5 0 0 1 2.5 8.2",
    "M12 12v9",
    "m16 16-4-4-4 4"
);
icon!(X, "M18 6 6 18", "m6 6 12 12");
icon!(
    LogOut,
    "M9 21H5a2 2 0 0 1-2-2V5a2 2 0 0 1 2-2h4",
    "m16 17 5-5-5-5",
    "M21 12H9"
);
icon!(Menu, "M4 6h16", "M4 12h16", "M4 18h16");
icon!(
    Mail,
    "M4 4h16a2 2 0 0 1 2 2v12a2 2 0 0 1-2 2H4a2 2 0 0 1-2-2V6a2 2 0 0 1 2-2z",
    "m22 6-10 7L2 6"
);
icon!(
    FileText,
    "M14 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V8z",
    "M14 2v6h6",
    "M16 13H8",
    "M16 17H8"
);
icon!(
    Calendar,
    "M19 4H5a2 2 0 0 0-2 2v14a2 2 0 0 0 2 2h14a2 2 0 0 0 2-2V6a2 2 0 0 0-2-2z",
    "M16 2v4",
    "M8 2v4",
    "M3 10h18"
);
icon!(
    User,
    "M19 21v-2a4 4 0 0 0-4-4H9a4 4 0 0 0-4 4v2",
    "M12 11a4 4 0 1 0 0-8 4 4 0 0 0 0 8z"
);
icon!(
    Stethoscope,
    "M4.8 2.3A.3.3 0 1 0 5 2H4a2 2 0 0 0-2 2v5a6 6 0 0 0 6 6 6 6 0 0 0 6-6V4a2 2 0 0 0-2-2h-1a.2.2 0 1 0 .3.3",
    "M8 15v1a6 6 0 0 0 6 6 6 6 0 0 0 6-6v-4",
    "M20 10a2 2 0 1 0 0-4 2 2 0 0 0 0 4z"
);
icon!(
    ChevronUpDown,
    "m7 15 5 5 5-5",
    "m7 9 5-5 5 5"
);
