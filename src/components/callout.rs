use crate::markup::{Component, Props, prop_text};
use maud::{PreEscaped, html};

/// Highlighted note box. Props: `type` (`info`, `warning`, `error`,
/// `success`; anything else is `info`) and an optional `title`.
pub struct Callout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Info,
    Warning,
    Error,
    Success,
}

impl Kind {
    fn from_prop(value: Option<&str>) -> Self {
        match value {
            Some("warning") => Self::Warning,
            Some("error") => Self::Error,
            Some("success") => Self::Success,
            _ => Self::Info,
        }
    }

    const fn classes(self) -> &'static str {
        match self {
            Self::Info => "border-blue-500 bg-blue-50 text-blue-900",
            Self::Warning => "border-yellow-500 bg-yellow-50 text-yellow-900",
            Self::Error => "border-red-500 bg-red-50 text-red-900",
            Self::Success => "border-green-500 bg-green-50 text-green-900",
        }
    }

    const fn icon(self) -> &'static str {
        match self {
            Self::Info => "🛈",
            Self::Warning => "⚠️",
            Self::Error => "❌",
            Self::Success => "✅",
        }
    }
}

impl Component for Callout {
    fn render(&self, props: &Props, children: &str) -> String {
        let kind = Kind::from_prop(prop_text(props, "type").as_deref());
        let title = prop_text(props, "title");

        html! {
            div class={ "border-l-4 p-4 my-6 rounded-r-lg " (kind.classes()) } {
                @if let Some(title) = &title {
                    div class="flex items-center mb-2" {
                        span class="mr-2 text-lg" { (kind.icon()) }
                        h4 class="font-semibold text-base" { (title) }
                    }
                }
                div class="prose prose-sm max-w-none" {
                    (PreEscaped(children))
                }
            }
        }
        .into_string()
    }
}
