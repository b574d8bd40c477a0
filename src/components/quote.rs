use crate::markup::{Component, Props, prop_text};
use maud::{PreEscaped, html};

/// Block quotation with an optional citation footer.
///
/// Props: `author`, `source`, `year`, `link` (makes `source` a link).
/// The footer only appears when `author` or `source` is set.
pub struct Quote;

impl Component for Quote {
    fn render(&self, props: &Props, children: &str) -> String {
        let author = prop_text(props, "author");
        let source = prop_text(props, "source");
        let year = prop_text(props, "year");
        let link = prop_text(props, "link");

        html! {
            blockquote class="border-l-4 border-blue-500 pl-6 py-4 my-6 bg-blue-50 italic" {
                div class="text-gray-800 text-lg leading-relaxed" {
                    (PreEscaped(children))
                }
                @if author.is_some() || source.is_some() {
                    footer class="mt-3 text-sm text-gray-600 not-italic" {
                        cite {
                            @if let Some(author) = &author {
                                span class="font-medium" { (author) }
                            }
                            @if let Some(source) = &source {
                                @if author.is_some() { ", " }
                                @if let Some(link) = &link {
                                    a href=(link) class="text-blue-600 hover:underline" { (source) }
                                } @else {
                                    span { (source) }
                                }
                            }
                            @if let Some(year) = &year {
                                span { " (" (year) ")" }
                            }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}
