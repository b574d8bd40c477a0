//! Page assembly.
//!
//! Fills the embedded document template with the title, inlined stylesheet,
//! surfaced metadata and rendered fragment. In watch mode the staleness
//! poller is injected into the head.

use maud::{Markup, html};
use std::time::Duration;

/// Document shell, loaded from `src/embed/document.html` at compile time.
const DOCUMENT_TEMPLATE: &str = include_str!("embed/document.html");

/// Staleness poller, loaded from `src/embed/reload.js` at compile time.
const RELOAD_SCRIPT: &str = include_str!("embed/reload.js");

const POLL_INTERVAL_MARKER: &str = "__POLL_INTERVAL_MS__";

/// Everything the assembler needs for one page.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub lang: &'a str,
    pub title: &'a str,
    pub css: &'a str,
    pub fragment: &'a str,
    /// Surfaced front matter fields, in display order.
    pub meta: Vec<(&'a str, &'a str)>,
    /// Poll interval of the live-reload script; `None` omits it.
    pub live_reload: Option<Duration>,
}

/// Assemble a complete HTML document.
pub fn assemble(page: &Page<'_>) -> String {
    let title = html! { (page.title) }.into_string();
    let lang = html! { (page.lang) }.into_string();
    let meta = meta_tags(&page.meta).into_string();
    let header = letter_header(page).map(Markup::into_string).unwrap_or_default();
    let reload = page.live_reload.map(reload_script).unwrap_or_default();

    render_template(
        DOCUMENT_TEMPLATE,
        &[
            ("lang", &lang),
            ("title", &title),
            ("meta", &meta),
            ("css", page.css),
            ("reload", &reload),
            ("header", &header),
            ("content", page.fragment),
        ],
    )
}

fn meta_tags(meta: &[(&str, &str)]) -> Markup {
    html! {
        @for (name, content) in meta {
            "  " meta name=(name) content=(content);
            "\n"
        }
    }
}

/// Visible title and byline, only when some metadata is surfaced.
fn letter_header(page: &Page<'_>) -> Option<Markup> {
    if page.meta.is_empty() {
        return None;
    }

    let field = |key: &str| {
        page.meta
            .iter()
            .find_map(|(name, value)| (*name == key).then_some(*value))
    };
    let author = field("author");
    let date = field("date");
    let rest = page
        .meta
        .iter()
        .filter(|(name, _)| !matches!(*name, "author" | "date"));

    Some(html! {
        header class="letter-header" {
            h1 class="letter-title" { (page.title) }
            @if author.is_some() || date.is_some() {
                p class="letter-byline" {
                    @if let Some(author) = author { span class="letter-author" { (author) } }
                    @if author.is_some() && date.is_some() { " · " }
                    @if let Some(date) = date { time class="letter-date" { (date) } }
                }
            }
            @for (name, value) in rest {
                p class={ "letter-" (name) } { (value) }
            }
        }
        "\n"
    })
}

fn reload_script(interval: Duration) -> String {
    let script = RELOAD_SCRIPT.replace(POLL_INTERVAL_MARKER, &interval.as_millis().to_string());
    format!("  <script>\n{script}  </script>\n")
}

/// Replace `{key}` placeholders in a single pass.
///
/// Substituted values are never scanned again, so braces inside the CSS or
/// the fragment are left alone. Unknown `{...}` sequences are kept verbatim.
fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>() -> Page<'a> {
        Page {
            lang: "en",
            title: "example",
            css: "body { color: red; }",
            fragment: "<p>Hello</p>",
            meta: vec![],
            live_reload: None,
        }
    }

    #[test]
    fn test_assemble_basic_document() {
        let html = assemble(&page());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("<title>example</title>"));
        assert!(html.contains("<style>\nbody { color: red; }\n  </style>"));
        assert!(html.contains("<main class=\"letter-content\">\n<p>Hello</p>"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("letter-header"));
    }

    #[test]
    fn test_assemble_is_byte_stable() {
        assert_eq!(assemble(&page()), assemble(&page()));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut page = page();
        page.title = "Fish & <Chips>";
        let html = assemble(&page);

        assert!(html.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn test_fragment_braces_are_not_placeholders() {
        let mut page = page();
        page.fragment = "<p>{title} and {css}</p>";
        page.css = ".a { } /* {content} */";
        let html = assemble(&page);

        assert!(html.contains("<p>{title} and {css}</p>"));
        assert!(html.contains(".a { } /* {content} */"));
    }

    #[test]
    fn test_live_reload_script() {
        let mut page = page();
        page.live_reload = Some(Duration::from_millis(750));
        let html = assemble(&page);

        assert!(html.contains("<script>"));
        assert!(html.contains("})(750);"));
        assert!(html.contains("method: \"HEAD\""));
        assert!(html.contains("cache: \"no-store\""));
        assert!(html.contains("Last-Modified"));
        assert!(!html.contains(POLL_INTERVAL_MARKER));
    }

    #[test]
    fn test_meta_tags_and_header() {
        let mut page = page();
        page.title = "Dear Reader";
        page.meta = vec![("author", "Ada \"A\" L."), ("date", "2024-05-01"), ("description", "A note")];
        let html = assemble(&page);

        assert!(html.contains("<meta name=\"author\" content=\"Ada &quot;A&quot; L.\">"));
        assert!(html.contains("<meta name=\"description\" content=\"A note\">"));
        assert!(html.contains("<header class=\"letter-header\">"));
        assert!(html.contains("<h1 class=\"letter-title\">Dear Reader</h1>"));
        assert!(html.contains("<span class=\"letter-author\">Ada &quot;A&quot; L.</span> · <time class=\"letter-date\">2024-05-01</time>"));
        assert!(html.contains("<p class=\"letter-description\">A note</p>"));
    }

    #[test]
    fn test_header_without_byline() {
        let mut page = page();
        page.meta = vec![("description", "Only this")];
        let html = assemble(&page);

        assert!(html.contains("letter-header"));
        assert!(!html.contains("letter-byline"));
    }

    #[test]
    fn test_render_template_single_pass() {
        let out = render_template("{a}-{b}-{c}", &[("a", "{b}"), ("b", "2")]);
        assert_eq!(out, "{b}-2-{c}");

        assert_eq!(render_template("{unclosed", &[("unclosed", "x")]), "{unclosed");
    }
}
