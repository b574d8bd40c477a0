//! Program execution: [`Program`] + [`ComponentRegistry`] → HTML fragment.
//!
//! Markdown runs through pulldown-cmark once per nesting level. Components
//! and expression text are rendered separately and stand in the markdown as
//! `U+E000 N U+E001` placeholders. Private-use characters are plain text to
//! the markdown renderer, so a placeholder at the start of a line still joins
//! its paragraph and the inline markdown around it is rendered.
//!
//! A component that fills a paragraph on its own is substituted without the
//! `<p>` wrapper, since it renders block content.

use super::{
    parse::{Node, Program},
    registry::ComponentRegistry,
};
use crate::error::Error;
use pulldown_cmark::{Options, Parser, html};

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Rendered component or expression waiting for its placeholder.
struct Fragment {
    html: String,
    /// May replace a paragraph that holds nothing else.
    block: bool,
}

/// Execute `program`, resolving every component through `registry`.
pub fn execute(program: &Program, registry: &ComponentRegistry) -> Result<String, Error> {
    render_nodes(&program.nodes, registry, false)
}

fn render_nodes(nodes: &[Node], registry: &ComponentRegistry, inline: bool) -> Result<String, Error> {
    let mut markdown = String::new();
    let mut fragments = Vec::new();

    for node in nodes {
        match node {
            Node::Markdown(text) => markdown.push_str(text),
            Node::Text(text) => {
                push_placeholder(&mut markdown, fragments.len());
                fragments.push(Fragment {
                    html: maud::html! { (text) }.into_string(),
                    block: false,
                });
            }
            Node::Element(element) => {
                let component = registry
                    .get(&element.name)
                    .ok_or_else(|| Error::UnknownComponent {
                        name: element.name.clone(),
                        line: element.line,
                    })?;
                let children = render_nodes(&element.children, registry, element.inline)?;

                // Multi-line components opened at line start are flow content.
                let flow = !element.inline && (markdown.is_empty() || markdown.ends_with('\n'));
                if flow && !markdown.is_empty() && !markdown.ends_with("\n\n") {
                    markdown.push('\n');
                }
                push_placeholder(&mut markdown, fragments.len());
                if flow {
                    markdown.push_str("\n\n");
                }
                fragments.push(Fragment {
                    html: component.render(&element.props, &children),
                    block: true,
                });
            }
        }
    }

    let rendered = markdown_to_html(&markdown);
    let rendered = if inline {
        unwrap_paragraph(&rendered)
    } else {
        rendered.as_str()
    };

    Ok(substitute(rendered, &fragments))
}

fn push_placeholder(markdown: &mut String, index: usize) {
    markdown.push(PLACEHOLDER_OPEN);
    markdown.push_str(&index.to_string());
    markdown.push(PLACEHOLDER_CLOSE);
}

fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Strip the `<p>` wrapper around single-line content.
fn unwrap_paragraph(html: &str) -> &str {
    let trimmed = html.trim();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|inner| inner.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner,
        _ => trimmed,
    }
}

/// Replace placeholders with their rendered fragments.
///
/// Unknown indices are left as they are.
fn substitute(html: &str, fragments: &[Fragment]) -> String {
    if fragments.is_empty() {
        return html.to_owned();
    }

    let size = fragments.iter().map(|f| f.html.len()).sum::<usize>();
    let mut out = String::with_capacity(html.len() + size);
    let mut rest = html;

    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + PLACEHOLDER_OPEN.len_utf8()..];

        let found = after.find(PLACEHOLDER_CLOSE).and_then(|end| {
            let index: usize = after[..end].parse().ok()?;
            let tail = &after[end + PLACEHOLDER_CLOSE.len_utf8()..];
            Some((fragments.get(index)?, tail))
        });

        let Some((fragment, tail)) = found else {
            out.push(PLACEHOLDER_OPEN);
            rest = after;
            continue;
        };

        let standalone = fragment.block && out.ends_with("<p>") && tail.starts_with("</p>");
        if standalone {
            out.truncate(out.len() - "<p>".len());
            out.push_str(&fragment.html);
            rest = &tail["</p>".len()..];
        } else {
            out.push_str(&fragment.html);
            rest = tail;
        }
    }

    out.push_str(rest);
    out
}
