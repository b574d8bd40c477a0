//! Markup compilation: body text → [`Program`].
//!
//! The body is markdown that may embed components and expressions:
//!
//! ```text
//! Dear reader,
//!
//! <Quote author="Ada" year={1843}>
//! The engine *weaves* algebraic patterns.
//! </Quote>
//!
//! {/* comments render as nothing */}
//! ```
//!
//! Component tags start with an uppercase letter; lowercase tags are plain
//! HTML and stay in the markdown. Expressions are JSON literals or comments.
//! Fenced code blocks and code spans are copied verbatim.

use super::registry::Props;
use crate::error::CompileError;
use serde_json::Value;

/// Compiled markup, ready to be executed against a component registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Markdown source, rendered as-is.
    Markdown(String),
    /// Text produced by an expression, escaped on output.
    Text(String),
    /// Component invocation.
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub props: Props,
    pub children: Vec<Node>,
    /// Children were written on the opening tag's line.
    pub inline: bool,
    /// Line of the opening tag.
    pub line: usize,
}

/// Compile body text into a [`Program`].
pub fn compile(body: &str) -> Result<Program> {
    let mut parser = Parser::new(body);
    let (nodes, _) = parser.nodes(None)?;
    Ok(Program { nodes })
}

type Result<T> = std::result::Result<T, CompileError>;

/// Open component being parsed: its name and opening line.
type OpenTag<'a> = (&'a str, usize);

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    // ------------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------------

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.src.as_bytes()[self.pos - 1] == b'\n'
    }

    /// Advance past `len` bytes, counting newlines.
    fn advance(&mut self, len: usize) -> &'a str {
        let taken = &self.src[self.pos..self.pos + len];
        self.line += taken.matches('\n').count();
        self.pos += len;
        taken
    }

    fn skip_whitespace(&mut self) {
        let len = self.rest().len() - self.rest().trim_start().len();
        self.advance(len);
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.line, message)
    }

    // ------------------------------------------------------------------------
    // Flow content
    // ------------------------------------------------------------------------

    /// Parse nodes until end of input or the closing tag of `open`.
    ///
    /// Returns the nodes and the byte offset where the closing tag starts.
    fn nodes(&mut self, open: Option<OpenTag<'a>>) -> Result<(Vec<Node>, usize)> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            if self.pos >= self.src.len() {
                if let Some((name, line)) = open {
                    return Err(self.error(format!(
                        "unclosed component `<{name}>` opened on line {line}"
                    )));
                }
                flush(&mut nodes, &mut text);
                return Ok((nodes, self.pos));
            }

            if self.at_line_start()
                && let Some(len) = self.code_fence_len()
            {
                text.push_str(self.advance(len));
                continue;
            }

            let Some(c) = self.peek() else { break };
            match c {
                '`' => {
                    let len = self.code_span_len();
                    text.push_str(self.advance(len));
                }
                '\\' => {
                    let len = 1 + self.rest()[1..].chars().next().map_or(0, char::len_utf8);
                    text.push_str(self.advance(len));
                }
                '<' if self.peek_at(1) == Some(b'/')
                    && self.peek_at(2).is_some_and(|b| b.is_ascii_uppercase()) =>
                {
                    let close_start = self.pos;
                    let name = self.closing_tag()?;
                    return match open {
                        Some((open_name, _)) if open_name == name => {
                            flush(&mut nodes, &mut text);
                            Ok((nodes, close_start))
                        }
                        Some((open_name, line)) => Err(self.error(format!(
                            "expected `</{open_name}>` to close line {line}, found `</{name}>`"
                        ))),
                        None => Err(self.error(format!("unexpected closing tag `</{name}>`"))),
                    };
                }
                '<' if self.peek_at(1).is_some_and(|b| b.is_ascii_uppercase()) => {
                    flush(&mut nodes, &mut text);
                    let element = self.element()?;
                    nodes.push(Node::Element(element));
                }
                '{' => {
                    let inner = self.expression()?;
                    if let Some(value) = evaluate(inner).map_err(|msg| self.error(msg))? {
                        flush(&mut nodes, &mut text);
                        nodes.push(Node::Text(value_text(value)));
                    }
                }
                c => {
                    text.push_str(self.advance(c.len_utf8()));
                }
            }
        }

        flush(&mut nodes, &mut text);
        Ok((nodes, self.pos))
    }

    /// Length of a fenced code block starting at the current line, if any.
    ///
    /// An unclosed fence runs to the end of input, as in CommonMark.
    fn code_fence_len(&self) -> Option<usize> {
        let rest = self.rest();
        let indent = rest.len() - rest.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }

        let marker = rest[indent..].chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let fence = rest[indent..].len() - rest[indent..].trim_start_matches(marker).len();
        if fence < 3 {
            return None;
        }

        let mut offset = rest.find('\n').map_or(rest.len(), |i| i + 1);
        while offset < rest.len() {
            let line_end = rest[offset..]
                .find('\n')
                .map_or(rest.len(), |i| offset + i + 1);
            let trimmed = rest[offset..line_end].trim();
            let run = trimmed.len() - trimmed.trim_start_matches(marker).len();
            if run >= fence && trimmed[run..].is_empty() {
                return Some(line_end);
            }
            offset = line_end;
        }
        Some(rest.len())
    }

    /// Length of the code span (or lone backtick run) at the cursor.
    fn code_span_len(&self) -> usize {
        let rest = self.rest();
        let ticks = rest.len() - rest.trim_start_matches('`').len();
        let mut search = ticks;

        while let Some(found) = rest[search..].find('`') {
            let start = search + found;
            let run = rest[start..].len() - rest[start..].trim_start_matches('`').len();
            if run == ticks {
                return start + run;
            }
            search = start + run;
        }
        ticks
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    fn identifier(&mut self, extra: &[u8]) -> &'a str {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || extra.contains(b))
            .count();
        self.advance(len)
    }

    /// Parse `</Name>` and return the name.
    fn closing_tag(&mut self) -> Result<&'a str> {
        self.advance(2);
        let name = self.identifier(b"_.");
        self.skip_whitespace();
        if self.peek() != Some('>') {
            return Err(self.error(format!("unterminated closing tag `</{name}`")));
        }
        self.advance(1);
        Ok(name)
    }

    /// Parse a component element starting at `<`.
    fn element(&mut self) -> Result<Element> {
        let line = self.line;
        self.advance(1);
        let name = self.identifier(b"_.");
        let mut props = Props::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(self.error(format!("unterminated tag `<{name}` opened on line {line}")));
                }
                Some('/') if self.peek_at(1) == Some(b'>') => {
                    self.advance(2);
                    return Ok(Element {
                        name: name.to_owned(),
                        props,
                        children: Vec::new(),
                        inline: true,
                        line,
                    });
                }
                Some('>') => {
                    self.advance(1);
                    break;
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    let key = self.identifier(b"_-:.");
                    let value = self.attribute_value(key)?;
                    props.insert(key.to_owned(), value);
                }
                Some(c) => {
                    return Err(self.error(format!("unexpected `{c}` in tag `<{name}>`")));
                }
            }
        }

        let children_start = self.pos;
        let (children, close_start) = self.nodes(Some((name, line)))?;
        let inline = !self.src[children_start..close_start].contains('\n');

        Ok(Element {
            name: name.to_owned(),
            props,
            children,
            inline,
            line,
        })
    }

    /// Parse `="text"`, `='text'`, `={expr}` or nothing (boolean `true`).
    fn attribute_value(&mut self, key: &str) -> Result<Value> {
        let rest = self.rest();
        let after_ws = rest.trim_start();
        if !after_ws.starts_with('=') {
            return Ok(Value::Bool(true));
        }
        self.advance(rest.len() - after_ws.len() + 1);
        self.skip_whitespace();

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let Some(end) = self.rest()[1..].find(quote) else {
                    return Err(self.error(format!("unterminated value for attribute `{key}`")));
                };
                let value = self.advance(end + 2);
                Ok(Value::String(value[1..value.len() - 1].to_owned()))
            }
            Some('{') => {
                let inner = self.expression()?;
                match evaluate(inner).map_err(|msg| self.error(msg))? {
                    Some(value) => Ok(value),
                    None => Err(self.error(format!("attribute `{key}` has no value"))),
                }
            }
            _ => Err(self.error(format!("expected a value for attribute `{key}`"))),
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Consume a `{...}` expression and return its inner source.
    ///
    /// Braces inside string literals and comments do not count.
    fn expression(&mut self) -> Result<&'a str> {
        let line = self.line;
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance(i + 1);
                        return Ok(&rest[1..i]);
                    }
                }
                b'"' => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b'"' {
                        i += if bytes[i] == b'\\' { 2 } else { 1 };
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => match rest[i + 2..].find("*/") {
                    Some(end) => i += end + 3,
                    None => break,
                },
                _ => {}
            }
            i += 1;
        }

        Err(CompileError::new(line, "unterminated expression `{`"))
    }
}

fn flush(nodes: &mut Vec<Node>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(Node::Markdown(std::mem::take(text)));
    }
}

/// Evaluate expression source. `Ok(None)` for comments.
fn evaluate(source: &str) -> std::result::Result<Option<Value>, String> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err("empty expression `{}`".into());
    }
    if let Some(comment) = trimmed.strip_prefix("/*").and_then(|s| s.strip_suffix("*/"))
        && !comment.contains("*/")
    {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("malformed expression `{{{trimmed}}}`: {e}"))
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
