//! Source document reading.
//!
//! A source document is UTF-8 text with an optional front matter block
//! followed by the markup body:
//!
//! ```text
//! ---                    <- YAML front matter (`+++` for TOML)
//! title: Hello
//! author: Ada
//! ---
//! # Body markup
//! <Quote author="Ada">...</Quote>
//! ```

use crate::error::Error;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Front matter key → value. `None` marks a key that is present but empty.
pub type Metadata = BTreeMap<String, Option<String>>;

/// A source document split into metadata and body.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub metadata: Metadata,
    pub body: String,
}

impl SourceDocument {
    /// Read and split the document at `path`.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let source = fs::read_to_string(path).map_err(|cause| Error::Read {
            path: path.to_path_buf(),
            cause,
        })?;
        Self::parse(path, &source)
    }

    /// Split already loaded source text.
    pub fn parse(path: &Path, source: &str) -> Result<Self, Error> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let (metadata, body) = match detect_front_matter(source)? {
            Some((FrontMatter::Yaml, block, body)) => (parse_yaml(block)?, body),
            Some((FrontMatter::Toml, block, body)) => (parse_toml(block)?, body),
            None => (Metadata::new(), source),
        };

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            body: body.to_owned(),
        })
    }

    /// Metadata value for `key`, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Option::as_deref)
            .filter(|value| !value.trim().is_empty())
    }

    /// Document title: the `title` metadata, else the file's base name.
    pub fn title(&self) -> String {
        self.get("title")
            .map_or_else(|| file_stem(&self.path), str::to_owned)
    }
}

/// Base file name without extension (`letters/hello.mdx` → `hello`).
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Front matter detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrontMatter {
    Yaml,
    Toml,
}

/// Find a leading front matter block.
///
/// Returns `(format, block, body)`; fails if the opening fence is never closed.
fn detect_front_matter(source: &str) -> Result<Option<(FrontMatter, &str, &str)>, Error> {
    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };

    let fence = first.trim_end();
    let format = match fence {
        "---" => FrontMatter::Yaml,
        "+++" => FrontMatter::Toml,
        _ => return Ok(None),
    };

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == fence {
            let block = &source[start..offset];
            let body = &source[offset + line.len()..];
            return Ok(Some((format, block, body)));
        }
        offset += line.len();
    }

    Err(Error::Parse(format!(
        "block opened with `{fence}` is never closed"
    )))
}

// ============================================================================
// YAML
// ============================================================================

fn parse_yaml(block: &str) -> Result<Metadata, Error> {
    use serde_yaml::Value;

    if block.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: Value = serde_yaml::from_str(block).map_err(|e| Error::Parse(e.to_string()))?;
    match value {
        Value::Null => Ok(Metadata::new()),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(key, value)| Ok((yaml_key(key)?, yaml_text(value))))
            .collect(),
        _ => Err(Error::Parse("expected key/value pairs".into())),
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, Error> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::Parse(format!("unsupported key `{other:?}`"))),
    }
}

fn yaml_text(value: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s),
        Value::Sequence(items) => Some(
            items
                .into_iter()
                .filter_map(yaml_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Tagged(tagged) => yaml_text(tagged.value),
        map @ Value::Mapping(_) => serde_json::to_string(&map).ok(),
    }
}

// ============================================================================
// TOML
// ============================================================================

fn parse_toml(block: &str) -> Result<Metadata, Error> {
    let table: toml::Table = toml::from_str(block).map_err(|e| Error::Parse(e.to_string()))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_text(value)))
        .collect())
}

fn toml_text(value: toml::Value) -> Option<String> {
    use toml::Value;

    match value {
        Value::String(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(toml_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        table @ Value::Table(_) => serde_json::to_string(&table).ok(),
    }
}
