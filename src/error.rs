//! Error types for the build pipeline.
//!
//! Every stage of a build fails with one [`Error`] variant. The orchestrator
//! wraps it in a [`BuildError`] that also names the stage and the input path.

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// A failure inside one pipeline stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Source document missing or unreadable.
    #[error("cannot read `{}`: {cause}", path.display())]
    Read { path: PathBuf, cause: io::Error },

    /// Malformed front matter block.
    #[error("malformed front matter: {0}")]
    Parse(String),

    /// Structurally invalid markup.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Markup references a component the registry does not know.
    #[error("line {line}: unknown component `<{name}>`")]
    UnknownComponent { name: String, line: usize },

    /// Stylesheet source missing or the resolver failed.
    #[error("cannot resolve stylesheet `{}`: {message}", path.display())]
    StyleResolution { path: PathBuf, message: String },

    /// Output directory or artifact could not be written.
    #[error("cannot write `{}`: {cause}", path.display())]
    Write { path: PathBuf, cause: io::Error },
}

/// Markup compile failure with the 1-based line it was detected on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Pipeline stage, used to report where a build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Compile,
    Render,
    Style,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Compile => "compile",
            Self::Render => "render",
            Self::Style => "stylesheet",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// A failed build: the stage that failed, the document being built and why.
#[derive(Debug, Error)]
#[error("{stage} failed for `{}`", input.display())]
pub struct BuildError {
    pub stage: Stage,
    pub input: PathBuf,
    #[source]
    pub error: Error,
}

impl BuildError {
    /// One-line message including the underlying cause.
    pub fn report(&self) -> String {
        format!("{self}: {}", self.error)
    }
}
