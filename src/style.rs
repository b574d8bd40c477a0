//! Stylesheet resolution.
//!
//! The stylesheet is recomputed on every build so edits to the style source
//! (or to class names the utility compiler scans for) always show up.
//!
//! - [`RawStylesheet`]: inline the source file as is
//! - [`TailwindCli`]: run the Tailwind CLI over the source and inline the result

use crate::{config::ProjectConfig, error::Error, exec, utils::exec::FilterRule};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Tailwind filter: skip version banner and timing lines in output.
static TAILWIND_FILTER: FilterRule = FilterRule::new(&["≈ tailwindcss", "Done in"]);

/// Produces the final CSS text for one build.
pub trait StyleResolver: Send + Sync {
    fn resolve(&self) -> Result<String, Error>;

    /// Source file this resolver reads, watched for changes.
    fn source(&self) -> &Path;
}

/// Pick the resolver configured in `[build.css]`.
pub fn resolver_for(config: &ProjectConfig) -> Box<dyn StyleResolver> {
    let css = &config.build.css;
    if css.tailwind.enable {
        Box::new(TailwindCli {
            root: config.root.clone(),
            input: css.input.clone(),
            command: css.tailwind.command.clone(),
            minify: config.build.minify,
        })
    } else {
        Box::new(RawStylesheet::new(css.input.clone()))
    }
}

fn style_error(path: &Path, message: impl Into<String>) -> Error {
    Error::StyleResolution {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Reads the style source verbatim.
#[derive(Debug, Clone)]
pub struct RawStylesheet {
    input: PathBuf,
}

impl RawStylesheet {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl StyleResolver for RawStylesheet {
    fn resolve(&self) -> Result<String, Error> {
        fs::read_to_string(&self.input).map_err(|err| style_error(&self.input, err.to_string()))
    }

    fn source(&self) -> &Path {
        &self.input
    }
}

/// Compiles the style source with the Tailwind CLI.
#[derive(Debug, Clone)]
pub struct TailwindCli {
    pub root: PathBuf,
    pub input: PathBuf,
    pub command: Vec<String>,
    pub minify: bool,
}

impl StyleResolver for TailwindCli {
    fn resolve(&self) -> Result<String, Error> {
        if !self.input.is_file() {
            return Err(style_error(&self.input, "source file not found"));
        }

        let output = tempfile::Builder::new()
            .prefix("letterpress-")
            .suffix(".css")
            .tempfile()
            .map_err(|err| style_error(&self.input, err.to_string()))?;

        exec!(
            filter=&TAILWIND_FILTER;
            self.root.as_path();
            &self.command;
            "-i", &self.input, "-o", output.path(),
            if self.minify { "--minify" } else { "" }
        )
        .map_err(|err| style_error(&self.input, format!("{err:#}")))?;

        fs::read_to_string(output.path()).map_err(|err| style_error(&self.input, err.to_string()))
    }

    fn source(&self) -> &Path {
        &self.input
    }
}
