//! Project configuration management for `letterpress.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `[build]`    | Source document, output directory, stylesheet   |
//! | `[document]` | Page language and surfaced front matter fields  |
//! | `[serve]`    | Live server and watch loop                      |
//!
//! # Example
//!
//! ```toml
//! [build]
//! input = "example.mdx"
//! output = "dist"
//!
//! [build.css]
//! input = "src/styles/main.css"
//!
//! [serve]
//! port = 3000
//! poll_interval_ms = 1000
//! ```
//!
//! The config file is optional. Without it every field takes its default.

mod build;
pub mod defaults;
mod document;
mod error;
mod serve;

pub use build::BuildConfig;
pub use document::DocumentConfig;
pub use error::ConfigError;
pub use serve::ServeConfig;

use crate::cli::{Cli, Commands, DEFAULT_CONFIG};
use crate::document::file_stem;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

// ============================================================================
// Configuration Structure
// ============================================================================

/// Root configuration structure representing letterpress.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Page assembly settings
    #[serde(default)]
    pub document: DocumentConfig,

    /// Live server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl ProjectConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in `{}`", path.display()))
    }

    /// Load, merge with CLI arguments, and validate.
    ///
    /// Only the default config file may be absent; an explicitly named one
    /// that does not exist is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);
        let explicit = cli.config != Path::new(DEFAULT_CONFIG);

        let mut config = if explicit || config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.input, cli.input.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        if let Some(args) = cli.build_args() {
            Self::update_option(&mut self.build.minify, args.minify.as_ref());
        }

        if let Some(Commands::Watch {
            interface, port, ..
        }) = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }

        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.update_path_with_root(root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against the root and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);

        self.build.input = Self::normalize_path(&root.join(&self.build.input));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.css.input = Self::normalize_path(&root.join(&self.build.css.input));
        self.root = root;
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// File name of the build artifact, `<input stem>.html`.
    pub fn artifact_name(&self) -> String {
        format!("{}.html", file_stem(&self.build.input))
    }

    /// Full path of the build artifact.
    pub fn output_path(&self) -> PathBuf {
        self.build.output.join(self.artifact_name())
    }

    /// Validate configuration values that serde cannot check.
    ///
    /// Missing input files are not an error here; they surface as a
    /// failed build so the watch loop can recover once they appear.
    pub fn validate(&self) -> Result<()> {
        if self.serve.interface.parse::<IpAddr>().is_err() {
            bail!(ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.serve.interface
            )));
        }

        if self.serve.poll_interval_ms == 0 {
            bail!(ConfigError::Validation(
                "[serve.poll_interval_ms] must be greater than zero".into()
            ));
        }

        if self.build.css.tailwind.enable {
            Self::check_command_installed(
                "[build.css.tailwind.command]",
                &self.build.css.tailwind.command,
            )?;
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
