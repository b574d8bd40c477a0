//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "letterpress.toml";

/// Letterpress single-document builder CLI
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: letterpress.toml)
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Source document path (relative to project root)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// subcommands, `build` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Shared build arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the document once and exit
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, serve, and rebuild on every change to the document or stylesheet
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Some(Commands::Watch { .. }))
    }

    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Some(Commands::Build { build_args } | Commands::Watch { build_args, .. }) => {
                Some(build_args)
            }
            None => None,
        }
    }
}
