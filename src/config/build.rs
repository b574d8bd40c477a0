//! `[build]` section configuration.
//!
//! Source document, output directory, minification and stylesheet settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in letterpress.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// input = "letters/hello.mdx"  # Source document
/// output = "dist"              # Output directory
/// minify = false               # Minify HTML
///
/// [build.css]
/// input = "src/styles/main.css"
///
/// [build.css.tailwind]
/// enable = true
/// command = ["npx", "tailwindcss"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source document (relative to project root).
    #[serde(default = "defaults::build::input")]
    #[educe(Default = defaults::build::input())]
    pub input: PathBuf,

    /// Output directory; the artifact is `<output>/<input stem>.html`.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Minify the assembled HTML.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Stylesheet settings.
    #[serde(default)]
    pub css: CssConfig,
}

/// `[build.css]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CssConfig {
    /// Stylesheet source file, inlined into every build.
    #[serde(default = "defaults::build::css::input")]
    #[educe(Default = defaults::build::css::input())]
    pub input: PathBuf,

    /// Run the source through the Tailwind CLI before inlining.
    #[serde(default)]
    pub tailwind: TailwindConfig,
}

/// `[build.css.tailwind]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TailwindConfig {
    /// Enable Tailwind CSS processing
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Tailwind command and arguments
    #[serde(default = "defaults::build::css::tailwind::command")]
    #[educe(Default = defaults::build::css::tailwind::command())]
    pub command: Vec<String>,
}
