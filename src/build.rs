//! Build orchestration.
//!
//! One build runs every stage in order:
//!
//! ```text
//! read → compile → render → stylesheet → assemble → write
//! ```
//!
//! The first failing stage stops the build and is reported as a
//! [`BuildError`]. Nothing is cached between builds and nothing is written
//! unless every earlier stage succeeded.

use crate::{
    assemble::{Page, assemble},
    config::ProjectConfig,
    document::SourceDocument,
    error::{BuildError, Error, Stage},
    markup::{self, ComponentRegistry},
    output::write_atomic,
    style::StyleResolver,
    utils::minify::minify_html,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Per-build options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// Inject the staleness poller with this interval.
    pub live_reload: Option<Duration>,
}

impl BuildMode {
    pub const ONE_SHOT: Self = Self { live_reload: None };

    pub const fn live(interval: Duration) -> Self {
        Self {
            live_reload: Some(interval),
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub output_path: PathBuf,
    pub html: String,
}

/// Runs builds for one project.
pub struct Builder<'a> {
    config: &'a ProjectConfig,
    registry: ComponentRegistry,
    resolver: Box<dyn StyleResolver>,
}

impl<'a> Builder<'a> {
    pub fn new(
        config: &'a ProjectConfig,
        registry: ComponentRegistry,
        resolver: Box<dyn StyleResolver>,
    ) -> Self {
        Self {
            config,
            registry,
            resolver,
        }
    }

    pub const fn config(&self) -> &'a ProjectConfig {
        self.config
    }

    /// Style source watched alongside the document.
    pub fn style_source(&self) -> &Path {
        self.resolver.source()
    }

    /// Run every stage and write the artifact.
    pub fn build(&self, mode: BuildMode) -> Result<BuildArtifact, BuildError> {
        let input = self.config.build.input.as_path();
        let fail = |stage| failed(stage, input);

        let document = SourceDocument::read(input).map_err(fail(Stage::Read))?;
        let program = markup::compile(&document.body)
            .map_err(Error::from)
            .map_err(fail(Stage::Compile))?;
        let fragment =
            markup::execute(&program, &self.registry).map_err(fail(Stage::Render))?;
        let css = self.resolver.resolve().map_err(fail(Stage::Style))?;

        let html = self.assemble(&document, &css, &fragment, mode);

        let output_path = self.config.output_path();
        write_atomic(&output_path, html.as_bytes()).map_err(fail(Stage::Write))?;

        Ok(BuildArtifact { output_path, html })
    }

    fn assemble(
        &self,
        document: &SourceDocument,
        css: &str,
        fragment: &str,
        mode: BuildMode,
    ) -> String {
        let title = document.title();
        let meta = self
            .config
            .document
            .meta
            .iter()
            .filter_map(|key| document.get(key).map(|value| (key.as_str(), value)))
            .collect();

        let html = assemble(&Page {
            lang: &self.config.document.lang,
            title: &title,
            css,
            fragment,
            meta,
            live_reload: mode.live_reload,
        });

        minify_html(&html, self.config.build.minify).into_owned()
    }
}

fn failed(stage: Stage, input: &Path) -> impl FnOnce(Error) -> BuildError + '_ {
    move |error| BuildError {
        stage,
        input: input.to_path_buf(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components, style::RawStylesheet};
    use std::fs;
    use tempfile::TempDir;

    struct Project {
        dir: TempDir,
        config: ProjectConfig,
    }

    impl Project {
        fn new(document: &str) -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("example.mdx"), document).unwrap();
            fs::write(dir.path().join("main.css"), ".letter-content { margin: 0 auto; }").unwrap();

            let mut config = ProjectConfig::default();
            config.build.input = dir.path().join("example.mdx");
            config.build.output = dir.path().join("dist");
            config.build.css.input = dir.path().join("main.css");

            Self { dir, config }
        }

        fn builder(&self) -> Builder<'_> {
            Builder::new(
                &self.config,
                components::builtin(),
                Box::new(RawStylesheet::new(&self.config.build.css.input)),
            )
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("dist/example.html")
        }
    }

    const LETTER: &str = r#"---
title: Dear Reader
author: Ada
---
# Hello

<Quote author="Grace">Ships are safe in harbor.</Quote>
"#;

    #[test]
    fn test_build_writes_artifact() {
        let project = Project::new(LETTER);
        let artifact = project.builder().build(BuildMode::ONE_SHOT).unwrap();

        assert_eq!(artifact.output_path, project.output());
        let written = fs::read_to_string(project.output()).unwrap();
        assert_eq!(written, artifact.html);
        assert!(written.contains("<title>Dear Reader</title>"));
        assert!(written.contains("<h1>Hello</h1>"));
        assert!(written.contains("Ships are safe in harbor."));
        assert!(written.contains("Grace"));
        assert!(written.contains(".letter-content { margin: 0 auto; }"));
        assert!(written.contains("<meta name=\"author\" content=\"Ada\">"));
        assert!(!written.contains("<script>"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let project = Project::new(LETTER);
        let builder = project.builder();

        let first = builder.build(BuildMode::ONE_SHOT).unwrap();
        let second = builder.build(BuildMode::ONE_SHOT).unwrap();
        assert_eq!(first.html, second.html);
    }

    #[test]
    fn test_title_falls_back_to_file_name() {
        let project = Project::new("# No front matter\n");
        let artifact = project.builder().build(BuildMode::ONE_SHOT).unwrap();

        assert!(artifact.html.contains("<title>example</title>"));
        assert!(!artifact.html.contains("letter-header"));
    }

    #[test]
    fn test_empty_title_falls_back_to_file_name() {
        let project = Project::new("---\ntitle: \"\"\n---\nBody\n");
        let artifact = project.builder().build(BuildMode::ONE_SHOT).unwrap();

        assert!(artifact.html.contains("<title>example</title>"));
    }

    #[test]
    fn test_live_reload_mode_injects_poller() {
        let project = Project::new(LETTER);
        let artifact = project
            .builder()
            .build(BuildMode::live(Duration::from_millis(1000)))
            .unwrap();

        assert!(artifact.html.contains("<script>"));
        assert!(artifact.html.contains("})(1000);"));
    }

    #[test]
    fn test_unknown_component_writes_nothing() {
        let project = Project::new("Hi <Chart data={[1, 2]} />\n");
        let err = project.builder().build(BuildMode::ONE_SHOT).unwrap_err();

        assert_eq!(err.stage, Stage::Render);
        assert!(matches!(&err.error, Error::UnknownComponent { name, .. } if name == "Chart"));
        assert!(err.report().contains("Chart"));
        assert!(!project.output().exists());
    }

    #[test]
    fn test_failed_build_keeps_previous_artifact() {
        let project = Project::new(LETTER);
        let builder = project.builder();
        let good = builder.build(BuildMode::ONE_SHOT).unwrap();

        fs::write(&project.config.build.input, "<Quote>never closed\n").unwrap();
        let err = builder.build(BuildMode::ONE_SHOT).unwrap_err();

        assert_eq!(err.stage, Stage::Compile);
        assert_eq!(fs::read_to_string(project.output()).unwrap(), good.html);
    }

    #[test]
    fn test_missing_input_is_read_failure() {
        let project = Project::new(LETTER);
        fs::remove_file(&project.config.build.input).unwrap();

        let err = project.builder().build(BuildMode::ONE_SHOT).unwrap_err();
        assert_eq!(err.stage, Stage::Read);
        assert!(err.to_string().starts_with("read failed for"));
    }

    #[test]
    fn test_missing_stylesheet_is_style_failure() {
        let project = Project::new(LETTER);
        fs::remove_file(&project.config.build.css.input).unwrap();

        let err = project.builder().build(BuildMode::ONE_SHOT).unwrap_err();
        assert_eq!(err.stage, Stage::Style);
        assert!(!project.output().exists());
    }

    #[test]
    fn test_stylesheet_change_is_picked_up() {
        let project = Project::new(LETTER);
        let builder = project.builder();
        builder.build(BuildMode::ONE_SHOT).unwrap();

        fs::write(&project.config.build.css.input, "body { color: teal; }").unwrap();
        let artifact = builder.build(BuildMode::ONE_SHOT).unwrap();
        assert!(artifact.html.contains("body { color: teal; }"));
    }

    #[test]
    fn test_minify_option() {
        let mut project = Project::new(LETTER);
        project.config.build.minify = true;

        let artifact = project.builder().build(BuildMode::ONE_SHOT).unwrap();
        assert!(!artifact.html.contains("\n  <meta"));
        assert!(artifact.html.contains("Ships are safe in harbor."));
    }

    #[test]
    fn test_style_source_is_exposed() {
        let project = Project::new(LETTER);
        assert_eq!(
            project.builder().style_source(),
            Path::new(&project.config.build.css.input)
        );
    }
}
