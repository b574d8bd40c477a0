//! File system watcher for live reload.
//!
//! Watches the source document and the style source and runs one build per
//! change notification.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  mpsc   ┌──────────────────────────────────────────┐
//! │  notify    │────────▶│  run_loop (watch thread)                 │
//! │  watcher   │ events  │                                          │
//! └────────────┘         │  relevant? ──▶ [fold window] ──▶ build() │
//!                        │  (queued events wait their turn)         │
//!                        └──────────────────────────────────────────┘
//! ```
//!
//! Builds only ever run on the watch thread, one after another, so two
//! builds never overlap. A failed build is logged and the loop keeps going.

use crate::{
    build::{BuildMode, Builder},
    log,
    logger::WatchStatus,
};
use anyhow::{Context, Result, bail};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::{Duration, Instant},
};

// =============================================================================
// Session
// =============================================================================

/// Paths and address of one watch-mode run.
#[derive(Debug, Clone)]
pub struct WatchSession {
    pub input: PathBuf,
    pub style: PathBuf,
    pub output: PathBuf,
    pub address: SocketAddr,
}

impl WatchSession {
    /// Directories handed to the watcher (non-recursive).
    ///
    /// Parents are watched instead of the files themselves so editors that
    /// save by writing a new file and renaming it still trigger a build.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in [&self.input, &self.style] {
            let dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    pub fn targets(&self) -> WatchTargets {
        WatchTargets::new([self.input.as_path(), self.style.as_path()])
    }
}

/// Files whose changes trigger a build.
#[derive(Debug, Clone, Default)]
pub struct WatchTargets {
    files: FxHashSet<PathBuf>,
}

impl WatchTargets {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a Path>) -> Self {
        Self {
            files: files.into_iter().map(normalize).collect(),
        }
    }

    /// Whether the event touches any target file.
    pub fn matches(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|path| self.files.contains(&normalize(path)))
    }
}

/// Canonical parent joined with the file name.
///
/// The file itself may not exist mid-save, but its directory does, and the
/// watcher may report it through a different (symlinked) prefix.
fn normalize(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
        _ => path.to_path_buf(),
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

// =============================================================================
// Event Loop
// =============================================================================

/// Consume notifications until the channel closes, building once per
/// relevant event. Returns the number of builds run.
///
/// With a `debounce` window, relevant events arriving within the window
/// after the first one are folded into its build.
pub fn run_loop(
    rx: &Receiver<notify::Result<Event>>,
    targets: &WatchTargets,
    debounce: Option<Duration>,
    mut build: impl FnMut(),
) -> usize {
    let mut builds = 0;

    while let Ok(event) = rx.recv() {
        match event {
            Ok(event) if is_relevant(&event) && targets.matches(&event) => {
                let open = debounce.is_none_or(|window| fold_events(rx, targets, window));
                build();
                builds += 1;
                if !open {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log!("watch"; "error: {e}"),
        }
    }

    builds
}

/// Swallow relevant events for `window`. Returns false if the channel closed.
fn fold_events(
    rx: &Receiver<notify::Result<Event>>,
    targets: &WatchTargets,
    window: Duration,
) -> bool {
    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(event)) if is_relevant(&event) && targets.matches(&event) => {}
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) => return true,
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Run one build and report it on the status line.
fn rebuild(builder: &Builder<'_>, mode: BuildMode, status: &mut WatchStatus) {
    let root = &builder.config().root;
    match builder.build(mode) {
        Ok(artifact) => status.success(&format!(
            "built {}",
            rel_path(&artifact.output_path, root)
        )),
        Err(err) => status.error(&err.to_string(), &err.error.to_string()),
    }
}

/// Watch the session's files, build once, then rebuild on every change.
///
/// Only returns when the notification stream fails, which is an error:
/// the caller is expected to stop serving.
pub fn watch_for_changes_blocking(session: &WatchSession, builder: &Builder<'_>) -> Result<()> {
    let config = builder.config();
    let mode = BuildMode::live(config.serve.poll_interval());

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    for dir in session.watch_dirs() {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
    }
    log!("watch"; "{} and {} -> http://{}/{}",
        rel_path(&session.input, &config.root),
        rel_path(&session.style, &config.root),
        session.address,
        session.output.file_name().unwrap_or_default().to_string_lossy());

    let mut status = WatchStatus::new();
    rebuild(builder, mode, &mut status);

    let targets = session.targets();
    run_loop(&rx, &targets, config.serve.debounce(), || {
        rebuild(builder, mode, &mut status);
    });

    drop(watcher);
    bail!(
        "file watcher stopped after {} builds ({} failed)",
        status.builds(),
        status.failures()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components,
        config::ProjectConfig,
        serve::test_support::{Running, body},
        style::RawStylesheet,
    };
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::{
        fs,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
    };
    use tempfile::TempDir;

    fn modify(path: &Path) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf()))
    }

    fn setup() -> (TempDir, PathBuf, WatchTargets) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("example.mdx");
        fs::write(&input, "# hi").unwrap();
        let targets = WatchTargets::new([input.as_path()]);
        (dir, input, targets)
    }

    #[test]
    fn test_one_build_per_event() {
        let (_dir, input, targets) = setup();
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(modify(&input)).unwrap();
        }
        drop(tx);

        let mut count = 0;
        let builds = run_loop(&rx, &targets, None, || count += 1);

        assert_eq!(builds, 3);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_builds_never_overlap() {
        let (_dir, input, targets) = setup();
        let (tx, rx) = mpsc::channel();

        let sender = thread::spawn(move || {
            for _ in 0..5 {
                tx.send(modify(&input)).unwrap();
                thread::sleep(Duration::from_millis(2));
            }
        });

        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));
        let builds = run_loop(&rx, &targets, None, || {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            max_running.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            running.fetch_sub(1, Ordering::SeqCst);
        });
        sender.join().unwrap();

        assert_eq!(builds, 5);
        assert_eq!(max_running.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_irrelevant_events_are_ignored() {
        let (dir, input, targets) = setup();
        let (tx, rx) = mpsc::channel();

        tx.send(Ok(Event::new(EventKind::Remove(RemoveKind::File)).add_path(input.clone())))
            .unwrap();
        tx.send(modify(&dir.path().join("other.mdx"))).unwrap();
        tx.send(Err(notify::Error::generic("watch backend hiccup"))).unwrap();
        tx.send(Ok(Event::new(EventKind::Create(CreateKind::File)).add_path(input)))
            .unwrap();
        drop(tx);

        let builds = run_loop(&rx, &targets, None, || {});
        assert_eq!(builds, 1);
    }

    #[test]
    fn test_failing_build_does_not_stop_loop() {
        let (_dir, input, targets) = setup();
        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            tx.send(modify(&input)).unwrap();
        }
        drop(tx);

        let mut status = WatchStatus::new();
        let mut attempt = 0;
        let builds = run_loop(&rx, &targets, None, || {
            attempt += 1;
            if attempt % 2 == 0 {
                status.error("compile failed for `example.mdx`", "line 1: boom");
            } else {
                status.success("built example.html");
            }
        });

        assert_eq!(builds, 4);
        assert_eq!(status.failures(), 2);
    }

    #[test]
    fn test_debounce_folds_burst() {
        let (_dir, input, targets) = setup();
        let (tx, rx) = mpsc::channel();
        for _ in 0..5 {
            tx.send(modify(&input)).unwrap();
        }

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            tx.send(modify(&input)).unwrap();
        });

        let builds = run_loop(&rx, &targets, Some(Duration::from_millis(100)), || {});
        sender.join().unwrap();

        assert_eq!(builds, 2);
    }

    #[test]
    fn test_watch_dirs_deduplicated() {
        let session = WatchSession {
            input: PathBuf::from("/project/example.mdx"),
            style: PathBuf::from("/project/src/styles/main.css"),
            output: PathBuf::from("/project/dist/example.html"),
            address: "127.0.0.1:3000".parse().unwrap(),
        };
        assert_eq!(
            session.watch_dirs(),
            vec![PathBuf::from("/project"), PathBuf::from("/project/src/styles")]
        );

        let flat = WatchSession {
            style: PathBuf::from("/project/main.css"),
            ..session
        };
        assert_eq!(flat.watch_dirs(), vec![PathBuf::from("/project")]);
    }

    #[test]
    fn test_targets_match_through_unnormalized_path() {
        let (dir, _input, targets) = setup();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let roundabout = sub.join("..").join("example.mdx");

        let event = modify(&roundabout).unwrap();
        assert!(targets.matches(&event));
    }

    #[test]
    fn test_server_keeps_last_good_artifact_across_failed_rebuild() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("example.mdx");
        let css = dir.path().join("main.css");
        fs::write(&css, "body { margin: 0; }").unwrap();

        let mut config = ProjectConfig::default();
        config.build.input = input.clone();
        config.build.output = dir.path().join("dist");
        config.build.css.input = css.clone();

        let builder = Builder::new(
            &config,
            components::builtin(),
            Box::new(RawStylesheet::new(&css)),
        );
        let server = Running::start(config.output_path());
        let targets = WatchTargets::new([input.as_path()]);
        let mode = BuildMode::live(Duration::from_millis(1000));

        let edits = [
            "# First draft\n",
            "<Quote>never closed\n",
            "# Final draft\n\n<Quote author=\"Grace\">Ships</Quote>\n",
        ];

        let (tx, rx) = mpsc::channel();
        for _ in edits {
            tx.send(modify(&input)).unwrap();
        }
        drop(tx);

        let mut status = WatchStatus::new();
        let mut pending = edits.iter();
        let mut served = Vec::new();
        let builds = run_loop(&rx, &targets, None, || {
            if let Some(source) = pending.next() {
                fs::write(&input, source).unwrap();
            }
            rebuild(&builder, mode, &mut status);
            served.push(body(&server.request("GET", "/")).to_owned());
        });

        assert_eq!(builds, 3);
        assert_eq!(status.builds(), 3);
        assert_eq!(status.failures(), 1);

        assert!(served[0].contains("<h1>First draft</h1>"));
        assert_eq!(served[1], served[0]);
        assert!(served[2].contains("<h1>Final draft</h1>"));
        assert!(served[2].contains("Grace"));
    }
}
