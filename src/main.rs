//! Letterpress - build a single MDX-style letter into a self-contained HTML page.

mod assemble;
mod build;
mod cli;
mod components;
mod config;
mod document;
mod error;
mod logger;
mod markup;
mod output;
mod serve;
mod style;
mod utils;
mod watch;

use anyhow::{Context, Result, anyhow};
use build::{BuildMode, Builder};
use clap::Parser;
use cli::Cli;
use config::ProjectConfig;
use serve::LiveServer;
use std::{net::IpAddr, sync::mpsc, thread};
use watch::{WatchSession, watch_for_changes_blocking};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &'static ProjectConfig = Box::leak(Box::new(ProjectConfig::load(&cli)?));

    let builder = Builder::new(
        config,
        components::builtin(),
        style::resolver_for(config),
    );

    if cli.is_watch() {
        watch_and_serve(builder)
    } else {
        build_once(&builder)
    }
}

/// Build once and exit; a failed build exits non-zero.
fn build_once(builder: &Builder<'_>) -> Result<()> {
    let artifact = builder
        .build(BuildMode::ONE_SHOT)
        .map_err(|err| anyhow!(err.report()))?;

    log!("build"; "{} -> {}",
        builder.config().build.input.display(),
        artifact.output_path.display());
    Ok(())
}

/// Serve the artifact on the main thread while the watch thread rebuilds it.
///
/// Blocks until Ctrl+C, or until the watcher fails.
fn watch_and_serve(builder: Builder<'static>) -> Result<()> {
    let config = builder.config();
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("invalid interface `{}`", config.serve.interface))?;

    let server = LiveServer::bind(interface, config.serve.port, config.output_path())?;
    let session = WatchSession {
        input: config.build.input.clone(),
        style: builder.style_source().to_path_buf(),
        output: config.output_path(),
        address: server.addr(),
    };

    let handle = server.handle();
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        handle.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    let handle = server.handle();
    let (failed_tx, failed_rx) = mpsc::channel();
    thread::spawn(move || {
        if let Err(err) = watch_for_changes_blocking(&session, &builder) {
            failed_tx.send(err).ok();
        }
        handle.unblock();
    });

    log!("serve"; "http://{}", server.addr());
    server.run();

    // Ctrl+C leaves the watcher running; it ends with the process.
    match failed_rx.try_recv() {
        Ok(err) => Err(err),
        Err(_) => Ok(()),
    }
}
