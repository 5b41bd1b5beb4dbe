//! Command dispatch and handlers.

pub mod generate;
pub mod init;
pub mod status;
pub mod update;

use std::env;
use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::generate::StopHandle;

/// Dispatch a parsed command line to its handler.
///
/// When `DOCKEEP_RECORD` is set to a directory path, all port interactions are
/// recorded to per-port cassette files in a new session under it.
///
/// # Errors
///
/// Returns an error string if settings cannot be loaded or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let repo = cli.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    let settings = Settings::load(&repo).map_err(|e| e.to_string())?;

    let (ctx, session) = if let Ok(path) = env::var("DOCKEEP_RECORD") {
        let (ctx, session) = ServiceContext::recording_at(&settings, Path::new(&path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&settings), None)
    };

    let result = dispatch_with_context(&cli.command, &ctx, &settings);

    if let Some(session) = session {
        // Recording adapters hold the recorders until the context is gone.
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the command fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &Settings,
) -> Result<(), String> {
    match command {
        Command::Init { force } => init::run(ctx, settings, *force),
        Command::Generate => generate::run(ctx, settings),
        Command::Update => update::run(ctx, settings),
        Command::Status => status::run(ctx, settings),
    }
}

/// Runs `future` to completion on a fresh runtime. Ctrl-C stops `stop`
/// instead of killing the process, so in-flight generations still land in
/// the checkpoint.
fn block_on<F: Future>(stop: StopHandle, future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    Ok(runtime.block_on(async move {
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing running tasks");
                stop.stop();
            }
        });
        let output = future.await;
        watcher.abort();
        output
    }))
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
