//! `dockeep update` command.

use super::block_on;
use super::generate::describe;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::runner::Runner;

/// Brings documentation in line with the staged changes.
///
/// Files that fail to diff or parse are reported and left as they were;
/// they do not fail the command.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded or written, or if the
/// staged changes cannot be listed.
pub fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let runner = Runner::new(ctx, settings);
    let mut tree = runner.load_or_init().map_err(|e| e.to_string())?;
    let summary =
        block_on(runner.stop_handle(), runner.update(&mut tree))?.map_err(|e| e.to_string())?;

    println!(
        "Reconciled {} file(s), removed {}, skipped {}",
        summary.reconciled.len(),
        summary.removed.len(),
        summary.skipped.len()
    );
    println!("{}", describe(&summary.generation));
    for (path, message) in &summary.failed {
        eprintln!("  unchanged: {path}: {message}");
    }
    for (target, message) in &summary.generation.failures {
        eprintln!("  failed: {target}: {message}");
    }
    if !summary.staged.is_empty() {
        println!("Staged {} path(s)", summary.staged.len());
    }
    Ok(())
}
