//! `dockeep init` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::runner::Runner;

/// Builds the documentation record from the tracked sources.
///
/// # Errors
///
/// Returns an error if a record already exists and `force` is not set, or
/// if building or writing the record fails.
pub fn run(ctx: &ServiceContext, settings: &Settings, force: bool) -> Result<(), String> {
    let path = settings.hierarchy_file();
    if ctx.fs.exists(&path) && !force {
        return Err(format!(
            "A documentation record already exists at {}; pass --force to rebuild it",
            path.display()
        ));
    }

    let tree = Runner::new(ctx, settings).init().map_err(|e| e.to_string())?;
    let stats = tree.stats();
    println!(
        "Recorded {} declaration(s) in {} file(s) at {}",
        stats.declarations,
        stats.files,
        path.display()
    );
    Ok(())
}
