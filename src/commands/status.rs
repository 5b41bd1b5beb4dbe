//! `dockeep status` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::meta::{MetaTree, TreeStats, UNGENERATED};

/// Prints a summary of the documentation record.
///
/// # Errors
///
/// Returns an error if no record exists or it cannot be read.
pub fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let path = settings.hierarchy_file();
    if !ctx.fs.exists(&path) {
        return Err(format!(
            "No documentation record at {}; run `dockeep init` first",
            path.display()
        ));
    }
    let tree = MetaTree::restore(ctx.fs.as_ref(), &path).map_err(|e| e.to_string())?;
    print!("{}", render(&settings.repo_name(), tree.version_tag(), tree.stats()));
    Ok(())
}

fn render(repo: &str, version_tag: i64, stats: TreeStats) -> String {
    let version = if version_tag == UNGENERATED {
        "not generated".to_string()
    } else {
        version_tag.to_string()
    };
    let pending = stats.declarations - stats.documented;
    format!(
        "repository:   {repo}\nversion:      {version}\nfiles:        {}\ndeclarations: {}\ndocumented:   {}\npending:      {pending}\n",
        stats.files, stats.declarations, stats.documented
    )
}
