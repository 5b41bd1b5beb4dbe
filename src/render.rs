//! Markdown rendering of per-file documentation.

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{DocError, DocResult};
use crate::meta::{MetaNode, MetaTree};
use crate::ports::FileSystem;

const PENDING: &str = "_Documentation pending._";

/// Renders one file node: a title, then one heading per declaration whose
/// level follows its nesting depth.
#[must_use]
pub fn render_file(file_path: &str, file: &MetaNode) -> String {
    let mut depth: HashMap<&str, usize> = HashMap::new();
    let mut out = format!("# {file_path}\n");

    for (name, child) in &file.children {
        let Some(meta) = child.declaration_meta() else {
            continue;
        };
        let level = meta.parent.as_deref().and_then(|p| depth.get(p)).map_or(0, |d| d + 1);
        depth.insert(name.as_str(), level);

        let hashes = "#".repeat((level + 2).min(6));
        let _ = writeln!(out, "\n{hashes} {} {name}\n", meta.kind);
        if child.is_documented() {
            out.push_str(child.doc_payload.trim_end());
        } else {
            out.push_str(PENDING);
        }
        out.push('\n');
    }
    out
}

/// Writes Markdown for each of `file_paths` and returns the written
/// repository-relative paths.
///
/// Files missing from the tree are skipped.
///
/// # Errors
///
/// Returns [`DocError::Io`] if a document cannot be written.
pub fn write_docs(
    fs: &dyn FileSystem,
    settings: &Settings,
    tree: &MetaTree,
    file_paths: &[String],
) -> DocResult<Vec<String>> {
    let mut written = Vec::new();
    for path in file_paths {
        let Some(file) = tree.file(path) else {
            warn!(path = %path, "not rendering file missing from the record");
            continue;
        };
        let relative = settings.markdown_path_for(path);
        fs.write(&settings.repo_path.join(&relative), &render_file(path, file))
            .map_err(|e| DocError::Io(std::io::Error::other(e.to_string())))?;
        debug!(path = %relative.display(), "rendered");
        written.push(relative.to_string_lossy().into_owned());
    }
    Ok(written)
}
