//! Durable JSON form of the [`MetaTree`].
//!
//! The record is keyed by file path, then declaration name. Directories are
//! not stored; they are rebuilt from the file paths on restore.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CodeSpan, DeclarationMeta, ItemType, MetaNode, MetaTree, NodeItem};
use crate::error::{DocError, DocResult};
use crate::ports::FileSystem;
use crate::structure::DeclarationKind;

/// Persisted record of the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Name of the repository root node.
    pub repo_name: String,
    /// Version of the last complete generation pass.
    pub version_tag: i64,
    /// File records keyed by repository-relative path.
    pub files: IndexMap<String, FileRecord>,
}

/// Persisted file node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// First line of the file span.
    pub code_start_line: usize,
    /// Last line of the file span.
    pub code_end_line: usize,
    /// Declarations keyed by name, in structure order.
    pub objects: IndexMap<String, DeclarationRecord>,
}

/// Persisted declaration node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRecord {
    /// Declaration kind.
    #[serde(rename = "type")]
    pub kind: DeclarationKind,
    /// First line.
    pub code_start_line: usize,
    /// Last line.
    pub code_end_line: usize,
    /// Enclosing declaration name.
    pub parent: Option<String>,
    /// Column of the name token.
    pub name_column: usize,
    /// Generated documentation.
    #[serde(default)]
    pub doc_payload: String,
    /// Generation pass of `doc_payload`.
    pub version_tag: i64,
}

impl MetaTree {
    /// Flattens the tree into its persisted record.
    #[must_use]
    pub fn to_record(&self) -> CheckpointRecord {
        let mut files = IndexMap::new();
        for entry in self.topological_order() {
            let NodeItem::File { span } = entry.node.item else {
                continue;
            };
            let objects = entry
                .node
                .children
                .iter()
                .filter_map(|(name, child)| {
                    let meta = child.declaration_meta()?;
                    Some((
                        name.clone(),
                        DeclarationRecord {
                            kind: meta.kind,
                            code_start_line: meta.span.start_line,
                            code_end_line: meta.span.end_line,
                            parent: meta.parent.clone(),
                            name_column: meta.name_column,
                            doc_payload: child.doc_payload.clone(),
                            version_tag: child.version_tag,
                        },
                    ))
                })
                .collect();
            files.insert(
                entry.full_path,
                FileRecord {
                    code_start_line: span.start_line,
                    code_end_line: span.end_line,
                    objects,
                },
            );
        }
        CheckpointRecord {
            repo_name: self.root.name.clone(),
            version_tag: self.version_tag,
            files,
        }
    }

    /// Rebuilds a tree from its persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Checkpoint`] if a span is inverted or a path is
    /// empty.
    pub fn from_record(record: CheckpointRecord, location: &str) -> DocResult<Self> {
        let invalid = |message: String| DocError::Checkpoint { path: location.to_string(), message };
        let mut tree = Self::new(&record.repo_name);
        tree.set_version_tag(record.version_tag);

        for (path, file) in record.files {
            if path.split('/').all(str::is_empty) {
                return Err(invalid("file record with empty path".to_string()));
            }
            let span = checked_span(file.code_start_line, file.code_end_line)
                .ok_or_else(|| invalid(format!("{path} has an invalid span")))?;
            let node = tree.file_entry(&path, span);
            if node.item_type() != ItemType::File {
                return Err(invalid(format!("{path} is not a file")));
            }
            for (name, decl) in file.objects {
                let span = checked_span(decl.code_start_line, decl.code_end_line)
                    .ok_or_else(|| invalid(format!("{path}/{name} has an invalid span")))?;
                let item = NodeItem::Declaration(DeclarationMeta {
                    kind: decl.kind,
                    span,
                    parent: decl.parent,
                    name_column: decl.name_column,
                });
                node.children.insert(
                    name.clone(),
                    MetaNode {
                        name,
                        item,
                        doc_payload: decl.doc_payload,
                        version_tag: decl.version_tag,
                        children: IndexMap::new(),
                    },
                );
            }
        }
        Ok(tree)
    }

    /// Writes the tree to `path` as pretty-printed JSON.
    ///
    /// On failure the in-memory tree is untouched, so the same checkpoint can
    /// be retried.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Checkpoint`] if serialization or the write fails.
    pub fn checkpoint(&self, fs: &dyn FileSystem, path: &Path) -> DocResult<()> {
        let location = path.display().to_string();
        let failed = |message: String| DocError::Checkpoint { path: location.clone(), message };
        let mut json =
            serde_json::to_string_pretty(&self.to_record()).map_err(|e| failed(e.to_string()))?;
        json.push('\n');
        fs.write(path, &json).map_err(|e| failed(e.to_string()))?;
        info!(path = %location, version = self.version_tag, "checkpointed documentation record");
        Ok(())
    }

    /// Reads a tree previously written by [`MetaTree::checkpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Checkpoint`] if the file is missing, unreadable or
    /// not a valid record.
    pub fn restore(fs: &dyn FileSystem, path: &Path) -> DocResult<Self> {
        let location = path.display().to_string();
        let failed = |message: String| DocError::Checkpoint { path: location.clone(), message };
        let json = fs.read_to_string(path).map_err(|e| failed(e.to_string()))?;
        let record: CheckpointRecord =
            serde_json::from_str(&json).map_err(|e| failed(e.to_string()))?;
        let tree = Self::from_record(record, &location)?;
        debug!(path = %location, files = tree.stats().files, "restored documentation record");
        Ok(tree)
    }
}

fn checked_span(start_line: usize, end_line: usize) -> Option<CodeSpan> {
    (start_line >= 1 && start_line <= end_line).then_some(CodeSpan { start_line, end_line })
}
