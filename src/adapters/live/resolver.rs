//! Lexical reference resolver: whole-word matches of a declaration name.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::error::PortError;
use crate::ports::{ReferenceQuery, ReferenceResolver, ReferenceScope, Referencer};

/// Finds referencers by scanning source files for the declaration's name.
///
/// This over-approximates (any identically named symbol matches) but needs
/// no language server.
pub struct LexicalResolver {
    root: PathBuf,
    extension: String,
}

impl LexicalResolver {
    /// Resolver scanning files with `extension` under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self { root: root.into(), extension: extension.trim_start_matches('.').to_string() }
    }

    fn source_files(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|x| x == self.extension.as_str()))
            .filter_map(|e| relative(&self.root, e.path()))
            .collect()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel.components().filter_map(|c| c.as_os_str().to_str()).collect();
    Some(parts.join("/"))
}

impl ReferenceResolver for LexicalResolver {
    fn find_referencers(&self, query: &ReferenceQuery) -> Result<Vec<Referencer>, PortError> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&query.name)))?;
        let files = match query.scope {
            ReferenceScope::InFile => vec![query.file_path.clone()],
            ReferenceScope::WholeRepo => self.source_files(),
        };

        let mut found = Vec::new();
        for file in files {
            let Ok(text) = std::fs::read_to_string(self.root.join(&file)) else {
                continue;
            };
            for (index, line) in text.lines().enumerate() {
                let line_number = index + 1;
                if file == query.file_path && line_number == query.line {
                    continue;
                }
                if pattern.is_match(line) {
                    found.push(Referencer { file_path: file.clone(), line: line_number });
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
