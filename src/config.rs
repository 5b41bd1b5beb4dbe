//! Run settings, loaded once per command and passed down explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::error::{DocError, DocResult};
use crate::ports::{FileSystem, ReferenceScope};

/// Name of the optional settings file at the repository root.
pub const SETTINGS_FILE: &str = ".dockeep.yaml";

/// Settings for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Repository root; every other path is relative to it.
    #[serde(skip)]
    pub repo_path: PathBuf,
    /// Location of the persisted documentation record.
    pub hierarchy_path: PathBuf,
    /// Folder receiving rendered Markdown.
    pub markdown_docs_folder: PathBuf,
    /// Paths (files or directories) excluded from documentation.
    pub ignore_list: Vec<String>,
    /// Concurrent generation tasks.
    pub max_workers: usize,
    /// Extension of documented source files, without the dot.
    pub source_extension: String,
    /// Model identifier sent to the LLM.
    pub model: String,
    /// Completion token limit per declaration.
    pub max_tokens: u32,
    /// Reach of referencer lookups.
    pub reference_scope: ReferenceScope,
    /// Add rendered docs and the record to the git index after an update.
    pub stage_outputs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            hierarchy_path: PathBuf::from(".project_doc_record/project_hierarchy.json"),
            markdown_docs_folder: PathBuf::from("markdown_docs"),
            ignore_list: Vec::new(),
            max_workers: 5,
            source_extension: "py".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            max_tokens: 1024,
            reference_scope: ReferenceScope::WholeRepo,
            stage_outputs: true,
        }
    }
}

impl Settings {
    /// Loads settings for `repo_path` from its settings file (if any) and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Config`] if the settings file is invalid or a value
    /// fails validation.
    pub fn load(repo_path: &Path) -> DocResult<Self> {
        Self::load_with(&LiveFileSystem, repo_path)
    }

    /// Like [`Settings::load`], reading the settings file through `fs`.
    ///
    /// Settings pick the ports a command runs with, so they are read before
    /// any recording context exists and never appear in a cassette.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Config`] if the settings file cannot be read, is
    /// invalid, or a value fails validation.
    pub fn load_with(fs: &dyn FileSystem, repo_path: &Path) -> DocResult<Self> {
        let file = repo_path.join(SETTINGS_FILE);
        let yaml = if fs.exists(&file) {
            let text = fs
                .read_to_string(&file)
                .map_err(|e| DocError::Config(format!("{}: {e}", file.display())))?;
            Some(text)
        } else {
            None
        };
        Self::from_sources(repo_path, yaml.as_deref(), |key| std::env::var(key).ok())
    }

    /// Builds settings from an optional YAML document and an environment
    /// lookup. `DOCKEEP_MODEL` and `DOCKEEP_MAX_WORKERS` override the file.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Config`] on invalid YAML or invalid values.
    pub fn from_sources(
        repo_path: &Path,
        yaml: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> DocResult<Self> {
        let mut settings: Self = match yaml {
            Some(text) if !text.trim().is_empty() => serde_yaml::from_str(text)
                .map_err(|e| DocError::Config(format!("{SETTINGS_FILE}: {e}")))?,
            _ => Self::default(),
        };
        settings.repo_path = repo_path.to_path_buf();

        if let Some(model) = env("DOCKEEP_MODEL") {
            settings.model = model;
        }
        if let Some(workers) = env("DOCKEEP_MAX_WORKERS") {
            settings.max_workers = workers
                .parse()
                .map_err(|_| DocError::Config(format!("DOCKEEP_MAX_WORKERS={workers:?} is not a number")))?;
        }

        settings.validate()?;
        debug!(?settings, "loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> DocResult<()> {
        if self.max_workers == 0 {
            return Err(DocError::Config("max_workers must be at least 1".to_string()));
        }
        if self.source_extension.trim_start_matches('.').is_empty() {
            return Err(DocError::Config("source_extension must not be empty".to_string()));
        }
        Ok(())
    }

    /// Last component of the repository path.
    #[must_use]
    pub fn repo_name(&self) -> String {
        self.repo_path
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(&self.repo_path)
            .file_name()
            .map_or_else(|| "repo".to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Absolute location of the persisted record.
    #[must_use]
    pub fn hierarchy_file(&self) -> PathBuf {
        self.repo_path.join(&self.hierarchy_path)
    }

    /// Returns `true` if `path` is under an `ignore_list` entry.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_list.iter().any(|entry| {
            let entry = entry.trim_end_matches('/');
            path == entry || path.strip_prefix(entry).is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns `true` for non-ignored files with the source extension.
    #[must_use]
    pub fn tracks(&self, path: &str) -> bool {
        let extension = self.source_extension.trim_start_matches('.');
        Path::new(path).extension().is_some_and(|e| e == extension) && !self.is_ignored(path)
    }

    /// Repository-relative location of the rendered Markdown for `file_path`.
    #[must_use]
    pub fn markdown_path_for(&self, file_path: &str) -> PathBuf {
        self.markdown_docs_folder.join(Path::new(file_path).with_extension("md"))
    }
}
