//! Git repository port for version-control queries.

use serde::{Deserialize, Serialize};

use crate::error::PortError;

/// How a staged file changed relative to `HEAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// New file, absent from `HEAD`.
    Added,
    /// Existing file with content changes.
    Modified,
    /// File removed from the index.
    Deleted,
}

/// One entry of the staged change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    /// Repository-relative path.
    pub path: String,
    /// Change classification.
    pub status: ChangeStatus,
}

/// Read access to a git repository plus staging of generated outputs.
///
/// All paths are relative to the repository root the adapter was built for.
pub trait GitRepo: Send + Sync {
    /// Lists all tracked files.
    ///
    /// # Errors
    ///
    /// Returns an error if the file list cannot be retrieved.
    fn list_files(&self) -> Result<Vec<String>, PortError>;

    /// Lists files staged in the index relative to `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be compared.
    fn staged_changes(&self) -> Result<Vec<StagedFile>, PortError>;

    /// Returns the unified diff for one file.
    ///
    /// New files are diffed against the empty tree so every line is an addition.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be computed.
    fn file_diff(&self, path: &str, is_new: bool) -> Result<String, PortError>;

    /// Returns the file content at `HEAD`, or `None` if it did not exist there.
    ///
    /// # Errors
    ///
    /// Returns an error if the object lookup fails for another reason.
    fn previous_version(&self, path: &str) -> Result<Option<String>, PortError>;

    /// Adds the given paths to the index.
    ///
    /// # Errors
    ///
    /// Returns an error if `git add` fails.
    fn stage(&self, paths: &[String]) -> Result<(), PortError>;
}
