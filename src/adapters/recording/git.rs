//! Recording adapter for the `GitRepo` port.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::PortError;
use crate::ports::{GitRepo, StagedFile};

/// Records git interactions while delegating to an inner implementation.
pub struct RecordingGitRepo {
    inner: Box<dyn GitRepo>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingGitRepo {
    /// Creates a recording git adapter wrapping `inner`.
    pub fn new(inner: Box<dyn GitRepo>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl GitRepo for RecordingGitRepo {
    fn list_files(&self) -> Result<Vec<String>, PortError> {
        let result = self.inner.list_files();
        record_result(&self.recorder, "git", "list_files", &json!({}), &result);
        result
    }

    fn staged_changes(&self) -> Result<Vec<StagedFile>, PortError> {
        let result = self.inner.staged_changes();
        record_result(&self.recorder, "git", "staged_changes", &json!({}), &result);
        result
    }

    fn file_diff(&self, path: &str, is_new: bool) -> Result<String, PortError> {
        let result = self.inner.file_diff(path, is_new);
        let input = json!({ "path": path, "is_new": is_new });
        record_result(&self.recorder, "git", "file_diff", &input, &result);
        result
    }

    fn previous_version(&self, path: &str) -> Result<Option<String>, PortError> {
        let result = self.inner.previous_version(path);
        record_result(&self.recorder, "git", "previous_version", &json!({ "path": path }), &result);
        result
    }

    fn stage(&self, paths: &[String]) -> Result<(), PortError> {
        let result = self.inner.stage(paths);
        record_result(&self.recorder, "git", "stage", &json!({ "paths": paths }), &result);
        result
    }
}
