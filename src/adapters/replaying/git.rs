//! Replaying adapter for the `GitRepo` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;
use crate::ports::{GitRepo, StagedFile};

/// Serves recorded git results.
pub struct ReplayingGitRepo {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingGitRepo {
    /// Creates a replaying git adapter from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn replay<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T, PortError> {
        extract_result(&next_output(&self.replayer, "git", method), &format!("git::{method}"))
    }
}

impl GitRepo for ReplayingGitRepo {
    fn list_files(&self) -> Result<Vec<String>, PortError> {
        self.replay("list_files")
    }

    fn staged_changes(&self) -> Result<Vec<StagedFile>, PortError> {
        self.replay("staged_changes")
    }

    fn file_diff(&self, _path: &str, _is_new: bool) -> Result<String, PortError> {
        self.replay("file_diff")
    }

    fn previous_version(&self, _path: &str) -> Result<Option<String>, PortError> {
        self.replay("previous_version")
    }

    fn stage(&self, _paths: &[String]) -> Result<(), PortError> {
        self.replay("stage")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::replaying::tests::replayer;
    use crate::ports::ChangeStatus;

    #[test]
    fn replays_staged_changes_and_missing_head_version() {
        let git = ReplayingGitRepo::new(replayer(
            "git",
            vec![
                ("staged_changes", json!({"ok": [{"path": "a.py", "status": "added"}]})),
                ("previous_version", json!({"ok": null})),
                ("stage", json!({"err": "index.lock exists"})),
            ],
        ));
        let staged = git.staged_changes().unwrap();
        assert_eq!(staged, vec![StagedFile { path: "a.py".into(), status: ChangeStatus::Added }]);
        assert_eq!(git.previous_version("a.py").unwrap(), None);
        assert!(git.stage(&["a.md".into()]).is_err());
    }
}
