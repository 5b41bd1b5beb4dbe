//! Live git adapter using `git` CLI commands.

use std::path::PathBuf;
use std::process::Command;

use crate::error::PortError;
use crate::ports::{ChangeStatus, GitRepo, StagedFile};

/// Hash of git's empty tree; diffing against it shows a new file as all
/// additions.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Live git adapter that shells out to `git -C <root>`.
pub struct LiveGitRepo {
    root: PathBuf,
}

impl LiveGitRepo {
    /// Adapter for the repository at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> Result<String, PortError> {
        let output = Command::new("git").arg("-C").arg(&self.root).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parses `git diff --name-status` output.
fn parse_name_status(output: &str) -> Vec<StagedFile> {
    output
        .lines()
        .filter_map(|line| {
            let (status, path) = line.split_once('\t')?;
            let status = match status.chars().next()? {
                'A' => ChangeStatus::Added,
                'D' => ChangeStatus::Deleted,
                _ => ChangeStatus::Modified,
            };
            Some(StagedFile { path: path.to_string(), status })
        })
        .collect()
}

impl GitRepo for LiveGitRepo {
    fn list_files(&self) -> Result<Vec<String>, PortError> {
        Ok(self.git(&["ls-files"])?.lines().map(String::from).collect())
    }

    fn staged_changes(&self) -> Result<Vec<StagedFile>, PortError> {
        let output = self.git(&["diff", "--cached", "--name-status", "--no-renames"])?;
        Ok(parse_name_status(&output))
    }

    fn file_diff(&self, path: &str, is_new: bool) -> Result<String, PortError> {
        if is_new {
            self.git(&["diff", "--staged", EMPTY_TREE, "--", path])
        } else {
            self.git(&["diff", "HEAD", "--", path])
        }
    }

    fn previous_version(&self, path: &str) -> Result<Option<String>, PortError> {
        let object = format!("HEAD:{path}");
        let exists = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["cat-file", "-e", &object])
            .output()?
            .status
            .success();
        if !exists {
            return Ok(None);
        }
        self.git(&["show", &object]).map(Some)
    }

    fn stage(&self, paths: &[String]) -> Result<(), PortError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.git(&args).map(|_| ())
    }
}
