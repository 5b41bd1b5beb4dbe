//! Replaying adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;
use crate::ports::FileSystem;

/// Serves recorded filesystem results; nothing touches the disk.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, PortError> {
        extract_result(&next_output(&self.replayer, "fs", "read_to_string"), "fs::read_to_string")
    }

    fn write(&self, _path: &Path, _contents: &str) -> Result<(), PortError> {
        extract_result(&next_output(&self.replayer, "fs", "write"), "fs::write")
    }

    fn exists(&self, _path: &Path) -> bool {
        next_output(&self.replayer, "fs", "exists").as_bool().unwrap_or(false)
    }

    fn list_dir(&self, _path: &Path) -> Result<Vec<String>, PortError> {
        extract_result(&next_output(&self.replayer, "fs", "list_dir"), "fs::list_dir")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::replaying::tests::replayer;

    #[test]
    fn replays_reads_writes_and_existence() {
        let fs = ReplayingFileSystem::new(replayer(
            "fs",
            vec![
                ("read_to_string", json!({"ok": "def f():\n    pass\n"})),
                ("read_to_string", json!({"err": "No such file"})),
                ("write", json!({"ok": null})),
                ("exists", json!(true)),
            ],
        ));
        assert_eq!(fs.read_to_string(Path::new("a.py")).unwrap(), "def f():\n    pass\n");
        assert_eq!(fs.read_to_string(Path::new("b.py")).unwrap_err().to_string(), "No such file");
        fs.write(Path::new("out.md"), "# a").unwrap();
        assert!(fs.exists(Path::new(".dockeep/hierarchy.json")));
    }
}
