//! Cassette data structures for recording and replaying port interactions.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DocResult;

/// External ports whose traffic can be captured on a cassette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// The completion service.
    Llm,
    /// Source and output files.
    Fs,
    /// The git index and history.
    Git,
    /// Cross-reference lookups.
    Resolver,
}

impl Port {
    /// Every port, in the order their cassettes are written.
    pub const ALL: [Port; 4] = [Port::Llm, Port::Fs, Port::Git, Port::Resolver];

    /// Name used in interactions and cassette file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Port::Llm => "llm",
            Port::Fs => "fs",
            Port::Git => "git",
            Port::Resolver => "resolver",
        }
    }

    /// Cassette file name for this port inside a session directory.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.cassette.yaml", self.as_str())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number, assigned by the recorder.
    pub seq: u64,
    /// Port name, see [`Port::as_str`].
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments of the call.
    pub input: serde_json::Value,
    /// Return value, `{"ok": ..}` / `{"err": ..}` for fallible calls.
    pub output: serde_json::Value,
}

/// A named, ordered list of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Commit checked out while recording.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a YAML error if it
    /// is not a cassette.
    pub fn load(path: &Path) -> DocResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Number of interactions recorded for `port`.
    #[must_use]
    pub fn count_for(&self, port: Port) -> usize {
        self.interactions.iter().filter(|i| i.port == port.as_str()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Cassette {
        Cassette {
            name: "update".into(),
            recorded_at: Utc::now(),
            commit: "abc123".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "git".into(),
                    method: "staged_changes".into(),
                    input: json!({}),
                    output: json!({"ok": [{"path": "a.py", "status": "modified"}]}),
                },
                Interaction {
                    seq: 1,
                    port: "llm".into(),
                    method: "complete".into(),
                    input: json!({"prompt": "document load"}),
                    output: json!({"ok": {"text": "Loads.", "prompt_tokens": 3, "completion_tokens": 1}}),
                },
            ],
        }
    }

    #[test]
    fn load_reads_written_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update.cassette.yaml");
        let cassette = sample();
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
        assert_eq!(Cassette::load(&path).unwrap(), cassette);
    }

    #[test]
    fn load_rejects_non_cassette_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(Cassette::load(&path).is_err());
    }

    #[test]
    fn counts_per_port() {
        let cassette = sample();
        assert_eq!(cassette.count_for(Port::Git), 1);
        assert_eq!(cassette.count_for(Port::Resolver), 0);
        assert_eq!(Port::Resolver.file_name(), "resolver.cassette.yaml");
    }
}
