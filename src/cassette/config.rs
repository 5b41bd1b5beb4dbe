//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::{Cassette, Port};
use super::replayer::CassetteReplayer;

/// Per-port cassette paths. Ports without a cassette panic if called
/// during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// LLM cassette.
    pub llm: Option<PathBuf>,
    /// Filesystem cassette.
    pub fs: Option<PathBuf>,
    /// Git cassette.
    pub git: Option<PathBuf>,
    /// Reference resolver cassette.
    pub resolver: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the LLM port.
    pub llm: Option<CassetteReplayer>,
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
    /// Replayer for the git port.
    pub git: Option<CassetteReplayer>,
    /// Replayer for the reference resolver port.
    pub resolver: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Config for a session directory written by a recording run; only the
    /// cassettes present on disk are used.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let existing = |port: Port| Some(dir.join(port.file_name())).filter(|p| p.is_file());
        Self {
            llm: existing(Port::Llm),
            fs: existing(Port::Fs),
            git: existing(Port::Git),
            resolver: existing(Port::Resolver),
        }
    }

    /// Loads one cassette file into a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        Cassette::load(path)
            .map(|cassette| CassetteReplayer::new(&cassette))
            .map_err(|e| format!("Failed to load cassette {}: {e}", path.display()))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Option<PathBuf>| path.as_deref().map(Self::load_cassette).transpose();
        Ok(PortReplayers {
            llm: load(&self.llm)?,
            fs: load(&self.fs)?,
            git: load(&self.git)?,
            resolver: load(&self.resolver)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, port: Port, method: &str, output: serde_json::Value) {
        let cassette = Cassette {
            name: port.to_string(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: port.to_string(),
                method: method.into(),
                input: json!({}),
                output,
            }],
        };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    #[test]
    fn session_dir_picks_up_existing_cassettes_only() {
        let dir = tempfile::tempdir().unwrap();
        write_cassette(&dir.path().join("git.cassette.yaml"), Port::Git, "list_files", json!({"ok": []}));

        let config = CassetteConfig::from_session_dir(dir.path());
        assert!(config.git.is_some());
        assert!(config.llm.is_none());
        assert!(config.resolver.is_none());

        let mut replayers = config.load_all().unwrap();
        let git = replayers.git.as_mut().unwrap();
        assert_eq!(git.next_interaction("git", "list_files").output, json!({"ok": []}));
        assert!(replayers.fs.is_none());
    }

    #[test]
    fn unreadable_cassette_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            CassetteConfig { llm: Some(dir.path().join("missing.yaml")), ..CassetteConfig::default() };
        let Err(message) = config.load_all() else {
            panic!("missing cassette should fail to load");
        };
        assert!(message.contains("missing.yaml"));
    }

    #[test]
    fn empty_config_loads_nothing() {
        let replayers = CassetteConfig::default().load_all().unwrap();
        assert!(replayers.llm.is_none());
        assert!(replayers.fs.is_none());
        assert!(replayers.git.is_none());
        assert!(replayers.resolver.is_none());
    }
}
