//! Replaying adapters that serve recorded interactions.

pub mod filesystem;
pub mod git;
pub mod llm;
pub mod resolver;

pub use filesystem::ReplayingFileSystem;
pub use git::ReplayingGitRepo;
pub use llm::ReplayingLlmClient;
pub use resolver::ReplayingResolver;

use std::sync::Mutex;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;

/// Output of the next recorded `port::method` interaction.
///
/// # Panics
///
/// Panics if the cassette has no interaction left for the pair.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).output
}

/// Reads a recorded `{"ok": v}` / `{"err": msg}` output.
pub(crate) fn extract_result<T: serde::de::DeserializeOwned>(
    output: &serde_json::Value,
    context: &str,
) -> Result<T, PortError> {
    if let Some(err) = output.get("err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(msg.into());
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};

    pub(crate) fn replayer(port: &str, calls: Vec<(&str, serde_json::Value)>) -> CassetteReplayer {
        let interactions = calls
            .into_iter()
            .enumerate()
            .map(|(seq, (method, output))| Interaction {
                seq: seq as u64,
                port: port.into(),
                method: method.into(),
                input: serde_json::json!({}),
                output,
            })
            .collect();
        CassetteReplayer::new(&Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        })
    }

    #[test]
    fn extract_result_reads_ok_and_err() {
        let ok: Vec<String> = extract_result(&serde_json::json!({"ok": ["a"]}), "t").unwrap();
        assert_eq!(ok, vec!["a"]);
        let err = extract_result::<String>(&serde_json::json!({"err": "boom"}), "t").unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn extract_result_reports_shape_mismatch() {
        let err = extract_result::<u32>(&serde_json::json!({"ok": "x"}), "git::list_files")
            .unwrap_err();
        assert!(err.to_string().starts_with("git::list_files"));
    }
}
