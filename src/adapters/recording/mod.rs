//! Recording adapters that capture interactions to cassettes.

pub mod filesystem;
pub mod git;
pub mod llm;
pub mod resolver;

pub use filesystem::RecordingFileSystem;
pub use git::RecordingGitRepo;
pub use llm::RecordingLlmClient;
pub use resolver::RecordingResolver;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::cassette::recorder::CassetteRecorder;

/// Record an interaction with a plain (non-Result) return value.
///
/// Mirror of `replaying::next_output`.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input_json = to_json(port, method, "input", input);
    let output_json = to_json(port, method, "output", output);

    let mut guard = recorder.lock().expect("recorder lock poisoned");
    guard.record(port, method, input_json, output_json);
}

/// Record a `Result<T, E>` interaction.
///
/// `Ok(v)` is stored as `{"ok": v}` and `Err(e)` as `{"err": e.to_string()}`,
/// the shape `replaying::extract_result` reads back.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => serde_json::json!({ "ok": to_json(port, method, "result", v) }),
        Err(e) => serde_json::json!({ "err": e.to_string() }),
    };
    record_interaction(recorder, port, method, input, &output);
}

/// Serializes `value`, recording `null` with a warning when that fails. The
/// call itself already happened, so the run goes on with a lossy entry.
fn to_json<T: Serialize>(port: &str, method: &str, part: &str, value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(port, method, part, error = %e, "interaction could not be serialized; recording null");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::cassette::format::Cassette;

    #[test]
    fn unserializable_values_are_recorded_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            dir.path().join("fs.cassette.yaml"),
            "fs",
            "abc",
        )));
        let byte_keyed: HashMap<Vec<u8>, u8> = HashMap::from([(vec![1, 2], 3)]);
        let ok: Result<_, String> = Ok(byte_keyed.clone());

        record_interaction(&recorder, "fs", "exists", &byte_keyed, &true);
        record_result(&recorder, "fs", "read_to_string", &"a.py", &ok);

        let path = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();
        let cassette: Cassette = serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].input, Value::Null);
        assert_eq!(cassette.interactions[0].output, Value::Bool(true));
        assert_eq!(cassette.interactions[1].input, Value::from("a.py"));
        assert_eq!(cassette.interactions[1].output["ok"], Value::Null);
    }
}
