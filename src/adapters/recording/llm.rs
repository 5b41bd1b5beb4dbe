//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a recording LLM client wrapping `inner`.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CompletionResponse;

    struct Fixed;

    impl LlmClient for Fixed {
        fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
            Box::pin(async {
                Ok(CompletionResponse { text: "doc".into(), prompt_tokens: 3, completion_tokens: 1 })
            })
        }
    }

    #[tokio::test]
    async fn records_request_and_response() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            dir.path().join("llm.cassette.yaml"),
            "llm",
            "abc",
        )));
        let client = RecordingLlmClient::new(Box::new(Fixed), Arc::clone(&recorder));
        let request = CompletionRequest {
            model: "m".into(),
            system: "s".into(),
            prompt: "p".into(),
            max_tokens: 4,
        };
        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.text, "doc");
        drop(client);

        let path = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap().finish().unwrap();
        let cassette: crate::cassette::format::Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let interaction = &cassette.interactions[0];
        assert_eq!(interaction.input["prompt"], "p");
        assert_eq!(interaction.output["ok"]["text"], "doc");
    }
}
