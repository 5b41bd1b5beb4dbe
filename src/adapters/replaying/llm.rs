//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CompletionRequest, CompletionResponse, LlmClient, LlmFuture};

/// Serves recorded completions in call order.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Creates a replaying LLM client from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        let output = next_output(&self.replayer, "llm", "complete");
        Box::pin(async move { extract_result::<CompletionResponse>(&output, "llm::complete") })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::replaying::tests::replayer;

    fn request() -> CompletionRequest {
        CompletionRequest { model: "m".into(), system: String::new(), prompt: "p".into(), max_tokens: 8 }
    }

    #[tokio::test]
    async fn replays_completions_then_errors() {
        let client = ReplayingLlmClient::new(replayer(
            "llm",
            vec![
                (
                    "complete",
                    json!({"ok": {"text": "Parses a diff.", "prompt_tokens": 40, "completion_tokens": 4}}),
                ),
                ("complete", json!({"err": "rate limited"})),
            ],
        ));
        let first = client.complete(&request()).await.unwrap();
        assert_eq!(first.text, "Parses a diff.");
        assert_eq!(first.prompt_tokens, 40);
        let second = client.complete(&request()).await.unwrap_err();
        assert_eq!(second.to_string(), "rate limited");
    }
}
