//! LLM-backed [`DocGenerator`].

use std::fmt::Write as _;
use std::sync::Arc;

use super::{DocFuture, DocGenerator, DocRequest};
use crate::ports::{CompletionRequest, LlmClient};
use crate::structure::DeclarationKind;

const SYSTEM_PROMPT: &str = "You write reference documentation for source code. \
Describe what the declaration does, its parameters and return value, and how it is \
used by the listed callers. Answer in Markdown without a top-level heading.";

/// Referencer lists are cut after this many entries.
const MAX_LISTED_REFERENCERS: usize = 20;

/// Generates documentation by prompting an [`LlmClient`].
pub struct LlmDocGenerator {
    llm: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
}

impl LlmDocGenerator {
    /// Wraps `llm`, sending every request to `model`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self { llm, model: model.into(), max_tokens }
    }
}

impl DocGenerator for LlmDocGenerator {
    fn generate(&self, request: &DocRequest) -> DocFuture<'_> {
        let completion = CompletionRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(request),
            max_tokens: self.max_tokens,
        };
        Box::pin(async move {
            let response = self.llm.complete(&completion).await?;
            Ok(response.text.trim().to_string())
        })
    }
}

fn kind_label(kind: DeclarationKind) -> &'static str {
    match kind {
        DeclarationKind::Function => "function",
        DeclarationKind::AsyncFunction => "async function",
        DeclarationKind::Method => "method",
        DeclarationKind::Class => "class",
    }
}

/// Renders the user prompt for one declaration.
#[must_use]
pub fn build_prompt(request: &DocRequest) -> String {
    let task = &request.task;
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Document the {} `{}` defined in `{}` (lines {}-{}).",
        kind_label(task.kind),
        task.name,
        task.file_path,
        task.span.start_line,
        task.span.end_line
    );
    if let Some(parent) = &task.parent {
        let _ = writeln!(prompt, "It is nested inside `{parent}`.");
    }
    let _ = writeln!(prompt, "\n```\n{}\n```", task.code);

    if request.referencers.is_empty() {
        prompt.push_str("\nNo other code in the repository references it.\n");
    } else {
        prompt.push_str("\nReferenced from:\n");
        for r in request.referencers.iter().take(MAX_LISTED_REFERENCERS) {
            let _ = writeln!(prompt, "- {}:{}", r.file_path, r.line);
        }
        let hidden = request.referencers.len().saturating_sub(MAX_LISTED_REFERENCERS);
        if hidden > 0 {
            let _ = writeln!(prompt, "- ... and {hidden} more");
        }
    }
    prompt
}
