//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the documentation engine and an
//! external collaborator (filesystem, git, structure extractor, reference
//! resolver, LLM). Implementations live in `src/adapters/`.

pub mod extractor;
pub mod filesystem;
pub mod git;
pub mod llm;
pub mod resolver;

pub use extractor::StructureExtractor;
pub use filesystem::FileSystem;
pub use git::{ChangeStatus, GitRepo, StagedFile};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmFuture};
pub use resolver::{ReferenceQuery, ReferenceResolver, ReferenceScope, Referencer};
