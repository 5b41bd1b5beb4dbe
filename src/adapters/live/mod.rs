//! Live adapters for real external interactions.

pub mod extractor;
pub mod filesystem;
pub mod git;
pub mod llm;
pub mod resolver;
