//! Documentation generation: the generator boundary and the bounded
//! scheduler that drives it.

pub mod prompt;
pub mod scheduler;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::PortError;
use crate::meta::CodeSpan;
use crate::ports::Referencer;
use crate::structure::{Declaration, DeclarationKind, FileStructure};

pub use prompt::LlmDocGenerator;
pub use scheduler::{GenerationReport, GenerationScheduler, StopHandle};

/// Boxed future returned by [`DocGenerator::generate`].
pub type DocFuture<'a> = Pin<Box<dyn Future<Output = Result<String, PortError>> + Send + 'a>>;

/// One declaration to (re)document, with everything except its referencers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Repository-relative path of the declaring file.
    pub file_path: String,
    /// Declaration name.
    pub name: String,
    /// Declaration kind.
    pub kind: DeclarationKind,
    /// Enclosing declaration name.
    pub parent: Option<String>,
    /// Current span.
    pub span: CodeSpan,
    /// Column of the name token.
    pub name_column: usize,
    /// Source text of the declaration.
    pub code: String,
}

impl GenerationTask {
    /// Task for `decl`, slicing its code out of `source`.
    #[must_use]
    pub fn from_declaration(file_path: &str, decl: &Declaration, source: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            name: decl.name.clone(),
            kind: decl.kind,
            parent: decl.parent.clone(),
            span: CodeSpan { start_line: decl.start_line, end_line: decl.end_line },
            name_column: decl.name_column,
            code: FileStructure::code_of(decl, source),
        }
    }

    /// Full path of the target node, `file/name`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}/{}", self.file_path, self.name)
    }
}

/// Input handed to a [`DocGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRequest {
    /// The declaration being documented.
    pub task: GenerationTask,
    /// Locations that use the declaration.
    pub referencers: Vec<Referencer>,
}

/// Produces documentation text for one declaration.
pub trait DocGenerator: Send + Sync {
    /// Generates documentation for `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing model call fails.
    fn generate(&self, request: &DocRequest) -> DocFuture<'_>;
}
