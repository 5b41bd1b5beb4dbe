//! Reference resolver port: who uses a given declaration.

use serde::{Deserialize, Serialize};

use crate::error::PortError;

/// How far to search for references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceScope {
    /// Only the declaring file.
    InFile,
    /// Every source file in the repository.
    #[default]
    WholeRepo,
}

/// Position of the declaration whose referencers are wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceQuery {
    /// Declared name.
    pub name: String,
    /// Repository-relative path of the declaring file.
    pub file_path: String,
    /// 1-based line of the name token.
    pub line: usize,
    /// 0-based column of the name token.
    pub column: usize,
    /// Search scope.
    pub scope: ReferenceScope,
}

/// A location that uses a declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Referencer {
    /// Repository-relative path.
    pub file_path: String,
    /// 1-based line number.
    pub line: usize,
}

/// Finds usages of a declaration.
pub trait ReferenceResolver: Send + Sync {
    /// Returns every location referencing the queried declaration, excluding
    /// the declaration itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be searched.
    fn find_referencers(&self, query: &ReferenceQuery) -> Result<Vec<Referencer>, PortError>;
}
