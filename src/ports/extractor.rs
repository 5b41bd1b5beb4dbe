//! Structure extractor port: source text to declarations.

use crate::error::PortError;
use crate::structure::Declaration;

/// Parses source text into structural declarations.
///
/// Output need not be sorted; [`crate::structure::FileStructure`] orders and
/// validates it.
pub trait StructureExtractor: Send + Sync {
    /// Extracts functions, classes and methods from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    fn extract(&self, path: &str, source: &str) -> Result<Vec<Declaration>, PortError>;
}
