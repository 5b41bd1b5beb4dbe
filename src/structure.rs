//! Structural snapshot of a source file: declarations and their nesting.
//!
//! The structure extractor port produces raw declarations; this module
//! normalizes their order (by start line, outer before inner) and enforces
//! the nesting invariants the rest of the engine relies on.

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DocError, DocResult};
use crate::ports::StructureExtractor;

/// Kind of a structural declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Free function.
    #[serde(rename = "FunctionDef")]
    Function,
    /// Free `async` function.
    #[serde(rename = "AsyncFunctionDef")]
    AsyncFunction,
    /// Function defined directly inside a class.
    #[serde(rename = "MethodDef")]
    Method,
    /// Class definition.
    #[serde(rename = "ClassDef")]
    Class,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Function => "FunctionDef",
            Self::AsyncFunction => "AsyncFunctionDef",
            Self::Method => "MethodDef",
            Self::Class => "ClassDef",
        };
        f.write_str(label)
    }
}

/// A named structural unit with a contiguous 1-based inclusive line span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declaration kind.
    pub kind: DeclarationKind,
    /// Declared name.
    pub name: String,
    /// First line (1-based).
    pub start_line: usize,
    /// Last line (1-based, inclusive).
    pub end_line: usize,
    /// Name of the nearest enclosing declaration, if any.
    pub parent: Option<String>,
    /// 0-based column of the name token on `start_line`.
    pub name_column: usize,
}

impl Declaration {
    /// Returns `true` if `line` falls within `[start_line, end_line]`.
    #[must_use]
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Attribution identity: name plus parent name.
    #[must_use]
    pub fn id(&self) -> DeclarationId {
        DeclarationId { name: self.name.clone(), parent: self.parent.clone() }
    }
}

/// Identity used for attribution, stable across line shifts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationId {
    /// Declared name.
    pub name: String,
    /// Enclosing declaration name.
    pub parent: Option<String>,
}

impl DeclarationId {
    /// Builds an id from borrowed parts.
    #[must_use]
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self { name: name.to_string(), parent: parent.map(str::to_string) }
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{parent}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Ordered, validated declarations of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStructure {
    /// Repository-relative path.
    pub path: String,
    /// Number of lines in the source text.
    pub line_count: usize,
    /// Declarations ordered by start line, outer before inner.
    pub declarations: Vec<Declaration>,
}

impl FileStructure {
    /// Runs the extractor on `source` and validates its output.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::StructureExtraction`] if the extractor fails or
    /// returns declarations that violate the span invariants.
    pub fn extract(
        extractor: &dyn StructureExtractor,
        path: &str,
        source: &str,
    ) -> DocResult<Self> {
        let declarations = extractor.extract(path, source).map_err(|e| {
            DocError::StructureExtraction { path: path.to_string(), message: e.to_string() }
        })?;
        Self::from_declarations(path, source.lines().count(), declarations)
    }

    /// Orders and validates an already extracted declaration list.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::StructureExtraction`] if a span is inverted or a
    /// child escapes its parent's span.
    pub fn from_declarations(
        path: &str,
        line_count: usize,
        mut declarations: Vec<Declaration>,
    ) -> DocResult<Self> {
        declarations.sort_by_key(|d| (d.start_line, Reverse(d.end_line)));
        validate(path, &declarations)?;
        Ok(Self { path: path.to_string(), line_count, declarations })
    }

    /// Declarations whose parent is `parent` (top level when `None`).
    pub fn children_of<'a>(
        &'a self,
        parent: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.declarations.iter().filter(move |d| d.parent.as_deref() == parent)
    }

    /// Declaration names, in structure order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|d| d.name.as_str())
    }

    /// First declaration with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Source lines covered by `decl`, joined with newlines.
    #[must_use]
    pub fn code_of(decl: &Declaration, source: &str) -> String {
        source
            .lines()
            .skip(decl.start_line.saturating_sub(1))
            .take(decl.end_line + 1 - decl.start_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Checks span ordering and parent containment.
///
/// Parents are matched by name against the stack of currently open spans,
/// which works because declarations are sorted outer-before-inner.
fn validate(path: &str, declarations: &[Declaration]) -> DocResult<()> {
    let fail = |message: String| DocError::StructureExtraction { path: path.to_string(), message };
    let mut open: Vec<&Declaration> = Vec::new();

    for decl in declarations {
        if decl.start_line == 0 || decl.start_line > decl.end_line {
            return Err(fail(format!(
                "{} has invalid span {}..{}",
                decl.name, decl.start_line, decl.end_line
            )));
        }
        while open.last().is_some_and(|o| o.end_line < decl.start_line) {
            open.pop();
        }
        if let Some(parent) = &decl.parent {
            let Some(enclosing) = open.iter().rev().find(|o| &o.name == parent) else {
                return Err(fail(format!("{} is not nested inside parent {parent}", decl.name)));
            };
            if decl.end_line > enclosing.end_line {
                return Err(fail(format!("{} overruns parent {parent}", decl.name)));
            }
        }
        open.push(decl);
    }
    Ok(())
}
