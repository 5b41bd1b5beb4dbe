//! Python structure extractor built on tree-sitter.

use tree_sitter::{Node, Parser};

use crate::error::PortError;
use crate::ports::StructureExtractor;
use crate::structure::{Declaration, DeclarationKind};

/// Extracts functions, methods and classes from Python source.
pub struct PythonExtractor;

struct Scope<'s> {
    name: &'s str,
    is_class: bool,
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> Result<&'s str, PortError> {
    Ok(node.utf8_text(source.as_bytes())?)
}

fn is_async(node: Node<'_>) -> bool {
    node.child(0).is_some_and(|c| c.kind() == "async")
}

fn collect<'s>(
    node: Node<'_>,
    source: &'s str,
    scope: Option<&Scope<'s>>,
    out: &mut Vec<Declaration>,
) -> Result<(), PortError> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let is_class = match child.kind() {
            "class_definition" => true,
            "function_definition" => false,
            _ => {
                collect(child, source, scope, out)?;
                continue;
            }
        };
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(name_node, source)?;
        let kind = if is_class {
            DeclarationKind::Class
        } else if scope.is_some_and(|s| s.is_class) {
            DeclarationKind::Method
        } else if is_async(child) {
            DeclarationKind::AsyncFunction
        } else {
            DeclarationKind::Function
        };
        out.push(Declaration {
            kind,
            name: name.to_string(),
            start_line: child.start_position().row + 1,
            end_line: child.end_position().row + 1,
            parent: scope.map(|s| s.name.to_string()),
            name_column: name_node.start_position().column,
        });
        collect(child, source, Some(&Scope { name, is_class }), out)?;
    }
    Ok(())
}

impl StructureExtractor for PythonExtractor {
    fn extract(&self, path: &str, source: &str) -> Result<Vec<Declaration>, PortError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| format!("Failed to set language: {e}"))?;
        let tree = parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| format!("Failed to parse {path}"))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(format!("{path}: syntax error").into());
        }

        let mut declarations = Vec::new();
        collect(root, source, None, &mut declarations)?;
        Ok(declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
import os


class Store:
    \"\"\"Keeps things.\"\"\"

    def load(self, key):
        return key

    @staticmethod
    async def fetch():
        def inner():
            pass
        return inner


def main():
    Store().load(1)


async def serve():
    pass
";

    fn by_name<'a>(decls: &'a [Declaration], name: &str) -> &'a Declaration {
        decls.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn extracts_nested_declarations_with_spans() {
        let decls = PythonExtractor.extract("store.py", SOURCE).unwrap();
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Store", "load", "fetch", "inner", "main", "serve"]);

        let store = by_name(&decls, "Store");
        assert_eq!((store.start_line, store.end_line), (4, 14));
        assert_eq!(store.kind, DeclarationKind::Class);
        assert_eq!(store.name_column, 6);

        let load = by_name(&decls, "load");
        assert_eq!(load.kind, DeclarationKind::Method);
        assert_eq!(load.parent.as_deref(), Some("Store"));
        assert_eq!((load.start_line, load.end_line, load.name_column), (7, 8, 8));
    }

    #[test]
    fn decorated_method_starts_at_def_line() {
        let decls = PythonExtractor.extract("store.py", SOURCE).unwrap();
        let fetch = by_name(&decls, "fetch");
        assert_eq!(fetch.kind, DeclarationKind::Method);
        assert_eq!(fetch.start_line, 11);
        let inner = by_name(&decls, "inner");
        assert_eq!(inner.kind, DeclarationKind::Function);
        assert_eq!(inner.parent.as_deref(), Some("fetch"));
    }

    #[test]
    fn async_top_level_function() {
        let decls = PythonExtractor.extract("store.py", SOURCE).unwrap();
        let serve = by_name(&decls, "serve");
        assert_eq!(serve.kind, DeclarationKind::AsyncFunction);
        assert_eq!(serve.parent, None);
        assert_eq!(by_name(&decls, "main").kind, DeclarationKind::Function);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = PythonExtractor.extract("bad.py", "def broken(:\n    pass\n").unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn empty_source_has_no_declarations() {
        assert!(PythonExtractor.extract("empty.py", "").unwrap().is_empty());
    }
}
