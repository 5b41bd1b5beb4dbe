//! Hierarchical documentation record: repository, directories, files and
//! declarations.
//!
//! Every node is owned by its parent through an insertion-ordered map, so
//! iteration order (and therefore the checkpoint and the generation order)
//! is deterministic. Declarations are keyed by name within their file; the
//! `parent` field records nesting.

pub mod checkpoint;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::error::{DocError, DocResult};
use crate::structure::{Declaration, DeclarationKind, FileStructure};

/// Version tag of a tree or node that has never been generated.
pub const UNGENERATED: i64 = -1;

/// Inclusive 1-based line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSpan {
    /// First line.
    pub start_line: usize,
    /// Last line.
    pub end_line: usize,
}

impl CodeSpan {
    /// Span of a whole file with `line_count` lines (at least one line).
    #[must_use]
    pub fn for_line_count(line_count: usize) -> Self {
        Self { start_line: 1, end_line: line_count.max(1) }
    }
}

/// Structural fingerprint of a declaration node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationMeta {
    /// Declaration kind.
    pub kind: DeclarationKind,
    /// Current line span.
    pub span: CodeSpan,
    /// Enclosing declaration name.
    pub parent: Option<String>,
    /// Column of the name token.
    pub name_column: usize,
}

impl DeclarationMeta {
    fn from_declaration(decl: &Declaration) -> Self {
        Self {
            kind: decl.kind,
            span: CodeSpan { start_line: decl.start_line, end_line: decl.end_line },
            parent: decl.parent.clone(),
            name_column: decl.name_column,
        }
    }
}

/// Kind-specific data of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeItem {
    /// Repository root.
    Repo,
    /// Directory.
    Directory,
    /// Source file.
    File {
        /// Whole-file span.
        span: CodeSpan,
    },
    /// Function, method or class.
    Declaration(DeclarationMeta),
}

/// Discriminant of [`NodeItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Repository root.
    Repo,
    /// Directory.
    Directory,
    /// Source file.
    File,
    /// Function, method or class.
    Declaration,
}

/// One node of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaNode {
    /// Last path component (or declaration name).
    pub name: String,
    /// Kind-specific fields.
    pub item: NodeItem,
    /// Generated documentation; empty until generated.
    pub doc_payload: String,
    /// Generation pass that produced `doc_payload`.
    pub version_tag: i64,
    /// Owned children in deterministic order.
    pub children: IndexMap<String, MetaNode>,
}

impl MetaNode {
    fn with_item(name: &str, item: NodeItem) -> Self {
        Self {
            name: name.to_string(),
            item,
            doc_payload: String::new(),
            version_tag: UNGENERATED,
            children: IndexMap::new(),
        }
    }

    /// New repository root.
    #[must_use]
    pub fn repo(name: &str) -> Self {
        Self::with_item(name, NodeItem::Repo)
    }

    /// New empty directory.
    #[must_use]
    pub fn directory(name: &str) -> Self {
        Self::with_item(name, NodeItem::Directory)
    }

    /// New empty file node.
    #[must_use]
    pub fn file(name: &str, span: CodeSpan) -> Self {
        Self::with_item(name, NodeItem::File { span })
    }

    /// New undocumented declaration node.
    #[must_use]
    pub fn declaration(decl: &Declaration) -> Self {
        Self::with_item(&decl.name, NodeItem::Declaration(DeclarationMeta::from_declaration(decl)))
    }

    /// Node kind.
    #[must_use]
    pub fn item_type(&self) -> ItemType {
        match self.item {
            NodeItem::Repo => ItemType::Repo,
            NodeItem::Directory => ItemType::Directory,
            NodeItem::File { .. } => ItemType::File,
            NodeItem::Declaration(_) => ItemType::Declaration,
        }
    }

    /// Line span, present for files and declarations.
    #[must_use]
    pub fn code_span(&self) -> Option<CodeSpan> {
        match &self.item {
            NodeItem::File { span } => Some(*span),
            NodeItem::Declaration(meta) => Some(meta.span),
            NodeItem::Repo | NodeItem::Directory => None,
        }
    }

    /// Declaration fingerprint, if this is a declaration node.
    #[must_use]
    pub fn declaration_meta(&self) -> Option<&DeclarationMeta> {
        match &self.item {
            NodeItem::Declaration(meta) => Some(meta),
            _ => None,
        }
    }

    /// Rebuilds the declaration a declaration node describes.
    #[must_use]
    pub fn to_declaration(&self) -> Option<Declaration> {
        let meta = self.declaration_meta()?;
        Some(Declaration {
            kind: meta.kind,
            name: self.name.clone(),
            start_line: meta.span.start_line,
            end_line: meta.span.end_line,
            parent: meta.parent.clone(),
            name_column: meta.name_column,
        })
    }

    /// Returns `true` once documentation has been generated.
    #[must_use]
    pub fn is_documented(&self) -> bool {
        !self.doc_payload.is_empty()
    }

    /// Overwrites structural fields from `decl`, keeping the payload.
    ///
    /// Returns `true` if kind or parent changed, which the reconciler reports
    /// as a conflict when it happens twice in one pass.
    pub fn refresh_from(&mut self, decl: &Declaration) -> bool {
        let fresh = DeclarationMeta::from_declaration(decl);
        let identity_changed = match &self.item {
            NodeItem::Declaration(old) => old.kind != fresh.kind || old.parent != fresh.parent,
            _ => true,
        };
        self.item = NodeItem::Declaration(fresh);
        identity_changed
    }

    /// Names of child nodes in order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

/// Counts reported by `dockeep status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// File nodes.
    pub files: usize,
    /// Declaration nodes.
    pub declarations: usize,
    /// Declaration nodes with a payload.
    pub documented: usize,
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTree {
    root: MetaNode,
    version_tag: i64,
}

impl MetaTree {
    /// Empty record for a repository.
    #[must_use]
    pub fn new(repo_name: &str) -> Self {
        Self { root: MetaNode::repo(repo_name), version_tag: UNGENERATED }
    }

    /// Builds the record by extracting every tracked source file.
    ///
    /// Files that cannot be read or parsed are logged and left out; they
    /// are picked up by a later update once they parse.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Git`] if the tracked file list is unavailable.
    pub fn init_from_source(ctx: &ServiceContext, settings: &Settings) -> DocResult<Self> {
        let files = ctx.git.list_files().map_err(|e| DocError::Git(e.to_string()))?;
        let mut tree = Self::new(&settings.repo_name());

        for path in files.iter().filter(|p| settings.tracks(p)) {
            let source = match ctx.fs.read_to_string(&settings.repo_path.join(path)) {
                Ok(source) => source,
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping unreadable file");
                    continue;
                }
            };
            match FileStructure::extract(ctx.extractor.as_ref(), path, &source) {
                Ok(structure) => {
                    tree.insert_structure(&structure);
                }
                Err(e) => warn!(path = %path, error = %e, "skipping file"),
            }
        }

        let stats = tree.stats();
        info!(
            files = stats.files,
            declarations = stats.declarations,
            "built documentation record from source"
        );
        Ok(tree)
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> &MetaNode {
        &self.root
    }

    /// Version of the last complete generation pass, or [`UNGENERATED`].
    #[must_use]
    pub fn version_tag(&self) -> i64 {
        self.version_tag
    }

    /// Version the next generation pass will stamp on regenerated nodes.
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.version_tag.max(UNGENERATED) + 1
    }

    /// Records a completed full-tree generation pass.
    pub fn bump_version(&mut self) {
        self.version_tag = self.next_version();
    }

    pub(crate) fn set_version_tag(&mut self, version_tag: i64) {
        self.version_tag = version_tag;
    }

    /// File node at `path`, creating it and any missing directories.
    ///
    /// An existing file keeps its declarations; only its span is updated.
    pub fn file_entry(&mut self, path: &str, span: CodeSpan) -> &mut MetaNode {
        let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let file_name = parts.pop().unwrap_or(path);

        let mut node = &mut self.root;
        for dir in parts {
            node = node
                .children
                .entry(dir.to_string())
                .or_insert_with(|| MetaNode::directory(dir));
        }
        let file = node
            .children
            .entry(file_name.to_string())
            .or_insert_with(|| MetaNode::file(file_name, span));
        file.item = NodeItem::File { span };
        file
    }

    /// Inserts (or replaces) a file with fresh, undocumented declarations.
    pub fn insert_structure(&mut self, structure: &FileStructure) -> &mut MetaNode {
        let file = self.file_entry(&structure.path, CodeSpan::for_line_count(structure.line_count));
        file.children = structure
            .declarations
            .iter()
            .map(|d| (d.name.clone(), MetaNode::declaration(d)))
            .collect();
        file
    }

    /// File node at `path`.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&MetaNode> {
        let mut node = &self.root;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.children.get(part)?;
        }
        (node.item_type() == ItemType::File).then_some(node)
    }

    /// Mutable file node at `path`.
    pub fn file_mut(&mut self, path: &str) -> Option<&mut MetaNode> {
        let mut node = &mut self.root;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.children.get_mut(part)?;
        }
        (node.item_type() == ItemType::File).then_some(node)
    }

    /// Removes a file node, pruning directories left empty.
    pub fn remove_file(&mut self, path: &str) -> Option<MetaNode> {
        self.file(path)?;
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let removed = remove_path(&mut self.root, &parts);
        if removed.is_some() {
            info!(path = %path, "removed file from documentation record");
        }
        removed
    }

    /// Stores a generated payload on a declaration node.
    ///
    /// Returns `false` if the node no longer exists.
    pub fn set_doc(&mut self, file_path: &str, name: &str, payload: String) -> bool {
        let version = self.next_version();
        let Some(node) = self.file_mut(file_path).and_then(|f| f.children.get_mut(name)) else {
            return false;
        };
        node.doc_payload = payload;
        node.version_tag = version;
        true
    }

    /// Paths of all file nodes in tree order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<String> {
        self.topological_order()
            .into_iter()
            .filter(|r| r.node.item_type() == ItemType::File)
            .map(|r| r.full_path.to_string())
            .collect()
    }

    /// Generation order: children before parents.
    ///
    /// Declarations come before their file (in structure order), files before
    /// their directory, and the root last. Dependency order between
    /// declarations is not considered.
    #[must_use]
    pub fn topological_order(&self) -> Vec<OrderedNode<'_>> {
        let mut out = Vec::new();
        post_order(&self.root, String::new(), &mut out);
        out
    }

    /// Counts of files, declarations and documented declarations.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for entry in self.topological_order() {
            match entry.node.item_type() {
                ItemType::File => stats.files += 1,
                ItemType::Declaration => {
                    stats.declarations += 1;
                    if entry.node.is_documented() {
                        stats.documented += 1;
                    }
                }
                ItemType::Repo | ItemType::Directory => {}
            }
        }
        stats
    }
}

/// An entry of [`MetaTree::topological_order`].
#[derive(Debug, Clone)]
pub struct OrderedNode<'a> {
    /// `/`-joined names below the root; empty for the root.
    pub full_path: String,
    /// The node.
    pub node: &'a MetaNode,
}

impl OrderedNode<'_> {
    /// Path of the file owning a declaration entry.
    #[must_use]
    pub fn owning_file(&self) -> Option<&str> {
        if self.node.item_type() != ItemType::Declaration {
            return None;
        }
        self.full_path.rsplit_once('/').map(|(file, _)| file)
    }
}

fn post_order<'a>(node: &'a MetaNode, path: String, out: &mut Vec<OrderedNode<'a>>) {
    for (name, child) in &node.children {
        let child_path = if path.is_empty() { name.clone() } else { format!("{path}/{name}") };
        post_order(child, child_path, out);
    }
    out.push(OrderedNode { full_path: path, node });
}

fn remove_path(node: &mut MetaNode, parts: &[&str]) -> Option<MetaNode> {
    let (first, rest) = parts.split_first()?;
    if rest.is_empty() {
        return node.children.shift_remove(*first);
    }
    let child = node.children.get_mut(*first)?;
    let removed = remove_path(child, rest);
    if removed.is_some() && child.item_type() == ItemType::Directory && child.children.is_empty() {
        node.children.shift_remove(*first);
    }
    removed
}
