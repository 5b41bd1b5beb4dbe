//! Brings one file's subtree in line with its current declarations.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::attribution::StructureChanges;
use crate::error::DocResult;
use crate::meta::MetaNode;
use crate::structure::{Declaration, DeclarationId};

/// Declarations whose documentation must be regenerated. Holds at most one
/// entry per name, so every entry is a distinct node.
pub type DirtySet = BTreeSet<DeclarationId>;

/// Reconciles `file_node` against `current` and returns the dirty set.
///
/// Declarations missing from `current` are dropped, surviving ones keep
/// their payload while their kind, span, parent and name column are
/// refreshed, and new ones are created empty. Children end up in `current`
/// order. If `current` is an error the subtree is left untouched and the
/// error is returned.
///
/// # Errors
///
/// Returns the extraction error carried by `current`.
pub fn reconcile(
    file_node: &mut MetaNode,
    previous: &[Declaration],
    current: DocResult<&[Declaration]>,
    attribution: &StructureChanges,
) -> DocResult<DirtySet> {
    let current = current?;
    let file = file_node.name.clone();
    let previous_names: HashSet<&str> = previous.iter().map(|d| d.name.as_str()).collect();

    let mut old = std::mem::take(&mut file_node.children);
    for decl in current {
        if let Some(existing) = file_node.children.get_mut(&decl.name) {
            if existing.refresh_from(decl) {
                warn!(
                    file = %file,
                    name = %decl.name,
                    kind = %decl.kind,
                    "declaration name reused with a different kind or parent; keeping the last one"
                );
            }
            continue;
        }
        let node = match old.shift_remove(&decl.name) {
            Some(mut node) => {
                if node.refresh_from(decl) {
                    debug!(file = %file, name = %decl.name, "declaration changed kind or parent");
                }
                node
            }
            None => {
                debug!(file = %file, name = %decl.name, "new declaration");
                MetaNode::declaration(decl)
            }
        };
        file_node.children.insert(decl.name.clone(), node);
    }

    for name in old.keys() {
        if previous_names.contains(name.as_str()) {
            info!(file = %file, name = %name, "removed declaration");
        } else {
            warn!(file = %file, name = %name, "removed stale declaration missing from both snapshots");
        }
    }

    // Nodes are keyed by name, so the id that survives is the last writer's.
    let touched: HashSet<&str> = attribution.added.iter().map(|id| id.name.as_str()).collect();
    let mut last_by_name: HashMap<&str, &Declaration> = HashMap::new();
    for decl in current {
        last_by_name.insert(decl.name.as_str(), decl);
    }
    let dirty: DirtySet = last_by_name
        .into_iter()
        .filter(|(name, _)| touched.contains(name))
        .map(|(_, decl)| decl.id())
        .collect();
    debug!(file = %file, dirty = dirty.len(), "reconciled");
    Ok(dirty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocError;
    use crate::meta::checkpoint::tests::MemFs;
    use crate::meta::{CodeSpan, ItemType, MetaTree};
    use crate::structure::tests::decl;
    use crate::structure::DeclarationKind;
    use proptest::prelude::*;
    use std::path::Path;

    fn file_with(previous: &[Declaration]) -> MetaNode {
        let mut node = MetaNode::file("m.py", CodeSpan::for_line_count(40));
        for d in previous {
            node.children.insert(d.name.clone(), MetaNode::declaration(d));
        }
        node
    }

    fn names(node: &MetaNode) -> Vec<&str> {
        node.child_names().collect()
    }

    fn added(ids: &[(&str, Option<&str>)]) -> StructureChanges {
        StructureChanges {
            added: ids.iter().map(|(n, p)| DeclarationId::new(n, *p)).collect(),
            removed: BTreeSet::new(),
        }
    }

    #[test]
    fn grown_function_refreshes_span_and_new_helper_is_dirty() {
        let previous = vec![decl(DeclarationKind::Function, "f", 1, 5, None)];
        let current = vec![
            decl(DeclarationKind::Function, "f", 1, 6, None),
            decl(DeclarationKind::Function, "h", 7, 9, None),
        ];
        let mut node = file_with(&previous);
        node.children.get_mut("f").unwrap().doc_payload = "Does f.".into();

        let dirty =
            reconcile(&mut node, &previous, Ok(current.as_slice()), &added(&[("h", None)])).unwrap();

        assert_eq!(dirty.into_iter().collect::<Vec<_>>(), vec![DeclarationId::new("h", None)]);
        let f = node.children.get("f").unwrap();
        assert_eq!(f.code_span(), Some(CodeSpan { start_line: 1, end_line: 6 }));
        assert_eq!(f.doc_payload, "Does f.");
        assert_eq!(node.children.get("h").unwrap().doc_payload, "");
    }

    #[test]
    fn removed_declaration_leaves_tree_and_dirty_set() {
        let previous = vec![
            decl(DeclarationKind::Function, "keep", 1, 3, None),
            decl(DeclarationKind::Function, "gone", 5, 8, None),
        ];
        let current = vec![decl(DeclarationKind::Function, "keep", 1, 3, None)];
        let mut node = file_with(&previous);
        let attribution = StructureChanges {
            added: BTreeSet::new(),
            removed: [DeclarationId::new("gone", None)].into_iter().collect(),
        };
        let dirty = reconcile(&mut node, &previous, Ok(current.as_slice()), &attribution).unwrap();
        assert!(dirty.is_empty());
        assert_eq!(names(&node), vec!["keep"]);
    }

    #[test]
    fn modified_in_place_is_dirty() {
        let decls = vec![decl(DeclarationKind::Function, "f", 1, 4, None)];
        let mut node = file_with(&decls);
        let attribution = StructureChanges {
            added: [DeclarationId::new("f", None)].into_iter().collect(),
            removed: [DeclarationId::new("f", None)].into_iter().collect(),
        };
        let dirty = reconcile(&mut node, &decls, Ok(decls.as_slice()), &attribution).unwrap();
        assert!(dirty.contains(&DeclarationId::new("f", None)));
    }

    #[test]
    fn extraction_failure_leaves_subtree_untouched() {
        let previous = vec![decl(DeclarationKind::Class, "C", 1, 9, None)];
        let mut node = file_with(&previous);
        let before = node.clone();
        let failure = Err(DocError::StructureExtraction {
            path: "m.py".into(),
            message: "syntax error".into(),
        });
        let result = reconcile(&mut node, &previous, failure, &added(&[("C", None)]));
        assert!(result.is_err());
        assert_eq!(node, before);
    }

    #[test]
    fn second_pass_without_attribution_is_clean() {
        let previous = vec![decl(DeclarationKind::Function, "a", 1, 2, None)];
        let current = vec![
            decl(DeclarationKind::Function, "a", 1, 2, None),
            decl(DeclarationKind::Function, "b", 4, 6, None),
        ];
        let mut node = file_with(&previous);
        let first = reconcile(&mut node, &previous, Ok(current.as_slice()), &added(&[("b", None)])).unwrap();
        assert_eq!(first.len(), 1);
        let after_first = node.clone();
        let second =
            reconcile(&mut node, &current, Ok(current.as_slice()), &StructureChanges::default()).unwrap();
        assert!(second.is_empty());
        assert_eq!(node, after_first);
    }

    #[test]
    fn reused_name_keeps_last_declaration() {
        let current = vec![
            decl(DeclarationKind::Function, "run", 1, 3, None),
            decl(DeclarationKind::Class, "Job", 5, 12, None),
            decl(DeclarationKind::Method, "run", 6, 9, Some("Job")),
        ];
        let mut node = file_with(&[]);
        reconcile(&mut node, &[], Ok(current.as_slice()), &StructureChanges::default()).unwrap();
        assert_eq!(names(&node), vec!["run", "Job"]);
        let run = node.children.get("run").unwrap().declaration_meta().unwrap();
        assert_eq!(run.kind, DeclarationKind::Method);
        assert_eq!(run.parent.as_deref(), Some("Job"));
    }

    #[test]
    fn children_follow_current_order() {
        let previous = vec![
            decl(DeclarationKind::Function, "b", 1, 2, None),
            decl(DeclarationKind::Function, "a", 4, 5, None),
        ];
        let current = vec![
            decl(DeclarationKind::Function, "a", 1, 2, None),
            decl(DeclarationKind::Function, "b", 4, 5, None),
        ];
        let mut node = file_with(&previous);
        reconcile(&mut node, &previous, Ok(current.as_slice()), &StructureChanges::default()).unwrap();
        assert_eq!(names(&node), vec!["a", "b"]);
        assert!(node.children.values().all(|c| c.item_type() == ItemType::Declaration));
    }

    #[test]
    fn reused_name_is_dirty_once_as_last_writer() {
        let current = vec![
            decl(DeclarationKind::Function, "run", 1, 3, None),
            decl(DeclarationKind::Class, "Job", 5, 12, None),
            decl(DeclarationKind::Method, "run", 6, 9, Some("Job")),
        ];
        let mut node = file_with(&[]);
        let attribution = added(&[("run", None), ("run", Some("Job")), ("Job", None)]);
        let dirty = reconcile(&mut node, &[], Ok(current.as_slice()), &attribution).unwrap();
        assert_eq!(
            dirty.into_iter().collect::<Vec<_>>(),
            vec![DeclarationId::new("Job", None), DeclarationId::new("run", Some("Job"))]
        );
    }

    fn decls_from(names: &BTreeSet<usize>) -> Vec<Declaration> {
        names
            .iter()
            .map(|&i| {
                let start = i * 3 + 1;
                decl(DeclarationKind::Function, &format!("f{i}"), start, start + 1, None)
            })
            .collect()
    }

    fn nested_decls(entries: &[(usize, bool)]) -> Vec<Declaration> {
        entries
            .iter()
            .map(|&(i, nested)| {
                let start = i * 3 + 1;
                if nested {
                    decl(DeclarationKind::Method, &format!("f{i}"), start, start + 1, Some("C"))
                } else {
                    decl(DeclarationKind::Function, &format!("f{i}"), start, start + 1, None)
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn file_children_match_current_names(
            prev in proptest::collection::btree_set(0usize..8, 0..8),
            curr in proptest::collection::btree_set(0usize..8, 0..8),
            touched in proptest::collection::btree_set(0usize..8, 0..8),
        ) {
            let previous = decls_from(&prev);
            let current = decls_from(&curr);
            let mut node = file_with(&previous);
            let attribution = StructureChanges {
                added: touched.iter().map(|i| DeclarationId::new(&format!("f{i}"), None)).collect(),
                removed: BTreeSet::new(),
            };

            let dirty = reconcile(&mut node, &previous, Ok(current.as_slice()), &attribution).unwrap();

            let got: Vec<&str> = node.child_names().collect();
            let want: Vec<&str> = current.iter().map(|d| d.name.as_str()).collect();
            prop_assert_eq!(got, want);
            for id in &dirty {
                let found = curr.iter().any(|i| format!("f{i}") == id.name);
                prop_assert!(found);
            }
        }

        #[test]
        fn reconciled_tree_survives_checkpoint(
            prev in proptest::collection::vec((0usize..6, any::<bool>()), 0..8),
            curr in proptest::collection::vec((0usize..6, any::<bool>()), 0..8),
            touched in proptest::collection::btree_set(0usize..6, 0..6),
        ) {
            let previous = nested_decls(&prev);
            let current = nested_decls(&curr);
            let mut tree = MetaTree::new("repo");
            let file = tree.file_entry("pkg/m.py", CodeSpan::for_line_count(40));
            reconcile(file, &[], Ok(previous.as_slice()), &StructureChanges::default()).unwrap();
            for d in previous.iter().step_by(2) {
                tree.set_doc("pkg/m.py", &d.name, format!("Does {}.", d.name));
            }
            let attribution = StructureChanges {
                added: touched.iter().map(|i| DeclarationId::new(&format!("f{i}"), None)).collect(),
                removed: BTreeSet::new(),
            };

            let file = tree.file_entry("pkg/m.py", CodeSpan::for_line_count(40));
            let dirty = reconcile(file, &previous, Ok(current.as_slice()), &attribution).unwrap();

            let dirty_names: HashSet<&str> = dirty.iter().map(|id| id.name.as_str()).collect();
            prop_assert_eq!(dirty_names.len(), dirty.len());

            let fs = MemFs::default();
            let record = Path::new("/repo/record.json");
            tree.checkpoint(&fs, record).unwrap();
            let restored = MetaTree::restore(&fs, record).unwrap();
            prop_assert_eq!(restored, tree);
        }
    }
}
