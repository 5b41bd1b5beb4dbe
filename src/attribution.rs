//! Maps changed lines onto the declarations that contain them.
//!
//! A line inside a nested declaration attributes to every enclosing
//! declaration as well. Renames are not detected: the old span attributes to
//! the old name and the new span to the new name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::diff::{ChangedLines, LineKind, LineRecord};
use crate::structure::{Declaration, DeclarationId};

/// Declarations touched by an edit, split by the side of the change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureChanges {
    /// Declarations containing at least one added line.
    pub added: BTreeSet<DeclarationId>,
    /// Declarations containing at least one removed line.
    pub removed: BTreeSet<DeclarationId>,
}

impl StructureChanges {
    /// Returns `true` when no declaration was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Ids present on both sides: modified in place rather than renamed.
    pub fn modified_in_place(&self) -> impl Iterator<Item = &DeclarationId> {
        self.added.intersection(&self.removed)
    }

    fn side_mut(&mut self, kind: LineKind) -> &mut BTreeSet<DeclarationId> {
        match kind {
            LineKind::Added => &mut self.added,
            LineKind::Removed => &mut self.removed,
        }
    }
}

fn attribute_lines(
    records: &[LineRecord],
    declarations: &[Declaration],
    into: &mut BTreeSet<DeclarationId>,
) {
    for record in records {
        for decl in declarations.iter().filter(|d| d.contains_line(record.line_number)) {
            into.insert(decl.id());
        }
    }
}

/// Attributes both added and removed lines against one declaration list.
///
/// Every declaration whose span contains a changed line of a given kind is
/// added to that kind's set.
#[must_use]
pub fn attribute(changed: &ChangedLines, declarations: &[Declaration]) -> StructureChanges {
    let mut result = StructureChanges::default();
    for kind in [LineKind::Added, LineKind::Removed] {
        attribute_lines(changed.of_kind(kind), declarations, result.side_mut(kind));
    }
    result
}

/// Attributes each side against the snapshot taken in its own coordinates:
/// removed lines against `previous`, added lines against `current`.
#[must_use]
pub fn attribute_with_snapshots(
    changed: &ChangedLines,
    previous: &[Declaration],
    current: &[Declaration],
) -> StructureChanges {
    let mut result = StructureChanges::default();
    attribute_lines(&changed.added, current, &mut result.added);
    attribute_lines(&changed.removed, previous, &mut result.removed);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_diff_text;
    use crate::structure::tests::decl;
    use crate::structure::DeclarationKind;
    use proptest::prelude::*;

    fn record(line: usize, kind: LineKind) -> LineRecord {
        LineRecord { line_number: line, text: String::new(), kind }
    }

    fn class_with_method() -> Vec<Declaration> {
        vec![
            decl(DeclarationKind::Class, "Pipeline", 1, 10, None),
            decl(DeclarationKind::Method, "to_json", 4, 8, Some("Pipeline")),
            decl(DeclarationKind::Function, "helper", 12, 14, None),
        ]
    }

    #[test]
    fn line_in_method_marks_method_and_enclosing_class() {
        let changed = ChangedLines { added: vec![record(5, LineKind::Added)], removed: vec![] };
        let result = attribute(&changed, &class_with_method());
        let expected: BTreeSet<_> = [
            DeclarationId::new("Pipeline", None),
            DeclarationId::new("to_json", Some("Pipeline")),
        ]
        .into_iter()
        .collect();
        assert_eq!(result.added, expected);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn lines_outside_any_declaration_attribute_nothing() {
        let changed = ChangedLines {
            added: vec![record(11, LineKind::Added)],
            removed: vec![record(20, LineKind::Removed)],
        };
        assert!(attribute(&changed, &class_with_method()).is_empty());
    }

    #[test]
    fn span_boundaries_are_inclusive() {
        let changed = ChangedLines {
            added: vec![record(12, LineKind::Added), record(14, LineKind::Added)],
            removed: vec![],
        };
        let result = attribute(&changed, &class_with_method());
        assert_eq!(result.added.len(), 1);
        assert!(result.added.contains(&DeclarationId::new("helper", None)));
    }

    #[test]
    fn in_place_edit_appears_on_both_sides() {
        let diff = "@@ -12,3 +12,3 @@\n def helper():\n-    return 1\n+    return 2";
        let changed = parse_diff_text(diff).unwrap();
        let result = attribute(&changed, &class_with_method());
        let both: Vec<_> = result.modified_in_place().collect();
        assert_eq!(both, vec![&DeclarationId::new("helper", None)]);
    }

    #[test]
    fn rename_is_removed_old_plus_added_new() {
        let previous = vec![decl(DeclarationKind::Function, "load", 1, 3, None)];
        let current = vec![decl(DeclarationKind::Function, "load_all", 1, 3, None)];
        let diff = "@@ -1,3 +1,3 @@\n-def load():\n+def load_all():\n     x = 1\n     return x";
        let changed = parse_diff_text(diff).unwrap();
        let result = attribute_with_snapshots(&changed, &previous, &current);
        assert_eq!(result.removed.iter().next().unwrap().name, "load");
        assert_eq!(result.added.iter().next().unwrap().name, "load_all");
        assert_eq!(result.modified_in_place().count(), 0);
    }

    proptest! {
        #[test]
        fn more_changed_lines_never_shrink_the_result(
            base in proptest::collection::vec(1usize..20, 0..10),
            extra in proptest::collection::vec(1usize..20, 0..10),
        ) {
            let decls = class_with_method();
            let small = ChangedLines {
                added: base.iter().map(|&l| record(l, LineKind::Added)).collect(),
                removed: base.iter().map(|&l| record(l, LineKind::Removed)).collect(),
            };
            let mut large = small.clone();
            large.added.extend(extra.iter().map(|&l| record(l, LineKind::Added)));
            large.removed.extend(extra.iter().map(|&l| record(l, LineKind::Removed)));

            let a = attribute(&small, &decls);
            let b = attribute(&large, &decls);
            prop_assert!(a.added.is_subset(&b.added));
            prop_assert!(a.removed.is_subset(&b.removed));
        }
    }
}
