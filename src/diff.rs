//! Unified-diff parsing into line-addressed added/removed records.
//!
//! Two cursors are tracked per hunk: `old_cursor` walks the pre-image and
//! `new_cursor` walks the post-image. Both are reset at every hunk header,
//! and the header's line counts tell us where a hunk ends so that the next
//! file's `---`/`+++` headers are never mistaken for content.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DocError, DocResult};

static HUNK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
        .expect("hunk header pattern is valid")
});

/// Which side of the diff a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Present only in the new file; numbered in new-file coordinates.
    Added,
    /// Present only in the old file; numbered in old-file coordinates.
    Removed,
}

/// A single changed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// 1-based line number on the side given by `kind`.
    pub line_number: usize,
    /// Line content without the `+`/`-` prefix.
    pub text: String,
    /// Side of the diff.
    pub kind: LineKind,
}

/// Output of [`parse_diff`]: added and removed lines in diff order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedLines {
    /// Lines added, in new-file numbering.
    pub added: Vec<LineRecord>,
    /// Lines removed, in old-file numbering.
    pub removed: Vec<LineRecord>,
}

impl ChangedLines {
    /// Returns `true` when the diff changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Records of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: LineKind) -> &[LineRecord] {
        match kind {
            LineKind::Added => &self.added,
            LineKind::Removed => &self.removed,
        }
    }
}

/// Cursor state inside one hunk.
#[derive(Debug)]
struct Hunk {
    old_cursor: usize,
    new_cursor: usize,
    old_remaining: usize,
    new_remaining: usize,
}

impl Hunk {
    fn is_exhausted(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }
}

/// Parses a hunk header such as `@@ -43,33 +43,40 @@ fn context`.
///
/// A missing count means one line, as in `@@ -3 +3 @@`.
fn parse_header(line_index: usize, line: &str) -> DocResult<Hunk> {
    let malformed = || DocError::MalformedDiff { line: line_index, text: line.to_string() };
    let caps = HUNK_HEADER_RE.captures(line).ok_or_else(malformed)?;
    let number = |group: usize, default: usize| -> DocResult<usize> {
        caps.get(group).map_or(Ok(default), |m| m.as_str().parse().map_err(|_| malformed()))
    };
    Ok(Hunk {
        old_cursor: number(1, 0)?,
        old_remaining: number(2, 1)?,
        new_cursor: number(3, 0)?,
        new_remaining: number(4, 1)?,
    })
}

/// Parses unified-diff lines into added/removed records.
///
/// Lines before the first hunk header are ignored, so a diff without hunks
/// yields two empty lists.
///
/// # Errors
///
/// Returns [`DocError::MalformedDiff`] if a line starting with `@@` is not a
/// valid hunk header.
pub fn parse_diff<I, S>(diff_lines: I) -> DocResult<ChangedLines>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut changed = ChangedLines::default();
    let mut hunk: Option<Hunk> = None;

    for (index, raw) in diff_lines.into_iter().enumerate() {
        let line = raw.as_ref();
        if line.starts_with("@@") {
            hunk = Some(parse_header(index + 1, line)?);
            continue;
        }

        let Some(current) = hunk.as_mut() else {
            continue;
        };
        if current.is_exhausted() {
            hunk = None;
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => {
                changed.added.push(LineRecord {
                    line_number: current.new_cursor,
                    text: line[1..].to_string(),
                    kind: LineKind::Added,
                });
                current.new_cursor += 1;
                current.new_remaining = current.new_remaining.saturating_sub(1);
            }
            Some(b'-') => {
                changed.removed.push(LineRecord {
                    line_number: current.old_cursor,
                    text: line[1..].to_string(),
                    kind: LineKind::Removed,
                });
                current.old_cursor += 1;
                current.old_remaining = current.old_remaining.saturating_sub(1);
            }
            // "\ No newline at end of file" belongs to neither side.
            Some(b'\\') => {}
            _ => {
                current.old_cursor += 1;
                current.new_cursor += 1;
                current.old_remaining = current.old_remaining.saturating_sub(1);
                current.new_remaining = current.new_remaining.saturating_sub(1);
            }
        }
    }

    Ok(changed)
}

/// Convenience wrapper over [`parse_diff`] for a whole diff string.
///
/// # Errors
///
/// Same as [`parse_diff`].
pub fn parse_diff_text(text: &str) -> DocResult<ChangedLines> {
    parse_diff(text.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbers(records: &[LineRecord]) -> Vec<(usize, &str)> {
        records.iter().map(|r| (r.line_number, r.text.as_str())).collect()
    }

    #[test]
    fn single_added_line_between_context() {
        let changed = parse_diff_text("@@ -1,2 +1,3 @@\n line1\n+line2\n line3").unwrap();
        assert_eq!(numbers(&changed.added), vec![(2, "line2")]);
        assert!(changed.removed.is_empty());
    }

    #[test]
    fn no_hunk_headers_yields_nothing() {
        let changed = parse_diff_text("diff --git a/x.py b/x.py\n+stray\n-stray\n context").unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        let changed = parse_diff(Vec::<String>::new()).unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn cursors_reset_at_each_hunk() {
        let diff = "\
--- a/m.py
+++ b/m.py
@@ -1,3 +1,3 @@
 a
-b
+B
 c
@@ -10,2 +10,3 @@
 j
+k2
 k";
        let changed = parse_diff_text(diff).unwrap();
        assert_eq!(numbers(&changed.removed), vec![(2, "b")]);
        assert_eq!(numbers(&changed.added), vec![(2, "B"), (11, "k2")]);
    }

    #[test]
    fn removal_shifts_only_old_cursor() {
        let diff = "@@ -5,4 +5,2 @@\n x\n-y\n-z\n w";
        let changed = parse_diff_text(diff).unwrap();
        assert_eq!(numbers(&changed.removed), vec![(6, "y"), (7, "z")]);
        assert!(changed.added.is_empty());
    }

    #[test]
    fn triple_dash_content_inside_hunk_is_a_removal() {
        let diff = "--- a/q.sql\n+++ b/q.sql\n@@ -1,2 +1,1 @@\n--- old comment\n keep";
        let changed = parse_diff_text(diff).unwrap();
        assert_eq!(numbers(&changed.removed), vec![(1, "-- old comment")]);
    }

    #[test]
    fn next_file_headers_after_exhausted_hunk_are_skipped() {
        let diff = "\
@@ -1 +1 @@
-old
+new
diff --git a/b.py b/b.py
--- a/b.py
+++ b/b.py
@@ -0,0 +1,1 @@
+fresh";
        let changed = parse_diff_text(diff).unwrap();
        assert_eq!(numbers(&changed.removed), vec![(1, "old")]);
        assert_eq!(numbers(&changed.added), vec![(1, "new"), (1, "fresh")]);
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let diff = "@@ -1,2 +1,2 @@\n a\n-b\n\\ No newline at end of file\n+c\n\\ No newline at end of file";
        let changed = parse_diff_text(diff).unwrap();
        assert_eq!(numbers(&changed.removed), vec![(2, "b")]);
        assert_eq!(numbers(&changed.added), vec![(2, "c")]);
    }

    #[test]
    fn malformed_header_is_reported() {
        let err = parse_diff_text("@@ -x,1 +1,1 @@\n+a").unwrap_err();
        assert!(matches!(err, DocError::MalformedDiff { line: 1, .. }));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Context(String),
        Add(String),
        Remove(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let text = "[a-z+ -]{0,6}";
        prop_oneof![
            text.prop_map(Op::Context),
            text.prop_map(Op::Add),
            text.prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn recorded_numbers_replay_against_each_side(
            old_start in 1usize..50,
            new_start in 1usize..50,
            ops in proptest::collection::vec(op_strategy(), 1..30),
        ) {
            let mut old_side = Vec::new();
            let mut new_side = Vec::new();
            let mut body = Vec::new();
            for op in &ops {
                match op {
                    Op::Context(t) => {
                        old_side.push(t.clone());
                        new_side.push(t.clone());
                        body.push(format!(" {t}"));
                    }
                    Op::Add(t) => {
                        new_side.push(t.clone());
                        body.push(format!("+{t}"));
                    }
                    Op::Remove(t) => {
                        old_side.push(t.clone());
                        body.push(format!("-{t}"));
                    }
                }
            }
            let mut lines = vec![format!(
                "@@ -{old_start},{} +{new_start},{} @@",
                old_side.len(),
                new_side.len()
            )];
            lines.extend(body);

            let changed = parse_diff(&lines).unwrap();
            for rec in &changed.added {
                prop_assert_eq!(&new_side[rec.line_number - new_start], &rec.text);
            }
            for rec in &changed.removed {
                prop_assert_eq!(&old_side[rec.line_number - old_start], &rec.text);
            }
            let adds = ops.iter().filter(|o| matches!(o, Op::Add(_))).count();
            let removes = ops.iter().filter(|o| matches!(o, Op::Remove(_))).count();
            prop_assert_eq!(changed.added.len(), adds);
            prop_assert_eq!(changed.removed.len(), removes);
        }
    }
}
