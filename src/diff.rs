//! Diff previews shown before a mutation is committed.
//!
//! Alignment uses Myers' algorithm from `similar` with no deadline, so the
//! result is minimal and identical for identical inputs.

use crate::document::Document;
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp, DiffTag};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    Add,
    Remove,
    Context,
}

/// A contiguous run of lines with one classification.
///
/// Ranges are zero-based, half-open line indices. An `Add` hunk has an empty
/// `original_range` positioned where the lines go; `Remove` is the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub kind: HunkKind,
    pub original_range: Range<usize>,
    pub result_range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPreview {
    original_lines: Vec<String>,
    result_lines: Vec<String>,
    hunks: Vec<Hunk>,
    ops: Vec<DiffOp>,
    trailing_newline_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    /// Change regions, counting a replaced run once.
    pub regions: usize,
    pub trailing_newline_changed: bool,
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.added == 0 && self.removed == 0 {
            write!(f, "no line changes")?;
        } else {
            let plural = if self.regions == 1 { "" } else { "s" };
            write!(
                f,
                "+{} -{} lines in {} region{plural}",
                self.added, self.removed, self.regions
            )?;
        }
        if self.trailing_newline_changed {
            write!(f, " (newline at end of file changed)")?;
        }
        Ok(())
    }
}

/// Compare two snapshots line by line.
pub fn compute_diff(original: &Document, result: &Document) -> DiffPreview {
    let ops = capture_diff_slices(Algorithm::Myers, original.lines(), result.lines());

    let mut hunks = Vec::with_capacity(ops.len());
    for op in &ops {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => hunks.push(Hunk {
                kind: HunkKind::Context,
                original_range: old,
                result_range: new,
            }),
            DiffTag::Delete => hunks.push(Hunk {
                kind: HunkKind::Remove,
                original_range: old,
                result_range: new.start..new.start,
            }),
            DiffTag::Insert => hunks.push(Hunk {
                kind: HunkKind::Add,
                original_range: old.start..old.start,
                result_range: new,
            }),
            DiffTag::Replace => {
                hunks.push(Hunk {
                    kind: HunkKind::Remove,
                    original_range: old.clone(),
                    result_range: new.start..new.start,
                });
                hunks.push(Hunk {
                    kind: HunkKind::Add,
                    original_range: old.end..old.end,
                    result_range: new,
                });
            }
        }
    }

    DiffPreview {
        original_lines: original.lines().to_vec(),
        result_lines: result.lines().to_vec(),
        hunks,
        ops,
        trailing_newline_changed: !original.is_empty()
            && !result.is_empty()
            && original.has_trailing_newline() != result.has_trailing_newline(),
    }
}

impl DiffPreview {
    pub fn original_lines(&self) -> &[String] {
        &self.original_lines
    }

    pub fn result_lines(&self) -> &[String] {
        &self.result_lines
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Only the `Add` and `Remove` hunks.
    pub fn changes(&self) -> impl Iterator<Item = &Hunk> {
        self.hunks.iter().filter(|h| h.kind != HunkKind::Context)
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some() || self.trailing_newline_changed
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary {
            trailing_newline_changed: self.trailing_newline_changed,
            ..DiffSummary::default()
        };
        for op in &self.ops {
            match op.tag() {
                DiffTag::Equal => continue,
                DiffTag::Delete => summary.removed += op.old_range().len(),
                DiffTag::Insert => summary.added += op.new_range().len(),
                DiffTag::Replace => {
                    summary.removed += op.old_range().len();
                    summary.added += op.new_range().len();
                }
            }
            summary.regions += 1;
        }
        summary
    }

    /// Render as a unified diff with `context` lines around each change.
    ///
    /// Returns an empty string when no line changed.
    pub fn unified(&self, context: usize, original_label: &str, result_label: &str) -> String {
        let groups = group_diff_ops(self.ops.clone(), context);
        if groups.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        out.push_str(&format!("--- {original_label}\n+++ {result_label}\n"));

        for group in groups {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };
            let old = first.old_range().start..last.old_range().end;
            let new = first.new_range().start..last.new_range().end;
            out.push_str(&format!(
                "@@ -{} +{} @@\n",
                header_range(&old),
                header_range(&new)
            ));

            for op in &group {
                let (tag, old, new) = op.as_tag_tuple();
                match tag {
                    DiffTag::Equal => push_lines(&mut out, ' ', &self.original_lines, old),
                    DiffTag::Delete => push_lines(&mut out, '-', &self.original_lines, old),
                    DiffTag::Insert => push_lines(&mut out, '+', &self.result_lines, new),
                    DiffTag::Replace => {
                        push_lines(&mut out, '-', &self.original_lines, old);
                        push_lines(&mut out, '+', &self.result_lines, new);
                    }
                }
            }
        }
        out
    }
}

fn push_lines(out: &mut String, sign: char, lines: &[String], range: Range<usize>) {
    for line in &lines[range] {
        out.push(sign);
        out.push_str(line);
        out.push('\n');
    }
}

/// `start,len` in unified-diff convention: 1-based, and an empty range names
/// the line before it.
fn header_range(range: &Range<usize>) -> String {
    if range.is_empty() {
        format!("{},0", range.start)
    } else {
        format!("{},{}", range.start + 1, range.len())
    }
}
