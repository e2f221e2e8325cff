//! File-level diff: line-by-line comparison of two text contents.
//!
//! Uses the `similar` crate (Myers diff algorithm) to compute the edit
//! script, then groups it into hunks with context and renders those as a
//! unified-diff fragment.

use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp, DiffTag};

use crate::whitespace::WhitespaceMode;

/// Number of context lines used by `diff -u` and by the patch builder.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file\n";

/// The result of comparing two file contents.
///
/// Lines keep their `\n` terminator; only the last line of a side may lack
/// one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDiff {
    /// Label written after `--- `.
    pub old_label: String,
    /// Label written after `+++ `.
    pub new_label: String,
    old_lines: Vec<String>,
    new_lines: Vec<String>,
    ops: Vec<DiffOp>,
}

impl FileDiff {
    /// Returns `true` if both sides are equivalent under the whitespace
    /// policy the diff was computed with.
    pub fn is_empty(&self) -> bool {
        self.ops.iter().all(|op| op.tag() == DiffTag::Equal)
    }

    /// Total number of lines added.
    pub fn additions(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op.tag() {
                DiffTag::Insert | DiffTag::Replace => op.new_range().len(),
                DiffTag::Equal | DiffTag::Delete => 0,
            })
            .sum()
    }

    /// Total number of lines removed.
    pub fn deletions(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op.tag() {
                DiffTag::Delete | DiffTag::Replace => op.old_range().len(),
                DiffTag::Equal | DiffTag::Insert => 0,
            })
            .sum()
    }

    /// Number of lines on the old side.
    pub fn old_line_count(&self) -> usize {
        self.old_lines.len()
    }

    /// Number of lines on the new side.
    pub fn new_line_count(&self) -> usize {
        self.new_lines.len()
    }

    /// Group the edit script into hunks carrying up to `context` lines of
    /// unchanged text on either side.
    pub fn hunks(&self, context: usize) -> Vec<DiffHunk> {
        if self.is_empty() {
            return Vec::new();
        }
        group_diff_ops(self.ops.clone(), context)
            .iter()
            .filter_map(|group| self.make_hunk(group))
            .collect()
    }

    /// Render the diff as a unified-diff fragment.
    ///
    /// Returns an empty string when there is nothing to report, so callers
    /// can concatenate fragments without filtering first.
    pub fn to_unified(&self, context: usize) -> String {
        let hunks = self.hunks(context);
        if hunks.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        out.push_str("--- ");
        out.push_str(&self.old_label);
        out.push('\n');
        out.push_str("+++ ");
        out.push_str(&self.new_label);
        out.push('\n');
        for hunk in &hunks {
            hunk.write_to(&mut out);
        }
        out
    }

    fn make_hunk(&self, group: &[DiffOp]) -> Option<DiffHunk> {
        let first = group.first()?;
        let last = group.last()?;

        let mut lines = Vec::new();
        for op in group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    lines.extend(self.old_lines[old_range].iter().cloned().map(DiffLine::Context));
                }
                DiffTag::Delete => {
                    lines.extend(self.old_lines[old_range].iter().cloned().map(DiffLine::Removed));
                }
                DiffTag::Insert => {
                    lines.extend(self.new_lines[new_range].iter().cloned().map(DiffLine::Added));
                }
                DiffTag::Replace => {
                    lines.extend(self.old_lines[old_range].iter().cloned().map(DiffLine::Removed));
                    lines.extend(self.new_lines[new_range].iter().cloned().map(DiffLine::Added));
                }
            }
        }

        let old_begin = first.old_range().start;
        let old_count = last.old_range().end - old_begin;
        let new_begin = first.new_range().start;
        let new_count = last.new_range().end - new_begin;

        Some(DiffHunk {
            old_start: header_start(old_begin, old_count),
            old_count,
            new_start: header_start(new_begin, new_count),
            new_count,
            lines,
        })
    }
}

/// An empty range is addressed by the line preceding it (`0` at the top of
/// the file); a non-empty range by its first line, 1-based.
fn header_start(begin: usize, count: usize) -> usize {
    if count == 0 {
        begin
    } else {
        begin + 1
    }
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Start line in the old content, as written in the hunk header.
    pub old_start: usize,
    /// Number of lines from the old content in this hunk.
    pub old_count: usize,
    /// Start line in the new content, as written in the hunk header.
    pub new_start: usize,
    /// Number of lines from the new content in this hunk.
    pub new_count: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -l,n +l,n @@` header line, without terminator.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.header());
        out.push('\n');
        for line in &self.lines {
            out.push(line.prefix());
            let text = line.text();
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
                out.push_str(NO_NEWLINE_MARKER);
            }
        }
    }
}

/// A single line in a diff hunk, terminator included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
}

impl DiffLine {
    /// The unified-diff prefix character for this line.
    pub fn prefix(&self) -> char {
        match self {
            Self::Context(_) => ' ',
            Self::Added(_) => '+',
            Self::Removed(_) => '-',
        }
    }

    /// The line content.
    pub fn text(&self) -> &str {
        match self {
            Self::Context(s) | Self::Added(s) | Self::Removed(s) => s,
        }
    }
}

/// Split text into lines, keeping each `\n` terminator.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Compute a line-by-line diff between two texts.
pub fn diff_texts(
    old_label: impl Into<String>,
    new_label: impl Into<String>,
    old: &str,
    new: &str,
    mode: WhitespaceMode,
) -> FileDiff {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);

    // Identical content.
    let ops = if old == new {
        Vec::new()
    } else {
        let old_keys: Vec<_> = old_lines.iter().map(|l| mode.comparison_key(l)).collect();
        let new_keys: Vec<_> = new_lines.iter().map(|l| mode.comparison_key(l)).collect();
        capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys)
    };

    FileDiff {
        old_label: old_label.into(),
        new_label: new_label.into(),
        old_lines,
        new_lines,
        ops,
    }
}
