//! Text-level hunk application.
//!
//! Each hunk is first looked for at its header position, shifted by how far
//! earlier hunks landed from theirs. If the pre-image is not there, the
//! nearest matching position after the previous hunk is used. Lines are
//! compared exactly first and whitespace-insensitively second; context lines
//! are copied from the target, not from the patch.

use dirpatch_diff::WhitespaceMode;
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::parse::{FilePatch, Hunk, HunkLine};

/// Which side of a patch is the starting point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Turn the old side into the new side.
    Forward,
    /// Turn the new side into the old side.
    Reverse,
}

impl Direction {
    /// Returns `true` for [`Direction::Reverse`].
    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// A hunk line as seen from one application direction.
enum Step<'h> {
    Keep,
    Drop,
    Insert(&'h str),
}

impl Hunk {
    /// `(start, count)` of the side the hunk is applied to.
    fn pre_range(&self, direction: Direction) -> (usize, usize) {
        match direction {
            Direction::Forward => (self.old_start, self.old_count),
            Direction::Reverse => (self.new_start, self.new_count),
        }
    }

    /// `(start, count)` of the side the hunk produces.
    fn post_range(&self, direction: Direction) -> (usize, usize) {
        match direction {
            Direction::Forward => (self.new_start, self.new_count),
            Direction::Reverse => (self.old_start, self.old_count),
        }
    }

    fn pre_image(&self, direction: Direction) -> Vec<&str> {
        self.steps(direction)
            .zip(&self.lines)
            .filter(|(step, _)| !matches!(step, Step::Insert(_)))
            .map(|(_, line)| line.text())
            .collect()
    }

    fn steps(&self, direction: Direction) -> impl Iterator<Item = Step<'_>> + '_ {
        self.lines.iter().map(move |line| match (line, direction) {
            (HunkLine::Context(_), _) => Step::Keep,
            (HunkLine::Removed(_), Direction::Forward) | (HunkLine::Added(_), Direction::Reverse) => Step::Drop,
            (HunkLine::Added(text), Direction::Forward) | (HunkLine::Removed(text), Direction::Reverse) => {
                Step::Insert(text)
            }
        })
    }

    /// A pre-image that is empty at line 0 only applies to an empty file.
    fn creates_file(&self, direction: Direction) -> bool {
        self.pre_range(direction) == (0, 0)
    }
}

impl FilePatch {
    /// Returns `true` if applying in `direction` removes the whole file.
    pub fn removes_file(&self, direction: Direction) -> bool {
        matches!(self.hunks.as_slice(), [hunk] if hunk.post_range(direction) == (0, 0))
    }

    /// Returns `true` if applying in `direction` creates the file from nothing.
    pub fn creates_file(&self, direction: Direction) -> bool {
        matches!(self.hunks.as_slice(), [hunk] if hunk.creates_file(direction))
    }
}

/// Apply `hunks` to `content` in the given direction.
///
/// Fails with [`PatchError::HunkMismatch`] naming the first hunk (1-based)
/// whose pre-image cannot be found.
pub fn apply_hunks(content: &str, hunks: &[Hunk], direction: Direction) -> PatchResult<String> {
    let source: Vec<&str> = content.split_inclusive('\n').collect();
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0usize;
    let mut drift = 0isize;

    for (index, hunk) in hunks.iter().enumerate() {
        let number = index + 1;
        let pre = hunk.pre_image(direction);
        let (start, count) = hunk.pre_range(direction);

        if hunk.creates_file(direction) && !source.is_empty() {
            return Err(PatchError::HunkMismatch { hunk: number });
        }

        let nominal = if count == 0 { start } else { start.saturating_sub(1) };
        let expected = nominal.saturating_add_signed(drift).max(cursor);
        let pos = find_position(&source, &pre, cursor, expected)
            .ok_or(PatchError::HunkMismatch { hunk: number })?;
        if pos != expected {
            debug!(hunk = number, offset = pos as isize - expected as isize, "hunk located at offset");
        }

        for line in &source[cursor..pos] {
            out.push_str(line);
        }
        let mut at = pos;
        for step in hunk.steps(direction) {
            match step {
                Step::Keep => {
                    out.push_str(source[at]);
                    at += 1;
                }
                Step::Drop => at += 1,
                Step::Insert(text) => out.push_str(text),
            }
        }

        cursor = pos + pre.len();
        drift = pos as isize - nominal as isize;
    }

    for line in &source[cursor..] {
        out.push_str(line);
    }
    Ok(out)
}

fn find_position(source: &[&str], pre: &[&str], lower: usize, expected: usize) -> Option<usize> {
    [WhitespaceMode::Exact, WhitespaceMode::IgnoreAll]
        .into_iter()
        .find_map(|mode| nearest_match(source, pre, lower, expected, mode))
}

/// Search outward from `expected`, never before `lower`.
fn nearest_match(
    source: &[&str],
    pre: &[&str],
    lower: usize,
    expected: usize,
    mode: WhitespaceMode,
) -> Option<usize> {
    let last = source.len().checked_sub(pre.len())?;
    if lower > last {
        return None;
    }
    let expected = expected.clamp(lower, last);
    let matches_at = |pos: usize| {
        pre.iter()
            .zip(&source[pos..])
            .all(|(want, have)| mode.lines_equal(want, have))
    };

    for delta in 0..=(last - lower) {
        if let Some(pos) = expected.checked_sub(delta).filter(|&p| p >= lower) {
            if matches_at(pos) {
                return Some(pos);
            }
        }
        let pos = expected + delta;
        if delta > 0 && pos <= last && matches_at(pos) {
            return Some(pos);
        }
    }
    None
}
