//! Flat, left-driven per-file comparison.
//!
//! Unlike [`crate::PatchTreeBuilder`], this only looks at the regular files
//! directly inside the left directory and compares each against the
//! same-named path on the right. It neither recurses nor visits names that
//! exist only on the right, and it keeps empty results.

use std::path::Path;

use dirpatch_diff::{DiffEngine, FileDiff, LineDiffEngine};
use tracing::debug;

use crate::config::PatchOptions;
use crate::entries::{list_entries, open_content, EntryKind};
use crate::error::TreeResult;

/// One [`FileDiff`] per regular file in `left`, in name order.
pub fn list_diffs(
    engine: &dyn DiffEngine,
    left: &Path,
    right: &Path,
    options: &PatchOptions,
) -> TreeResult<Vec<FileDiff>> {
    let mut diffs = Vec::new();

    for name in list_entries(left) {
        let left_child = left.join(&name);
        let left_kind = EntryKind::of(&left_child);
        if !left_kind.is_file() {
            debug!(entry = %left_child.display(), kind = ?left_kind, "skipping non-file entry");
            continue;
        }

        let right_child = right.join(&name);
        let right_kind = EntryKind::of(&right_child);
        let display = name.to_string_lossy();
        let mut left_content = open_content(&left_child, left_kind)?;
        let mut right_content = open_content(&right_child, right_kind)?;
        let diff = engine.diff_files(
            &format!("{}/{display}", options.left_prefix),
            &format!("{}/{display}", options.right_prefix),
            &mut *left_content,
            &mut *right_content,
            options.whitespace_mode(),
        )?;
        diffs.push(diff);
    }

    Ok(diffs)
}

/// [`list_diffs`] with the default engine and options.
pub fn compute_flat_diffs(left: &Path, right: &Path, whitespace_insensitive: bool) -> TreeResult<Vec<FileDiff>> {
    let options = PatchOptions::with_whitespace_insensitive(whitespace_insensitive);
    list_diffs(&LineDiffEngine, left, right, &options)
}
