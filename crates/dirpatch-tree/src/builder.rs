//! Recursive multi-file patch assembly.
//!
//! Visits the sorted union of entry names of each directory pair. A name
//! that is a directory on either side is recursed into; a name that is a
//! regular file on either side is diffed, with absent or non-file sides
//! read as empty content. Both can happen for the same name.

use std::path::Path;

use dirpatch_diff::{DiffEngine, LineDiffEngine};
use tracing::{debug, warn};

use crate::config::PatchOptions;
use crate::entries::{entry_union, open_content, EntryKind};
use crate::error::TreeResult;

/// Builds a unified-diff document describing how to turn one tree into
/// another.
pub struct PatchTreeBuilder<'e> {
    engine: &'e dyn DiffEngine,
    options: PatchOptions,
}

impl std::fmt::Debug for PatchTreeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchTreeBuilder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'e> PatchTreeBuilder<'e> {
    pub fn new(engine: &'e dyn DiffEngine, options: PatchOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Build the patch document for `left` -> `right`.
    ///
    /// Either root may be missing. Returns an empty string when the trees
    /// hold equivalent content.
    pub fn build(&self, left: &Path, right: &Path) -> TreeResult<String> {
        let mut document = String::new();
        self.build_level(
            left,
            right,
            &self.options.left_prefix,
            &self.options.right_prefix,
            &mut document,
        )?;
        Ok(document)
    }

    fn build_level(
        &self,
        left: &Path,
        right: &Path,
        left_label: &str,
        right_label: &str,
        document: &mut String,
    ) -> TreeResult<()> {
        for name in entry_union(left, right) {
            let left_child = left.join(&name);
            let right_child = right.join(&name);
            let left_kind = EntryKind::of(&left_child);
            let right_kind = EntryKind::of(&right_child);
            let display = name.to_string_lossy();
            let child_left_label = format!("{left_label}/{display}");
            let child_right_label = format!("{right_label}/{display}");

            if (left_kind.is_dir() && right_kind.is_file()) || (left_kind.is_file() && right_kind.is_dir()) {
                warn!(
                    entry = %child_left_label,
                    left = ?left_kind,
                    right = ?right_kind,
                    "entry is a directory on one side and a file on the other"
                );
            }

            if left_kind.is_dir() || right_kind.is_dir() {
                debug!(entry = %child_left_label, "descending into directory");
                self.build_level(
                    &left_child,
                    &right_child,
                    &child_left_label,
                    &child_right_label,
                    document,
                )?;
            }

            if left_kind.is_file() || right_kind.is_file() {
                let mut left_content = open_content(&left_child, left_kind)?;
                let mut right_content = open_content(&right_child, right_kind)?;
                let diff = self.engine.diff_files(
                    &child_left_label,
                    &child_right_label,
                    &mut *left_content,
                    &mut *right_content,
                    self.options.whitespace_mode(),
                )?;

                if diff.is_empty() {
                    continue;
                }
                debug!(
                    entry = %child_left_label,
                    additions = diff.additions(),
                    deletions = diff.deletions(),
                    "fragment emitted"
                );
                document.push_str(&diff.to_unified(self.options.context_lines));
            }
        }
        Ok(())
    }
}

/// Patch `left` -> `right` with the default engine and `a`/`b` labels.
pub fn build_unified_patch(left: &Path, right: &Path, whitespace_insensitive: bool) -> TreeResult<String> {
    let options = PatchOptions::with_whitespace_insensitive(whitespace_insensitive);
    PatchTreeBuilder::new(&LineDiffEngine, options).build(left, right)
}
