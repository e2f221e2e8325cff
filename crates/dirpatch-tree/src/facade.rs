//! Applying a patch document to a directory tree.

use std::path::Path;

use dirpatch_patch::{ApplyOptions, ApplyReport, FsPatchEngine, PatchEngine};
use tracing::debug;

use crate::error::TreeResult;

/// Apply `patch_text` under `target` through `engine`.
pub fn apply_patch_with(
    engine: &dyn PatchEngine,
    target: &Path,
    patch_text: &str,
    options: &ApplyOptions,
) -> TreeResult<ApplyReport> {
    debug!(target = %target.display(), bytes = patch_text.len(), "applying patch");
    Ok(engine.parse_and_apply(patch_text, target, options)?)
}

/// Apply `patch_text` under `target` with the filesystem engine and no
/// backup files.
///
/// Each file patch is tried forward, then reversed. A file patch that
/// applies in both directions resolves forward: if `target` still contains
/// the old side's lines, they are patched again rather than reverted. A file
/// may replace a directory (or the reverse) only when the same patch removes
/// every file in the way.
pub fn apply_patch(target: &Path, patch_text: &str) -> TreeResult<ApplyReport> {
    apply_patch_with(&FsPatchEngine, target, patch_text, &ApplyOptions::default())
}
