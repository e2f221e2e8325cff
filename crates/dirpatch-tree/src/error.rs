//! Error types for the tree crate.

use std::path::PathBuf;

use dirpatch_diff::DiffError;
use dirpatch_patch::PatchError;

/// Errors that can occur while building or applying a tree patch.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// An existing file could not be opened or read.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file-pair diff engine failed.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// The patch engine failed.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TreeError {
    /// Returns `true` if a patch document was not well-formed.
    pub fn is_malformed_patch(&self) -> bool {
        matches!(self, Self::Patch(PatchError::Malformed { .. }))
    }

    /// Returns `true` if a patch was well-formed but did not match the
    /// target content.
    pub fn is_apply_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Patch(PatchError::ApplyMismatch { .. } | PatchError::HunkMismatch { .. })
        )
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
