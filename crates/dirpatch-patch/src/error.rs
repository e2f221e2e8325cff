//! Error types for the patch crate.

use std::path::PathBuf;

/// Errors that can occur while parsing or applying a patch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The patch text is not well-formed unified-diff text.
    #[error("malformed patch at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A file header names a path outside the target root.
    #[error("unsafe path in patch: {0}")]
    UnsafePath(String),

    /// A hunk's pre-image could not be located in the content.
    #[error("hunk #{hunk} does not match")]
    HunkMismatch { hunk: usize },

    /// A file patch applies in neither direction.
    #[error("patch does not apply to {path}: hunk #{hunk} does not match")]
    ApplyMismatch { path: PathBuf, hunk: usize },

    /// Filesystem failure while reading or writing a target.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
