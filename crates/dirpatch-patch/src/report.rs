//! Outcome of applying a patch.

use std::path::PathBuf;

use serde::Serialize;

/// What happened to one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    Modified,
    Deleted,
}

/// The result for a single file patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Path relative to the target root.
    pub path: PathBuf,
    pub action: FileAction,
    /// The file patch was applied new-side to old-side.
    pub reversed: bool,
}

/// Per-file outcomes, in patch order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub files: Vec<FileOutcome>,
}

impl ApplyReport {
    /// Returns `true` if no file was touched.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of file patches applied.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Number of files with the given outcome.
    pub fn count(&self, action: FileAction) -> usize {
        self.files.iter().filter(|f| f.action == action).count()
    }

    /// Number of file patches that were applied in reverse.
    pub fn reversed(&self) -> usize {
        self.files.iter().filter(|f| f.reversed).count()
    }
}
