//! Entry listing and per-side classification.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{TreeError, TreeResult};

/// What a name resolves to on one side of the comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    RegularFile,
    /// Absent, unreadable, or neither a file nor a directory.
    Missing,
}

impl EntryKind {
    /// Classify `path`, following symlinks.
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Self::Directory,
            Ok(meta) if meta.is_file() => Self::RegularFile,
            _ => Self::Missing,
        }
    }

    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    pub fn is_file(self) -> bool {
        matches!(self, Self::RegularFile)
    }
}

/// Names of the direct children of `dir`, sorted.
///
/// Names are kept as the filesystem reports them so they can be joined back
/// onto either root; only labels are rendered lossily. A missing path, a
/// path that is not a directory, and unreadable entries all contribute
/// nothing.
pub fn list_entries(dir: &Path) -> BTreeSet<OsString> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.file_name().to_os_string()),
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping unlistable entry");
                None
            }
        })
        .collect()
}

/// Sorted union of the direct children of `left` and `right`.
pub fn entry_union(left: &Path, right: &Path) -> BTreeSet<OsString> {
    let mut names = list_entries(left);
    names.extend(list_entries(right));
    names
}

/// A reader over a side's content: the file's bytes for a regular file,
/// an empty stream otherwise.
pub(crate) fn open_content(path: &Path, kind: EntryKind) -> TreeResult<Box<dyn Read>> {
    match kind {
        EntryKind::RegularFile => {
            let file = File::open(path).map_err(|source| TreeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        EntryKind::Directory | EntryKind::Missing => Ok(Box::new(io::empty())),
    }
}
