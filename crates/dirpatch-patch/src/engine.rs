//! Applying parsed patches to a directory root.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::apply::{apply_hunks, Direction};
use crate::config::ApplyOptions;
use crate::error::{PatchError, PatchResult};
use crate::parse::{FilePatch, Patch};
use crate::report::{ApplyReport, FileAction, FileOutcome};

/// Applies unified-diff documents to a directory tree.
pub trait PatchEngine {
    /// Parse `patch_text` and apply every file patch under `root`.
    ///
    /// Structural problems surface as [`PatchError::Malformed`]; hunks that
    /// cannot be located as [`PatchError::ApplyMismatch`].
    fn parse_and_apply(
        &self,
        patch_text: &str,
        root: &Path,
        options: &ApplyOptions,
    ) -> PatchResult<ApplyReport>;
}

/// Filesystem patch engine.
///
/// Every file patch is resolved in memory before the first write, so a hunk
/// mismatch anywhere leaves the tree untouched. Write failures are not
/// rolled back.
///
/// A file may replace a directory, and a directory a file, when the same
/// patch removes everything in the way. Removals are written before
/// contents.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsPatchEngine;

impl FsPatchEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    /// Apply an already-parsed patch under `root`.
    pub fn apply(&self, patch: &Patch, root: &Path, options: &ApplyOptions) -> PatchResult<ApplyReport> {
        // Relative path -> content after the patch (`None` = removed).
        let mut staged: BTreeMap<PathBuf, Option<String>> = BTreeMap::new();
        let mut files = Vec::with_capacity(patch.len());

        for file in &patch.files {
            let path = file.target_path()?;
            let current = match staged.get(&path) {
                Some(state) => state.clone(),
                None => read_existing(root, &path)?,
            };

            let (content, direction) = resolve(file, current.as_deref().unwrap_or(""), &path)?;
            let removed = content.is_empty() && file.removes_file(direction);
            let action = match (&current, removed) {
                (_, true) => FileAction::Deleted,
                (None, false) => FileAction::Created,
                (Some(_), false) => FileAction::Modified,
            };

            staged.insert(path.clone(), (!removed).then_some(content));
            files.push(FileOutcome {
                path,
                action,
                reversed: direction.is_reverse(),
            });
        }

        check_obstructions(root, &staged)?;

        for (path, _) in staged.iter().filter(|(_, content)| content.is_none()) {
            write_staged(&root.join(path), None, options)?;
        }
        for (path, content) in &staged {
            if let Some(text) = content {
                let full = root.join(path);
                if full.is_dir() {
                    clear_directory(&full)?;
                }
                write_staged(&full, Some(text), options)?;
            }
        }

        let report = ApplyReport { files };
        info!(
            root = %root.display(),
            files = report.len(),
            created = report.count(FileAction::Created),
            modified = report.count(FileAction::Modified),
            deleted = report.count(FileAction::Deleted),
            reversed = report.reversed(),
            "patch applied"
        );
        Ok(report)
    }
}

impl PatchEngine for FsPatchEngine {
    fn parse_and_apply(
        &self,
        patch_text: &str,
        root: &Path,
        options: &ApplyOptions,
    ) -> PatchResult<ApplyReport> {
        let patch = Patch::parse(patch_text)?;
        self.apply(&patch, root, options)
    }
}

/// Try the patch forward, then reversed.
fn resolve(file: &FilePatch, current: &str, path: &Path) -> PatchResult<(String, Direction)> {
    match apply_hunks(current, &file.hunks, Direction::Forward) {
        Ok(content) => Ok((content, Direction::Forward)),
        Err(PatchError::HunkMismatch { hunk }) => {
            match apply_hunks(current, &file.hunks, Direction::Reverse) {
                Ok(content) => {
                    debug!(path = %path.display(), "reversed patch detected; applying new side to old side");
                    Ok((content, Direction::Reverse))
                }
                Err(_) => Err(PatchError::ApplyMismatch {
                    path: path.to_path_buf(),
                    hunk,
                }),
            }
        }
        Err(e) => Err(e),
    }
}

/// Missing files read as `None`. So do directories and paths below a
/// regular file; [`check_obstructions`] decides whether they can be replaced.
fn read_existing(root: &Path, relative: &Path) -> PatchResult<Option<String>> {
    let path = root.join(relative);
    if path.is_dir() || blocking_ancestor(root, relative).is_some() {
        return Ok(None);
    }
    match fs::read(&path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PatchError::io(&path, e)),
    }
}

/// The nearest ancestor of `relative` (below `root`) that is a regular file.
fn blocking_ancestor(root: &Path, relative: &Path) -> Option<PathBuf> {
    relative
        .ancestors()
        .skip(1)
        .filter(|a| !a.as_os_str().is_empty())
        .find(|a| root.join(a).is_file())
        .map(Path::to_path_buf)
}

/// Content may only land where a directory or file stands when the patch
/// also removes every file in the way.
fn check_obstructions(root: &Path, staged: &BTreeMap<PathBuf, Option<String>>) -> PatchResult<()> {
    let removed = |rel: &Path| matches!(staged.get(rel), Some(None));

    for (rel, content) in staged {
        if content.is_none() {
            continue;
        }
        let full = root.join(rel);
        if full.is_dir() {
            for entry in WalkDir::new(&full).min_depth(1) {
                let entry = entry.map_err(|e| PatchError::io(&full, io::Error::other(e.to_string())))?;
                if entry.file_type().is_dir() {
                    continue;
                }
                let inner = entry.path().strip_prefix(root).unwrap_or(entry.path());
                if !removed(inner) {
                    return Err(PatchError::io(&full, io::Error::other("target is a non-empty directory")));
                }
            }
        }
        if let Some(ancestor) = blocking_ancestor(root, rel) {
            if !removed(&ancestor) {
                return Err(PatchError::io(root.join(&ancestor), io::Error::other("parent is a regular file")));
            }
        }
    }
    Ok(())
}

/// Remove a directory whose files have all been deleted, leaving room for a
/// file of the same name. Fails if anything (e.g. a backup) is left inside.
fn clear_directory(dir: &Path) -> PatchResult<()> {
    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry.map_err(|e| PatchError::io(dir, io::Error::other(e.to_string())))?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path()).map_err(|e| PatchError::io(entry.path(), e))?;
        }
    }
    debug!(dir = %dir.display(), "directory replaced by file");
    Ok(())
}

fn write_staged(path: &Path, content: Option<&str>, options: &ApplyOptions) -> PatchResult<()> {
    let exists = path.is_file();
    if exists && options.create_backups {
        let backup = backup_path(path, &options.backup_suffix);
        fs::copy(path, &backup).map_err(|e| PatchError::io(&backup, e))?;
        debug!(backup = %backup.display(), "backup written");
    }

    match content {
        Some(text) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| PatchError::io(parent, e))?;
            }
            fs::write(path, text).map_err(|e| PatchError::io(path, e))
        }
        None if exists => fs::remove_file(path).map_err(|e| PatchError::io(path, e)),
        None => Ok(()),
    }
}

fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODIFY: &str = concat!(
        "--- a/myFile1.txt\n",
        "+++ b/myFile1.txt\n",
        "@@ -1,4 +1,5 @@\n",
        " line1\n",
        "+line3\n",
        " line2\n",
        "+line4\n",
        " toto\n",
        "-tata\n",
    );
    const OLD: &str = "line1\nline2\ntoto\ntata\n";
    const NEW: &str = "line1\nline3\nline2\nline4\ntoto\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn applies_forward() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "myFile1.txt", OLD);

        let report = FsPatchEngine
            .parse_and_apply(MODIFY, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "myFile1.txt"), NEW);
        assert_eq!(report.count(FileAction::Modified), 1);
        assert_eq!(report.reversed(), 0);
        assert!(!dir.path().join("myFile1.txt.orig").exists());
    }

    #[test]
    fn detects_reversed_patch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "myFile1.txt", NEW);

        let report = FsPatchEngine
            .parse_and_apply(MODIFY, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "myFile1.txt"), OLD);
        assert!(report.files[0].reversed);
    }

    #[test]
    fn creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let patch = "--- a/sub/dir/new.txt\n+++ b/sub/dir/new.txt\n@@ -0,0 +1,2 @@\n+line1\n+line2\n";

        let report = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "sub/dir/new.txt"), "line1\nline2\n");
        assert_eq!(report.files[0].action, FileAction::Created);
    }

    #[test]
    fn whole_file_removal_deletes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "gone.txt", "a\nb\n");
        let patch = "--- a/gone.txt\n+++ b/gone.txt\n@@ -1,2 +0,0 @@\n-a\n-b\n";

        let report = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert!(!dir.path().join("gone.txt").exists());
        assert_eq!(report.files[0].action, FileAction::Deleted);
    }

    #[test]
    fn reversed_addition_deletes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "added.txt", "a\nb\n");
        let patch = "--- a/added.txt\n+++ b/added.txt\n@@ -0,0 +1,2 @@\n+a\n+b\n";

        let report = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert!(!dir.path().join("added.txt").exists());
        assert_eq!(report.files[0].action, FileAction::Deleted);
        assert!(report.files[0].reversed);
    }

    #[test]
    fn mismatch_leaves_tree_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "myFile1.txt", OLD);
        write(dir.path(), "other.txt", "unrelated\n");
        let patch = format!("{MODIFY}--- a/other.txt\n+++ b/other.txt\n@@ -1,1 +1,1 @@\n-expected\n+changed\n");

        let err = FsPatchEngine
            .parse_and_apply(&patch, dir.path(), &ApplyOptions::default())
            .unwrap_err();
        match err {
            PatchError::ApplyMismatch { path, hunk } => {
                assert_eq!(path, PathBuf::from("other.txt"));
                assert_eq!(hunk, 1);
            }
            other => panic!("expected ApplyMismatch, got {:?}", other),
        }
        assert_eq!(read(dir.path(), "myFile1.txt"), OLD);
    }

    #[test]
    fn malformed_patch_is_reported_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsPatchEngine
            .parse_and_apply("--- a/x\n", dir.path(), &ApplyOptions::default())
            .unwrap_err();
        assert!(matches!(err, PatchError::Malformed { .. }));
    }

    #[test]
    fn backups_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "myFile1.txt", OLD);

        FsPatchEngine
            .parse_and_apply(MODIFY, dir.path(), &ApplyOptions::with_backups())
            .unwrap();
        assert_eq!(read(dir.path(), "myFile1.txt"), NEW);
        assert_eq!(read(dir.path(), "myFile1.txt.orig"), OLD);
    }

    #[test]
    fn same_file_patched_twice_sees_first_result() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "f.txt", "a\n");
        let patch = concat!(
            "--- a/f.txt\n+++ b/f.txt\n@@ -1,1 +1,1 @@\n-a\n+b\n",
            "--- a/f.txt\n+++ b/f.txt\n@@ -1,1 +1,1 @@\n-b\n+c\n",
        );

        FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "f.txt"), "c\n");
    }

    #[test]
    fn occupied_directory_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "d/keep.txt", "keep\n");
        let patch = "--- a/d\n+++ b/d\n@@ -0,0 +1,1 @@\n+x\n";

        let err = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
        assert_eq!(read(dir.path(), "d/keep.txt"), "keep\n");
    }

    #[test]
    fn file_replaces_directory_emptied_by_the_same_patch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x/sub/f", "two\n");
        let patch = concat!(
            "--- a/x/sub/f\n+++ b/x/sub/f\n@@ -1,1 +0,0 @@\n-two\n",
            "--- a/x\n+++ b/x\n@@ -0,0 +1,1 @@\n+one\n",
        );

        let report = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "x"), "one\n");
        assert_eq!(report.count(FileAction::Deleted), 1);
        assert_eq!(report.count(FileAction::Created), 1);
    }

    #[test]
    fn directory_replaces_file_removed_by_the_same_patch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x", "one\n");
        let patch = concat!(
            "--- a/x/f\n+++ b/x/f\n@@ -0,0 +1,1 @@\n+two\n",
            "--- a/x\n+++ b/x\n@@ -1,1 +0,0 @@\n-one\n",
        );

        FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap();
        assert_eq!(read(dir.path(), "x/f"), "two\n");
    }

    #[test]
    fn file_in_the_way_of_a_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x", "one\n");
        let patch = "--- a/x/f\n+++ b/x/f\n@@ -0,0 +1,1 @@\n+two\n";

        let err = FsPatchEngine
            .parse_and_apply(patch, dir.path(), &ApplyOptions::default())
            .unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
        assert_eq!(read(dir.path(), "x"), "one\n");
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let report = FsPatchEngine
            .parse_and_apply("", dir.path(), &ApplyOptions::default())
            .unwrap();
        assert!(report.is_empty());
    }
}
