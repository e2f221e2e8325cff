//! The file-pair diff seam used by the directory builders.

use std::io::Read;

use crate::error::{DiffError, DiffResult};
use crate::file_diff::{diff_texts, FileDiff};
use crate::whitespace::WhitespaceMode;

/// Compares the contents of two files.
///
/// Implementations read both streams to completion. The labels are carried
/// into the returned [`FileDiff`] verbatim and end up as the `---`/`+++`
/// header paths of the rendered fragment.
pub trait DiffEngine {
    /// Compare `old` against `new`.
    ///
    /// Returns `Err` only if one of the streams fails to read.
    fn diff_files(
        &self,
        old_label: &str,
        new_label: &str,
        old: &mut dyn Read,
        new: &mut dyn Read,
        mode: WhitespaceMode,
    ) -> DiffResult<FileDiff>;
}

/// Default engine: Myers line diff over UTF-8 text.
///
/// Invalid UTF-8 is decoded lossily.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineDiffEngine;

impl LineDiffEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }
}

impl DiffEngine for LineDiffEngine {
    fn diff_files(
        &self,
        old_label: &str,
        new_label: &str,
        old: &mut dyn Read,
        new: &mut dyn Read,
        mode: WhitespaceMode,
    ) -> DiffResult<FileDiff> {
        let old_text = read_text(old_label, old)?;
        let new_text = read_text(new_label, new)?;
        Ok(diff_texts(old_label, new_label, &old_text, &new_text, mode))
    }
}

fn read_text(label: &str, reader: &mut dyn Read) -> DiffResult<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(|source| DiffError::Io {
        label: label.to_string(),
        source,
    })?;
    Ok(match String::from_utf8(buf) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(label, "content is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn diffs_two_streams() {
        let mut old = "a\nb\n".as_bytes();
        let mut new = "a\nc\n".as_bytes();
        let diff = LineDiffEngine::new()
            .diff_files("a/x", "b/x", &mut old, &mut new, WhitespaceMode::Exact)
            .unwrap();
        assert_eq!(diff.old_label, "a/x");
        assert_eq!(diff.new_label, "b/x");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
    }

    #[test]
    fn empty_stream_against_empty_stream() {
        let diff = LineDiffEngine
            .diff_files("a/x", "b/x", &mut io::empty(), &mut io::empty(), WhitespaceMode::Exact)
            .unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn read_failure_names_the_side() {
        let err = LineDiffEngine
            .diff_files("a/x", "b/x", &mut io::empty(), &mut FailingReader, WhitespaceMode::Exact)
            .unwrap_err();
        match err {
            DiffError::Io { label, source } => {
                assert_eq!(label, "b/x");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
        }
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut old: &[u8] = &[0x66, 0xFF, b'\n'];
        let mut new: &[u8] = &[0x66, 0xFF, b'\n'];
        let diff = LineDiffEngine
            .diff_files("a/x", "b/x", &mut old, &mut new, WhitespaceMode::Exact)
            .unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.old_line_count(), 1);
    }
}
