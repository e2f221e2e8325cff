//! Unified-diff parser.
//!
//! Accepts the multi-file documents produced by the tree builder as well as
//! the usual `diff -ru` / `git diff` output. Lines outside a file patch
//! (`diff --git`, `index`, `Only in`, ...) are skipped.

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{PatchError, PatchResult};

const DEV_NULL: &str = "/dev/null";

/// A parsed multi-file patch document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    /// File patches in document order.
    pub files: Vec<FilePatch>,
}

impl Patch {
    /// Parse a unified-diff document.
    ///
    /// Empty or whitespace-only text is an empty patch. Any other text must
    /// contain at least one file patch.
    pub fn parse(text: &str) -> PatchResult<Self> {
        let mut parser = Parser::new(text);
        let mut files = Vec::new();

        while let Some(line) = parser.peek() {
            if line.starts_with("--- ") {
                files.push(parser.file_patch()?);
            } else if line.starts_with("@@") {
                return Err(PatchError::malformed(
                    parser.pos + 1,
                    "hunk header outside of a file patch",
                ));
            } else {
                parser.pos += 1;
            }
        }

        if files.is_empty() && !text.trim().is_empty() {
            return Err(PatchError::malformed(1, "no file patches found"));
        }
        Ok(Self { files })
    }

    /// Returns `true` if the document holds no file patches.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of file patches.
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

impl FromStr for Patch {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The patch for a single file: two header labels and their hunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePatch {
    /// Label after `--- `.
    pub old_label: String,
    /// Label after `+++ `.
    pub new_label: String,
    /// Hunks in file order.
    pub hunks: Vec<Hunk>,
}

impl FilePatch {
    /// Path named by the old label, relative to the target root.
    ///
    /// `None` for `/dev/null`.
    pub fn old_path(&self) -> PatchResult<Option<PathBuf>> {
        label_path(&self.old_label)
    }

    /// Path named by the new label, relative to the target root.
    pub fn new_path(&self) -> PatchResult<Option<PathBuf>> {
        label_path(&self.new_label)
    }

    /// The file this patch rewrites: the new side, else the old side.
    pub fn target_path(&self) -> PatchResult<PathBuf> {
        match self.new_path()? {
            Some(path) => Ok(path),
            None => self
                .old_path()?
                .ok_or_else(|| PatchError::UnsafePath(format!("{} -> {}", self.old_label, self.new_label))),
        }
    }
}

/// One `@@` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
}

/// A hunk body line. The text keeps its `\n` unless the patch marked it
/// with `\ No newline at end of file`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl HunkLine {
    /// The line content.
    pub fn text(&self) -> &str {
        match self {
            Self::Context(s) | Self::Added(s) | Self::Removed(s) => s,
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            Self::Context(s) | Self::Added(s) | Self::Removed(s) => s,
        }
    }
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    fn file_patch(&mut self) -> PatchResult<FilePatch> {
        let old_label = match self.next_line().and_then(|l| l.strip_prefix("--- ")) {
            Some(label) => trim_eol(label).to_string(),
            None => return Err(PatchError::malformed(self.pos, "expected `---` header")),
        };
        let new_label = match self.next_line().and_then(|l| l.strip_prefix("+++ ")) {
            Some(label) => trim_eol(label).to_string(),
            None => return Err(PatchError::malformed(self.pos, "expected `+++` after `---`")),
        };

        let mut hunks = Vec::new();
        while self.peek().is_some_and(|l| l.starts_with("@@")) {
            hunks.push(self.hunk()?);
        }
        if hunks.is_empty() {
            return Err(PatchError::malformed(
                self.pos + 1,
                format!("file patch for `{new_label}` has no hunks"),
            ));
        }

        Ok(FilePatch {
            old_label,
            new_label,
            hunks,
        })
    }

    fn hunk(&mut self) -> PatchResult<Hunk> {
        let header_line = self.pos + 1;
        let (old_start, old_count, new_start, new_count) = self
            .next_line()
            .and_then(parse_hunk_header)
            .ok_or_else(|| PatchError::malformed(header_line, "invalid hunk header"))?;

        let mut lines: Vec<HunkLine> = Vec::new();
        let (mut old_seen, mut new_seen) = (0, 0);

        while old_seen < old_count || new_seen < new_count {
            let line_no = self.pos + 1;
            let raw = self
                .next_line()
                .ok_or_else(|| PatchError::malformed(line_no, "hunk ends before its declared length"))?;

            if raw.starts_with('\\') {
                strip_last_newline(&mut lines, line_no)?;
                continue;
            }

            // Some editors strip the single space off blank context lines.
            let (prefix, text) = if raw == "\n" || raw == "\r\n" {
                (' ', raw)
            } else {
                let mut chars = raw.chars();
                match chars.next() {
                    Some(c) => (c, chars.as_str()),
                    None => (' ', raw),
                }
            };

            match prefix {
                ' ' => {
                    lines.push(HunkLine::Context(text.to_string()));
                    old_seen += 1;
                    new_seen += 1;
                }
                '-' => {
                    lines.push(HunkLine::Removed(text.to_string()));
                    old_seen += 1;
                }
                '+' => {
                    lines.push(HunkLine::Added(text.to_string()));
                    new_seen += 1;
                }
                other => {
                    return Err(PatchError::malformed(
                        line_no,
                        format!("unexpected line prefix {other:?} in hunk"),
                    ));
                }
            }

            if old_seen > old_count || new_seen > new_count {
                return Err(PatchError::malformed(line_no, "hunk is longer than its header declares"));
            }
        }

        if self.peek().is_some_and(|l| l.starts_with('\\')) {
            let line_no = self.pos + 1;
            self.pos += 1;
            strip_last_newline(&mut lines, line_no)?;
        }

        Ok(Hunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines,
        })
    }
}

fn strip_last_newline(lines: &mut [HunkLine], line_no: usize) -> PatchResult<()> {
    let last = lines
        .last_mut()
        .ok_or_else(|| PatchError::malformed(line_no, "no-newline marker without a preceding line"))?;
    let text = last.text_mut();
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(())
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Parse `@@ -l[,n] +l[,n] @@[ section]`. An omitted count means 1.
fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Strip a trailing timestamp and the first path component (`-p1`).
/// Trailing spaces belong to the file name.
fn label_path(label: &str) -> PatchResult<Option<PathBuf>> {
    let name = label.split_once('\t').map_or(label, |(name, _)| name);
    if name == DEV_NULL {
        return Ok(None);
    }

    let relative = match name.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => name,
    };
    let path = Path::new(relative);
    let safe = path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(PatchError::UnsafePath(name.to_string()));
    }
    Ok(Some(path.to_path_buf()))
}
