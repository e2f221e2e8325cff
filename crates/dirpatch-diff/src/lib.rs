//! File-pair diff engine for dirpatch.
//!
//! Compares two text streams line by line and renders the result as a
//! unified-diff fragment. The directory-level crates only ever talk to this
//! crate through the [`DiffEngine`] trait, so tests can swap in a scripted
//! engine.
//!
//! # Key Types
//!
//! - [`DiffEngine`] / [`LineDiffEngine`] -- The collaborator seam and its Myers-based default
//! - [`FileDiff`] -- The comparison of one file pair (emptiness, stats, rendering)
//! - [`DiffHunk`] / [`DiffLine`] -- Grouped hunks with context

pub mod engine;
pub mod error;
pub mod file_diff;
pub mod whitespace;

pub use engine::{DiffEngine, LineDiffEngine};
pub use error::{DiffError, DiffResult};
pub use file_diff::{diff_texts, DiffHunk, DiffLine, FileDiff, DEFAULT_CONTEXT_LINES};
pub use whitespace::WhitespaceMode;
