//! Patch application for dirpatch.
//!
//! Parses multi-file unified-diff documents and applies them to a directory
//! root. Each file patch is applied forward when its hunks match, or in
//! reverse when the target already holds the patch's new side.
//!
//! # Key Types
//!
//! - [`Patch`] / [`FilePatch`] / [`Hunk`] / [`HunkLine`] -- Parsed patch document
//! - [`PatchEngine`] / [`FsPatchEngine`] -- The application seam and its filesystem default
//! - [`ApplyOptions`] -- Backup policy
//! - [`ApplyReport`] / [`FileOutcome`] -- What an application changed

pub mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod parse;
pub mod report;

pub use apply::{apply_hunks, Direction};
pub use config::ApplyOptions;
pub use engine::{FsPatchEngine, PatchEngine};
pub use error::{PatchError, PatchResult};
pub use parse::{FilePatch, Hunk, HunkLine, Patch};
pub use report::{ApplyReport, FileAction, FileOutcome};
