//! Directory-tree reconciliation for dirpatch.
//!
//! Walks two directory trees side by side and assembles a single multi-file
//! unified diff describing how to turn the left tree into the right one, and
//! applies such a document back onto a tree.
//!
//! # Key Types
//!
//! - [`PatchTreeBuilder`] -- Recursive, union-based patch assembly
//! - [`list_diffs`] -- Flat, left-driven per-file comparison
//! - [`apply_patch`] / [`apply_patch_with`] -- Patch application facade
//! - [`EntryKind`] / [`entry_union`] -- Per-side classification and the sorted entry union
//! - [`PatchOptions`] / [`DirpatchConfig`] -- Options and their TOML form
//!
//! # Rules
//!
//! 1. A missing path, or a listing target that is not a directory, is never
//!    an error: it is an empty entry set or empty content.
//! 2. Entries are visited in byte order of their names, depth first.
//! 3. A name that is a directory on one side and a file on the other is
//!    processed as both: the directory is recursed into first, then the
//!    file contents are compared against empty content.
//! 4. Empty per-file diffs never reach the patch document.

pub mod builder;
pub mod config;
pub mod entries;
pub mod error;
pub mod facade;
pub mod flat;

pub use builder::{build_unified_patch, PatchTreeBuilder};
pub use config::{DirpatchConfig, PatchOptions};
pub use entries::{entry_union, list_entries, EntryKind};
pub use error::{TreeError, TreeResult};
pub use facade::{apply_patch, apply_patch_with};
pub use flat::{compute_flat_diffs, list_diffs};

// Collaborator types that appear in this crate's signatures.
pub use dirpatch_diff::{DiffEngine, FileDiff, LineDiffEngine, WhitespaceMode};
pub use dirpatch_patch::{ApplyOptions, ApplyReport, FileAction, FileOutcome, FsPatchEngine, PatchEngine};
