use std::fs;
use std::path::Path;

use dirpatch_diff::{WhitespaceMode, DEFAULT_CONTEXT_LINES};
use dirpatch_patch::ApplyOptions;
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// Options for building a tree patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchOptions {
    /// Treat lines that differ only in whitespace as equal.
    pub whitespace_insensitive: bool,
    /// Context lines around each change.
    pub context_lines: usize,
    /// Label prefix for the left tree (`--- <prefix>/<path>`).
    pub left_prefix: String,
    /// Label prefix for the right tree (`+++ <prefix>/<path>`).
    pub right_prefix: String,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            whitespace_insensitive: false,
            context_lines: DEFAULT_CONTEXT_LINES,
            left_prefix: "a".into(),
            right_prefix: "b".into(),
        }
    }
}

impl PatchOptions {
    /// Defaults with the given whitespace policy.
    pub fn with_whitespace_insensitive(whitespace_insensitive: bool) -> Self {
        Self {
            whitespace_insensitive,
            ..Default::default()
        }
    }

    /// The line comparison policy for the diff engine.
    pub fn whitespace_mode(&self) -> WhitespaceMode {
        WhitespaceMode::from_insensitive(self.whitespace_insensitive)
    }
}

/// Everything a `dirpatch.toml` can set.
///
/// ```toml
/// [diff]
/// whitespace_insensitive = true
/// context_lines = 5
///
/// [apply]
/// create_backups = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirpatchConfig {
    pub diff: PatchOptions,
    pub apply: ApplyOptions,
}

impl DirpatchConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> TreeResult<Self> {
        toml::from_str(text).map_err(|e| TreeError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> TreeResult<String> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Config(e.to_string()))
    }
}
