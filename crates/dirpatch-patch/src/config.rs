use serde::{Deserialize, Serialize};

/// Options controlling how a patch is written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Copy each pre-existing file to `<file><backup_suffix>` before
    /// modifying or deleting it.
    pub create_backups: bool,
    /// Suffix appended to backup copies.
    pub backup_suffix: String,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            create_backups: false,
            backup_suffix: ".orig".into(),
        }
    }
}

impl ApplyOptions {
    /// Defaults with backups turned on.
    pub fn with_backups() -> Self {
        Self {
            create_backups: true,
            ..Default::default()
        }
    }
}
