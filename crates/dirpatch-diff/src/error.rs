//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Reading one side of the comparison failed.
    #[error("failed to read content for {label}: {source}")]
    Io {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
