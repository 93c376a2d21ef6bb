//! Error types for the journal core

use thiserror::Error;

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// Journal error types
#[derive(Error, Debug)]
pub enum JournalError {
    /// Local file I/O failed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Month outside 0..=11
    #[error("Invalid month {0}, expected 0-11")]
    InvalidMonth(u32),
}

impl JournalError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        JournalError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
