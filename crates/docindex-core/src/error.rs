//! Core error types for docindex.

use docindex_indexer::IndexerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or running an indexing job
#[derive(Debug, Error)]
pub enum CoreError {
    /// Settings could not be loaded or are invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Root is missing or not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRoot(PathBuf),

    /// Fatal engine error
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexer_error_is_transparent() {
        let err: CoreError = IndexerError::LockHeld { pid: 42 }.into();
        assert_eq!(err.to_string(), "Another indexing run holds the lock (PID: 42)");
    }

    #[test]
    fn test_invalid_root_message() {
        let err = CoreError::InvalidRoot(PathBuf::from("/nowhere"));
        assert!(err.to_string().contains("/nowhere"));
    }
}
