//! Indexer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during indexing operations.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The processed-file ledger exists but cannot be read
    #[error("Ledger unavailable at {path}: {source}")]
    LedgerUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the run lock; `pid` is 0 when it could not be read
    #[error("Another indexing run holds the lock (PID: {pid})")]
    LockHeld { pid: u32 },

    /// An index document could not be opened or updated
    #[error("Index document error in {path}: {message}")]
    Document { path: PathBuf, message: String },

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
}

/// Errors raised while turning a source file into index content.
///
/// None of these are fatal to a run: the file is logged, left out of the
/// ledger and retried on the next run.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Source file disappeared before it could be read
    #[error("File not found: {0}")]
    Missing(PathBuf),

    /// Source file has no bytes (or a PDF has no pages)
    #[error("File is empty: {0}")]
    Empty(PathBuf),

    /// Text is neither valid UTF-8 nor valid in the fallback encoding
    #[error("Cannot decode {path} as UTF-8 or {fallback}")]
    Decode { path: PathBuf, fallback: &'static str },

    /// PDF could not be loaded
    #[error("PDF error in {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    /// I/O error while reading the source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
