//! docindex Indexer
//!
//! This crate provides the incremental indexing engine for docindex, including:
//! - Content extraction keyed by file extension (paginated, plain text, name-only)
//! - A durable append-only ledger of processed files
//! - Directory classification (skip, unclassified merge roots, normal)
//! - Per-directory `search_index.xml` documents and upward propagation
//! - A worklist-driven directory walker and an advisory run lock

mod classify;
mod context;
pub mod document;
mod error;
pub mod extract;
mod ledger;
mod lock;
mod tree;
mod walker;

pub use classify::{Classification, ClassificationPolicy};
pub use context::{ReservedNames, RunContext};
pub use document::{escape, unescape, Content, FileEntry, Fragment, IndexDocument};
pub use error::{ExtractError, IndexerError};
pub use extract::{ContentExtractor, ExtractorKind, ExtractorRegistry};
pub use ledger::{ledger_key, ProcessedFileLedger};
pub use lock::RunLock;
pub use walker::{DirectoryWalker, RunReport};
