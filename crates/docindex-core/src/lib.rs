//! docindex Core Components
//!
//! This crate wires the indexing engine into a runnable job: settings
//! discovery, logging setup and the lock-guarded `IndexJob`.

mod config;
mod error;
mod job;
pub mod logging;

pub use config::{
    ClassificationConfig, Discovered, ExtractorsConfig, LockConfig, LoggingConfig, Settings, ROOT_CONFIG_FILE,
};
pub use error::CoreError;
pub use job::{IndexJob, JobOutcome};

pub use docindex_indexer::RunReport;
