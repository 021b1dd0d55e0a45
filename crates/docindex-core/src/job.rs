//! One indexing run over a root directory.

use crate::{CoreError, Settings};
use docindex_indexer::{
    DirectoryWalker, IndexerError, ProcessedFileLedger, RunContext, RunLock, RunReport,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// How a job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The walk ran to completion
    Completed(RunReport),
    /// Another run held the lock for every attempt
    Busy { pid: u32 },
}

/// Lock-guarded indexing run
#[derive(Debug)]
pub struct IndexJob {
    root: PathBuf,
    settings: Settings,
}

impl IndexJob {
    /// Prepare a job over `root`, which must be an existing directory.
    pub fn new(root: &Path, settings: Settings) -> Result<Self, CoreError> {
        let root = root
            .canonicalize()
            .map_err(|_| CoreError::InvalidRoot(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(CoreError::InvalidRoot(root));
        }
        settings.validate()?;

        Ok(Self { root, settings })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take the lock, load the ledger and walk the tree.
    pub fn run(&self) -> Result<JobOutcome, CoreError> {
        let _lock = match self.acquire_lock()? {
            Ok(lock) => lock,
            Err(pid) => {
                warn!(
                    root = ?self.root,
                    pid,
                    "Another indexing run holds the lock, nothing done"
                );
                return Ok(JobOutcome::Busy { pid });
            }
        };

        let ledger = ProcessedFileLedger::load(self.root.join(&self.settings.ledger_file_name))?;
        info!(path = ?ledger.path(), entries = ledger.len(), "Loaded ledger");

        let mut ctx = RunContext::new(
            self.root.clone(),
            ledger,
            self.settings.classification_policy(),
            self.settings.extractor_registry()?,
            self.settings.reserved_names(),
        )
        .with_follow_symlinks(self.settings.follow_symlinks);

        let report = DirectoryWalker::new(&mut ctx).run()?;
        Ok(JobOutcome::Completed(report))
    }

    /// Acquire the run lock, retrying while it is held.
    ///
    /// The inner `Err` carries the holder's PID after the last attempt.
    fn acquire_lock(&self) -> Result<Result<RunLock, u32>, CoreError> {
        let path = self.root.join(&self.settings.lock_file_name);
        let delay = Duration::from_millis(self.settings.lock.retry_delay_ms);
        let retries = self.settings.lock.retries;

        let mut attempt = 0;
        loop {
            match RunLock::acquire(&path) {
                Ok(lock) => return Ok(Ok(lock)),
                Err(IndexerError::LockHeld { pid }) if attempt >= retries => return Ok(Err(pid)),
                Err(IndexerError::LockHeld { pid }) => {
                    attempt += 1;
                    info!(pid, attempt, "Lock held, retrying in {}ms", delay.as_millis());
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
