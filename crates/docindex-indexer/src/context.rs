//! Per-run state threaded through the walker.

use crate::{ClassificationPolicy, ExtractorRegistry, ProcessedFileLedger};
use std::path::{Path, PathBuf};

/// File names the walker must never index.
#[derive(Debug, Clone)]
pub struct ReservedNames {
    index_file: String,
    root_files: Vec<String>,
}

impl ReservedNames {
    /// Reserve the index document name in every directory.
    pub fn new(index_file: impl Into<String>) -> Self {
        Self {
            index_file: index_file.into(),
            root_files: Vec::new(),
        }
    }

    /// Additionally reserve `name` in the root directory (ledger, log, lock, config).
    pub fn with_root_file(mut self, name: impl Into<String>) -> Self {
        self.root_files.push(name.into());
        self
    }

    /// Name of the per-directory index document.
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// Whether a file called `name` must be left out of the index.
    ///
    /// Comparison is case-insensitive. The index document and the temp file
    /// used when rebuilding it are reserved everywhere.
    pub fn is_reserved(&self, name: &str, at_root: bool) -> bool {
        if name.eq_ignore_ascii_case(&self.index_file) {
            return true;
        }
        if let Some(stripped) = name.strip_prefix('.').and_then(|n| n.strip_suffix(".tmp")) {
            if stripped.eq_ignore_ascii_case(&self.index_file) {
                return true;
            }
        }
        at_root
            && self
                .root_files
                .iter()
                .any(|reserved| name.eq_ignore_ascii_case(reserved))
    }
}

/// Everything a run needs, passed explicitly instead of held in globals.
#[derive(Debug)]
pub struct RunContext {
    /// Root of the tree being indexed
    pub root: PathBuf,
    /// Processed-file ledger, shared by every directory visit
    pub ledger: ProcessedFileLedger,
    /// Directory classification rules
    pub policy: ClassificationPolicy,
    /// Extension-keyed extractors
    pub extractors: ExtractorRegistry,
    /// Names excluded from indexing
    pub reserved: ReservedNames,
    /// Whether symlinked directories are descended into
    pub follow_symlinks: bool,
}

impl RunContext {
    pub fn new(
        root: PathBuf,
        ledger: ProcessedFileLedger,
        policy: ClassificationPolicy,
        extractors: ExtractorRegistry,
        reserved: ReservedNames,
    ) -> Self {
        Self {
            root,
            ledger,
            policy,
            extractors,
            reserved,
            follow_symlinks: false,
        }
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Path of the index document for `dir`.
    pub fn index_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.reserved.index_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> ReservedNames {
        ReservedNames::new("search_index.xml")
            .with_root_file("processed_files_log.txt")
            .with_root_file(".search_index.lock")
    }

    #[test]
    fn test_index_file_reserved_everywhere() {
        let names = reserved();
        assert!(names.is_reserved("search_index.xml", false));
        assert!(names.is_reserved("SEARCH_INDEX.XML", true));
        assert!(names.is_reserved(".search_index.xml.tmp", false));
    }

    #[test]
    fn test_root_files_reserved_only_at_root() {
        let names = reserved();
        assert!(names.is_reserved("processed_files_log.txt", true));
        assert!(!names.is_reserved("processed_files_log.txt", false));
        assert!(!names.is_reserved("notes.txt", true));
    }

    #[test]
    fn test_index_path() {
        let ctx = RunContext::new(
            PathBuf::from("/docs"),
            ProcessedFileLedger::load(PathBuf::from("/nonexistent/ledger.txt")).unwrap(),
            ClassificationPolicy::default(),
            ExtractorRegistry::new(),
            reserved(),
        );
        assert_eq!(
            ctx.index_path(Path::new("/docs/a")),
            PathBuf::from("/docs/a/search_index.xml")
        );
    }
}
