//! Depth-first directory walker.
//!
//! Traversal runs off an explicit stack of [`Visit`] frames. Entering a
//! directory indexes its files and schedules an exit frame below its
//! children, so a directory's exit (propagation into its aggregation
//! target) only runs once its whole subtree is done.

use crate::document::{propagate, Content, FileEntry, IndexDocument};
use crate::tree::{DirState, DirectoryTree};
use crate::{ledger_key, Classification, IndexerError, RunContext};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Directories whose files were processed
    pub directories_visited: usize,
    /// Directories excluded by the skip list
    pub directories_skipped: usize,
    /// Directories that could not be listed or whose index could not be opened
    pub directories_failed: usize,
    /// Files newly written to an index
    pub files_indexed: usize,
    /// Files found in the ledger and left alone
    pub files_already_indexed: usize,
    /// Files with no registered extractor
    pub files_unsupported: usize,
    /// Files that failed extraction, writing or ledger append
    pub files_failed: usize,
    /// Entries copied into ancestor indexes
    pub entries_propagated: usize,
    /// Wall-clock duration
    pub duration_ms: u64,
}

/// A directory waiting to be entered.
#[derive(Debug, Clone)]
struct Frame {
    dir: PathBuf,
    /// Document this directory's entries aggregate into (`None` for the root)
    target: Option<PathBuf>,
    /// Enclosing unclassified merge root, if any
    merge_root: Option<PathBuf>,
}

#[derive(Debug)]
enum Visit {
    Enter(Frame),
    Exit { dir: PathBuf, target: PathBuf },
}

/// Walks the tree under a [`RunContext`], writing and aggregating indexes.
pub struct DirectoryWalker<'a> {
    ctx: &'a mut RunContext,
    report: RunReport,
    tree: DirectoryTree,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(ctx: &'a mut RunContext) -> Self {
        Self {
            ctx,
            report: RunReport::default(),
            tree: DirectoryTree::default(),
        }
    }

    /// Index the whole tree.
    ///
    /// Only a missing root is an error; per-file and per-directory failures
    /// are logged, counted in the report and skipped.
    pub fn run(mut self) -> Result<RunReport, IndexerError> {
        let start = Instant::now();
        let root = self.ctx.root.clone();

        if !root.is_dir() {
            return Err(IndexerError::NotFound(root));
        }

        info!(
            root = ?root,
            ledger_entries = self.ctx.ledger.len(),
            "Starting indexing run"
        );

        self.tree = DirectoryTree::scan(&root, &self.ctx.policy, self.ctx.follow_symlinks);

        let mut stack = vec![Visit::Enter(Frame {
            dir: root,
            target: None,
            merge_root: None,
        })];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(frame) => self.enter(frame, &mut stack),
                Visit::Exit { dir, target } => self.exit(&dir, &target),
            }
        }

        self.report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            indexed = self.report.files_indexed,
            already_indexed = self.report.files_already_indexed,
            unsupported = self.report.files_unsupported,
            failed = self.report.files_failed,
            directories = self.report.directories_visited,
            propagated = self.report.entries_propagated,
            duration_ms = self.report.duration_ms,
            "Indexing run finished"
        );

        Ok(self.report)
    }

    fn enter(&mut self, frame: Frame, stack: &mut Vec<Visit>) {
        let (files, subdirs) = match self.tree.take(&frame.dir) {
            Some(DirState::Listed(listing)) => (listing.files, listing.subdirs),
            Some(DirState::Unreadable(reason)) => {
                warn!(dir = ?frame.dir, error = %reason, "Cannot read directory, skipping subtree");
                self.report.directories_failed += 1;
                return;
            }
            None => {
                warn!(dir = ?frame.dir, "Directory was not listed, skipping subtree");
                self.report.directories_failed += 1;
                return;
            }
        };

        let at_root = frame.dir == self.ctx.root;
        match IndexDocument::open(&frame.dir, self.ctx.reserved.index_file()) {
            Ok(mut doc) => {
                debug!(dir = ?frame.dir, new = doc.is_new(), files = files.len(), "Processing directory");
                for file in &files {
                    self.process_file(&mut doc, file, at_root);
                }
                if let Err(e) = doc.close() {
                    warn!(dir = ?frame.dir, error = %e, "Failed to close index document");
                }
                if let Some(target) = &frame.target {
                    stack.push(Visit::Exit {
                        dir: frame.dir.clone(),
                        target: target.clone(),
                    });
                }
            }
            Err(e) => {
                error!(dir = ?frame.dir, error = %e, "Cannot open index document, skipping files");
                self.report.directories_failed += 1;
            }
        }
        self.report.directories_visited += 1;

        for subdir in subdirs.into_iter().rev() {
            let name = subdir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let classification = self.ctx.policy.classify(&name);
            if classification == Classification::Skip {
                info!(dir = ?subdir, "Skipping directory");
                self.report.directories_skipped += 1;
                continue;
            }

            let child = match (&frame.merge_root, classification) {
                (Some(merge_root), _) => Frame {
                    dir: subdir,
                    target: Some(merge_root.clone()),
                    merge_root: Some(merge_root.clone()),
                },
                (None, Classification::Unclassified) => {
                    info!(dir = ?subdir, "Unclassified directory, merging its subtree");
                    Frame {
                        merge_root: Some(subdir.clone()),
                        dir: subdir,
                        target: Some(frame.dir.clone()),
                    }
                }
                (None, _) => Frame {
                    dir: subdir,
                    target: Some(frame.dir.clone()),
                    merge_root: None,
                },
            };

            stack.push(Visit::Enter(child));
        }
    }

    fn exit(&mut self, dir: &Path, target: &Path) {
        let child_index = self.ctx.index_path(dir);
        if !child_index.is_file() {
            return;
        }

        let mut target_doc = match IndexDocument::open(target, self.ctx.reserved.index_file()) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(target = ?target, error = %e, "Cannot open aggregate index, entries not propagated");
                return;
            }
        };

        match propagate(&child_index, &mut target_doc) {
            Ok(appended) => self.report.entries_propagated += appended,
            Err(e) => warn!(child = ?child_index, error = %e, "Propagation failed"),
        }

        if let Err(e) = target_doc.close() {
            warn!(target = ?target, error = %e, "Failed to close aggregate index");
        }
    }

    fn process_file(&mut self, doc: &mut IndexDocument, path: &Path, at_root: bool) {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return,
        };

        if self.ctx.reserved.is_reserved(&name, at_root) {
            debug!(file = %name, "Skipping reserved file");
            return;
        }

        let Some(key) = ledger_key(&self.ctx.root, path) else {
            warn!(path = ?path, "File path is not valid UTF-8, skipping");
            self.report.files_failed += 1;
            return;
        };
        if self.ctx.ledger.contains(&key) {
            self.report.files_already_indexed += 1;
            return;
        }

        let Some(extractor) = self.ctx.extractors.lookup(path) else {
            debug!(file = %key, "Skipping file with no extractor");
            self.report.files_unsupported += 1;
            return;
        };

        let content = match extractor.extract(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %key, error = %e, "Extraction failed, will retry next run");
                self.report.files_failed += 1;
                return;
            }
        };

        let pages = match &content {
            Content::Pages(pages) => pages.len(),
            _ => 0,
        };
        let entry = FileEntry::new(name, key.clone(), content);

        match doc.write_entry(&entry) {
            Ok(true) => {}
            Ok(false) => debug!(file = %key, "Entry already present in index document"),
            Err(e) => {
                error!(file = %key, error = %e, "Failed to write index entry");
                self.report.files_failed += 1;
                return;
            }
        }

        if let Err(e) = self.ctx.ledger.record(&key) {
            error!(file = %key, error = %e, "Ledger append failed, will retry next run");
            self.report.files_failed += 1;
            return;
        }

        self.report.files_indexed += 1;
        info!(file = %key, kind = extractor.kind().name(), pages, "Indexed file");
    }
}
