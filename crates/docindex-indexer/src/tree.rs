//! Directory listing for a run.
//!
//! The tree is listed in one `walkdir` pass before any index is written.
//! Skip-classified directories are recorded in their parent's listing but
//! never descended into, and symlink loops are reported by `walkdir` and
//! left out.

use crate::{Classification, ClassificationPolicy};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Files and subdirectories directly inside one directory, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Listing {
    pub files: Vec<PathBuf>,
    pub subdirs: Vec<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum DirState {
    Listed(Listing),
    /// The directory was found but its contents could not be read
    Unreadable(String),
}

/// Listings of every directory reachable from the root.
#[derive(Debug, Default)]
pub(crate) struct DirectoryTree {
    dirs: HashMap<PathBuf, DirState>,
}

impl DirectoryTree {
    pub fn scan(root: &Path, policy: &ClassificationPolicy, follow_symlinks: bool) -> Self {
        let mut dirs: HashMap<PathBuf, DirState> = HashMap::new();
        let mut walker = WalkDir::new(root)
            .follow_links(follow_symlinks)
            .sort_by_file_name()
            .into_iter();

        while let Some(result) = walker.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(ancestor) = e.loop_ancestor() {
                        debug!(path = ?e.path(), ancestor = ?ancestor, "Symlink loop, not following");
                    } else if let Some(state) = e.path().and_then(|path| dirs.get_mut(path)) {
                        *state = DirState::Unreadable(e.to_string());
                    } else {
                        debug!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                    }
                    continue;
                }
            };

            let path = entry.path().to_path_buf();
            if entry.depth() == 0 {
                dirs.insert(path, DirState::Listed(Listing::default()));
                continue;
            }

            let Some(kind) = entry_kind(&entry) else {
                continue;
            };

            if kind == EntryKind::Dir {
                let name = entry.file_name().to_string_lossy();
                if policy.classify(&name) == Classification::Skip {
                    walker.skip_current_dir();
                } else {
                    dirs.insert(path.clone(), DirState::Listed(Listing::default()));
                }
            }

            let parent = path.parent().and_then(|parent| dirs.get_mut(parent));
            if let Some(DirState::Listed(listing)) = parent {
                match kind {
                    EntryKind::File => listing.files.push(path),
                    EntryKind::Dir => listing.subdirs.push(path),
                }
            }
        }

        Self { dirs }
    }

    /// Remove and return the state recorded for `dir`.
    pub fn take(&mut self, dir: &Path) -> Option<DirState> {
        self.dirs.remove(dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

fn entry_kind(entry: &DirEntry) -> Option<EntryKind> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Some(EntryKind::Dir);
    }
    if file_type.is_file() {
        return Some(EntryKind::File);
    }

    // Unfollowed symlink: index linked files, leave linked directories alone
    if entry.path_is_symlink() {
        return match std::fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => Some(EntryKind::File),
            Ok(metadata) if metadata.is_dir() => {
                debug!(path = ?entry.path(), "Not following symlinked directory");
                None
            }
            _ => None,
        };
    }

    None
}
