//! Append-only ledger of files that have already been indexed.

use crate::IndexerError;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Durable record of relative paths already written to an index.
///
/// Membership only ever grows: keys are appended to the backing file one
/// line at a time and the file is never rewritten. On disk, `\\`, `\n` and
/// `\r` inside a key are backslash-escaped so every key stays on one line.
#[derive(Debug)]
pub struct ProcessedFileLedger {
    path: PathBuf,
    entries: HashSet<String>,
}

impl ProcessedFileLedger {
    /// Load the ledger from `path`.
    ///
    /// A missing file yields an empty ledger. Any other read failure is
    /// reported as [`IndexerError::LedgerUnavailable`] so the caller can
    /// abort before doing duplicate work.
    pub fn load(path: PathBuf) -> Result<Self, IndexerError> {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?path, "No ledger yet, starting empty");
                return Ok(Self {
                    path,
                    entries: HashSet::new(),
                });
            }
            Err(source) => return Err(IndexerError::LedgerUnavailable { path, source }),
        };

        let entries: HashSet<String> = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(decode_key)
            .collect();

        debug!(path = ?path, entries = entries.len(), "Loaded ledger");

        Ok(Self { path, entries })
    }

    /// Check whether a key has already been processed.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Append a key to the ledger and flush it to disk.
    ///
    /// The in-memory set is only updated once the line is durable, so a
    /// failed append leaves the file eligible for the next run.
    pub fn record(&mut self, key: &str) -> Result<(), IndexerError> {
        if self.entries.contains(key) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut line = encode_key(key);
        line.push('\n');

        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        self.entries.insert(key.to_string());
        debug!(key = %key, "Recorded in ledger");

        Ok(())
    }

    /// Number of processed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the ledger key for `path`: relative to `root`, `/`-separated.
///
/// Paths outside `root` keep their full form so they still map to a stable key.
/// Returns `None` when a component is not valid UTF-8, since a lossy key
/// could collide with another file's.
pub fn ledger_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                parts.push(component.as_os_str().to_str()?.to_string())
            }
        }
    }

    Some(parts.join("/"))
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 1);
    for ch in key.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

fn decode_key(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let ledger = ProcessedFileLedger::load(temp_dir.path().join("ledger.txt")).unwrap();

        assert!(ledger.is_empty());
        assert!(!temp_dir.path().join("ledger.txt").exists());
    }

    #[test]
    fn test_record_and_reload() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ledger.txt");

        let mut ledger = ProcessedFileLedger::load(path.clone()).unwrap();
        ledger.record("a/one.txt").unwrap();
        ledger.record("two.pdf").unwrap();
        assert!(ledger.contains("a/one.txt"));

        let reloaded = ProcessedFileLedger::load(path.clone()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("two.pdf"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a/one.txt\ntwo.pdf\n");
    }

    #[test]
    fn test_record_is_not_duplicated() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ledger.txt");

        let mut ledger = ProcessedFileLedger::load(path.clone()).unwrap();
        ledger.record("same.txt").unwrap();
        ledger.record("same.txt").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_load_ignores_blank_lines_and_crlf() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        std::fs::write(&path, "one.txt\r\n\n  \ntwo.txt\n").unwrap();

        let ledger = ProcessedFileLedger::load(path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("one.txt"));
        assert!(ledger.contains("two.txt"));
    }

    #[test]
    fn test_load_directory_is_unavailable() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        std::fs::create_dir(&path).unwrap();

        let result = ProcessedFileLedger::load(path);
        assert!(matches!(
            result,
            Err(IndexerError::LedgerUnavailable { .. })
        ));
    }

    #[test]
    fn test_ledger_key_is_relative_and_slash_separated() {
        let root = Path::new("/docs");
        let key = ledger_key(root, &root.join("ProjectA").join("plan.txt"));
        assert_eq!(key.as_deref(), Some("ProjectA/plan.txt"));
    }

    #[test]
    fn test_ledger_key_normalizes_dot_segments() {
        let root = Path::new("/docs");
        let key = ledger_key(root, Path::new("/docs/a/./b/../plan.txt"));
        assert_eq!(key.as_deref(), Some("a/plan.txt"));
    }

    #[test]
    fn test_keys_with_line_breaks_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        let keys = ["a\nb.txt", "trailing\r", "back\\slash\\n.txt"];

        for _ in 0..3 {
            let mut ledger = ProcessedFileLedger::load(path.clone()).unwrap();
            for key in keys {
                ledger.record(key).unwrap();
            }
        }

        let reloaded = ProcessedFileLedger::load(path.clone()).unwrap();
        assert_eq!(reloaded.len(), 3);
        for key in keys {
            assert!(reloaded.contains(key), "missing {key:?}");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("a\\nb.txt\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ledger_key_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/docs");
        let path = root.join(OsStr::from_bytes(b"a\xff.txt"));
        assert_eq!(ledger_key(root, &path), None);
    }
}
