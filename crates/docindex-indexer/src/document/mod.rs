//! Per-directory index documents.
//!
//! A document is an XML envelope holding one `<file>` record per indexed
//! file:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <files>
//!     <file> ... </file>
//! </files>
//! ```
//!
//! The envelope is written once, when the document is created. Later
//! appends go inside it: each record overwrites the closing `</files>` line
//! and re-emits it, so the document is well-formed after every write. A
//! document left with a truncated tail is cut back to its last complete
//! record when it is next opened.

mod entry;
mod propagate;

pub use entry::{escape, unescape, Content, FileEntry};
pub use propagate::{propagate, read_fragments, Fragment};

use crate::IndexerError;
use propagate::scan;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
pub const OPEN_MARKER: &str = "<files>";
pub const CLOSE_MARKER: &str = "</files>";

/// An open, appendable index document bound to one directory.
#[derive(Debug)]
pub struct IndexDocument {
    path: PathBuf,
    file: File,
    /// Offset where the closing marker starts
    body_len: u64,
    keys: HashSet<String>,
    is_new: bool,
    appended: usize,
}

impl IndexDocument {
    /// Open the document named `file_name` in `dir`, creating it with an
    /// envelope if it does not exist yet.
    pub fn open(dir: &Path, file_name: &str) -> Result<Self, IndexerError> {
        let path = dir.join(file_name);

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::open_existing(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Self::create(path),
            Err(e) => Err(document_error(&path, e)),
        }
    }

    fn create(path: PathBuf) -> Result<Self, IndexerError> {
        let header = envelope_header();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| document_error(&path, e))?;
        file.write_all(header.as_bytes())?;
        file.write_all(close_line().as_bytes())?;
        file.flush()?;

        debug!(path = ?path, "Created index document");

        Ok(Self {
            path,
            file,
            body_len: header.len() as u64,
            keys: HashSet::new(),
            is_new: true,
            appended: 0,
        })
    }

    fn open_existing(path: PathBuf, content: &str) -> Result<Self, IndexerError> {
        let scan = scan(content);
        let keys: HashSet<String> = scan
            .fragments
            .iter()
            .map(|fragment| fragment.key().to_string())
            .collect();

        if scan.header_end.is_none() {
            warn!(
                path = ?path,
                entries = scan.fragments.len(),
                "Index document has no envelope, rebuilding"
            );
            return Self::rebuild(path, &scan.fragments, keys);
        }

        let body_len = scan.complete_end as u64;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| document_error(&path, e))?;

        if !scan.closed {
            warn!(
                path = ?path,
                kept = scan.fragments.len(),
                dropped_bytes = content.len().saturating_sub(scan.complete_end),
                "Index document tail is incomplete, truncating to last complete entry"
            );
            file.set_len(body_len)?;
            file.seek(SeekFrom::Start(body_len))?;
            file.write_all(close_line().as_bytes())?;
            file.flush()?;
            file.sync_data()?;
        }

        debug!(path = ?path, entries = keys.len(), "Opened existing index document");

        Ok(Self {
            path,
            file,
            body_len,
            keys,
            is_new: false,
            appended: 0,
        })
    }

    /// Rewrite a document that lost its envelope, keeping its complete entries.
    ///
    /// Written to a temp file and renamed over the original.
    fn rebuild(
        path: PathBuf,
        fragments: &[Fragment],
        keys: HashSet<String>,
    ) -> Result<Self, IndexerError> {
        let mut body = envelope_header();
        for fragment in fragments {
            body.push_str(fragment.as_str());
        }
        let body_len = body.len() as u64;
        body.push_str(&close_line());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{file_name}.tmp"));
        std::fs::write(&temp_path, &body).map_err(|e| document_error(&temp_path, e))?;
        std::fs::rename(&temp_path, &path).map_err(|e| document_error(&path, e))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| document_error(&path, e))?;

        info!(path = ?path, entries = fragments.len(), "Rebuilt index document");

        Ok(Self {
            path,
            file,
            body_len,
            keys,
            is_new: false,
            appended: 0,
        })
    }

    /// Whether this document was created by this `open` call.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries the document holds.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries appended through this handle.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Whether an entry with the given escaped path key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Serialize and append a file entry, syncing it to disk.
    ///
    /// Returns `false` without writing if an entry for the same path exists.
    pub fn write_entry(&mut self, entry: &FileEntry) -> Result<bool, IndexerError> {
        let fragment = Fragment::new(entry.render());
        let written = self.append_fragment(&fragment)?;
        if written {
            self.file.sync_data()?;
        }
        Ok(written)
    }

    /// Append a serialized fragment verbatim unless its key is already present.
    pub fn append_fragment(&mut self, fragment: &Fragment) -> Result<bool, IndexerError> {
        if self.keys.contains(fragment.key()) {
            return Ok(false);
        }

        let close = close_line();
        self.file.seek(SeekFrom::Start(self.body_len))?;
        self.file.write_all(fragment.as_str().as_bytes())?;
        self.file.write_all(close.as_bytes())?;
        let body_len = self.body_len + fragment.as_str().len() as u64;
        // Anything after the re-emitted close line is stale tail
        self.file.set_len(body_len + close.len() as u64)?;
        self.file.flush()?;

        self.body_len = body_len;
        self.keys.insert(fragment.key().to_string());
        self.appended += 1;

        Ok(true)
    }

    /// Flush and sync the document, releasing the handle.
    pub fn close(mut self) -> Result<(), IndexerError> {
        self.file.flush()?;
        self.file.sync_all()?;
        debug!(path = ?self.path, appended = self.appended, "Closed index document");
        Ok(())
    }
}

fn envelope_header() -> String {
    format!("{XML_DECLARATION}\n{OPEN_MARKER}\n")
}

fn close_line() -> String {
    format!("{CLOSE_MARKER}\n")
}

fn document_error(path: &Path, e: std::io::Error) -> IndexerError {
    IndexerError::Document {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
