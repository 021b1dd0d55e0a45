//! Entry fragments and aggregation of child documents into ancestors.

use super::{IndexDocument, CLOSE_MARKER, OPEN_MARKER, XML_DECLARATION};
use crate::IndexerError;
use std::path::Path;
use tracing::debug;

/// One serialized `<file>` … `</file>` record, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    key: String,
}

impl Fragment {
    /// Wrap serialized entry lines (each ending with `\n`).
    pub fn new(text: String) -> Self {
        let key = fragment_key(&text);
        Self { text, key }
    }

    /// Dedupe key: the escaped `<path>` value, or the whole text when absent.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

// Element text is escaped, so the first literal `<path>` is the element and
// its value may span lines.
fn fragment_key(text: &str) -> String {
    text.find("<path>")
        .map(|start| &text[start + "<path>".len()..])
        .and_then(|rest| rest.find("</path>").map(|end| &rest[..end]))
        .map(str::to_string)
        .unwrap_or_else(|| text.to_string())
}

/// Result of scanning a document's text line by line.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Byte offset just past the `<files>` line, if present
    pub header_end: Option<usize>,
    /// Byte offset just past the last complete fragment (or the header)
    pub complete_end: usize,
    /// Complete fragments in document order
    pub fragments: Vec<Fragment>,
    /// Whether the text after `complete_end` is exactly the closing marker
    pub closed: bool,
}

/// Split a document into envelope and complete fragments.
///
/// Envelope lines are recognized after trimming; anything outside a
/// `<file>` … `</file>` pair is ignored, and an unterminated trailing
/// fragment is treated as absent.
pub(crate) fn scan(content: &str) -> Scan {
    let mut scan = Scan::default();
    let mut current: Option<String> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        offset += line.len();
        let trimmed = line.trim();

        if let Some(buf) = current.as_mut() {
            buf.push_str(line);
            if trimmed == "</file>" {
                if let Some(text) = current.take() {
                    scan.fragments.push(Fragment::new(text));
                }
                scan.complete_end = offset;
            }
            continue;
        }

        if trimmed == "<file>" {
            current = Some(line.to_string());
        } else if trimmed == OPEN_MARKER && scan.header_end.is_none() {
            scan.header_end = Some(offset);
            scan.complete_end = offset;
        } else if trimmed == XML_DECLARATION || trimmed == CLOSE_MARKER || trimmed.is_empty() {
            // envelope
        } else {
            debug!(line = %trimmed, "Ignoring line outside any entry");
        }
    }

    scan.closed = scan.header_end.is_some()
        && current.is_none()
        && content[scan.complete_end..].trim() == CLOSE_MARKER;

    scan
}

/// Read the complete entry fragments of the index document at `index_path`.
pub fn read_fragments(index_path: &Path) -> Result<Vec<Fragment>, IndexerError> {
    let content = std::fs::read_to_string(index_path).map_err(|e| IndexerError::Document {
        path: index_path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(scan(&content).fragments)
}

/// Copy every entry of the child document at `child_index_path` that `target`
/// does not hold yet. Returns the number of entries appended.
pub fn propagate(child_index_path: &Path, target: &mut IndexDocument) -> Result<usize, IndexerError> {
    let fragments = read_fragments(child_index_path)?;

    let mut appended = 0;
    for fragment in &fragments {
        if target.append_fragment(fragment)? {
            appended += 1;
        }
    }

    debug!(
        child = ?child_index_path,
        target = ?target.path(),
        total = fragments.len(),
        appended,
        "Propagated entries"
    );

    Ok(appended)
}
