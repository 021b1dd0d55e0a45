//! Content extraction keyed by file extension.
//!
//! Each supported extension maps to one [`ContentExtractor`]: paginated text
//! (PDF), whole-file text, or name-only for formats without extractable text.
//! New formats are added by registering another extractor, not by touching the
//! walker.

mod name_only;
mod pdf;
mod text;

pub use name_only::NameOnlyExtractor;
pub use pdf::PaginatedTextExtractor;
pub use text::{decode_text, PlainTextExtractor};

use crate::document::Content;
use crate::{ExtractError, IndexerError};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The shape of content an extractor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Paginated,
    PlainText,
    NameOnly,
}

impl ExtractorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractorKind::Paginated => "paginated",
            ExtractorKind::PlainText => "plain text",
            ExtractorKind::NameOnly => "name only",
        }
    }
}

/// Turns one source file into index content.
pub trait ContentExtractor: Send + Sync {
    /// What kind of content this extractor yields.
    fn kind(&self) -> ExtractorKind;

    /// Extract the content of the file at `path`.
    fn extract(&self, path: &Path) -> Result<Content, ExtractError>;
}

/// Extension-keyed lookup of content extractors.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock extension mapping.
    ///
    /// `pdf` is paginated, `txt` and `log` are plain text (falling back to
    /// windows-1252), and common office, drawing and video formats are
    /// indexed by name only.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let pdf: Arc<dyn ContentExtractor> = Arc::new(PaginatedTextExtractor);
        let text: Arc<dyn ContentExtractor> =
            Arc::new(PlainTextExtractor::new(encoding_rs::WINDOWS_1252));
        let name_only: Arc<dyn ContentExtractor> = Arc::new(NameOnlyExtractor);

        registry.register("pdf", pdf);
        for ext in ["txt", "log"] {
            registry.register(ext, text.clone());
        }
        for ext in ["mp4", "dwg", "tif", "xls", "xlsx", "doc", "docx"] {
            registry.register(ext, name_only.clone());
        }
        registry
    }

    /// Build a registry from extension lists.
    ///
    /// `fallback_encoding` is a WHATWG encoding label used when a text file is
    /// not valid UTF-8.
    pub fn from_extensions<S: AsRef<str>>(
        paginated: &[S],
        text: &[S],
        name_only: &[S],
        fallback_encoding: &str,
    ) -> Result<Self, IndexerError> {
        let encoding = Encoding::for_label(fallback_encoding.trim().as_bytes()).ok_or_else(|| {
            IndexerError::Config(format!("unknown fallback encoding: {fallback_encoding}"))
        })?;

        let mut registry = Self::new();
        let pdf: Arc<dyn ContentExtractor> = Arc::new(PaginatedTextExtractor);
        let plain: Arc<dyn ContentExtractor> = Arc::new(PlainTextExtractor::new(encoding));
        let names: Arc<dyn ContentExtractor> = Arc::new(NameOnlyExtractor);

        for ext in paginated {
            registry.register(ext.as_ref(), pdf.clone());
        }
        for ext in text {
            registry.register(ext.as_ref(), plain.clone());
        }
        for ext in name_only {
            registry.register(ext.as_ref(), names.clone());
        }

        Ok(registry)
    }

    /// Register an extractor for an extension (case-insensitive, leading dot optional).
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn ContentExtractor>) {
        self.by_extension
            .insert(normalize_extension(extension), extractor);
    }

    /// Find the extractor responsible for `path`.
    pub fn lookup(&self, path: &Path) -> Option<Arc<dyn ContentExtractor>> {
        let ext = path.extension()?.to_str()?;
        self.by_extension.get(&normalize_extension(ext)).cloned()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<_> = self.by_extension.keys().collect();
        extensions.sort();
        f.debug_struct("ExtractorRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Check that a source file exists and is not empty, returning its size.
pub(crate) fn check_source(path: &Path) -> Result<u64, ExtractError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::Missing(path.to_path_buf()))
        }
        Err(e) => return Err(ExtractError::Io(e)),
    };

    if metadata.len() == 0 {
        return Err(ExtractError::Empty(path.to_path_buf()));
    }

    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_mapping() {
        let registry = ExtractorRegistry::with_defaults();

        let kind = |name: &str| registry.lookup(&PathBuf::from(name)).map(|e| e.kind());

        assert_eq!(kind("report.pdf"), Some(ExtractorKind::Paginated));
        assert_eq!(kind("REPORT.PDF"), Some(ExtractorKind::Paginated));
        assert_eq!(kind("notes.txt"), Some(ExtractorKind::PlainText));
        assert_eq!(kind("server.log"), Some(ExtractorKind::PlainText));
        assert_eq!(kind("site.dwg"), Some(ExtractorKind::NameOnly));
        assert_eq!(kind("budget.xlsx"), Some(ExtractorKind::NameOnly));
        assert_eq!(kind("image.png"), None);
        assert_eq!(kind("Makefile"), None);
    }

    #[test]
    fn test_from_extensions() {
        let registry =
            ExtractorRegistry::from_extensions(&["pdf"], &[".MD", "txt"], &["zip"], "latin1")
                .unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry
                .lookup(&PathBuf::from("readme.md"))
                .map(|e| e.kind()),
            Some(ExtractorKind::PlainText)
        );
        assert_eq!(
            registry
                .lookup(&PathBuf::from("bundle.zip"))
                .map(|e| e.kind()),
            Some(ExtractorKind::NameOnly)
        );
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let empty: [&str; 0] = [];
        let result = ExtractorRegistry::from_extensions(&empty, &empty, &empty, "klingon");
        assert!(matches!(result, Err(IndexerError::Config(_))));
    }

    #[test]
    fn test_check_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let empty = temp_dir.path().join("empty.txt");
        std::fs::write(&empty, "").unwrap();
        let full = temp_dir.path().join("full.txt");
        std::fs::write(&full, "abc").unwrap();

        assert!(matches!(check_source(&empty), Err(ExtractError::Empty(_))));
        assert!(matches!(
            check_source(&temp_dir.path().join("gone.txt")),
            Err(ExtractError::Missing(_))
        ));
        assert_eq!(check_source(&full).unwrap(), 3);
    }
}
