//! Name-only entries for formats without extractable text.

use super::{check_source, ContentExtractor, ExtractorKind};
use crate::document::Content;
use crate::ExtractError;
use std::path::Path;

/// Records the file's name and path without reading its content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOnlyExtractor;

impl ContentExtractor for NameOnlyExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::NameOnly
    }

    fn extract(&self, path: &Path) -> Result<Content, ExtractError> {
        check_source(path)?;
        Ok(Content::NameOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_name_only() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("drawing.dwg");
        std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();

        assert_eq!(NameOnlyExtractor.extract(&path).unwrap(), Content::NameOnly);
    }
}
