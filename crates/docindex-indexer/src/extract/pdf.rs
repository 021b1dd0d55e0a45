//! Page-by-page PDF text extraction.

use super::{check_source, ContentExtractor, ExtractorKind};
use crate::document::Content;
use crate::ExtractError;
use std::path::Path;
use tracing::warn;

/// Extracts one text string per PDF page.
///
/// A page whose text cannot be decoded is kept as an empty page so page
/// numbering stays aligned with the source document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginatedTextExtractor;

impl ContentExtractor for PaginatedTextExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Paginated
    }

    fn extract(&self, path: &Path) -> Result<Content, ExtractError> {
        check_source(path)?;

        let document = lopdf::Document::load(path).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(ExtractError::Empty(path.to_path_buf()));
        }

        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!(path = ?path, page = page_number, error = %e, "Page text unavailable");
                    texts.push(String::new());
                }
            }
        }

        Ok(Content::Pages(texts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content as PageContent, Operation};
    use lopdf::{dictionary, Object, Stream};
    use tempfile::tempdir;

    /// Write a PDF with one line of Courier text per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = PageContent {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pages_are_extracted_in_order() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("report.pdf");
        write_pdf(&path, &["Quarterly summary", "Appendix tables"]);

        let content = PaginatedTextExtractor.extract(&path).unwrap();
        let Content::Pages(pages) = content else {
            panic!("expected pages, got {content:?}");
        };
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Quarterly summary"), "page 1: {:?}", pages[0]);
        assert!(pages[1].contains("Appendix tables"), "page 2: {:?}", pages[1]);
        assert!(!pages[0].contains("Appendix"));
    }

    #[test]
    fn test_missing_pdf() {
        let temp_dir = tempdir().unwrap();
        let result = PaginatedTextExtractor.extract(&temp_dir.path().join("nope.pdf"));
        assert!(matches!(result, Err(ExtractError::Missing(_))));
    }

    #[test]
    fn test_corrupt_pdf() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        let result = PaginatedTextExtractor.extract(&path);
        assert!(matches!(result, Err(ExtractError::Pdf { .. })));
    }
}
