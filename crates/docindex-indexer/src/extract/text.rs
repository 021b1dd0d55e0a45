//! Whole-file text extraction with one fallback encoding.

use super::{check_source, ContentExtractor, ExtractorKind};
use crate::document::Content;
use crate::ExtractError;
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads a file as text: UTF-8 first, then the configured fallback encoding.
#[derive(Debug, Clone, Copy)]
pub struct PlainTextExtractor {
    fallback: &'static Encoding,
}

impl PlainTextExtractor {
    pub fn new(fallback: &'static Encoding) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &'static Encoding {
        self.fallback
    }
}

impl ContentExtractor for PlainTextExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::PlainText
    }

    fn extract(&self, path: &Path) -> Result<Content, ExtractError> {
        check_source(path)?;
        let bytes = std::fs::read(path)?;

        let text = decode_text(&bytes, self.fallback).ok_or_else(|| ExtractError::Decode {
            path: path.to_path_buf(),
            fallback: self.fallback.name(),
        })?;

        Ok(Content::Text(text))
    }
}

/// Decode `bytes` as UTF-8 (ignoring a leading BOM), falling back to `fallback`.
///
/// Returns `None` when neither decoding is free of malformed sequences.
pub fn decode_text(bytes: &[u8], fallback: &'static Encoding) -> Option<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }

    debug!(encoding = fallback.name(), "Not UTF-8, trying fallback encoding");
    fallback
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}
