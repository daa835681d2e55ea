//! Plain-text extraction from the plan PDF.

use lopdf::Document;
use tracing::info;

use crate::contract::{Extractor, RawDocument};
use crate::error::ExtractionError;

/// Separator appended after every page's text.
const PAGE_SEPARATOR: &str = "\n\n";

/// Extracts text page by page with `lopdf`.
///
/// Pages are visited in document order and their text concatenated,
/// each followed by a blank line. A document with zero pages yields an
/// empty string. A page that cannot be read fails the whole extraction;
/// there is no partial result.
#[derive(Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, document: &RawDocument) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(document.bytes())
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let pages = doc.get_pages();
        info!(pages = pages.len(), "extracting plan text");

        let mut text = String::new();
        for page_number in pages.keys() {
            let page_text = doc
                .extract_text(&[*page_number])
                .map_err(|e| ExtractionError::Malformed(e.to_string()))?;
            text.push_str(&page_text);
            text.push_str(PAGE_SEPARATOR);
        }

        Ok(text)
    }
}
