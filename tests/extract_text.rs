use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use substitution_checker::contract::{Extractor, RawDocument};
use substitution_checker::error::ExtractionError;
use substitution_checker::extract::PdfExtractor;

/// Builds an in-memory PDF with one page per entry in `pages`.
fn pdf_with_pages(pages: &[&str]) -> RawDocument {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Page content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("PDF should serialise");
    RawDocument::from_bytes(bytes).expect("Artifact should be writable")
}

#[test]
fn single_page_text_is_found() {
    let document = pdf_with_pages(&["Vertretungen Dienstag 9b"]);
    let text = PdfExtractor::new()
        .extract(&document)
        .expect("Extraction should succeed");

    assert!(
        text.contains("Vertretungen Dienstag 9b"),
        "Extracted text should contain the page text, got: {text:?}"
    );
}

#[test]
fn pages_appear_in_document_order_with_separators() {
    let document = pdf_with_pages(&["Erste Seite Montag", "Zweite Seite 9b"]);
    let text = PdfExtractor::new()
        .extract(&document)
        .expect("Extraction should succeed");

    let first = text
        .find("Erste Seite Montag")
        .expect("First page text missing");
    let second = text
        .find("Zweite Seite 9b")
        .expect("Second page text missing");
    assert!(first < second, "Pages should appear in document order");
    assert!(
        text.ends_with("\n\n"),
        "Every page should be followed by a blank line"
    );
}

#[test]
fn extraction_is_idempotent() {
    let document = pdf_with_pages(&["Vertretungen Donnerstag"]);
    let extractor = PdfExtractor::new();

    let first = extractor
        .extract(&document)
        .expect("First extraction should succeed");
    let second = extractor
        .extract(&document)
        .expect("Second extraction should succeed");

    assert_eq!(first, second);
}

#[test]
fn a_document_without_pages_yields_an_empty_text() {
    let document = pdf_with_pages(&[]);
    let text = PdfExtractor::new()
        .extract(&document)
        .expect("Extraction should succeed");

    assert_eq!(text, "");
}

#[test]
fn garbage_bytes_are_reported_as_malformed() {
    let document =
        RawDocument::from_bytes(b"not a pdf at all".to_vec()).expect("Artifact should be writable");

    let err = PdfExtractor::new()
        .extract(&document)
        .expect_err("Garbage should not extract");

    match err {
        ExtractionError::Malformed(cause) => {
            assert!(!cause.is_empty(), "Cause should name the parse failure");
        }
    }
}
