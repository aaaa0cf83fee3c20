//! In-memory PDFs and PNGs for unit tests

use crate::data_uri::{self, PNG_MEDIA_TYPE};
use lopdf::ObjectId;
use shared_pdf::testing;
use shared_pdf::PdfDocument;

pub use shared_pdf::testing::{find_run, png_bytes, TextRun};

pub fn build_pdf(media_boxes: &[Option<[i64; 4]>]) -> PdfDocument {
    PdfDocument::from_document(testing::build_document(media_boxes))
}

pub fn pdf_bytes(media_boxes: &[Option<[i64; 4]>]) -> Vec<u8> {
    testing::document_bytes(media_boxes)
}

pub fn page_text(pdf: &PdfDocument, page_id: ObjectId) -> String {
    testing::page_text(pdf.doc(), page_id)
}

pub fn text_runs(pdf: &PdfDocument, page_id: ObjectId) -> Vec<TextRun> {
    testing::text_runs(pdf.doc(), page_id)
}

pub fn png_data_uri(width: u32, height: u32) -> String {
    data_uri::encode(PNG_MEDIA_TYPE, &png_bytes(width, height))
}
