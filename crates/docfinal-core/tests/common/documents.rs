//! Input builders and output inspection shared by the integration tests

#![allow(dead_code)]

use docfinal_core::data_uri::{self, DataUri, PDF_MEDIA_TYPE, PNG_MEDIA_TYPE};
use docfinal_core::{CallerContext, FinalizeRequest, FinalizedOutput, SignerInput, SignerRole};
use lopdf::{Document, ObjectId};
use shared_pdf::testing;

pub use shared_pdf::testing::{find_run, image_placements, page_text, text_runs, TextRun};

pub const LETTER: [i64; 4] = [0, 0, 612, 792];

pub fn pdf_data_uri(media_boxes: &[Option<[i64; 4]>]) -> String {
    data_uri::encode(PDF_MEDIA_TYPE, &testing::document_bytes(media_boxes))
}

pub fn png_data_uri(width: u32, height: u32) -> String {
    data_uri::encode(PNG_MEDIA_TYPE, &testing::png_bytes(width, height))
}

pub fn request(role: SignerRole, media_boxes: &[Option<[i64; 4]>]) -> FinalizeRequest {
    FinalizeRequest {
        source_document: pdf_data_uri(media_boxes),
        document_name: Some("Lease Agreement".to_string()),
        signer: SignerInput {
            role: Some(role),
            full_name: Some("Jane Doe".to_string()),
            signing_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
            signature_image: Some(png_data_uri(120, 40)),
        },
        caller: CallerContext {
            email: Some("jane@example.com".to_string()),
            user_agent: None,
        },
    }
}

/// Decode the finalized data URI and load it back
pub fn reload(output: &FinalizedOutput) -> Document {
    let uri = DataUri::parse(&output.finalized_document).unwrap();
    assert!(uri.is(PDF_MEDIA_TYPE), "{}", uri.media_type);
    Document::load_mem(&uri.data).unwrap()
}

/// Page object ids in document order
pub fn pages(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}
