//! Source document loading

use crate::data_uri::{DataUri, PDF_MEDIA_TYPE};
use crate::error::FinalizeError;
use sha2::{Digest, Sha256};
use shared_pdf::PdfDocument;

/// A parsed source document ready for drawing
pub struct LoadedSource {
    pub pdf: PdfDocument,
    /// `name=` parameter of the data URI, if any
    pub name: Option<String>,
    pub page_count: usize,
    pub size_bytes: usize,
    /// Hex SHA-256 of the decoded PDF bytes
    pub sha256: String,
}

/// Compute SHA-256 hash of document bytes
pub fn hash_document(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Decode a `data:application/pdf;base64,...` payload into a page model.
///
/// Every failure is a [`FinalizeError::Format`] and happens before any page
/// is touched.
pub fn load_source(payload: &str) -> Result<LoadedSource, FinalizeError> {
    let uri = DataUri::parse(payload).map_err(FinalizeError::Format)?;
    if !uri.is(PDF_MEDIA_TYPE) {
        return Err(FinalizeError::Format(format!(
            "expected {}, got '{}'",
            PDF_MEDIA_TYPE, uri.media_type
        )));
    }

    let pdf = PdfDocument::from_bytes(&uri.data).map_err(|e| FinalizeError::Format(e.to_string()))?;
    pdf.pages_root()
        .map_err(|e| FinalizeError::Format(e.to_string()))?;
    let page_count = pdf.page_count();
    if page_count == 0 {
        return Err(FinalizeError::Format("Document has no pages".into()));
    }

    let source = LoadedSource {
        name: uri.param("name").map(str::to_string),
        page_count,
        size_bytes: uri.data.len(),
        sha256: hash_document(&uri.data),
        pdf,
    };
    tracing::debug!(
        pages = source.page_count,
        bytes = source.size_bytes,
        sha256 = %source.sha256,
        "Source document loaded"
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_uri::encode;
    use crate::fixtures::pdf_bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_valid_pdf() {
        let bytes = pdf_bytes(&[Some([0, 0, 612, 792]), Some([0, 0, 612, 792])]);
        let source = load_source(&encode(PDF_MEDIA_TYPE, &bytes)).unwrap();
        assert_eq!(source.page_count, 2);
        assert_eq!(source.size_bytes, bytes.len());
        assert_eq!(source.sha256, hash_document(&bytes));
        assert_eq!(source.name, None);
    }

    #[test]
    fn test_load_keeps_name_param() {
        let bytes = pdf_bytes(&[Some([0, 0, 612, 792])]);
        let payload = encode(PDF_MEDIA_TYPE, &bytes).replacen(
            "data:application/pdf;",
            "data:application/pdf;name=lease.pdf;",
            1,
        );
        assert_eq!(load_source(&payload).unwrap().name.as_deref(), Some("lease.pdf"));
    }

    #[test]
    fn test_wrong_media_type_is_format_error() {
        let bytes = pdf_bytes(&[Some([0, 0, 612, 792])]);
        let result = load_source(&encode("image/png", &bytes));
        assert!(matches!(result, Err(FinalizeError::Format(_))));
    }

    #[test]
    fn test_missing_prefix_is_format_error() {
        let result = load_source("JVBERi0xLjcK");
        assert!(matches!(result, Err(FinalizeError::Format(_))));
    }

    #[test]
    fn test_garbage_bytes_are_format_error() {
        let result = load_source(&encode(PDF_MEDIA_TYPE, b"not a pdf at all"));
        assert!(matches!(result, Err(FinalizeError::Format(_))));
    }

    #[test]
    fn test_hash_document_known_value() {
        assert_eq!(
            hash_document(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
