use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Malformed PDF structure: {0}")]
    StructureError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),
}
