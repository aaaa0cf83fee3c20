use thiserror::Error;

/// Failures that abort a finalization run.
///
/// Certificate cosmetics never surface here; see [`CertificateRenderError`].
#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("Invalid source document: {0}")]
    Format(String),

    #[error("Signature image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("Invalid signer details: {0}")]
    InvalidSigner(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error("Failed to serialize finalized document: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failures while laying out the signing certificate page.
///
/// These are recovered inside the pipeline by substituting a placeholder page.
#[derive(Error, Debug)]
pub enum CertificateRenderError {
    #[error("Certificate page too narrow: {width:.1}pt wide, need {required:.1}pt")]
    PageTooNarrow { width: f64, required: f64 },

    #[error("Certificate layout overflowed the page in section '{section}'")]
    LayoutOverflow { section: &'static str },

    #[error("Certificate drawing failed: {0}")]
    Pdf(String),
}
