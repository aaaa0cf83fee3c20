//! Document finalization core
//!
//! Turns a source PDF plus signer-supplied values into a finalized copy:
//! a diagonal preview watermark on every page, the signer's date, name and
//! signature in the sender or recipient box of the last page, and an appended
//! signing certificate page with a synthetic audit timeline.
//!
//! ```no_run
//! use docfinal_core::{finalize_document, FinalizeConfig, FinalizeRequest};
//!
//! # fn run(request: FinalizeRequest) -> Result<(), docfinal_core::FinalizeError> {
//! let output = finalize_document(&request, FinalizeConfig::default())?;
//! println!("{} -> {} pages", output.document_display_name, output.report.output_page_count);
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod clock;
pub mod compositor;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod layout;
pub mod loader;
pub mod pipeline;
pub mod signer;
pub mod watermark;

#[cfg(test)]
pub(crate) mod fixtures;

pub use certificate::{CertificateOutcome, SigningCertificateData};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FinalizeConfig, PageSize};
pub use error::{CertificateRenderError, FinalizeError};
pub use pipeline::{FinalizeReport, FinalizeRequest, FinalizeStage, FinalizedOutput, Finalizer};
pub use signer::{CallerContext, SignerDetails, SignerInput, SignerRole};

/// Finalize one request with OS randomness and the system clock
pub fn finalize_document(
    request: &FinalizeRequest,
    config: FinalizeConfig,
) -> Result<FinalizedOutput, FinalizeError> {
    Finalizer::new(config).finalize(request)
}
