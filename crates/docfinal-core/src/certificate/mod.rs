//! Signing certificate page
//!
//! The certificate is best-effort. Any layout or drawing failure is logged
//! and replaced by a single-message page so the finalized document is still
//! produced.

pub mod device;
pub mod page;
pub mod timeline;

pub use device::DeviceKind;
pub use page::{layout_fits, render_certificate, render_replacement, CERTIFICATE_ERROR_TEXT};
pub use timeline::{signature_id, AuditTimeline};

use crate::clock::Clock;
use crate::error::{CertificateRenderError, FinalizeError};
use crate::signer::{CallerContext, SignerDetails};
use lopdf::ObjectId;
use rand_core::RngCore;
use shared_pdf::{EmbeddedImage, PdfDocument};

/// Shown in place of a missing caller email
pub const EMAIL_PLACEHOLDER: &str = "Not provided";

/// Everything printed on the certificate, derived once per run
#[derive(Debug, Clone, PartialEq)]
pub struct SigningCertificateData {
    pub signer_name: String,
    /// Caller email, or [`EMAIL_PLACEHOLDER`]
    pub email: String,
    pub signature_id: String,
    pub device_descriptor: String,
    pub timeline: AuditTimeline,
}

impl SigningCertificateData {
    pub fn derive<R: RngCore, C: Clock>(
        signer: &SignerDetails,
        caller: &CallerContext,
        rng: &mut R,
        clock: &C,
    ) -> Self {
        let signed = AuditTimeline::signed_at(Some(signer.signing_date), clock);
        let device = DeviceKind::from_user_agent(caller.user_agent.as_deref());
        Self {
            signer_name: signer.full_name.clone(),
            email: caller.email().unwrap_or(EMAIL_PLACEHOLDER).to_string(),
            signature_id: signature_id(rng),
            device_descriptor: device.descriptor().to_string(),
            timeline: AuditTimeline::derive(signed, rng),
        }
    }
}

/// What ended up on the appended page
#[derive(Debug)]
pub enum CertificateOutcome {
    Rendered(ObjectId),
    /// The certificate failed and a replacement page was appended instead
    Recovered {
        page: ObjectId,
        error: CertificateRenderError,
    },
}

impl CertificateOutcome {
    pub fn page_id(&self) -> ObjectId {
        match self {
            CertificateOutcome::Rendered(page) => *page,
            CertificateOutcome::Recovered { page, .. } => *page,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, CertificateOutcome::Recovered { .. })
    }
}

/// Append the certificate page, falling back to a replacement page.
///
/// Only a failure to append the replacement itself is reported as an error.
pub fn append_certificate(
    pdf: &mut PdfDocument,
    data: &SigningCertificateData,
    image: Option<&EmbeddedImage>,
    page_size: (f64, f64),
) -> Result<CertificateOutcome, FinalizeError> {
    match render_certificate(pdf, data, image, page_size) {
        Ok(page) => Ok(CertificateOutcome::Rendered(page)),
        Err(error) => {
            tracing::warn!(error = %error, "Certificate page failed, appending replacement");
            let page = render_replacement(pdf, page_size)
                .map_err(|e| FinalizeError::Operation(format!("Replacement page: {}", e)))?;
            Ok(CertificateOutcome::Recovered { page, error })
        }
    }
}
