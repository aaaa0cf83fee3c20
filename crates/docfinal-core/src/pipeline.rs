//! The finalization pipeline
//!
//! `Idle -> Loading -> Watermarking -> Compositing -> CertificateBuilding ->
//! Serializing -> Done`. Any failure other than a certificate failure moves
//! the run to `Failed` and nothing is returned.

use crate::certificate::{append_certificate, layout_fits, SigningCertificateData};
use crate::clock::{Clock, SystemClock};
use crate::compositor::composite_signature;
use crate::config::{FinalizeConfig, PageSize};
use crate::data_uri::{self, PDF_MEDIA_TYPE};
use crate::error::FinalizeError;
use crate::loader::load_source;
use crate::signer::{CallerContext, SignerDetails, SignerInput};
use crate::watermark::stamp_document;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use shared_pdf::PdfDocument;
use std::time::Instant;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FinalizeStage {
    Idle,
    Loading,
    Watermarking,
    Compositing,
    CertificateBuilding,
    Serializing,
    Done,
    Failed,
}

/// Everything needed for one finalization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    /// `data:application/pdf;base64,...`
    pub source_document: String,
    /// Display name; falls back to the data URI's `name=` parameter
    pub document_name: Option<String>,
    pub signer: SignerInput,
    #[serde(default)]
    pub caller: CallerContext,
}

/// Counters describing a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeReport {
    pub source_page_count: usize,
    pub output_page_count: usize,
    pub pages_watermarked: usize,
    pub pages_skipped: usize,
    pub certificate_recovered: bool,
    pub signature_id: String,
    pub source_sha256: String,
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub processing_time_ms: u64,
}

/// The only artifact handed back to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedOutput {
    /// `data:application/pdf;base64,...`
    pub finalized_document: String,
    /// The signature data URI exactly as it was passed in
    pub signature_image_preview: String,
    pub document_display_name: String,
    pub report: FinalizeReport,
}

/// Runs the pipeline with injected randomness and time
pub struct Finalizer<R: RngCore = OsRng, C: Clock = SystemClock> {
    config: FinalizeConfig,
    rng: R,
    clock: C,
    stage: FinalizeStage,
}

impl Finalizer {
    pub fn new(config: FinalizeConfig) -> Self {
        Self::with_sources(config, OsRng, SystemClock)
    }
}

impl<R: RngCore, C: Clock> Finalizer<R, C> {
    pub fn with_sources(config: FinalizeConfig, rng: R, clock: C) -> Self {
        Self {
            config,
            rng,
            clock,
            stage: FinalizeStage::Idle,
        }
    }

    /// Stage reached by the most recent run
    pub fn stage(&self) -> FinalizeStage {
        self.stage
    }

    fn enter(&mut self, stage: FinalizeStage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "Stage transition");
        self.stage = stage;
    }

    /// Produce the finalized document for one request
    pub fn finalize(&mut self, request: &FinalizeRequest) -> Result<FinalizedOutput, FinalizeError> {
        let span = tracing::info_span!("finalize");
        let _guard = span.enter();
        self.stage = FinalizeStage::Idle;

        match self.run(request) {
            Ok(output) => {
                self.enter(FinalizeStage::Done);
                tracing::info!(
                    pages = output.report.output_page_count,
                    recovered = output.report.certificate_recovered,
                    ms = output.report.processing_time_ms,
                    "Document finalized"
                );
                Ok(output)
            }
            Err(e) => {
                tracing::error!(stage = ?self.stage, error = %e, "Finalization failed");
                self.stage = FinalizeStage::Failed;
                Err(e)
            }
        }
    }

    fn run(&mut self, request: &FinalizeRequest) -> Result<FinalizedOutput, FinalizeError> {
        let start = Instant::now();
        let signer = SignerDetails::try_from(&request.signer)?;

        self.enter(FinalizeStage::Loading);
        let source = load_source(&request.source_document)?;
        let mut pdf = source.pdf;

        self.enter(FinalizeStage::Watermarking);
        let watermark = stamp_document(&mut pdf)?;

        self.enter(FinalizeStage::Compositing);
        let fallback = PageSize::Letter.dimensions();
        let placed = composite_signature(&mut pdf, &signer, fallback)?;

        self.enter(FinalizeStage::CertificateBuilding);
        let data =
            SigningCertificateData::derive(&signer, &request.caller, &mut self.rng, &self.clock);
        let page_size = self.certificate_page_size(&pdf);
        let outcome = append_certificate(&mut pdf, &data, Some(&placed.image), page_size)?;
        let output_page_count = pdf.page_count();

        self.enter(FinalizeStage::Serializing);
        let bytes = pdf
            .save_to_bytes()
            .map_err(|e| FinalizeError::Serialization(e.to_string()))?;

        let document_display_name = request
            .document_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or(source.name)
            .unwrap_or_else(|| self.config.default_document_name.clone());

        Ok(FinalizedOutput {
            finalized_document: data_uri::encode(PDF_MEDIA_TYPE, &bytes),
            signature_image_preview: signer.signature_image.clone(),
            document_display_name,
            report: FinalizeReport {
                source_page_count: source.page_count,
                output_page_count,
                pages_watermarked: watermark.stamped,
                pages_skipped: watermark.skipped,
                certificate_recovered: outcome.is_recovered(),
                signature_id: data.signature_id,
                source_sha256: source.sha256,
                input_size_bytes: source.size_bytes,
                output_size_bytes: bytes.len(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Configured size, else the last page's size when the layout fits on it,
    /// else Letter
    fn certificate_page_size(&self, pdf: &PdfDocument) -> (f64, f64) {
        if let Some(size) = self.config.certificate_page_size {
            return size.dimensions();
        }
        let last = pdf
            .last_page_id()
            .and_then(|id| pdf.page_box(id))
            .filter(|page| page.is_drawable())
            .map(|page| (page.width, page.height));
        match last {
            Some(size) if layout_fits(size) => size,
            Some((width, height)) => {
                tracing::debug!(width, height, "Last page too small for certificate, using Letter");
                PageSize::Letter.dimensions()
            }
            None => PageSize::Letter.dimensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fixtures::{build_pdf, pdf_bytes, png_data_uri};
    use crate::signer::SignerRole;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn finalizer(config: FinalizeConfig) -> Finalizer<ChaCha8Rng, FixedClock> {
        Finalizer::with_sources(
            config,
            ChaCha8Rng::seed_from_u64(99),
            FixedClock(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()),
        )
    }

    fn request(pages: &[Option<[i64; 4]>]) -> FinalizeRequest {
        FinalizeRequest {
            source_document: data_uri::encode(PDF_MEDIA_TYPE, &pdf_bytes(pages)),
            document_name: None,
            signer: SignerInput {
                role: Some(SignerRole::Sender),
                full_name: Some("Jane Doe".to_string()),
                signing_date: NaiveDate::from_ymd_opt(2024, 1, 15),
                signature_image: Some(png_data_uri(30, 10)),
            },
            caller: CallerContext::default(),
        }
    }

    #[test]
    fn test_successful_run_reaches_done() {
        let mut finalizer = finalizer(FinalizeConfig::default());
        let request = request(&[Some([0, 0, 612, 792]), None]);
        let output = finalizer.finalize(&request).unwrap();

        assert_eq!(finalizer.stage(), FinalizeStage::Done);
        assert_eq!(output.report.source_page_count, 2);
        assert_eq!(output.report.output_page_count, 3);
        assert_eq!(output.report.pages_watermarked, 1);
        assert_eq!(output.report.pages_skipped, 1);
        assert!(!output.report.certificate_recovered);
        assert_eq!(output.signature_image_preview, request.signer.signature_image.unwrap());
        assert_eq!(output.document_display_name, "Untitled Document");
        assert!(output.finalized_document.starts_with("data:application/pdf;base64,"));
    }

    #[test]
    fn test_missing_signer_field_fails_before_loading() {
        let mut finalizer = finalizer(FinalizeConfig::default());
        let mut request = request(&[Some([0, 0, 612, 792])]);
        request.signer.full_name = None;

        let result = finalizer.finalize(&request);
        assert!(matches!(result, Err(FinalizeError::InvalidSigner(_))));
        assert_eq!(finalizer.stage(), FinalizeStage::Failed);
    }

    #[test]
    fn test_display_name_precedence() {
        let mut finalizer = finalizer(FinalizeConfig::default());
        let mut request = request(&[Some([0, 0, 612, 792])]);
        request.source_document = request.source_document.replacen(
            "data:application/pdf;",
            "data:application/pdf;name=from-uri.pdf;",
            1,
        );
        assert_eq!(
            finalizer.finalize(&request).unwrap().document_display_name,
            "from-uri.pdf"
        );

        request.document_name = Some("Explicit".to_string());
        assert_eq!(finalizer.finalize(&request).unwrap().document_display_name, "Explicit");
    }

    #[test]
    fn test_certificate_page_size_follows_config() {
        let forced = finalizer(FinalizeConfig::default().with_certificate_page_size(PageSize::A4));
        let pdf = build_pdf(&[Some([0, 0, 612, 792])]);
        assert_eq!(forced.certificate_page_size(&pdf), PageSize::A4.dimensions());

        let matching = finalizer(FinalizeConfig::default());
        let pdf = build_pdf(&[Some([0, 0, 842, 595])]);
        assert_eq!(matching.certificate_page_size(&pdf), (842.0, 595.0));

        let pdf = build_pdf(&[None]);
        assert_eq!(matching.certificate_page_size(&pdf), (612.0, 792.0));
    }

    #[test]
    fn test_small_last_page_falls_back_to_letter() {
        let finalizer = finalizer(FinalizeConfig::default());
        for media_box in [[0, 0, 396, 612], [0, 0, 612, 396], [0, 0, 150, 150]] {
            let pdf = build_pdf(&[Some(media_box)]);
            assert_eq!(
                finalizer.certificate_page_size(&pdf),
                PageSize::Letter.dimensions(),
                "{:?}",
                media_box
            );
        }

        let pdf = build_pdf(&[Some([0, 0, 420, 595])]);
        assert_eq!(finalizer.certificate_page_size(&pdf), (420.0, 595.0));
    }

    #[test]
    fn test_half_letter_keeps_certificate() {
        let mut finalizer = finalizer(FinalizeConfig::default());
        for media_box in [[0, 0, 396, 612], [0, 0, 612, 396]] {
            let output = finalizer.finalize(&request(&[Some(media_box)])).unwrap();
            assert!(!output.report.certificate_recovered, "{:?}", media_box);
            assert_eq!(output.report.output_page_count, 2);
        }
    }
}
