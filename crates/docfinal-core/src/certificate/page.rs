//! Certificate page layout
//!
//! The page is composed in memory and only added to the document once every
//! section has been laid out, so a layout failure never leaves half a page.

use super::timeline::AuditTimeline;
use super::SigningCertificateData;
use crate::error::CertificateRenderError;
use crate::layout::fit_centered;
use lopdf::{Dictionary, Object, ObjectId};
use shared_pdf::{ContentBuilder, EmbeddedImage, PdfDocument, PdfError, Rect, StandardFont};

pub const MARGIN: f64 = 50.0;
pub const TITLE_SIZE: f64 = 22.0;
pub const HEADING_SIZE: f64 = 13.0;
pub const BODY_SIZE: f64 = 10.0;
pub const FOOTER_SIZE: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 16.0;
pub const SECTION_SPACING: f64 = 24.0;
/// Space between a section heading and the signature box below it
pub const HEADING_GAP: f64 = 8.0;
pub const SIGNATURE_BOX_HEIGHT: f64 = 100.0;
pub const SIGNATURE_BOX_PADDING: f64 = 10.0;
pub const COLUMN_GAP: f64 = 20.0;
/// Narrowest usable area between the side margins
pub const MIN_CONTENT_WIDTH: f64 = 300.0;
/// Footer baseline above the page bottom
pub const FOOTER_BASELINE: f64 = 30.0;
/// Lines in the details section (sent, viewed, signed, reason)
pub const DETAIL_LINES: usize = 4;
/// Vertical space taken by all sections between the top and bottom margins
pub const CONTENT_HEIGHT: f64 = TITLE_SIZE
    + 3.0 * (SECTION_SPACING + HEADING_SIZE)
    + 2.0 * LINE_HEIGHT
    + HEADING_GAP
    + SIGNATURE_BOX_HEIGHT
    + DETAIL_LINES as f64 * LINE_HEIGHT;

pub const TITLE: &str = "Signing Certificate";
pub const AUTHENTICATION_LINE: &str = "Authentication Level: Email";
pub const IP_ADDRESS_PLACEHOLDER: &str = "Not available (captured client-side)";
pub const SIGNING_REASON: &str = "I am the owner of this document";
pub const IMAGE_ERROR_TEXT: &str = "Signature image could not be rendered";
pub const FOOTER_TEXT: &str =
    "This certificate was generated by DocuSigner and records the signing events of this document.";
/// Body of the page substituted when the certificate cannot be laid out
pub const CERTIFICATE_ERROR_TEXT: &str = "Error generating signing certificate";

const BORDER_GRAY: f64 = 0.6;
const LABEL_GRAY: f64 = 0.35;
const ERROR_RGB: (f64, f64, f64) = (0.8, 0.1, 0.1);

/// Top-down baseline tracker that refuses to run into the bottom margin
struct Cursor {
    y: f64,
    floor: f64,
}

impl Cursor {
    fn advance(&mut self, by: f64, section: &'static str) -> Result<f64, CertificateRenderError> {
        self.y -= by;
        if self.y < self.floor {
            return Err(CertificateRenderError::LayoutOverflow { section });
        }
        Ok(self.y)
    }
}

fn font_resources(pdf: &mut PdfDocument) -> Dictionary {
    let mut fonts = Dictionary::new();
    for font in [StandardFont::Helvetica, StandardFont::HelveticaBold] {
        fonts.set(font.resource_name(), Object::Reference(pdf.font_object(font)));
    }
    let mut resources = Dictionary::new();
    resources.set("Font", fonts);
    resources
}

/// Whether a page of this size can hold the whole certificate layout
pub fn layout_fits((width, height): (f64, f64)) -> bool {
    width.is_finite()
        && height.is_finite()
        && width >= 2.0 * MARGIN + MIN_CONTENT_WIDTH
        && height >= 2.0 * MARGIN + CONTENT_HEIGHT
}

/// Lay out and append the certificate page
pub fn render_certificate(
    pdf: &mut PdfDocument,
    data: &SigningCertificateData,
    image: Option<&EmbeddedImage>,
    (width, height): (f64, f64),
) -> Result<ObjectId, CertificateRenderError> {
    let required = 2.0 * MARGIN + MIN_CONTENT_WIDTH;
    if width.is_nan() || width < required {
        return Err(CertificateRenderError::PageTooNarrow { width, required });
    }
    if !height.is_finite() {
        return Err(CertificateRenderError::LayoutOverflow { section: "page" });
    }

    let regular = StandardFont::Helvetica.resource_name();
    let bold = StandardFont::HelveticaBold.resource_name();
    let mut resources = font_resources(pdf);
    let mut content = ContentBuilder::new();
    let mut cursor = Cursor {
        y: height - MARGIN,
        floor: MARGIN,
    };

    content.save_state().fill_gray(0.0);

    let y = cursor.advance(TITLE_SIZE, "title")?;
    content.text(bold, TITLE_SIZE, MARGIN, y, TITLE);

    // Signer information
    let y = cursor.advance(SECTION_SPACING + HEADING_SIZE, "signer information")?;
    content.text(bold, HEADING_SIZE, MARGIN, y, "Signer Information");
    let y = cursor.advance(LINE_HEIGHT, "signer information")?;
    content.text(
        regular,
        BODY_SIZE,
        MARGIN,
        y,
        &format!("Signer: {} ({})", data.signer_name, data.email),
    );
    let y = cursor.advance(LINE_HEIGHT, "signer information")?;
    content.text(regular, BODY_SIZE, MARGIN, y, AUTHENTICATION_LINE);

    // Signature box with the identity column beside it
    let y = cursor.advance(SECTION_SPACING + HEADING_SIZE, "signature")?;
    content.text(bold, HEADING_SIZE, MARGIN, y, "Signature");
    let box_top = cursor.advance(HEADING_GAP, "signature")?;
    let box_bottom = cursor.advance(SIGNATURE_BOX_HEIGHT, "signature")?;

    let column_width = (width - 2.0 * MARGIN - COLUMN_GAP) / 2.0;
    let signature_box = Rect::new(MARGIN, box_bottom, column_width, SIGNATURE_BOX_HEIGHT);
    content
        .save_state()
        .stroke_gray(BORDER_GRAY)
        .line_width(1.0)
        .stroke_rect(&signature_box)
        .restore_state();

    let inner = Rect::new(
        signature_box.x + SIGNATURE_BOX_PADDING,
        signature_box.y + SIGNATURE_BOX_PADDING,
        signature_box.width - 2.0 * SIGNATURE_BOX_PADDING,
        signature_box.height - 2.0 * SIGNATURE_BOX_PADDING,
    );
    match image.map(|img| pdf.verify_image(img).map(|_| img)) {
        Some(Ok(img)) => {
            let placed = fit_centered(img.width as f64, img.height as f64, &inner);
            let mut xobjects = Dictionary::new();
            xobjects.set(img.name.as_str(), Object::Reference(img.id));
            resources.set("XObject", xobjects);
            content.image(&img.name, &placed);
        }
        failure => {
            match failure {
                Some(Err(e)) => tracing::warn!(error = %e, "Certificate signature image unavailable"),
                _ => tracing::warn!("No signature image for certificate"),
            }
            let (r, g, b) = ERROR_RGB;
            content
                .save_state()
                .fill_rgb(r, g, b)
                .text(
                    regular,
                    BODY_SIZE,
                    inner.x,
                    inner.y + inner.height / 2.0,
                    IMAGE_ERROR_TEXT,
                )
                .restore_state();
        }
    }

    let column_x = MARGIN + column_width + COLUMN_GAP;
    let identity = [
        ("Signature ID", data.signature_id.as_str()),
        ("IP Address", IP_ADDRESS_PLACEHOLDER),
        ("Device", data.device_descriptor.as_str()),
    ];
    let mut line_y = box_top - BODY_SIZE;
    for (label, value) in identity {
        content
            .save_state()
            .fill_gray(LABEL_GRAY)
            .text(bold, BODY_SIZE, column_x, line_y, &format!("{}:", label))
            .restore_state()
            .text(regular, BODY_SIZE, column_x, line_y - LINE_HEIGHT, value);
        line_y -= 2.0 * LINE_HEIGHT;
    }

    // Details
    let y = cursor.advance(SECTION_SPACING + HEADING_SIZE, "details")?;
    content.text(bold, HEADING_SIZE, MARGIN, y, "Details");
    let timeline = &data.timeline;
    let details: [String; DETAIL_LINES] = [
        format!("Sent: {}", AuditTimeline::format(&timeline.sent)),
        format!("Viewed: {}", AuditTimeline::format(&timeline.viewed)),
        format!("Signed: {}", AuditTimeline::format(&timeline.signed)),
        format!("Reason: {}", SIGNING_REASON),
    ];
    for line in &details {
        let y = cursor.advance(LINE_HEIGHT, "details")?;
        content.text(regular, BODY_SIZE, MARGIN, y, line);
    }

    content
        .fill_gray(LABEL_GRAY)
        .text(regular, FOOTER_SIZE, MARGIN, FOOTER_BASELINE, FOOTER_TEXT)
        .restore_state();

    pdf.append_page(width, height, resources, content.finish())
        .map_err(|e| CertificateRenderError::Pdf(e.to_string()))
}

/// Append a page that only carries [`CERTIFICATE_ERROR_TEXT`]
pub fn render_replacement(
    pdf: &mut PdfDocument,
    (width, height): (f64, f64),
) -> Result<ObjectId, PdfError> {
    let resources = font_resources(pdf);
    let x = MARGIN.min(width * 0.1);
    let mut content = ContentBuilder::new();
    let (r, g, b) = ERROR_RGB;
    content
        .save_state()
        .fill_rgb(r, g, b)
        .text(
            StandardFont::HelveticaBold.resource_name(),
            HEADING_SIZE,
            x,
            height / 2.0,
            CERTIFICATE_ERROR_TEXT,
        )
        .restore_state();
    pdf.append_page(width, height, resources, content.finish())
}
