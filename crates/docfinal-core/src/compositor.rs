//! Sender/recipient signature boxes on the last page
//!
//! Both boxes are always drawn, labeled and bordered. Only the box matching
//! the signer's role receives the date, the name and the signature image.

use crate::error::FinalizeError;
use crate::layout::fit_within;
use crate::signer::{SignerDetails, SignerRole};
use shared_pdf::{
    ContentBuilder, DecodedImage, EmbeddedImage, PageBox, PdfDocument, PdfError, Rect, StandardFont,
};

/// Distance from the left/right page edge to the outer box edge
pub const BOX_SIDE_MARGIN: f64 = 50.0;
/// Distance from the page bottom to the box bottom
pub const BOX_BOTTOM_MARGIN: f64 = 50.0;
/// Minimum horizontal gap between the two boxes
pub const BOX_GAP: f64 = 20.0;
pub const BOX_MAX_WIDTH: f64 = 220.0;
pub const BOX_HEIGHT: f64 = 110.0;
/// On small pages the margins shrink to these fractions of the page side
const SIDE_MARGIN_RATIO: f64 = 0.1;
const BOTTOM_MARGIN_RATIO: f64 = 0.08;
const GAP_RATIO: f64 = 0.04;
const HEIGHT_RATIO: f64 = 0.3;

pub const BOX_PADDING: f64 = 8.0;
pub const LABEL_FONT_SIZE: f64 = 10.0;
/// Baseline offset of the label above the box top
pub const LABEL_OFFSET: f64 = 6.0;
pub const DETAIL_FONT_SIZE: f64 = 9.0;
pub const LINE_HEIGHT: f64 = 12.0;
/// Space between the name line and the signature allotment
pub const IMAGE_GAP: f64 = 6.0;
/// Signature height cap as a fraction of the box height
pub const SIGNATURE_MAX_HEIGHT_RATIO: f64 = 0.35;
pub const BORDER_GRAY: f64 = 0.4;
pub const BORDER_WIDTH: f64 = 1.0;

/// The two fixed regions on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureBoxes {
    pub sender: Rect,
    pub recipient: Rect,
}

impl SignatureBoxes {
    /// Compute both boxes for a page. The boxes never overlap.
    pub fn for_page(page: &PageBox) -> Self {
        let side = BOX_SIDE_MARGIN.min(page.width * SIDE_MARGIN_RATIO);
        let bottom = BOX_BOTTOM_MARGIN.min(page.height * BOTTOM_MARGIN_RATIO);
        let gap = BOX_GAP.min(page.width * GAP_RATIO);
        let width = BOX_MAX_WIDTH.min((page.width - 2.0 * side - gap) / 2.0);
        let height = BOX_HEIGHT.min(page.height * HEIGHT_RATIO);

        Self {
            sender: Rect::new(page.x + side, page.y + bottom, width, height),
            recipient: Rect::new(
                page.x + page.width - side - width,
                page.y + bottom,
                width,
                height,
            ),
        }
    }

    pub fn for_role(&self, role: SignerRole) -> Rect {
        match role {
            SignerRole::Sender => self.sender,
            SignerRole::Recipient => self.recipient,
        }
    }
}

/// Where the signer's content landed
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSignature {
    pub role: SignerRole,
    pub boxes: SignatureBoxes,
    pub target: Rect,
    pub image_rect: Rect,
    /// The signature XObject, reused by the certificate page
    pub image: EmbeddedImage,
}

/// Baselines of the date and name lines inside a box
fn detail_baselines(target: &Rect) -> (f64, f64) {
    let date_y = target.top() - BOX_PADDING - DETAIL_FONT_SIZE;
    (date_y, date_y - LINE_HEIGHT)
}

/// Region left for the signature image below the text lines
pub fn signature_allotment(target: &Rect) -> Rect {
    let (_, name_y) = detail_baselines(target);
    let bottom = target.y + BOX_PADDING;
    let height = (name_y - IMAGE_GAP - bottom).max(0.0);
    Rect::new(
        target.x + BOX_PADDING,
        bottom,
        (target.width - 2.0 * BOX_PADDING).max(0.0),
        height,
    )
}

/// Scale the image into the allotment, centered horizontally in the box and
/// vertically in the allotment
pub fn place_signature(image_width: f64, image_height: f64, target: &Rect) -> Rect {
    let allotment = signature_allotment(target);
    let max_height = allotment
        .height
        .min(target.height * SIGNATURE_MAX_HEIGHT_RATIO);
    let (width, height) = fit_within(image_width, image_height, allotment.width, max_height);
    Rect::new(
        target.x + (target.width - width) / 2.0,
        allotment.y + (allotment.height - height) / 2.0,
        width,
        height,
    )
}

/// Draw both boxes on the last page and fill the signer's box.
///
/// `fallback_size` is used when the last page has no drawable MediaBox.
/// An undecodable signature aborts before anything is drawn.
pub fn composite_signature(
    pdf: &mut PdfDocument,
    signer: &SignerDetails,
    fallback_size: (f64, f64),
) -> Result<PlacedSignature, FinalizeError> {
    let png = signer.signature_png()?;
    let decoded =
        DecodedImage::from_png(&png).map_err(|e| FinalizeError::ImageDecode(e.to_string()))?;

    let page_id = pdf
        .last_page_id()
        .ok_or_else(|| FinalizeError::Format("Document has no pages".into()))?;
    let page = match pdf.page_box(page_id) {
        Some(page) if page.is_drawable() => page,
        other => {
            tracing::warn!(media_box = ?other, "Last page has no usable MediaBox, using fallback size");
            PageBox::from_corners([0.0, 0.0, fallback_size.0, fallback_size.1])
        }
    };

    let boxes = SignatureBoxes::for_page(&page);
    let target = boxes.for_role(signer.role);
    let image_rect = place_signature(decoded.width as f64, decoded.height as f64, &target);

    let image = pdf
        .embed_image(&decoded)
        .map_err(|e| FinalizeError::ImageDecode(e.to_string()))?;
    let op_err = |e: PdfError| FinalizeError::Operation(e.to_string());
    pdf.use_xobject(page_id, &image.name, image.id).map_err(op_err)?;
    let bold = pdf.use_font(page_id, StandardFont::HelveticaBold).map_err(op_err)?;
    let regular = pdf.use_font(page_id, StandardFont::Helvetica).map_err(op_err)?;

    let mut content = ContentBuilder::new();
    content
        .save_state()
        .stroke_gray(BORDER_GRAY)
        .line_width(BORDER_WIDTH)
        .stroke_rect(&boxes.sender)
        .stroke_rect(&boxes.recipient)
        .fill_gray(0.0);
    for role in [SignerRole::Sender, SignerRole::Recipient] {
        let rect = boxes.for_role(role);
        content.text(
            bold,
            LABEL_FONT_SIZE,
            rect.x,
            rect.top() + LABEL_OFFSET,
            role.label(),
        );
    }

    let (date_y, name_y) = detail_baselines(&target);
    let text_x = target.x + BOX_PADDING;
    content
        .text(
            regular,
            DETAIL_FONT_SIZE,
            text_x,
            date_y,
            &format!("Date: {}", signer.signing_date.format("%Y-%m-%d")),
        )
        .text(
            regular,
            DETAIL_FONT_SIZE,
            text_x,
            name_y,
            &format!("Signed by: {}", signer.full_name),
        )
        .image(&image.name, &image_rect)
        .restore_state();

    pdf.append_content(page_id, content.finish()).map_err(op_err)?;

    tracing::debug!(
        role = signer.role.label(),
        width = image_rect.width,
        height = image_rect.height,
        "Signature placed"
    );

    Ok(PlacedSignature {
        role: signer.role,
        boxes,
        target,
        image_rect,
        image,
    })
}
