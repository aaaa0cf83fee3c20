//! Diagonal preview watermark
//!
//! A visual deterrent only: the stamp is ordinary page content and does not
//! try to prevent extraction.

use crate::error::FinalizeError;
use shared_pdf::{ContentBuilder, PageBox, PdfDocument, StandardFont};

pub const WATERMARK_TEXT: &str = "DOCUSIGNER PREVIEW";
pub const MIN_FONT_SIZE: f64 = 24.0;
pub const MAX_FONT_SIZE: f64 = 150.0;
pub const ROTATION_DEGREES: f64 = -45.0;
pub const OPACITY: f64 = 0.3;
pub const GRAY_LEVEL: f64 = 0.5;
/// Origin as a fraction of page width / height
pub const ORIGIN_X_RATIO: f64 = 0.05;
pub const ORIGIN_Y_RATIO: f64 = 0.75;

/// Outcome of stamping a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatermarkSummary {
    pub stamped: usize,
    pub skipped: usize,
}

/// Font size derived from the page diagonal, clamped to a readable range
pub fn font_size_for(width: f64, height: f64) -> f64 {
    let diagonal = (width * width + height * height).sqrt();
    let size = diagonal / WATERMARK_TEXT.chars().count() as f64;
    if size.is_nan() {
        return MIN_FONT_SIZE;
    }
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Text origin for a page, honoring a MediaBox that does not start at 0,0
pub fn origin_for(page: &PageBox) -> (f64, f64) {
    (
        page.x + page.width * ORIGIN_X_RATIO,
        page.y + page.height * ORIGIN_Y_RATIO,
    )
}

/// Stamp every drawable page. Pages without positive dimensions are left alone.
pub fn stamp_document(pdf: &mut PdfDocument) -> Result<WatermarkSummary, FinalizeError> {
    let mut summary = WatermarkSummary::default();

    for (index, page_id) in pdf.page_ids().into_iter().enumerate() {
        let page = match pdf.page_box(page_id) {
            Some(page) if page.is_drawable() => page,
            other => {
                tracing::debug!(page = index + 1, media_box = ?other, "Skipping watermark");
                summary.skipped += 1;
                continue;
            }
        };

        let font = pdf
            .use_font(page_id, StandardFont::HelveticaBold)
            .map_err(|e| FinalizeError::Operation(e.to_string()))?;
        let opacity = pdf
            .use_opacity(page_id, OPACITY)
            .map_err(|e| FinalizeError::Operation(e.to_string()))?;

        let size = font_size_for(page.width, page.height);
        let (x, y) = origin_for(&page);

        let mut content = ContentBuilder::new();
        content
            .save_state()
            .graphics_state(&opacity)
            .fill_gray(GRAY_LEVEL)
            .rotated_text(font, size, x, y, ROTATION_DEGREES, WATERMARK_TEXT)
            .restore_state();

        pdf.append_content(page_id, content.finish())
            .map_err(|e| FinalizeError::Operation(e.to_string()))?;
        summary.stamped += 1;
    }

    tracing::debug!(
        stamped = summary.stamped,
        skipped = summary.skipped,
        "Watermark applied"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_pdf, page_text};

    #[test]
    fn test_font_size_letter() {
        // sqrt(612² + 792²) / 18 ≈ 55.6
        let size = font_size_for(612.0, 792.0);
        assert!((size - 55.6).abs() < 0.1, "{}", size);
    }

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(font_size_for(10.0, 10.0), MIN_FONT_SIZE);
        assert_eq!(font_size_for(14400.0, 14400.0), MAX_FONT_SIZE);
    }

    #[test]
    fn test_origin_offsets_media_box() {
        let page = PageBox::from_corners([100.0, 200.0, 300.0, 600.0]);
        assert_eq!(origin_for(&page), (110.0, 500.0));
    }

    #[test]
    fn test_every_drawable_page_is_stamped() {
        let mut pdf = build_pdf(&[Some([0, 0, 612, 792]), Some([0, 0, 842, 595])]);
        let summary = stamp_document(&mut pdf).unwrap();

        assert_eq!(summary, WatermarkSummary { stamped: 2, skipped: 0 });
        for page_id in pdf.page_ids() {
            let text = page_text(&pdf, page_id);
            assert!(text.contains("(DOCUSIGNER PREVIEW) Tj"), "{}", text);
            assert!(text.contains("/DfGs30 gs"));
        }
    }

    #[test]
    fn test_degenerate_pages_are_untouched() {
        let mut pdf = build_pdf(&[
            Some([0, 0, 0, 792]),
            Some([0, 0, 612, -5]),
            None,
            Some([0, 0, 612, 792]),
        ]);
        let ids = pdf.page_ids();
        let before: Vec<_> = ids[..3]
            .iter()
            .map(|id| format!("{:?}", pdf.doc().get_object(*id).unwrap()))
            .collect();

        let summary = stamp_document(&mut pdf).unwrap();

        assert_eq!(summary, WatermarkSummary { stamped: 1, skipped: 3 });
        for (id, original) in ids[..3].iter().zip(before) {
            assert_eq!(format!("{:?}", pdf.doc().get_object(*id).unwrap()), original);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: font size stays in [24, 150] for any positive geometry
        #[test]
        fn font_size_always_clamped(
            width in 1e-6f64..1e7,
            height in 1e-6f64..1e7,
        ) {
            let size = font_size_for(width, height);
            prop_assert!((MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size));
        }
    }
}
