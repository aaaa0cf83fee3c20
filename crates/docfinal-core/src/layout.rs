//! Image fitting shared by the signature box and the certificate page

use shared_pdf::Rect;

/// Scale `(width, height)` to fit inside `max_width` x `max_height`,
/// preserving aspect ratio. The result is never larger than either bound.
pub fn fit_within(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 || max_width <= 0.0 || max_height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height);
    (
        (width * scale).min(max_width),
        (height * scale).min(max_height),
    )
}

/// Fit an image into `area` and center it on both axes
pub fn fit_centered(image_width: f64, image_height: f64, area: &Rect) -> Rect {
    let (width, height) = fit_within(image_width, image_height, area.width, area.height);
    Rect::new(
        area.x + (area.width - width) / 2.0,
        area.y + (area.height - height) / 2.0,
        width,
        height,
    )
}
