//! Content stream construction
//!
//! Drawing is expressed as raw PDF operators appended to a buffer, the same
//! way signature appearance streams are written elsewhere in the workspace.
//! Every builder output is balanced (`q` ... `Q`) so it can be appended after
//! arbitrary existing page content.

use crate::geometry::Rect;

/// Escape special characters for PDF string literals.
///
/// Latin-1 characters are emitted as octal escapes, which WinAnsiEncoding
/// maps to the same glyphs. Anything outside that range becomes `?`.
pub fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            '\n' | '\r' | '\t' => " ".to_string(),
            _ if c.is_ascii_control() => String::new(),
            _ if c.is_ascii() => c.to_string(),
            _ if (0xA0..=0xFF).contains(&(c as u32)) => format!("\\{:03o}", c as u32),
            _ => "?".to_string(),
        })
        .collect()
}

fn num(value: f64) -> String {
    format!("{:.2}", value)
}

/// Builder for a single self-contained content stream
#[derive(Debug, Default)]
pub struct ContentBuilder {
    ops: Vec<String>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.ops.push("q".to_string());
        self
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.ops.push("Q".to_string());
        self
    }

    /// Select a named ExtGState resource (opacity etc.)
    pub fn graphics_state(&mut self, name: &str) -> &mut Self {
        self.ops.push(format!("/{} gs", name));
        self
    }

    pub fn fill_gray(&mut self, level: f64) -> &mut Self {
        self.ops.push(format!("{} g", num(level)));
        self
    }

    pub fn fill_rgb(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.ops.push(format!("{} {} {} rg", num(r), num(g), num(b)));
        self
    }

    pub fn stroke_gray(&mut self, level: f64) -> &mut Self {
        self.ops.push(format!("{} G", num(level)));
        self
    }

    pub fn line_width(&mut self, width: f64) -> &mut Self {
        self.ops.push(format!("{} w", num(width)));
        self
    }

    /// Outline a rectangle with the current stroke color
    pub fn stroke_rect(&mut self, rect: &Rect) -> &mut Self {
        self.ops.push(format!(
            "{} {} {} {} re S",
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height)
        ));
        self
    }

    /// Draw one line of text with its baseline starting at `(x, y)`
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) -> &mut Self {
        self.ops.push(format!(
            "BT /{} {} Tf 1 0 0 1 {} {} Tm ({}) Tj ET",
            font,
            num(size),
            num(x),
            num(y),
            escape_pdf_string(text)
        ));
        self
    }

    /// Draw one line of text rotated counter-clockwise by `degrees` around its origin
    pub fn rotated_text(
        &mut self,
        font: &str,
        size: f64,
        x: f64,
        y: f64,
        degrees: f64,
        text: &str,
    ) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.ops.push(format!(
            "BT /{} {} Tf {:.4} {:.4} {:.4} {:.4} {} {} Tm ({}) Tj ET",
            font,
            num(size),
            cos,
            sin,
            -sin,
            cos,
            num(x),
            num(y),
            escape_pdf_string(text)
        ));
        self
    }

    /// Paint a named image XObject scaled into `rect`
    pub fn image(&mut self, name: &str, rect: &Rect) -> &mut Self {
        self.ops.push(format!(
            "q {} 0 0 {} {} {} cm /{} Do Q",
            num(rect.width),
            num(rect.height),
            num(rect.x),
            num(rect.y),
            name
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.ops.join("\n");
        out.push('\n');
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_parentheses_and_backslash() {
        assert_eq!(escape_pdf_string("a(b)c\\"), "a\\(b\\)c\\\\");
    }

    #[test]
    fn test_escape_latin1_as_octal() {
        assert_eq!(escape_pdf_string("José"), "Jos\\351");
    }

    #[test]
    fn test_escape_outside_latin1_is_replaced() {
        assert_eq!(escape_pdf_string("名"), "?");
    }

    #[test]
    fn test_output_decodes_as_content_stream() {
        let mut builder = ContentBuilder::new();
        builder
            .save_state()
            .fill_gray(0.5)
            .text("F1", 12.0, 10.0, 20.0, "Hello (world)")
            .rotated_text("F1", 30.0, 5.0, 5.0, -45.0, "Stamp")
            .stroke_rect(&Rect::new(0.0, 0.0, 50.0, 25.0))
            .image("Im1", &Rect::new(1.0, 2.0, 3.0, 4.0))
            .restore_state();

        let bytes = builder.finish();
        let content = Content::decode(&bytes).unwrap();
        let operators: Vec<&str> = content
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();

        assert!(operators.contains(&"Tj"));
        assert!(operators.contains(&"Tm"));
        assert!(operators.contains(&"Do"));
        assert_eq!(operators.first(), Some(&"q"));
        assert_eq!(operators.last(), Some(&"Q"));
    }

    #[test]
    fn test_rotated_text_matrix_for_negative_45() {
        let mut builder = ContentBuilder::new();
        builder.rotated_text("F1", 24.0, 0.0, 0.0, -45.0, "X");
        let text = String::from_utf8(builder.finish()).unwrap();
        assert!(text.contains("0.7071 -0.7071 0.7071 0.7071"), "{}", text);
    }
}
