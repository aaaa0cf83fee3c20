//! `data:` URI parsing and encoding
//!
//! Documents and signature images travel as base64 data URIs such as
//! `data:application/pdf;name=lease.pdf;base64,JVBERi0...`.

use base64::{engine::general_purpose::STANDARD, Engine};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// A decoded data URI
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    /// Lowercased media type, e.g. `application/pdf`
    pub media_type: String,
    /// `key=value` parameters other than `base64`
    pub params: Vec<(String, String)>,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse a base64 data URI. Non-base64 payloads are rejected.
    pub fn parse(input: &str) -> Result<Self, String> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| "Payload is not a data URI".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "Data URI has no payload separator".to_string())?;

        let mut parts = header.split(';');
        let media_type = parts.next().unwrap_or_default().trim().to_lowercase();

        let mut is_base64 = false;
        let mut params = Vec::new();
        for part in parts {
            let part = part.trim();
            if part.eq_ignore_ascii_case("base64") {
                is_base64 = true;
            } else if let Some((key, value)) = part.split_once('=') {
                params.push((key.trim().to_lowercase(), value.trim().to_string()));
            }
        }

        if !is_base64 {
            return Err("Data URI is not base64 encoded".to_string());
        }

        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let data = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| format!("Invalid base64 payload: {}", e))?;

        Ok(Self {
            media_type,
            params,
            data,
        })
    }

    /// Look up a parameter by (case-insensitive) key
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// True when the URI declares `media_type` (case-insensitive)
    pub fn is(&self, media_type: &str) -> bool {
        self.media_type.eq_ignore_ascii_case(media_type)
    }
}

/// Encode bytes as a base64 data URI
pub fn encode(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdf_uri() {
        let uri = DataUri::parse("data:application/pdf;base64,JVBERi0=").unwrap();
        assert!(uri.is(PDF_MEDIA_TYPE));
        assert_eq!(uri.data, b"%PDF-".to_vec());
    }

    #[test]
    fn test_parse_keeps_name_param() {
        let uri = DataUri::parse("data:Application/PDF;name=lease.pdf;base64,JVBERi0=").unwrap();
        assert_eq!(uri.media_type, "application/pdf");
        assert_eq!(uri.param("NAME"), Some("lease.pdf"));
    }

    #[test]
    fn test_parse_tolerates_line_breaks() {
        let uri = DataUri::parse("data:image/png;base64,iVBO\nRw0K").unwrap();
        assert_eq!(uri.data[..4], [0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_parse_rejects_plain_base64() {
        assert!(DataUri::parse("JVBERi0xLjcK").is_err());
    }

    #[test]
    fn test_parse_rejects_percent_encoded() {
        assert!(DataUri::parse("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(DataUri::parse("data:application/pdf;base64,***").is_err());
    }

    #[test]
    fn test_encode_then_parse() {
        let encoded = encode(PDF_MEDIA_TYPE, b"%PDF-1.7");
        assert!(encoded.starts_with("data:application/pdf;base64,"));
        assert_eq!(DataUri::parse(&encoded).unwrap().data, b"%PDF-1.7".to_vec());
    }
}
