//! Runtime configuration for the finalization pipeline
//!
//! Layout geometry is fixed policy and lives in constants next to the code
//! that draws it. Only environment-dependent choices belong here.

use crate::error::FinalizeError;
use serde::{Deserialize, Serialize};

/// Page size presets, in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    Letter,
    A4,
    Legal,
}

impl PageSize {
    /// `(width, height)` in points
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
        }
    }

    pub fn parse(value: &str) -> Result<Self, FinalizeError> {
        match value.trim().to_lowercase().as_str() {
            "letter" | "us-letter" => Ok(PageSize::Letter),
            "a4" => Ok(PageSize::A4),
            "legal" | "us-legal" => Ok(PageSize::Legal),
            other => Err(FinalizeError::Config(format!(
                "Unknown page size: {}",
                other
            ))),
        }
    }
}

/// Finalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeConfig {
    /// Explicit size of the appended certificate page.
    /// `None` reuses the dimensions of the document's last page, falling back
    /// to [`PageSize::Letter`] when that page has no usable MediaBox or is too
    /// small for the certificate layout.
    pub certificate_page_size: Option<PageSize>,
    /// Display name used when the request carries none
    pub default_document_name: String,
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self {
            certificate_page_size: None,
            default_document_name: "Untitled Document".to_string(),
        }
    }
}

impl FinalizeConfig {
    /// Force a specific certificate page size
    pub fn with_certificate_page_size(mut self, size: PageSize) -> Self {
        self.certificate_page_size = Some(size);
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - DOCFINAL_CERTIFICATE_PAGE_SIZE: "letter", "a4" or "legal" (unset: match the document)
    /// - DOCFINAL_DEFAULT_DOCUMENT_NAME: fallback display name
    pub fn from_env() -> Result<Self, FinalizeError> {
        let defaults = Self::default();

        let certificate_page_size = match std::env::var("DOCFINAL_CERTIFICATE_PAGE_SIZE") {
            Ok(value) if !value.trim().is_empty() => Some(PageSize::parse(&value)?),
            _ => defaults.certificate_page_size,
        };

        let default_document_name = std::env::var("DOCFINAL_DEFAULT_DOCUMENT_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.default_document_name);

        Ok(Self {
            certificate_page_size,
            default_document_name,
        })
    }
}
