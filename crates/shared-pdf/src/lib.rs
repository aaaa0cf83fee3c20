//! Shared PDF handling utilities
//!
//! This crate wraps lopdf with the small page-level toolkit the finalization
//! pipeline needs: page geometry, append-only content streams, standard font
//! and opacity resources, PNG image XObjects and whole-page insertion.

pub mod content;
pub mod error;
pub mod geometry;
pub mod image;
pub mod parser;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use content::{escape_pdf_string, ContentBuilder};
pub use error::PdfError;
pub use geometry::{PageBox, Rect};
pub use image::{DecodedImage, EmbeddedImage};
pub use parser::{PdfDocument, StandardFont};
