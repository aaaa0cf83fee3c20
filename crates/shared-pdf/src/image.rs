//! PNG decoding and image XObject embedding
//!
//! Signatures arrive as PNG with an alpha channel. Color samples go into a
//! DeviceRGB/DeviceGray image and alpha into a soft mask, both Flate encoded.

use crate::error::PdfError;
use crate::parser::PdfDocument;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, ObjectId, Stream};
use std::io::Write;

/// PNG magic bytes: 89 50 4E 47 0D 0A 1A 0A
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Raw 8-bit samples of a decoded PNG
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 1 for grayscale, 3 for RGB
    pub components: u8,
    pub color: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

/// An image XObject that lives in a document
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub id: ObjectId,
    /// Resource name used whenever the image is placed on a page
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    /// Decode PNG bytes into 8-bit color and alpha planes
    pub fn from_png(bytes: &[u8]) -> Result<Self, PdfError> {
        if bytes.len() < PNG_MAGIC.len() || !bytes.starts_with(&PNG_MAGIC) {
            return Err(PdfError::ImageError("Invalid PNG magic bytes".into()));
        }

        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder
            .read_info()
            .map_err(|e| PdfError::ImageError(format!("PNG header: {}", e)))?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| PdfError::ImageError(format!("PNG data: {}", e)))?;
        buf.truncate(info.buffer_size());

        if info.width == 0 || info.height == 0 {
            return Err(PdfError::ImageError("PNG has zero dimensions".into()));
        }
        if info.bit_depth != png::BitDepth::Eight {
            return Err(PdfError::ImageError(format!(
                "Unsupported PNG bit depth after expansion: {:?}",
                info.bit_depth
            )));
        }

        let (components, has_alpha) = match info.color_type {
            png::ColorType::Grayscale => (1u8, false),
            png::ColorType::GrayscaleAlpha => (1, true),
            png::ColorType::Rgb => (3, false),
            png::ColorType::Rgba => (3, true),
            png::ColorType::Indexed => {
                return Err(PdfError::ImageError("Indexed PNG was not expanded".into()))
            }
        };

        let pixel_count = info.width as usize * info.height as usize;
        let (color, alpha) = if has_alpha {
            let stride = components as usize + 1;
            let mut color = Vec::with_capacity(pixel_count * components as usize);
            let mut alpha = Vec::with_capacity(pixel_count);
            for pixel in buf.chunks_exact(stride) {
                color.extend_from_slice(&pixel[..components as usize]);
                alpha.push(pixel[components as usize]);
            }
            (color, Some(alpha))
        } else {
            (buf, None)
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            components,
            color,
            alpha,
        })
    }

    fn color_space(&self) -> &'static str {
        if self.components == 1 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        }
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::ImageError(format!("Compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfError::ImageError(format!("Compression failed: {}", e)))
}

impl PdfDocument {
    /// Add a decoded image as an XObject (plus soft mask when it has alpha)
    pub fn embed_image(&mut self, image: &DecodedImage) -> Result<EmbeddedImage, PdfError> {
        let smask_id = match &image.alpha {
            Some(alpha) => Some(self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            ))),
            None => None,
        };

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space(),
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(smask_id) = smask_id {
            dict.set("SMask", smask_id);
        }
        let id = self.doc.add_object(Stream::new(dict, deflate(&image.color)?));

        let name = format!("DfIm{}", self.next_image);
        self.next_image += 1;
        tracing::debug!(
            width = image.width,
            height = image.height,
            alpha = image.alpha.is_some(),
            "Embedded image XObject {}",
            name
        );

        Ok(EmbeddedImage {
            id,
            name,
            width: image.width,
            height: image.height,
        })
    }

    /// Decode PNG bytes and embed them in one step
    pub fn embed_png(&mut self, bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
        let decoded = DecodedImage::from_png(bytes)?;
        self.embed_image(&decoded)
    }

    /// Confirm an embedded image still resolves to an image XObject
    pub fn verify_image(&self, image: &EmbeddedImage) -> Result<(), PdfError> {
        let stream = self
            .doc
            .get_object(image.id)
            .and_then(|obj| obj.as_stream())
            .map_err(|e| PdfError::ImageError(format!("{}: {}", image.name, e)))?;
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype == b"Image" => Ok(()),
            _ => Err(PdfError::ImageError(format!(
                "{} is not an image XObject",
                image.name
            ))),
        }
    }
}
