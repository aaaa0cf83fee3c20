//! In-memory documents and content inspection for tests
//!
//! Compiled for this crate's own tests and, through the `testing` feature,
//! for downstream test suites.

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Build a document whose pages carry the given MediaBoxes.
///
/// Each page shows `Page N` in Courier through its own `/F1` resource.
/// `None` leaves the MediaBox off the page entirely.
pub fn build_document(media_boxes: &[Option<[i64; 4]>]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let mut kids = Vec::new();
    for (index, media_box) in media_boxes.iter().enumerate() {
        let text = format!("BT /F1 12 Tf 72 700 Td (Page {}) Tj ET\n", index + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        };
        if let Some(mb) = media_box {
            page.set(
                "MediaBox",
                mb.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            );
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// [`build_document`] serialized to bytes
pub fn document_bytes(media_boxes: &[Option<[i64; 4]>]) -> Vec<u8> {
    let mut doc = build_document(media_boxes);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Opaque RGBA PNG with a dark stroke across the middle row
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut samples = vec![255u8; (width * height * 4) as usize];
    let row = (height / 2) as usize;
    for x in 0..width as usize {
        let offset = (row * width as usize + x) * 4;
        samples[offset..offset + 3].copy_from_slice(&[0, 0, 0]);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&samples).unwrap();
    }
    out
}

/// Concatenated (decompressed) content of a page as text
pub fn page_text(doc: &Document, page_id: ObjectId) -> String {
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

/// A `Tj` with the origin set by the closest preceding `Tm`/`Td`
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        _ => 0.0,
    }
}

pub fn text_runs(doc: &Document, page_id: ObjectId) -> Vec<TextRun> {
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let mut origin = (0.0, 0.0);
    let mut runs = Vec::new();
    for op in &content.operations {
        match (op.operator.as_str(), op.operands.as_slice()) {
            ("Tm", [_, _, _, _, e, f]) => origin = (number(e), number(f)),
            ("Td", [tx, ty]) => origin = (number(tx), number(ty)),
            ("Tj", [Object::String(text, _)]) => runs.push(TextRun {
                text: String::from_utf8_lossy(text).into_owned(),
                x: origin.0,
                y: origin.1,
            }),
            _ => {}
        }
    }
    runs
}

pub fn find_run<'a>(runs: &'a [TextRun], text: &str) -> Option<&'a TextRun> {
    runs.iter().find(|run| run.text == text)
}

/// `[x, y, w, h]` of every `cm` that places an image
pub fn image_placements(doc: &Document, page_id: ObjectId) -> Vec<[f64; 4]> {
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let mut last_cm = None;
    let mut placements = Vec::new();
    for op in &content.operations {
        match (op.operator.as_str(), op.operands.as_slice()) {
            ("cm", [a, _, _, d, e, f]) => {
                last_cm = Some([number(e), number(f), number(a), number(d)]);
            }
            ("Do", _) => {
                if let Some(cm) = last_cm.take() {
                    placements.push(cm);
                }
            }
            _ => {}
        }
    }
    placements
}
