//! PDF parsing and manipulation using lopdf

use crate::error::PdfError;
use crate::geometry::PageBox;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{HashMap, HashSet};

/// Maximum Parent hops followed when resolving inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Standard 14 fonts used for generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name under which the font is registered in page resources
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "DfHelv",
            StandardFont::HelveticaBold => "DfHelvB",
        }
    }
}

/// Where a page's resource dictionary lives
enum ResourceSlot {
    Inline,
    Indirect(ObjectId),
}

/// Wrapper around lopdf::Document for page-level drawing operations
pub struct PdfDocument {
    pub(crate) doc: Document,
    fonts: HashMap<StandardFont, ObjectId>,
    opacity_states: HashMap<u32, ObjectId>,
    /// Pages whose original content has already been wrapped in `q`/`Q`
    isolated: HashSet<ObjectId>,
    pub(crate) next_image: u32,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            fonts: HashMap::new(),
            opacity_states: HashMap::new(),
            isolated: HashSet::new(),
            next_image: 1,
        }
    }

    /// Read-only access to the underlying lopdf document
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object IDs in document order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    pub fn last_page_id(&self) -> Option<ObjectId> {
        self.doc.get_pages().values().next_back().copied()
    }

    /// Object ID of the root page tree node
    pub fn pages_root(&self) -> Result<ObjectId, PdfError> {
        let catalog = self
            .doc
            .catalog()
            .map_err(|e| PdfError::StructureError(format!("Missing catalog: {}", e)))?;
        catalog
            .get(b"Pages")
            .and_then(|pages| pages.as_reference())
            .map_err(|e| PdfError::StructureError(format!("Catalog has no page tree: {}", e)))
    }

    /// Resolve the page's MediaBox, following Parent inheritance.
    ///
    /// Returns `None` when no usable MediaBox exists. Callers decide whether
    /// that means "skip" or "use a default".
    pub fn page_box(&self, page_id: ObjectId) -> Option<PageBox> {
        let media_box = self.inherited_attribute(page_id, b"MediaBox")?;
        self.parse_rect(&media_box).map(PageBox::from_corners)
    }

    /// Find an attribute on the page or the nearest ancestor carrying it
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = page_id;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.doc.get_object(current).ok()?.as_dict().ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value.clone());
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    /// Parse a PDF rectangle array into `[x1, y1, x2, y2]`
    fn parse_rect(&self, obj: &Object) -> Option<[f64; 4]> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self.doc.get_object(*id).ok()?.as_array().ok()?,
            _ => return None,
        };

        if arr.len() != 4 {
            return None;
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }
        Some(values)
    }

    /// Extract a number from a PDF object, resolving at most one reference
    fn extract_number(&self, obj: &Object) -> Option<f64> {
        let obj = match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            direct => direct,
        };
        match obj {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r as f64),
            _ => None,
        }
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_object(page_id)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| PdfError::StructureError(format!("Page {:?}: {}", page_id, e)))
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfError> {
        self.doc
            .get_object_mut(page_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(|e| PdfError::StructureError(format!("Page {:?}: {}", page_id, e)))
    }

    /// Content stream references of a page, flattened into a list
    fn content_streams(&self, page_id: ObjectId) -> Result<Vec<Object>, PdfError> {
        let page = self.page_dict(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => Ok(items.clone()),
                _ => Ok(vec![Object::Reference(*id)]),
            },
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(_) => Err(PdfError::StructureError(
                "Page Contents is neither a stream nor an array".into(),
            )),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Append a content stream to a page.
    ///
    /// The first append on a page wraps the existing content in `q`/`Q` so a
    /// leftover transformation matrix cannot displace the new drawing.
    pub fn append_content(
        &mut self,
        page_id: ObjectId,
        content: Vec<u8>,
    ) -> Result<(), PdfError> {
        let mut streams = self.content_streams(page_id)?;
        let mut content = content;

        if self.isolated.insert(page_id) && !streams.is_empty() {
            let open_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            streams.insert(0, Object::Reference(open_id));
            let mut wrapped = b"\nQ\n".to_vec();
            wrapped.append(&mut content);
            content = wrapped;
        }

        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        streams.push(Object::Reference(stream_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(streams));
        Ok(())
    }

    /// Make sure the page owns a resource dictionary and report where it is.
    ///
    /// Pages that only inherit resources get an inline copy so additions do
    /// not leak into sibling pages.
    fn resource_slot(&mut self, page_id: ObjectId) -> Result<ResourceSlot, PdfError> {
        match self.page_dict(page_id)?.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(ResourceSlot::Indirect(*id)),
            Ok(Object::Dictionary(_)) => return Ok(ResourceSlot::Inline),
            _ => {}
        }

        let inherited = match self.inherited_attribute(page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict,
            Some(Object::Reference(id)) => self
                .doc
                .get_object(id)
                .and_then(|obj| obj.as_dict())
                .map(|dict| dict.clone())
                .unwrap_or_default(),
            _ => Dictionary::new(),
        };
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(inherited));
        Ok(ResourceSlot::Inline)
    }

    fn resources_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfError> {
        match self.resource_slot(page_id)? {
            ResourceSlot::Indirect(id) => self
                .doc
                .get_object_mut(id)
                .and_then(|obj| obj.as_dict_mut())
                .map_err(|e| PdfError::StructureError(format!("Resources: {}", e))),
            ResourceSlot::Inline => self
                .page_dict_mut(page_id)?
                .get_mut(b"Resources")
                .and_then(|obj| obj.as_dict_mut())
                .map_err(|e| PdfError::StructureError(format!("Resources: {}", e))),
        }
    }

    /// Register `value` under `/category/name` in the page's resources
    fn set_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        name: &str,
        value: Object,
    ) -> Result<(), PdfError> {
        let slot = {
            let resources = self.resources_mut(page_id)?;
            match resources.get(category) {
                Ok(Object::Reference(id)) => Some(*id),
                Ok(Object::Dictionary(_)) => None,
                _ => {
                    resources.set(category, Dictionary::new());
                    None
                }
            }
        };

        let target = match slot {
            Some(id) => self
                .doc
                .get_object_mut(id)
                .and_then(|obj| obj.as_dict_mut()),
            None => self
                .resources_mut(page_id)?
                .get_mut(category)
                .and_then(|obj| obj.as_dict_mut()),
        }
        .map_err(|e| PdfError::StructureError(format!("Resource category: {}", e)))?;

        target.set(name, value);
        Ok(())
    }

    /// Shared font object for a standard font, created on first use
    pub fn font_object(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.fonts.get(&font) {
            return *id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        self.fonts.insert(font, id);
        id
    }

    /// Register a standard font on a page and return its resource name
    pub fn use_font(
        &mut self,
        page_id: ObjectId,
        font: StandardFont,
    ) -> Result<&'static str, PdfError> {
        let font_id = self.font_object(font);
        self.set_resource(
            page_id,
            b"Font",
            font.resource_name(),
            Object::Reference(font_id),
        )?;
        Ok(font.resource_name())
    }

    /// Shared ExtGState for a constant fill/stroke opacity
    pub fn opacity_object(&mut self, opacity: f64) -> (String, ObjectId) {
        let key = (opacity.clamp(0.0, 1.0) * 100.0).round() as u32;
        let name = format!("DfGs{}", key);
        if let Some(id) = self.opacity_states.get(&key) {
            return (name, *id);
        }
        let alpha = key as f32 / 100.0;
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => alpha,
            "CA" => alpha,
        });
        self.opacity_states.insert(key, id);
        (name, id)
    }

    /// Register an opacity graphics state on a page and return its resource name
    pub fn use_opacity(&mut self, page_id: ObjectId, opacity: f64) -> Result<String, PdfError> {
        let (name, id) = self.opacity_object(opacity);
        self.set_resource(page_id, b"ExtGState", &name, Object::Reference(id))?;
        Ok(name)
    }

    /// Register an image XObject on a page
    pub fn use_xobject(
        &mut self,
        page_id: ObjectId,
        name: &str,
        xobject_id: ObjectId,
    ) -> Result<(), PdfError> {
        self.set_resource(page_id, b"XObject", name, Object::Reference(xobject_id))
    }

    /// Append a new page at the end of the root page tree
    pub fn append_page(
        &mut self,
        width: f64,
        height: f64,
        resources: Dictionary,
        content: Vec<u8>,
    ) -> Result<ObjectId, PdfError> {
        let pages_id = self.pages_root()?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });

        let pages = self
            .doc
            .get_object_mut(pages_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(|e| PdfError::StructureError(format!("Page tree root: {}", e)))?;

        let mut kids = match pages.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            Ok(_) => {
                return Err(PdfError::StructureError(
                    "Page tree Kids is not an inline array".into(),
                ))
            }
            Err(_) => Vec::new(),
        };
        let count = pages.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
        kids.push(Object::Reference(page_id));
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(count + 1));

        self.isolated.insert(page_id);
        Ok(page_id)
    }

    /// Drop an object that ended up unused (e.g. after an aborted page build)
    pub fn discard_object(&mut self, id: ObjectId) {
        self.doc.objects.remove(&id);
    }

    /// Serialize the document, consuming it
    pub fn save_to_bytes(mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }
}
