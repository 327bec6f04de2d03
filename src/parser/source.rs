//! Parsed-PDF handle.
//!
//! [`PdfSource`] is everything the extraction pipeline needs from a PDF
//! library. [`LopdfSource`] implements it on top of `lopdf`.

use std::collections::BTreeMap;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::layout::{build_text_page, LayoutAnalyzer};
use super::raw::RawTextPage;
use super::table_detector::{NativeTable, TableDetector};
use crate::error::{Error, Result};
use crate::model::TextSpan;

/// An embedded image on a page, as enumerated by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Object number of the image stream
    pub id: u32,
    /// Resource name (e.g. "Im1")
    pub name: String,
}

/// Decoded image samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Color channels, excluding alpha
    pub color_components: u8,
    pub has_alpha: bool,
    /// Interleaved 8-bit samples, row-major
    pub samples: Vec<u8>,
}

impl Pixmap {
    /// Total channel count including alpha.
    pub fn channels(&self) -> u8 {
        self.color_components + u8::from(self.has_alpha)
    }

    fn from_dynamic(img: DynamicImage, color_components: u8) -> Self {
        let (width, height) = (img.width(), img.height());
        let (components, samples) = match img {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            other if color_components == 1 => (1, other.to_luma8().into_raw()),
            other => (3, other.to_rgb8().into_raw()),
        };
        Self {
            width,
            height,
            color_components: components,
            has_alpha: false,
            samples,
        }
    }

    /// Write the pixmap as a PNG file.
    ///
    /// Only gray and RGB pixmaps (with or without alpha) can be written.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let color = match self.channels() {
            1 => image::ExtendedColorType::L8,
            2 => image::ExtendedColorType::La8,
            3 => image::ExtendedColorType::Rgb8,
            4 if self.has_alpha => image::ExtendedColorType::Rgba8,
            n => {
                return Err(Error::ImageExtract(format!(
                    "cannot write {} channel image as PNG",
                    n
                )))
            }
        };
        let expected = self.width as usize * self.height as usize * self.channels() as usize;
        if self.samples.len() != expected {
            return Err(Error::ImageExtract(format!(
                "expected {} sample bytes, found {}",
                expected,
                self.samples.len()
            )));
        }
        image::save_buffer_with_format(
            path,
            &self.samples,
            self.width,
            self.height,
            color,
            ImageFormat::Png,
        )?;
        Ok(())
    }
}

/// The parsed-PDF handle consumed by the extraction pipeline.
///
/// Page numbers are 1-indexed. Implementations must be safe to share across
/// threads since pages may be extracted in parallel.
pub trait PdfSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Page width and height in points.
    fn page_size(&self, page: u32) -> Result<(f32, f32)>;

    /// Structured text dictionary (blocks → lines → spans) for a page.
    fn text_dict(&self, page: u32) -> Result<RawTextPage>;

    /// Unstructured text of a page.
    fn plain_text(&self, page: u32) -> Result<String>;

    /// Native table detection. An error sends the page to the
    /// text-alignment fallback; an empty list does not.
    ///
    /// Detection fails when the page cannot be analyzed at all, for example
    /// when its content stream is unreadable or carries no positioned text.
    fn find_tables(&self, page: u32) -> Result<Vec<NativeTable>>;

    /// Embedded images in enumeration order.
    fn images(&self, page: u32) -> Result<Vec<ImageRef>>;

    /// Decode an image into a pixel buffer.
    fn materialize(&self, image: &ImageRef) -> Result<Pixmap>;

    /// Document information dictionary as strings.
    fn info(&self) -> BTreeMap<String, String>;

    /// PDF version (e.g., "1.7").
    fn version(&self) -> String;
}

/// [`PdfSource`] backed by an in-memory `lopdf` document.
pub struct LopdfSource {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Parse a PDF from bytes.
    ///
    /// Encrypted documents are opened with the empty user password when
    /// possible; anything else fails with [`Error::Encrypted`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        crate::detect::detect_format_from_bytes(data)?;
        let mut doc = LopdfDocument::load_mem(data)?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| Error::Encrypted)?;
            log::debug!("Decrypted PDF with empty password");
        }

        let pages = doc.get_pages();
        Ok(Self { doc, pages })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    /// Look up a page attribute, following the `/Parent` chain for
    /// inheritable entries.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut node = self.doc.get_dictionary(page_id).ok();
        // Bounded to guard against cyclic page trees
        for _ in 0..32 {
            let dict = node?;
            if let Ok(value) = dict.get(key) {
                return self.doc.dereference(value).ok().map(|(_, obj)| obj);
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let values: Option<Vec<f32>> = self
            .inherited(page_id, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| self.doc.dereference(o).ok())
                    .filter_map(|(_, o)| o.as_float().ok())
                    .collect()
            });
        match values.as_deref() {
            Some(&[x0, y0, x1, y1]) => [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)],
            // US Letter
            _ => [0.0, 0.0, 612.0, 792.0],
        }
    }

    fn spans(&self, page: u32) -> Result<(Vec<TextSpan>, [f32; 4])> {
        let page_id = self.page_id(page)?;
        let media = self.media_box(page_id);
        let mut spans = LayoutAnalyzer::new(&self.doc).page_spans(page_id, media[3])?;
        if media[0] != 0.0 {
            for span in &mut spans {
                span.bbox.x0 -= media[0];
                span.bbox.x1 -= media[0];
            }
        }
        Ok((spans, media))
    }

    fn xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let resources = self.inherited(page_id, b"Resources")?.as_dict().ok()?;
        let xobjects = resources.get(b"XObject").ok()?;
        self.doc.dereference(xobjects).ok()?.1.as_dict().ok()
    }

    /// Number of color components of an image's color space.
    fn color_components(&self, dict: &Dictionary) -> u8 {
        let Ok(cs) = dict.get(b"ColorSpace") else {
            // Image masks and JPX images carry no color space
            return 1;
        };
        let Ok((_, cs)) = self.doc.dereference(cs) else {
            return 3;
        };
        let (family, arr) = match cs {
            Object::Name(name) => (name.as_slice(), None),
            Object::Array(arr) => match arr.first().and_then(|o| o.as_name().ok()) {
                Some(name) => (name, Some(arr)),
                None => return 3,
            },
            _ => return 3,
        };

        match family {
            b"DeviceGray" | b"CalGray" | b"G" | b"Indexed" | b"I" | b"Separation" => 1,
            b"DeviceRGB" | b"CalRGB" | b"RGB" | b"Lab" => 3,
            b"DeviceCMYK" | b"CMYK" => 4,
            b"ICCBased" => arr
                .and_then(|a| a.get(1))
                .and_then(|o| self.doc.dereference(o).ok())
                .and_then(|(_, o)| o.as_stream().ok())
                .and_then(|s| s.dict.get(b"N").ok())
                .and_then(|n| n.as_i64().ok())
                .map(|n| n.clamp(1, 4) as u8)
                .unwrap_or(3),
            b"DeviceN" => arr
                .and_then(|a| a.get(1))
                .and_then(|o| o.as_array().ok())
                .map(|names| names.len().min(u8::MAX as usize) as u8)
                .unwrap_or(4),
            _ => 3,
        }
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<(f32, f32)> {
        let [x0, y0, x1, y1] = self.media_box(self.page_id(page)?);
        Ok((x1 - x0, y1 - y0))
    }

    fn text_dict(&self, page: u32) -> Result<RawTextPage> {
        let (spans, [x0, y0, x1, y1]) = self.spans(page)?;
        Ok(build_text_page(&spans, x1 - x0, y1 - y0))
    }

    fn plain_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::TextExtract(e.to_string()))
    }

    fn find_tables(&self, page: u32) -> Result<Vec<NativeTable>> {
        let (spans, _) = self
            .spans(page)
            .map_err(|e| Error::TableDetect(e.to_string()))?;
        // Column detection needs positioned text to work with
        if spans.is_empty() {
            return Err(Error::TableDetect(format!(
                "no positioned text on page {}",
                page
            )));
        }
        Ok(TableDetector::new().detect(&spans))
    }

    fn images(&self, page: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(page)?;
        let Some(xobjects) = self.xobjects(page_id) else {
            return Ok(vec![]);
        };

        let images = xobjects
            .iter()
            .filter_map(|(name, obj)| {
                let id = obj.as_reference().ok()?;
                let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
                let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
                (subtype == b"Image").then(|| ImageRef {
                    id: id.0,
                    name: String::from_utf8_lossy(name).to_string(),
                })
            })
            .collect();
        Ok(images)
    }

    fn materialize(&self, image: &ImageRef) -> Result<Pixmap> {
        let stream = self
            .doc
            .get_object((image.id, 0))
            .and_then(Object::as_stream)
            .map_err(|e| Error::ImageExtract(format!("{}: {}", image.name, e)))?;
        let dict = &stream.dict;

        let dimension = |key: &[u8]| -> Result<u32> {
            dict.get(key)
                .and_then(Object::as_i64)
                .ok()
                .filter(|v| *v > 0)
                .map(|v| v as u32)
                .ok_or_else(|| Error::ImageExtract(format!("{}: missing dimensions", image.name)))
        };
        let width = dimension(b"Width")?;
        let height = dimension(b"Height")?;
        // Soft masks are not composited, so samples never carry alpha
        let components = self.color_components(dict);

        let filters: Vec<Vec<u8>> = match dict.get(b"Filter") {
            Ok(Object::Name(name)) => vec![name.clone()],
            Ok(Object::Array(arr)) => arr
                .iter()
                .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
                .collect(),
            _ => vec![],
        };

        match filters.last().map(Vec::as_slice) {
            Some(b"DCTDecode") => {
                let img = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?;
                let mut pixmap = Pixmap::from_dynamic(img, components);
                // CMYK JPEGs stay flagged as 4 components so callers can skip them
                if components >= 4 {
                    pixmap.color_components = components;
                }
                Ok(pixmap)
            }
            Some(other @ (b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode")) => {
                Err(Error::ImageExtract(format!(
                    "{}: unsupported filter {}",
                    image.name,
                    String::from_utf8_lossy(other)
                )))
            }
            _ => {
                let bits = dict
                    .get(b"BitsPerComponent")
                    .and_then(Object::as_i64)
                    .unwrap_or(8);
                if bits != 8 {
                    return Err(Error::ImageExtract(format!(
                        "{}: unsupported {} bits per component",
                        image.name, bits
                    )));
                }
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let expected = width as usize * height as usize * components as usize;
                if data.len() < expected {
                    return Err(Error::ImageExtract(format!(
                        "{}: expected {} bytes, found {}",
                        image.name,
                        expected,
                        data.len()
                    )));
                }
                Ok(Pixmap {
                    width,
                    height,
                    color_components: components,
                    has_alpha: false,
                    samples: data[..expected].to_vec(),
                })
            }
        }
    }

    fn info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        let dict = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(|o| self.doc.dereference(o))
            .and_then(|(_, o)| o.as_dict());
        let Ok(dict) = dict else {
            return info;
        };

        for (key, value) in dict.iter() {
            let value = match self.doc.dereference(value) {
                Ok((_, Object::String(bytes, _))) => decode_pdf_string(bytes),
                Ok((_, Object::Name(name))) => String::from_utf8_lossy(name).to_string(),
                _ => continue,
            };
            info.insert(String::from_utf8_lossy(key).to_string(), value);
        }
        info
    }

    fn version(&self) -> String {
        self.doc.version.clone()
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).to_string();
    }
    // PDFDocEncoding matches Latin-1 for printable text
    bytes.iter().map(|&b| b as char).collect()
}
