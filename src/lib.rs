//! # pdfknow
//!
//! Structural extraction of PDF documents for downstream knowledge processing.
//!
//! Each page is read into typed text blocks, which are classified into
//! headers, body text, running headers and footers, and footnotes. Tables
//! are reconstructed, embedded images are extracted and optionally OCR'd,
//! and everything is assembled into a [`DocumentModel`] with a pre-rendered
//! Markdown view.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfknow::{ExtractOptions, PdfExtractor};
//!
//! fn main() -> pdfknow::Result<()> {
//!     let extractor = PdfExtractor::new(ExtractOptions::default())?;
//!     let doc = extractor.extract_file("document.pdf")?;
//!
//!     println!("{}", doc.markdown);
//!     for table in doc.tables() {
//!         println!("table {} on page {}", table.index, table.page_number);
//!     }
//!
//!     extractor.cleanup()
//! }
//! ```
//!
//! ## Modes
//!
//! - [`ExtractMode::Raw`]: text, roles and tables
//! - [`ExtractMode::Standard`]: plus embedded images
//! - [`ExtractMode::Detailed`]: plus OCR of every image (default)

pub mod detect;
pub mod error;
pub mod extractor;
pub mod model;
pub mod ocr;
pub mod parser;
pub mod render;

pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use extractor::{FileInfo, PdfExtractor};
pub use model::{
    BBox, DocumentMetadata, DocumentModel, ExtractionSummary, ImageOcrResult, ImageRecord,
    PageRecord, Role, Table, TableSource, TextBlock, TextSpan,
};
pub use ocr::{OcrEngine, TesseractEngine};
pub use parser::{
    ClassifierConfig, ErrorMode, ExtractMode, ExtractOptions, LopdfSource, PdfSource,
};
pub use render::{JsonFormat, MarkdownRenderer, RenderOptions};

use std::path::Path;

/// Extract a PDF file with default options.
///
/// The scratch directory is removed before returning, so the `path` of each
/// [`ImageRecord`] no longer exists. Use a [`PdfExtractor`] to keep the images
/// around.
///
/// ```no_run
/// let doc = pdfknow::extract_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<DocumentModel> {
    extract_file_with_options(path, ExtractOptions::default())
}

/// Extract a PDF file with custom options.
///
/// ```no_run
/// use pdfknow::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().raw().sequential();
/// let doc = extract_file_with_options("document.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<DocumentModel> {
    let extractor = PdfExtractor::new(options)?;
    let result = extractor.extract_file(path);
    extractor.cleanup()?;
    result
}

/// Extract a PDF held in memory.
pub fn extract_bytes(data: &[u8], name: &str, options: ExtractOptions) -> Result<DocumentModel> {
    let extractor = PdfExtractor::new(options)?;
    let result = extractor.extract_bytes(data, name);
    extractor.cleanup()?;
    result
}

/// Extract plain text from a PDF file. No images or OCR.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = extract_file_with_options(path, ExtractOptions::new().raw())?;
    Ok(doc.plain_text())
}

/// Convert a PDF to Markdown.
///
/// ```no_run
/// let markdown = pdfknow::to_markdown("document.pdf").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(extract_file(path)?.markdown)
}

/// Convert a PDF to JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = extract_file(path)?;
    render::to_json(&doc, format)
}

/// Convert a PDF to formatted plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = extract_file(path)?;
    Ok(render::to_text(&doc))
}
