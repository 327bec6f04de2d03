//! Page and document assembly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rayon::prelude::*;

use crate::error::Result;
use crate::model::{DocumentMetadata, DocumentModel, PageRecord};
use crate::ocr::{ImageAssociator, OcrEngine, ScratchDir, TesseractEngine};
use crate::parser::{
    extract_blocks, raw_text_fallback, BlockClassifier, ErrorMode, ExtractOptions, LopdfSource,
    PdfSource, TableReconstructor,
};
use crate::render::{MarkdownRenderer, RenderOptions};

/// File-system facts about the document being extracted.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    /// File name including extension
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time (RFC 3339), empty when unknown
    pub modified: String,
}

impl FileInfo {
    /// Read name, size and modification time of a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified = meta
            .modified()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size: meta.len(),
            modified,
        })
    }

    /// File info for an in-memory document.
    pub fn named(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: String::new(),
        }
    }
}

/// Turns PDFs into [`DocumentModel`]s.
///
/// Each extractor owns a scratch directory for extracted images. Every
/// document gets its own subdirectory so image files never collide. The
/// directory lives until [`cleanup`](PdfExtractor::cleanup) is called or the
/// extractor is dropped.
///
/// ```no_run
/// use pdfknow::{ExtractOptions, PdfExtractor};
///
/// let extractor = PdfExtractor::new(ExtractOptions::default().raw())?;
/// let doc = extractor.extract_file("report.pdf")?;
/// println!("{}", doc.markdown);
/// extractor.cleanup()?;
/// # Ok::<(), pdfknow::Error>(())
/// ```
pub struct PdfExtractor {
    options: ExtractOptions,
    render_options: RenderOptions,
    classifier: BlockClassifier,
    tables: TableReconstructor,
    engine: Arc<dyn OcrEngine>,
    scratch: ScratchDir,
    documents: AtomicUsize,
}

impl PdfExtractor {
    /// Create an extractor and its scratch directory.
    pub fn new(options: ExtractOptions) -> Result<Self> {
        let scratch = match &options.scratch_parent {
            Some(parent) => ScratchDir::new_in(parent)?,
            None => ScratchDir::new()?,
        };
        Ok(Self {
            classifier: BlockClassifier::with_config(options.classifier.clone()),
            tables: TableReconstructor::new(),
            render_options: RenderOptions::default(),
            engine: Arc::new(TesseractEngine::new()),
            scratch,
            documents: AtomicUsize::new(0),
            options,
        })
    }

    /// Use a different OCR engine.
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Options for the Markdown stored in each document.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Root of this extractor's scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Extract a PDF file.
    ///
    /// Only an unreadable, corrupt or encrypted file is an error; per-page
    /// problems are logged and produce empty page records.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<DocumentModel> {
        let path = path.as_ref();
        log::info!("Extracting {}", path.display());
        crate::detect::detect_format_from_path(path)?;
        let file = FileInfo::from_path(path)?;
        let source = LopdfSource::open(path)?;
        self.extract_source(&source, file)
    }

    /// Extract a PDF held in memory.
    pub fn extract_bytes(&self, data: &[u8], name: &str) -> Result<DocumentModel> {
        let source = LopdfSource::from_bytes(data)?;
        self.extract_source(&source, FileInfo::named(name, data.len() as u64))
    }

    /// Extract from any parsed-PDF handle.
    pub fn extract_source(&self, source: &dyn PdfSource, file: FileInfo) -> Result<DocumentModel> {
        let started = Instant::now();
        let total_pages = source.page_count();
        let images_dir = self.document_dir()?;

        let mut pages: Vec<PageRecord> = if self.options.parallel && total_pages > 1 {
            (1..=total_pages)
                .into_par_iter()
                .map(|n| self.extract_page(source, n, &images_dir))
                .collect()
        } else {
            (1..=total_pages)
                .map(|n| self.extract_page(source, n, &images_dir))
                .collect()
        };
        pages.sort_by_key(|p| p.page_number);

        let mut metadata = build_metadata(&source.info(), file);
        metadata.pdf_version = source.version();
        metadata.total_pages = total_pages;
        metadata.extraction_timestamp = Utc::now().to_rfc3339();
        metadata.extraction_seconds = started.elapsed().as_secs_f64();

        let mut doc = DocumentModel::new(metadata, pages);
        doc.markdown = MarkdownRenderer::new(self.render_options.clone()).render(&doc);

        log::info!(
            "Extracted {} pages from {} in {:.2}s",
            total_pages,
            doc.metadata.file_name,
            doc.metadata.extraction_seconds
        );
        Ok(doc)
    }

    /// Extract one page. Never fails: an anomaly yields an empty record.
    fn extract_page(&self, source: &dyn PdfSource, page_number: u32, images_dir: &Path) -> PageRecord {
        match self.try_extract_page(source, page_number, images_dir) {
            Ok(page) => page,
            Err(e) => {
                match self.options.error_mode {
                    ErrorMode::Strict => log::error!("Page {} failed: {}", page_number, e),
                    ErrorMode::Lenient => log::warn!("Page {} failed: {}", page_number, e),
                }
                PageRecord::new(page_number, 0.0, 0.0)
            }
        }
    }

    fn try_extract_page(
        &self,
        source: &dyn PdfSource,
        page_number: u32,
        images_dir: &Path,
    ) -> Result<PageRecord> {
        let (width, height) = source.page_size(page_number)?;
        let text = source.text_dict(page_number)?;

        let mut page = PageRecord::new(page_number, width, height);
        page.blocks = extract_blocks(&text, page_number);
        self.classifier.apply(&mut page.blocks, height);
        page.tables = self
            .tables
            .reconstruct(source, page_number, &text, (width, height));

        match source.plain_text(page_number) {
            Ok(raw) => page.raw_text = raw_text_fallback(&page.blocks, &raw),
            Err(e) => log::debug!("No unstructured text for page {}: {}", page_number, e),
        }

        if self.options.mode.extracts_images() {
            let mut associator = ImageAssociator::new(images_dir);
            if self.options.mode.runs_ocr() {
                associator = associator
                    .with_ocr(Arc::clone(&self.engine), &self.options.ocr_language)
                    .with_timeout(self.options.ocr_timeout);
            }
            page.images = associator.extract_images(source, page_number);
            page.ocr_results = associator.recognize(&page.images);
        }

        log::debug!(
            "Page {}: {} blocks, {} tables, {} images, {} OCR results",
            page_number,
            page.blocks.len(),
            page.tables.len(),
            page.images.len(),
            page.ocr_results.len()
        );
        Ok(page)
    }

    fn document_dir(&self) -> Result<PathBuf> {
        let n = self.documents.fetch_add(1, Ordering::SeqCst) + 1;
        let dir = self.scratch.file(&format!("doc_{}", n));
        if self.options.mode.extracts_images() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Delete the scratch directory and every image written to it.
    pub fn cleanup(self) -> Result<()> {
        self.scratch.close()
    }
}

fn build_metadata(info: &BTreeMap<String, String>, file: FileInfo) -> DocumentMetadata {
    let field = |key: &str| info.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
    DocumentMetadata {
        file_name: file.name,
        file_size: file.size,
        file_modified: file.modified,
        title: field("Title"),
        author: field("Author"),
        subject: field("Subject"),
        keywords: field("Keywords"),
        creator: field("Creator"),
        producer: field("Producer"),
        creation_date: normalize_pdf_date(&field("CreationDate")),
        modification_date: normalize_pdf_date(&field("ModDate")),
        ..Default::default()
    }
}

/// RFC 3339 form of a PDF date, or the input unchanged if it does not parse.
pub fn normalize_pdf_date(raw: &str) -> String {
    parse_pdf_date(raw)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Only the year is required. Missing fields default to their minimum and a
/// missing offset means UTC.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);
    let offset = s.get(14..).map(parse_offset).unwrap_or(Some(0))?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let tz = FixedOffset::east_opt(offset)?;
    naive.and_local_timezone(tz).single()
}

/// Seconds east of UTC for `Z`, `+HH'mm'` or `-HH'mm'`.
fn parse_offset(s: &str) -> Option<i32> {
    let mut chars = s.chars();
    let sign = match chars.next() {
        None | Some('Z') => return Some(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };
    let digits: String = chars.filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
    Some(sign * (hours * 3600 + minutes * 60))
}
