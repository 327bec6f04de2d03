//! Document-level types.

use super::{ImageOcrResult, ImageRecord, PageRecord, Table, TextBlock};
use serde::{Deserialize, Serialize};

/// File and PDF metadata.
///
/// Every string field defaults to the empty string when the source has no
/// value for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// File name including extension
    pub file_name: String,

    /// File size in bytes
    pub file_size: u64,

    /// File modification time (RFC 3339)
    pub file_modified: String,

    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,

    /// Creator application
    pub creator: String,

    /// PDF producer
    pub producer: String,

    /// Creation date, RFC 3339 when the PDF date parsed
    pub creation_date: String,

    /// Modification date, RFC 3339 when the PDF date parsed
    pub modification_date: String,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the file
    pub total_pages: u32,

    /// When the extraction ran (RFC 3339)
    pub extraction_timestamp: String,

    /// Wall-clock extraction time in seconds
    pub extraction_seconds: f64,
}

impl DocumentMetadata {
    /// Document title, falling back to the file name without its `.pdf` suffix.
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        self.file_name
            .strip_suffix(".pdf")
            .or_else(|| self.file_name.strip_suffix(".PDF"))
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// Counts over a document, computed from its pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_pages: u32,
    pub total_text_blocks: usize,
    pub total_headers: usize,
    pub total_images: usize,
    pub total_tables: usize,
    pub total_footnotes: usize,
    pub ocr_processed_images: usize,
    /// Seconds
    pub extraction_time: f64,
}

/// A fully extracted PDF document.
///
/// Document-wide collections (headers, tables, footnotes, OCR results) are
/// not stored; they are projected from `pages` on every call so they can
/// never disagree with the per-page data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentModel {
    /// File and PDF metadata
    pub metadata: DocumentMetadata,

    /// Pages in ascending page-number order
    pub pages: Vec<PageRecord>,

    /// Markdown rendering of this document
    pub markdown: String,
}

impl DocumentModel {
    /// Create a document without a Markdown rendering.
    pub fn new(metadata: DocumentMetadata, pages: Vec<PageRecord>) -> Self {
        Self {
            metadata,
            pages,
            markdown: String::new(),
        }
    }

    /// Get the number of extracted pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_number: u32) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All header blocks, in page order.
    pub fn headers(&self) -> Vec<&TextBlock> {
        self.pages.iter().flat_map(|p| p.headers()).collect()
    }

    /// All tables, in page order.
    pub fn tables(&self) -> Vec<&Table> {
        self.pages.iter().flat_map(|p| &p.tables).collect()
    }

    /// All footnote blocks, in page order.
    pub fn footnotes(&self) -> Vec<&TextBlock> {
        self.pages.iter().flat_map(|p| p.footnotes()).collect()
    }

    /// All OCR results, in page order.
    pub fn ocr_results(&self) -> Vec<&ImageOcrResult> {
        self.pages.iter().flat_map(|p| &p.ocr_results).collect()
    }

    /// All extracted images, in page order.
    pub fn images(&self) -> Vec<&ImageRecord> {
        self.pages.iter().flat_map(|p| &p.images).collect()
    }

    pub fn page_headers(&self) -> Vec<&TextBlock> {
        self.pages.iter().flat_map(|p| p.page_headers()).collect()
    }

    pub fn page_footers(&self) -> Vec<&TextBlock> {
        self.pages.iter().flat_map(|p| p.page_footers()).collect()
    }

    /// Plain text of every page, separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Summary counts.
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            total_pages: self.metadata.total_pages,
            total_text_blocks: self.pages.iter().map(|p| p.blocks.len()).sum(),
            total_headers: self.pages.iter().map(|p| p.headers().count()).sum(),
            total_images: self.pages.iter().map(|p| p.images.len()).sum(),
            total_tables: self.pages.iter().map(|p| p.tables.len()).sum(),
            total_footnotes: self.pages.iter().map(|p| p.footnotes().count()).sum(),
            ocr_processed_images: self.pages.iter().map(|p| p.ocr_results.len()).sum(),
            extraction_time: self.metadata.extraction_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Role, TableSource};

    fn block(page: u32, text: &str, role: Role) -> TextBlock {
        let mut b = TextBlock::new(page, vec![], text.to_string(), BBox::default());
        b.role = role;
        b
    }

    fn sample() -> DocumentModel {
        let mut p1 = PageRecord::new(1, 612.0, 792.0);
        p1.blocks = vec![
            block(1, "Intro", Role::Header { level: 1 }),
            block(1, "text", Role::Body),
            block(1, "fn1", Role::Footnote),
        ];
        p1.tables.push(Table::new(
            1,
            1,
            vec![vec!["a".into(), "b".into()]],
            BBox::default(),
            TableSource::Native,
        ));

        let mut p2 = PageRecord::new(2, 612.0, 792.0);
        p2.blocks = vec![block(2, "Methods", Role::Header { level: 2 })];

        let metadata = DocumentMetadata {
            file_name: "report.pdf".to_string(),
            total_pages: 2,
            ..Default::default()
        };
        DocumentModel::new(metadata, vec![p1, p2])
    }

    #[test]
    fn test_aggregated_headers_follow_pages() {
        let doc = sample();
        let headers: Vec<&str> = doc.headers().iter().map(|b| b.text.as_str()).collect();
        assert_eq!(headers, vec!["Intro", "Methods"]);

        let flattened: Vec<&TextBlock> = doc.pages.iter().flat_map(|p| p.headers()).collect();
        assert_eq!(doc.headers(), flattened);
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.total_pages, 2);
        assert_eq!(summary.total_text_blocks, 4);
        assert_eq!(summary.total_headers, 2);
        assert_eq!(summary.total_tables, 1);
        assert_eq!(summary.total_footnotes, 1);
        assert_eq!(summary.ocr_processed_images, 0);
    }

    #[test]
    fn test_display_title() {
        let mut metadata = DocumentMetadata {
            file_name: "annual_report.pdf".to_string(),
            ..Default::default()
        };
        assert_eq!(metadata.display_title(), "annual_report");

        metadata.title = "Annual Report 2023".to_string();
        assert_eq!(metadata.display_title(), "Annual Report 2023");
    }

    #[test]
    fn test_get_page() {
        let doc = sample();
        assert_eq!(doc.get_page(2).map(|p| p.page_number), Some(2));
        assert!(doc.get_page(3).is_none());
    }
}
