//! Page-level types.

use super::{ImageOcrResult, ImageRecord, Role, Table, TextBlock};
use serde::{Deserialize, Serialize};

/// Everything extracted from a single page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Classified text blocks in source order
    pub blocks: Vec<TextBlock>,

    /// Tables in detection order
    pub tables: Vec<Table>,

    /// Embedded images in enumeration order
    pub images: Vec<ImageRecord>,

    /// OCR results, a subset of `images` in the same order
    pub ocr_results: Vec<ImageOcrResult>,

    /// Unstructured page text, kept only when it is longer than the
    /// concatenated block text
    pub raw_text: Option<String>,
}

impl PageRecord {
    /// Create an empty page with the given dimensions.
    pub fn new(page_number: u32, width: f32, height: f32) -> Self {
        Self {
            page_number,
            width,
            height,
            ..Default::default()
        }
    }

    fn with_role<'a>(
        &'a self,
        pred: impl Fn(&Role) -> bool + 'a,
    ) -> impl Iterator<Item = &'a TextBlock> + 'a {
        self.blocks.iter().filter(move |b| pred(&b.role))
    }

    /// Header blocks in source order.
    pub fn headers(&self) -> impl Iterator<Item = &TextBlock> {
        self.with_role(Role::is_header)
    }

    /// Body text blocks.
    pub fn body(&self) -> impl Iterator<Item = &TextBlock> {
        self.with_role(Role::is_body)
    }

    pub fn footnotes(&self) -> impl Iterator<Item = &TextBlock> {
        self.with_role(|r| *r == Role::Footnote)
    }

    pub fn page_headers(&self) -> impl Iterator<Item = &TextBlock> {
        self.with_role(|r| *r == Role::PageHeader)
    }

    pub fn page_footers(&self) -> impl Iterator<Item = &TextBlock> {
        self.with_role(|r| *r == Role::PageFooter)
    }

    /// Block texts joined by newlines.
    pub fn block_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Best available plain text: the raw fallback if one was kept,
    /// otherwise the block text.
    pub fn plain_text(&self) -> String {
        match &self.raw_text {
            Some(raw) => raw.clone(),
            None => self.block_text(),
        }
    }

    /// Whether the page has any header, body text, table, OCR result or
    /// kept raw text.
    ///
    /// Pages holding only running headers, footers or footnotes are not
    /// considered to have content.
    pub fn has_content(&self) -> bool {
        self.headers().next().is_some()
            || self.body().next().is_some()
            || !self.tables.is_empty()
            || !self.ocr_results.is_empty()
            || self.raw_text.is_some()
    }
}
