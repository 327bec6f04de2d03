//! Markdown rendering for extracted documents.

use crate::model::{collapse_whitespace, DocumentMetadata, DocumentModel, PageRecord, TextBlock};

use super::RenderOptions;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &DocumentModel, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Markdown renderer.
///
/// Rendering is a single pass over the document and is deterministic: the
/// same document always yields the same bytes.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &DocumentModel) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("# {}", doc.metadata.display_title()));
        lines.push(String::new());

        if self.options.include_metadata {
            self.render_metadata(&mut lines, &doc.metadata);
        }

        for page in &doc.pages {
            self.render_page(&mut lines, page);
        }

        collapse_blank_lines(&lines)
    }

    fn render_metadata(&self, lines: &mut Vec<String>, meta: &DocumentMetadata) {
        lines.push("## Document Information".to_string());
        lines.push(String::new());
        lines.push(format!("- **File:** {}", meta.file_name));
        lines.push(format!("- **Pages:** {}", meta.total_pages));
        lines.push(format!(
            "- **File Size:** {} bytes",
            thousands(meta.file_size)
        ));

        let optional = [
            ("Author", &meta.author),
            ("Creator", &meta.creator),
            ("Producer", &meta.producer),
            ("Created", &meta.creation_date),
            ("Modified", &meta.modification_date),
            ("Subject", &meta.subject),
            ("Keywords", &meta.keywords),
        ];
        for (label, value) in optional {
            if !value.trim().is_empty() {
                lines.push(format!("- **{}:** {}", label, value.trim()));
            }
        }

        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    fn render_page(&self, lines: &mut Vec<String>, page: &PageRecord) {
        if page.has_content() {
            lines.push(format!("## Page {}", page.page_number));
            lines.push(String::new());
        }

        for header in page.headers() {
            let text = header.collapsed_text();
            if text.is_empty() {
                continue;
            }
            lines.push(format!("{} {}", "#".repeat(self.heading_depth(header)), text));
            lines.push(String::new());
        }

        for block in page.body() {
            let text = block.collapsed_text();
            if text.is_empty() || text.chars().count() <= self.options.min_paragraph_chars {
                continue;
            }
            lines.push(text);
            lines.push(String::new());
        }

        if let Some(raw) = &page.raw_text {
            let text = collapse_whitespace(raw);
            if !text.is_empty() {
                lines.push(text);
                lines.push(String::new());
            }
        }

        for table in &page.tables {
            if table.markdown.trim().is_empty() {
                continue;
            }
            lines.push(format!("### Table {}", table.index));
            lines.push(String::new());
            lines.push(table.markdown.trim_end().to_string());
            lines.push(String::new());
        }

        for ocr in &page.ocr_results {
            let text = ocr.extracted_text.trim();
            if text.is_empty() {
                continue;
            }
            lines.push(format!("### [Figure {}: Extracted Text]", ocr.image_index));
            lines.push(String::new());
            lines.push(text.to_string());
            lines.push(String::new());
        }

        let footnotes: Vec<String> = page
            .footnotes()
            .map(TextBlock::collapsed_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !footnotes.is_empty() {
            lines.push("### Footnotes".to_string());
            lines.push(String::new());
            lines.extend(footnotes.into_iter().map(|t| format!("- {}", t)));
            lines.push(String::new());
        }

        self.render_marginals(lines, "Page Header", page.page_headers());
        self.render_marginals(lines, "Page Footer", page.page_footers());
    }

    fn render_marginals<'a>(
        &self,
        lines: &mut Vec<String>,
        title: &str,
        blocks: impl Iterator<Item = &'a TextBlock>,
    ) {
        let useful: Vec<String> = blocks
            .filter(|b| b.text.trim().chars().count() > self.options.min_marginal_chars)
            .map(TextBlock::collapsed_text)
            .collect();
        if useful.is_empty() {
            return;
        }
        lines.push(format!("### {}", title));
        lines.push(String::new());
        lines.extend(useful);
        lines.push(String::new());
    }

    /// Page headings are H2, so header level 1 lands on H3.
    fn heading_depth(&self, block: &TextBlock) -> usize {
        let level = block.header_level().clamp(1, 3) + 2;
        level.min(self.options.max_heading_depth) as usize
    }
}

/// Join lines, keeping at most one blank line in a row.
fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push(if blank { "" } else { line.as_str() });
        prev_blank = blank;
    }
    out.join("\n")
}

/// Format a number with comma thousands separators.
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
