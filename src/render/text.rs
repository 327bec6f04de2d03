//! Formatted plain-text rendering.

use crate::model::DocumentModel;

/// Render a document as structured plain text.
///
/// The output lists document headers, then each page's headers, content
/// blocks, table rows and footnotes, and ends with an extraction summary.
pub fn to_text(doc: &DocumentModel) -> String {
    let mut out: Vec<String> = Vec::new();
    let meta = &doc.metadata;

    out.push(format!("=== PDF Document: {} ===", meta.file_name));
    out.push(format!("Total Pages: {}", meta.total_pages));
    out.push(format!("Extraction Time: {}", meta.extraction_timestamp));
    out.push(String::new());

    let headers = doc.headers();
    if !headers.is_empty() {
        out.push("=== HEADERS AND TITLES ===".to_string());
        for header in &headers {
            out.push(format!("Page {}: {}", header.page_number, header.collapsed_text()));
        }
        out.push(String::new());
    }

    for page in &doc.pages {
        out.push(format!("=== PAGE {} ===", page.page_number));

        let page_headers: Vec<_> = page.headers().collect();
        if !page_headers.is_empty() {
            out.push("Headers:".to_string());
            for header in page_headers {
                out.push(format!("  - {}", header.collapsed_text()));
            }
            out.push(String::new());
        }

        if !page.blocks.is_empty() {
            out.push("Content:".to_string());
            for block in &page.blocks {
                out.push(format!("  {}", block.collapsed_text()));
            }
            out.push(String::new());
        }

        if !page.tables.is_empty() {
            out.push("Tables:".to_string());
            for row in page.tables.iter().flat_map(|t| &t.rows) {
                out.push(format!("  | {} |", row.join(" | ")));
            }
            out.push(String::new());
        }

        let footnotes: Vec<_> = page.footnotes().collect();
        if !footnotes.is_empty() {
            out.push("Footnotes:".to_string());
            for note in footnotes {
                out.push(format!("  - {}", note.collapsed_text()));
            }
            out.push(String::new());
        }

        if !page.ocr_results.is_empty() {
            out.push("Image Text:".to_string());
            for ocr in &page.ocr_results {
                out.push(format!("  [{}] {}", ocr.file_name, ocr.extracted_text.trim()));
            }
            out.push(String::new());
        }

        out.push(String::new());
    }

    let summary = doc.summary();
    out.push("=== EXTRACTION SUMMARY ===".to_string());
    out.push(format!("Total Headers Found: {}", summary.total_headers));
    out.push(format!("Total Tables Found: {}", summary.total_tables));
    out.push(format!("Total Footnotes Found: {}", summary.total_footnotes));
    out.push(format!("Total Text Blocks: {}", summary.total_text_blocks));
    out.push(format!("Total Images: {}", summary.total_images));
    out.push(format!("OCR Processed Images: {}", summary.ocr_processed_images));
    out.push(format!(
        "Total Characters: {}",
        doc.plain_text().chars().count()
    ));

    out.join("\n")
}
