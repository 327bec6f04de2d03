//! Reconstructed tables.

use super::BBox;
use serde::{Deserialize, Serialize};

/// Which detection path produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    /// The document's native table detector
    Native,
    /// Whitespace-aligned text lines (fallback path)
    TextAlignment,
}

/// A table found on a page, stored as a row-major cell matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Ordinal on its page (1-indexed)
    pub index: u32,
    /// Cell matrix; the first row is treated as the header row
    pub rows: Vec<Vec<String>>,
    /// Source region; the full page for fallback tables
    pub bbox: BBox,
    /// Detection path
    pub source: TableSource,
    /// Pre-rendered Markdown table
    pub markdown: String,
}

impl Table {
    /// Create a table and render its Markdown form.
    pub fn new(
        page_number: u32,
        index: u32,
        rows: Vec<Vec<String>>,
        bbox: BBox,
        source: TableSource,
    ) -> Self {
        let markdown = markdown_table(&rows);
        Self {
            page_number,
            index,
            rows,
            bbox,
            source,
            markdown,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, based on the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tab-separated plain text.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render a cell matrix as a Markdown table.
///
/// The first row becomes the header, followed by a `---` separator per header
/// column. Newlines inside cells are flattened to spaces so a cell never
/// breaks its row.
pub fn markdown_table(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(markdown_row(header));
    lines.push(format!(
        "| {} |",
        header.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));
    for row in body {
        lines.push(markdown_row(row));
    }
    lines.join("\n")
}

fn markdown_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| c.replace('\n', " ")).collect();
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_markdown_table_two_by_two() {
        let md = markdown_table(&rows(&[&["A", "B"], &["1", "2"]]));
        assert_eq!(md, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_markdown_table_empty() {
        assert_eq!(markdown_table(&[]), "");
    }

    #[test]
    fn test_markdown_table_header_only_and_multiline_cell() {
        let md = markdown_table(&rows(&[&["Name", "Note\nmore"]]));
        assert_eq!(md, "| Name | Note more |\n| --- | --- |");
    }

    #[test]
    fn test_table_new_renders_markdown() {
        let table = Table::new(
            3,
            1,
            rows(&[&["x", "y", "z"], &["1", "", "3"]]),
            BBox::page(612.0, 792.0),
            TableSource::TextAlignment,
        );
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 2);
        assert!(table.markdown.ends_with("| 1 |  | 3 |"));
        assert_eq!(table.plain_text(), "x\ty\tz\n1\t\t3");
    }
}
