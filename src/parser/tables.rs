//! Table reconstruction: native detection with a text-alignment fallback.

use std::sync::OnceLock;

use regex::Regex;

use super::raw::RawTextPage;
use super::source::PdfSource;
use crate::model::{BBox, Table, TableSource};

/// Cell separator for fallback rows: two or more whitespace characters, or a tab.
fn cell_separator() -> &'static Regex {
    static SEP: OnceLock<Regex> = OnceLock::new();
    SEP.get_or_init(|| Regex::new(r"\s{2,}|\t").expect("valid regex"))
}

/// Builds the tables of one page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReconstructor;

impl TableReconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the tables of a page.
    ///
    /// The native detector runs first. Only when it fails does the
    /// whitespace-alignment fallback run over `text`; a native result with
    /// zero tables is final. Tables without rows are dropped and indexes are
    /// 1-based in emission order.
    pub fn reconstruct(
        &self,
        source: &dyn PdfSource,
        page_number: u32,
        text: &RawTextPage,
        page_size: (f32, f32),
    ) -> Vec<Table> {
        match source.find_tables(page_number) {
            Ok(found) => found
                .into_iter()
                .map(|t| (t.rows, t.bbox))
                .filter(|(rows, _)| !rows.is_empty())
                .enumerate()
                .map(|(i, (rows, bbox))| {
                    Table::new(page_number, i as u32 + 1, rows, bbox, TableSource::Native)
                })
                .collect(),
            Err(e) => {
                log::debug!(
                    "Native table detection failed on page {}: {}; using text alignment",
                    page_number,
                    e
                );
                let rows = fallback_rows(line_texts(text));
                if rows.len() < 2 {
                    return vec![];
                }
                vec![Table::new(
                    page_number,
                    1,
                    rows,
                    BBox::page(page_size.0, page_size.1),
                    TableSource::TextAlignment,
                )]
            }
        }
    }
}

/// Text of every line in the page dictionary, in source order.
pub fn line_texts(page: &RawTextPage) -> Vec<String> {
    page.blocks
        .iter()
        .flat_map(|b| &b.lines)
        .map(|line| {
            line.spans
                .iter()
                .filter_map(|s| s.text.as_deref())
                .collect::<String>()
        })
        .collect()
}

/// Candidate table rows among text lines.
///
/// A line is split on runs of 2+ whitespace characters or tabs; it becomes a
/// row when that yields at least two non-empty cells.
pub fn fallback_rows<I, S>(lines: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sep = cell_separator();
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if !sep.is_match(line) {
                return None;
            }
            let cells: Vec<String> = sep
                .split(line)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            (cells.len() >= 2).then_some(cells)
        })
        .collect()
}
