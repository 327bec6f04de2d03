//! Table detection using text position analysis (stream mode).
//!
//! Tables are found from text alignment alone, without ruling lines: spans
//! are grouped into rows, recurring left edges become column boundaries, and
//! runs of rows aligned to those boundaries become tables.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{BBox, TextSpan};

/// Width of the buckets left edges are snapped to, in points.
const EDGE_BUCKET: f32 = 5.0;
/// Distance within which a span counts as aligned to a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A table found by [`TableDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTable {
    /// Cell matrix, one entry per detected column in every row
    pub rows: Vec<Vec<String>>,
    /// Region covered by the table's spans
    pub bbox: BBox,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Row<'a> {
    spans: Vec<&'a TextSpan>,
}

/// Detects tables in a page's spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<NativeTable> {
        let c = &self.config;
        if spans.len() < c.min_rows * c.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: {} rows, column edges {:?}",
            rows.len(),
            columns
        );
        if rows.len() < c.min_rows || columns.len() < c.min_columns {
            return vec![];
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region = &rows[start..=end];
            let region_columns = self.detect_columns(region);

            if region_columns.len() < c.min_columns {
                continue;
            }
            if region_columns.len() > c.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({})",
                    region_columns.len()
                );
                continue;
            }
            if is_list_pattern(region, region_columns.len()) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            tables.push(to_native(region, &region_columns));
        }
        tables
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows<'a>(&self, spans: &'a [TextSpan]) -> Vec<Row<'a>> {
        let mut sorted: Vec<&TextSpan> = spans.iter().collect();
        sorted.sort_by(|a, b| {
            a.bbox
                .y1
                .partial_cmp(&b.bbox.y1)
                .unwrap_or(Ordering::Equal)
                .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<Row> = Vec::new();
        let mut row_y: Option<f32> = None;
        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            let same_row = row_y.is_some_and(|y| (span.bbox.y1 - y).abs() <= tolerance);
            if same_row {
                if let Some(row) = rows.last_mut() {
                    row.spans.push(span);
                    continue;
                }
            }
            row_y = Some(span.bbox.y1);
            rows.push(Row { spans: vec![span] });
        }
        rows
    }

    /// Left edges shared by enough rows, merged when closer than the column gap.
    ///
    /// Rows with two or more spans are preferred as evidence; with too few of
    /// them every span of every row counts.
    fn detect_columns(&self, rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let (evidence, per_row): (Vec<&Row>, bool) = if multi.len() >= self.config.min_rows {
            (multi, true)
        } else {
            (rows.iter().collect(), false)
        };
        if evidence.is_empty() {
            return vec![];
        }

        let mut counts: HashMap<i32, usize> = HashMap::new();
        for row in &evidence {
            let buckets = row
                .spans
                .iter()
                .map(|s| (s.bbox.x0 / EDGE_BUCKET).round() as i32);
            if per_row {
                for bucket in buckets.collect::<HashSet<_>>() {
                    *counts.entry(bucket).or_insert(0) += 1;
                }
            } else {
                for bucket in buckets {
                    *counts.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        let min_occurrences =
            ((evidence.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);
        let mut edges: Vec<f32> = counts
            .into_iter()
            .filter(|(_, n)| *n >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            if merged
                .last()
                .map_or(true, |last| edge - last >= self.config.min_column_gap)
            {
                merged.push(edge);
            }
        }
        merged
    }

    /// Runs of at least `min_rows` consecutive aligned rows, as inclusive index pairs.
    fn find_table_regions(&self, rows: &[Row], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = alignment_score(row, columns) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_rows {
                        regions.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }
        regions
    }
}

/// Share of a row's spans whose left edge sits on a column edge.
fn alignment_score(row: &Row, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.bbox.x0 - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

fn to_native(rows: &[Row], columns: &[f32]) -> NativeTable {
    let bbox = rows
        .iter()
        .flat_map(|r| r.spans.iter().map(|s| s.bbox))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();

    let cells = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row.spans {
                let col = column_for(span.bbox.x0, columns, bbox.x1);
                cells[col].push(span.text.trim());
            }
            cells.into_iter().map(|parts| parts.join(" ")).collect()
        })
        .collect();

    NativeTable { rows: cells, bbox }
}

/// Column whose span `[edge - 10, next_edge - 10)` holds `x`, else the nearest edge.
fn column_for(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Whether an aligned region is really a bulleted or numbered list.
///
/// Bullets almost never start real table rows. Numbered first columns are
/// only rejected for two-column regions, where they are most likely a list.
fn is_list_pattern(rows: &[Row], column_count: usize) -> bool {
    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        let first = row
            .spans
            .iter()
            .min_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));
        match first.map(|s| s.text.trim()) {
            Some(t) if is_bullet_marker(t) => bullets += 1,
            Some(t) if is_number_marker(t) => numbers += 1,
            _ => {}
        }
    }

    let total = rows.len() as f32;
    bullets as f32 / total >= 0.5 || (column_count == 2 && (bullets + numbers) as f32 / total >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "※" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)".
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.parse::<u32>().is_ok() {
        return true;
    }
    let mut chars = cleaned.chars();
    if !matches!(chars.next_back(), Some('.' | ')')) {
        return false;
    }
    let body = chars.as_str();
    (!body.is_empty() && body.chars().all(|c| c.is_ascii_digit()))
        || (body.chars().count() == 1 && body.chars().all(char::is_alphabetic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, top: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            font_size: 12.0,
            font: "Helvetica".to_string(),
            bold: false,
            italic: false,
            bbox: BBox::new(x, top, x + text.len() as f32 * 6.0, top + 12.0),
            color: 0,
        }
    }

    #[test]
    fn test_detect_simple_table() {
        let spans = vec![
            span("Name", 10.0, 100.0),
            span("Age", 60.0, 100.0),
            span("Alice", 10.0, 115.0),
            span("30", 60.0, 115.0),
            span("Bob", 10.0, 130.0),
            span("25", 60.0, 130.0),
        ];

        let tables = TableDetector::new().detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
                vec!["Bob".to_string(), "25".to_string()],
            ]
        );
        assert_eq!(tables[0].bbox.y0, 100.0);
        assert_eq!(tables[0].bbox.y1, 142.0);
    }

    #[test]
    fn test_no_table_single_column() {
        let spans = vec![
            span("Line 1", 10.0, 100.0),
            span("Line 2", 10.0, 115.0),
            span("Line 3", 10.0, 130.0),
            span("Line 4", 10.0, 145.0),
        ];
        assert!(TableDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let spans = vec![
            span("1.", 50.0, 100.0),
            span("Introduction", 80.0, 100.0),
            span("2.", 50.0, 130.0),
            span("Methods", 80.0, 130.0),
            span("3.", 50.0, 160.0),
            span("Results", 80.0, 160.0),
        ];
        assert!(TableDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let spans = vec![
            span("-", 50.0, 100.0),
            span("Management", 80.0, 100.0),
            span("-", 50.0, 130.0),
            span("Firmware", 80.0, 130.0),
            span("-", 50.0, 160.0),
            span("Routing", 80.0, 160.0),
        ];
        assert!(TableDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_list_markers() {
        for marker in ["1.", "12.", "1)", "1 .", "3", "a.", "B)"] {
            assert!(is_number_marker(marker), "{marker}");
        }
        for marker in ["-", "•", "*", "–"] {
            assert!(is_bullet_marker(marker), "{marker}");
        }
        for text in ["Name", "Alice", "", "ab."] {
            assert!(!is_number_marker(text) && !is_bullet_marker(text), "{text}");
        }
    }

    #[test]
    fn test_column_for() {
        let columns = [10.0, 60.0];
        assert_eq!(column_for(10.0, &columns, 100.0), 0);
        assert_eq!(column_for(62.0, &columns, 100.0), 1);
        assert_eq!(column_for(500.0, &columns, 100.0), 1);
    }
}
