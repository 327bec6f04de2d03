//! Layout analysis for PDF pages.
//!
//! Walks a page's content stream, tracking the text matrix, and produces
//! positioned spans. Spans are grouped into lines by baseline and lines into
//! blocks by spacing, size and indentation, giving the page text dictionary
//! consumed by [`extract_blocks`](super::extract_blocks).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::raw::{RawBlock, RawLine, RawSpan, RawTextPage};
use crate::error::{Error, Result};
use crate::model::{BBox, TextSpan};

/// Ascender share of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Descender share of the font size below the baseline.
const DESCENT: f32 = 0.2;
/// Glyph advance estimate as a share of the font size.
const CHAR_WIDTH: f32 = 0.5;
/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Content-stream walker for one document.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new layout analyzer.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract positioned spans from a page.
    ///
    /// `page_top` is the top edge of the page in PDF user space; span boxes
    /// are returned with a top-left origin.
    pub fn page_spans(&self, page_id: ObjectId, page_top: f32) -> Result<Vec<TextSpan>> {
        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::TextExtract(e.to_string()))?;
        let content = self.page_content(page_id)?;
        self.walk_content(&content, &fonts, page_top)
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page = self.doc.get_dictionary(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(c) => c,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        let refs: Vec<&Object> = match contents {
            Object::Array(arr) => arr.iter().collect(),
            other => vec![other],
        };

        let mut content = Vec::new();
        for obj in refs {
            let stream = match self.doc.dereference(obj) {
                Ok((_, Object::Stream(s))) => s,
                _ => continue,
            };
            match stream.decompressed_content() {
                Ok(data) => content.extend_from_slice(&data),
                Err(_) => content.extend_from_slice(&stream.content),
            }
            content.push(b'\n');
        }
        Ok(content)
    }

    fn walk_content(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        page_top: f32,
    ) -> Result<Vec<TextSpan>> {
        let content = lopdf::content::Content::decode(content)
            .map_err(|e| Error::TextExtract(e.to_string()))?;

        let mut state = TextState::default();
        let mut spans = Vec::new();

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => {
                    state.in_text = true;
                    state.matrix = TextMatrix::default();
                }
                "ET" => state.in_text = false,
                "Tf" if operands.len() >= 2 => {
                    if let Object::Name(name) = &operands[0] {
                        state.font_key = name.clone();
                        state.font_name = fonts
                            .get(name)
                            .and_then(|f| f.get(b"BaseFont").ok())
                            .and_then(|o| o.as_name().ok())
                            .map(|n| String::from_utf8_lossy(n).to_string())
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                    }
                    state.font_size = number(&operands[1]).unwrap_or(12.0);
                }
                "TL" => state.leading = operands.first().and_then(number).unwrap_or(0.0),
                "Td" | "TD" if operands.len() >= 2 => {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.matrix.translate(tx, ty);
                }
                "Tm" if operands.len() >= 6 => {
                    let v: Vec<f32> = operands.iter().take(6).map(|o| number(o).unwrap_or(0.0)).collect();
                    state.matrix.set([v[0], v[1], v[2], v[3], v[4], v[5]]);
                }
                "T*" => state.next_line(),
                "rg" if operands.len() >= 3 => {
                    state.color = pack_rgb(
                        number(&operands[0]).unwrap_or(0.0),
                        number(&operands[1]).unwrap_or(0.0),
                        number(&operands[2]).unwrap_or(0.0),
                    );
                }
                "g" => {
                    let gray = operands.first().and_then(number).unwrap_or(0.0);
                    state.color = pack_rgb(gray, gray, gray);
                }
                "Tj" | "'" | "\"" | "TJ" if state.in_text => {
                    if op.operator != "Tj" && op.operator != "TJ" {
                        state.next_line();
                    }
                    let text_index = if op.operator == "\"" { 2 } else { 0 };
                    let text = match operands.get(text_index) {
                        Some(Object::Array(items)) => self.decode_array(fonts, &state, items),
                        Some(Object::String(bytes, _)) => self.decode(fonts, &state, bytes),
                        _ => String::new(),
                    };
                    if let Some(span) = state.show(text, page_top) {
                        spans.push(span);
                    }
                }
                _ => {}
            }
        }

        Ok(spans)
    }

    fn decode(&self, fonts: &BTreeMap<Vec<u8>, &Dictionary>, state: &TextState, bytes: &[u8]) -> String {
        fonts
            .get(&state.font_key)
            .and_then(|f| f.get_font_encoding(self.doc).ok())
            .and_then(|enc| LopdfDocument::decode_text(&enc, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    }

    /// Decode a TJ array; large negative adjustments become word spaces.
    fn decode_array(
        &self,
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        state: &TextState,
        items: &[Object],
    ) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(fonts, state, bytes)),
                other => {
                    let Some(adjustment) = number(other) else { continue };
                    let wants_space = -adjustment > TJ_SPACE_THRESHOLD
                        && combined
                            .chars()
                            .last()
                            .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                    if wants_space {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }
}

/// Graphics state relevant to text placement.
#[derive(Debug, Clone)]
struct TextState {
    in_text: bool,
    matrix: TextMatrix,
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    color: u32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            in_text: false,
            matrix: TextMatrix::default(),
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            color: 0,
        }
    }
}

impl TextState {
    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.matrix.translate(0.0, -leading);
    }

    /// Place shown text at the current position and advance past it.
    fn show(&mut self, text: String, page_top: f32) -> Option<TextSpan> {
        let char_count = text.chars().count() as f32;
        let advance = char_count * self.font_size * CHAR_WIDTH;
        let (x, y) = self.matrix.position();
        let scale = self.matrix.scale();
        self.matrix.advance(advance);

        if text.trim().is_empty() {
            return None;
        }

        let size = self.font_size * scale;
        let lower = self.font_name.to_lowercase();
        Some(TextSpan {
            text,
            font_size: size,
            bold: ["bold", "black", "heavy", "semibold"].iter().any(|k| lower.contains(k)),
            italic: lower.contains("italic") || lower.contains("oblique"),
            font: self.font_name.clone(),
            bbox: BBox::new(
                x,
                page_top - (y + size * ASCENT),
                x + advance * scale,
                page_top - (y - size * DESCENT),
            ),
            color: self.color,
        })
    }
}

/// Text matrix for tracking position in the content stream.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    m: [f32; 6],
    /// Start of the current line (`Td` moves relative to this)
    line: [f32; 6],
}

impl Default for TextMatrix {
    fn default() -> Self {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        Self {
            m: identity,
            line: identity,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        self.m = m;
        self.line = m;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let l = &mut self.line;
        l[4] += tx * l[0] + ty * l[2];
        l[5] += tx * l[1] + ty * l[3];
        self.m = *l;
    }

    /// Move along the baseline after showing text (unscaled units).
    fn advance(&mut self, tx: f32) {
        self.m[4] += tx * self.m[0];
        self.m[5] += tx * self.m[1];
    }

    fn position(&self) -> (f32, f32) {
        (self.m[4], self.m[5])
    }

    fn scale(&self) -> f32 {
        let s = (self.m[2] * self.m[2] + self.m[3] * self.m[3]).sqrt();
        if s > 0.0 {
            s
        } else {
            1.0
        }
    }
}

/// Group positioned spans into the page text dictionary.
///
/// Spans on the same baseline (within 30% of the font size) form a line;
/// consecutive lines form a block until the vertical gap, font size or left
/// margin changes noticeably.
pub fn build_text_page(spans: &[TextSpan], width: f32, height: f32) -> RawTextPage {
    let lines = group_spans_into_lines(spans.to_vec());
    let blocks = group_lines_into_blocks(lines)
        .into_iter()
        .map(|lines| to_raw_block(&lines))
        .collect();

    RawTextPage {
        width: Some(width),
        height: Some(height),
        blocks,
    }
}

#[derive(Debug, Clone)]
struct Line {
    spans: Vec<TextSpan>,
    baseline: f32,
    x: f32,
    font_size: f32,
}

impl Line {
    fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));
        let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);
        let baseline = spans.first().map(baseline).unwrap_or(0.0);
        let x = spans.first().map(|s| s.bbox.x0).unwrap_or(0.0);
        Self {
            spans,
            baseline,
            x,
            font_size,
        }
    }

    fn bbox(&self) -> BBox {
        self.spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

fn baseline(span: &TextSpan) -> f32 {
    span.bbox.y1 - span.font_size * DESCENT
}

fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<Line> {
    // Top to bottom, then left to right
    spans.sort_by(|a, b| {
        baseline(a)
            .partial_cmp(&baseline(b))
            .unwrap_or(Ordering::Equal)
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y = baseline(&span);
        match current_y {
            Some(line_y) if (y - line_y).abs() <= span.font_size * 0.3 => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(Line::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from_spans(current));
    }
    lines
}

fn group_lines_into_blocks(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let avg_spacing = average_line_spacing(&lines);
    let mut blocks: Vec<Vec<Line>> = Vec::new();

    for line in lines {
        let starts_block = match blocks.last().and_then(|b| b.last()) {
            None => true,
            Some(prev) => {
                (line.baseline - prev.baseline).abs() > avg_spacing * 1.5
                    || (line.font_size - prev.font_size).abs() > 1.0
                    || (line.x - prev.x).abs() > 20.0
            }
        };
        if starts_block {
            blocks.push(vec![line]);
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
}

fn average_line_spacing(lines: &[Line]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[1].baseline - w[0].baseline).abs())
        .filter(|s| *s > 0.1)
        .collect();
    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn to_raw_block(lines: &[Line]) -> RawBlock {
    let raw_lines: Vec<RawLine> = lines
        .iter()
        .map(|line| {
            let mut spans = Vec::with_capacity(line.spans.len());
            let mut prev: Option<&TextSpan> = None;
            for span in &line.spans {
                let mut text = span.text.clone();
                if prev.is_some_and(|p| needs_space(p, span)) {
                    text.insert(0, ' ');
                }
                spans.push(RawSpan {
                    text: Some(text),
                    size: Some(span.font_size),
                    flags: Some(RawSpan::flags_for(span.bold, span.italic)),
                    font: Some(span.font.clone()),
                    bbox: Some(bbox_array(&span.bbox)),
                    color: Some(span.color),
                });
                prev = Some(span);
            }
            RawLine {
                bbox: Some(bbox_array(&line.bbox())),
                spans,
            }
        })
        .collect();

    let bbox = lines
        .iter()
        .map(Line::bbox)
        .reduce(|a, b| a.union(&b))
        .map(|b| bbox_array(&b));

    RawBlock {
        bbox,
        lines: raw_lines,
    }
}

/// Whether a word space separates two spans on one line.
///
/// CJK text never gets an inserted space.
fn needs_space(prev: &TextSpan, curr: &TextSpan) -> bool {
    let gap = curr.bbox.x0 - prev.bbox.x1;
    let threshold = curr.font_size * CHAR_WIDTH * 0.2;
    if gap <= threshold {
        return false;
    }
    if prev.text.ends_with(char::is_whitespace) || curr.text.starts_with(char::is_whitespace) {
        return false;
    }
    let both_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char)
        && curr.text.chars().next().is_some_and(is_spaceless_script_char);
    !both_cjk
}

fn bbox_array(b: &BBox) -> [f32; 4] {
    [b.x0, b.y0, b.x1, b.y1]
}

fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (c(r) << 16) | (c(g) << 8) | c(b)
}

/// Helper to extract a number from a PDF object.
fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words (Chinese, Japanese).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F     // CJK symbols and punctuation
        | 0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF   // Katakana
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xFF00..=0xFFEF   // Half/full-width forms
        | 0x20000..=0x2EBEF // CJK extensions B-F
    )
}

/// Decoding fallback when the font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, top: f32, size: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            font_size: size,
            font: "Helvetica".to_string(),
            bold: false,
            italic: false,
            bbox: BBox::new(
                x,
                top,
                x + text.chars().count() as f32 * size * CHAR_WIDTH,
                top + size,
            ),
            color: 0,
        }
    }

    #[test]
    fn test_spans_on_same_baseline_form_one_line() {
        let spans = vec![
            span("world", 100.0, 100.0, 12.0),
            span("Hello", 50.0, 100.5, 12.0),
        ];
        let page = build_text_page(&spans, 612.0, 792.0);
        assert_eq!(page.blocks.len(), 1);
        let line = &page.blocks[0].lines[0];
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].text.as_deref(), Some("Hello"));
        assert_eq!(line.spans[1].text.as_deref(), Some(" world"));
    }

    #[test]
    fn test_gap_and_size_change_split_blocks() {
        let spans = vec![
            span("Title", 50.0, 50.0, 20.0),
            span("Body line one", 50.0, 100.0, 10.0),
            span("Body line two", 50.0, 112.0, 10.0),
            span("Far below", 50.0, 400.0, 10.0),
        ];
        let page = build_text_page(&spans, 612.0, 792.0);
        let texts: Vec<usize> = page.blocks.iter().map(|b| b.lines.len()).collect();
        assert_eq!(texts, vec![1, 2, 1]);
    }

    #[test]
    fn test_cjk_spans_not_spaced() {
        let a = span("日本", 50.0, 100.0, 12.0);
        let mut b = span("語", 0.0, 100.0, 12.0);
        b.bbox.x0 = a.bbox.x1 + 5.0;
        b.bbox.x1 = b.bbox.x0 + 6.0;
        assert!(!needs_space(&a, &b));

        let c = span("end", 50.0, 100.0, 12.0);
        let mut d = span("next", 0.0, 100.0, 12.0);
        d.bbox.x0 = c.bbox.x1 + 5.0;
        assert!(needs_space(&c, &d));
    }

    #[test]
    fn test_text_matrix_translate_and_advance() {
        let mut m = TextMatrix::default();
        m.translate(72.0, 700.0);
        m.advance(30.0);
        assert_eq!(m.position(), (102.0, 700.0));
        // Td is relative to the line start, not the advanced position
        m.translate(0.0, -14.0);
        assert_eq!(m.position(), (72.0, 686.0));
    }

    #[test]
    fn test_show_flips_y_and_detects_style() {
        let mut state = TextState {
            font_name: "Arial-BoldItalic".to_string(),
            font_size: 10.0,
            ..Default::default()
        };
        state.matrix.set([1.0, 0.0, 0.0, 1.0, 72.0, 692.0]);
        let span = state.show("Hi".to_string(), 792.0).unwrap();
        assert!(span.bold);
        assert!(span.italic);
        assert_eq!(span.bbox.y0, 92.0);
        assert_eq!(span.bbox.y1, 102.0);
        assert_eq!(span.bbox.x1, 82.0);
        assert!(state.show("   ".to_string(), 792.0).is_none());
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"abc"), "abc");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41]), "A");
        assert_eq!(decode_text_simple(&[0xE9]), "\u{e9}");
    }

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(1.0, 0.0, 0.0), 0xFF0000);
        assert_eq!(pack_rgb(0.0, 0.0, 0.0), 0);
    }
}
