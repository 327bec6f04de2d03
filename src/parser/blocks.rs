//! Page block extraction: raw text dictionary → typed text blocks.

use unicode_normalization::UnicodeNormalization;

use super::raw::{RawBlock, RawSpan, RawTextPage, FLAG_BOLD, FLAG_ITALIC};
use crate::model::{BBox, TextBlock, TextSpan};

/// Convert one page's raw text dictionary into text blocks.
///
/// Blocks keep source order. A block whose trimmed text is empty, or that has
/// no spans at all, is not emitted. Missing span metadata defaults to a font
/// size of 0 and no bold/italic flags.
pub fn extract_blocks(page: &RawTextPage, page_number: u32) -> Vec<TextBlock> {
    page.blocks
        .iter()
        .filter_map(|raw| convert_block(raw, page_number))
        .collect()
}

fn convert_block(raw: &RawBlock, page_number: u32) -> Option<TextBlock> {
    let mut spans = Vec::new();
    let mut text = String::new();

    for line in &raw.lines {
        for raw_span in &line.spans {
            let span = convert_span(raw_span, line.bbox.or(raw.bbox));
            text.push_str(&span.text);
            spans.push(span);
        }
        text.push('\n');
    }

    let text = text.trim();
    if spans.is_empty() || text.is_empty() {
        return None;
    }

    let bbox = match raw.bbox {
        Some(b) => BBox::from_array(b),
        None => spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default(),
    };

    Some(TextBlock::new(page_number, spans, text.to_string(), bbox))
}

fn convert_span(raw: &RawSpan, fallback_bbox: Option<[f32; 4]>) -> TextSpan {
    let flags = raw.flags.unwrap_or(0);
    TextSpan {
        text: raw.text.as_deref().unwrap_or("").nfc().collect(),
        font_size: raw.size.filter(|s| s.is_finite()).unwrap_or(0.0),
        font: raw.font.clone().unwrap_or_default(),
        bold: flags & FLAG_BOLD != 0,
        italic: flags & FLAG_ITALIC != 0,
        bbox: raw
            .bbox
            .or(fallback_bbox)
            .map(BBox::from_array)
            .unwrap_or_default(),
        color: raw.color.unwrap_or(0),
    }
}

/// Decide whether the unstructured page text should be kept.
///
/// Returns the unstructured text when it has more non-whitespace characters
/// than the concatenated block text, which means the structured path lost
/// content. Line breaks and spacing differ between the two paths and are not
/// counted.
pub fn raw_text_fallback(blocks: &[TextBlock], unstructured: &str) -> Option<String> {
    let block_chars: usize = blocks.iter().map(|b| visible_chars(&b.text)).sum();
    let raw = unstructured.trim();
    let raw_chars = visible_chars(raw);
    if raw_chars > block_chars {
        log::debug!(
            "Raw text fallback kept ({} chars vs {} in blocks)",
            raw_chars,
            block_chars
        );
        Some(raw.to_string())
    } else {
        None
    }
}

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
