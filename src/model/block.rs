//! Text spans, blocks and their semantic roles.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page coordinates (origin top-left, y grows down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a bounding box from its corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The whole page, used when a region has no measured bounds.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Build from a `[x0, y0, x1, y1]` array.
    pub fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Whether all coordinates are zero.
    pub fn is_empty(&self) -> bool {
        *self == BBox::default()
    }
}

/// The finest-grained text unit with uniform font, size and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Font name as reported by the PDF
    pub font: String,
    /// Bold style
    pub bold: bool,
    /// Italic style
    pub italic: bool,
    /// Span bounds
    pub bbox: BBox,
    /// sRGB color packed as 0xRRGGBB
    pub color: u32,
}

/// Semantic role of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    /// Regular body text
    #[default]
    Body,
    /// A heading, level 1-3
    Header { level: u8 },
    /// Running header in the top band of the page
    PageHeader,
    /// Running footer in the bottom band of the page
    PageFooter,
    /// Small print near the bottom of the page
    Footnote,
}

impl Role {
    /// Heading level, 0 for anything that is not a header.
    pub fn header_level(&self) -> u8 {
        match self {
            Role::Header { level } => *level,
            _ => 0,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Role::Header { .. })
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Role::Body)
    }
}

/// A spatially grouped run of text lines read from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Spans in source order
    pub spans: Vec<TextSpan>,
    /// Concatenated text, lines separated by `\n`, trimmed
    pub text: String,
    /// Block bounds
    pub bbox: BBox,
    /// Mean font size over all spans (0 if there are none)
    pub avg_font_size: f32,
    /// True if any span is bold
    pub bold: bool,
    /// True if any span is italic
    pub italic: bool,
    /// Top edge of the block, measured from the page top
    pub y_position: f32,
    /// Assigned role
    pub role: Role,
}

impl TextBlock {
    /// Create an unclassified block; aggregate metrics are derived from the spans.
    pub fn new(page_number: u32, spans: Vec<TextSpan>, text: String, bbox: BBox) -> Self {
        let avg_font_size = if spans.is_empty() {
            0.0
        } else {
            spans.iter().map(|s| s.font_size).sum::<f32>() / spans.len() as f32
        };
        let bold = spans.iter().any(|s| s.bold);
        let italic = spans.iter().any(|s| s.italic);

        Self {
            page_number,
            spans,
            text,
            bbox,
            avg_font_size,
            bold,
            italic,
            y_position: bbox.y0,
            role: Role::Body,
        }
    }

    /// Header level (0 if not a header).
    pub fn header_level(&self) -> u8 {
        self.role.header_level()
    }

    /// Text with every whitespace run collapsed to one space.
    pub fn collapsed_text(&self) -> String {
        collapse_whitespace(&self.text)
    }
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
