//! Loosely-typed page text dictionary.
//!
//! This is the blocks → lines → spans shape a PDF backend reports for one
//! page. Every field is optional; [`extract_blocks`](super::extract_blocks)
//! is the only consumer and turns it into typed [`TextBlock`](crate::model::TextBlock)s.

use serde::{Deserialize, Serialize};

/// Span flag bit for italic text.
pub const FLAG_ITALIC: u32 = 1 << 1;
/// Span flag bit for bold text.
pub const FLAG_BOLD: u32 = 1 << 4;

/// One page's text dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTextPage {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub blocks: Vec<RawBlock>,
}

/// A block; image blocks carry no lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBlock {
    pub bbox: Option<[f32; 4]>,
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLine {
    pub bbox: Option<[f32; 4]>,
    pub spans: Vec<RawSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSpan {
    pub text: Option<String>,
    pub size: Option<f32>,
    pub flags: Option<u32>,
    pub font: Option<String>,
    pub bbox: Option<[f32; 4]>,
    pub color: Option<u32>,
}

impl RawSpan {
    /// Flags word for a bold/italic combination.
    pub fn flags_for(bold: bool, italic: bool) -> u32 {
        let mut flags = 0;
        if bold {
            flags |= FLAG_BOLD;
        }
        if italic {
            flags |= FLAG_ITALIC;
        }
        flags
    }
}
