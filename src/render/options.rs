//! Rendering options and configuration.

use serde::{Deserialize, Serialize};

/// Options for rendering a [`DocumentModel`](crate::model::DocumentModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Emit the "Document Information" section
    pub include_metadata: bool,

    /// Body paragraphs must be longer than this many characters to render
    pub min_paragraph_chars: usize,

    /// Page headers and footers must be longer than this many characters
    pub min_marginal_chars: usize,

    /// Deepest Markdown heading emitted for header blocks (1-6)
    pub max_heading_depth: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            min_paragraph_chars: 0,
            min_marginal_chars: 5,
            max_heading_depth: 5,
        }
    }
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the metadata section.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Skip body paragraphs of `chars` characters or fewer.
    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    /// Skip page headers and footers of `chars` characters or fewer.
    pub fn with_min_marginal_chars(mut self, chars: usize) -> Self {
        self.min_marginal_chars = chars;
        self
    }

    /// Set the deepest heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_depth = level.clamp(1, 6);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert!(options.include_metadata);
        assert_eq!(options.min_paragraph_chars, 0);
        assert_eq!(options.min_marginal_chars, 5);
        assert_eq!(options.max_heading_depth, 5);
    }

    #[test]
    fn test_max_heading_clamped() {
        assert_eq!(RenderOptions::new().with_max_heading(0).max_heading_depth, 1);
        assert_eq!(RenderOptions::new().with_max_heading(9).max_heading_depth, 6);
    }
}
