//! Block classification by font metrics and position on the page.

use serde::{Deserialize, Serialize};

use crate::model::{Role, TextBlock};

/// Thresholds used by [`BlockClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Font size at or above which a block is a level-1 header
    pub h1_size: f32,
    /// Font size at or above which a header is level 2
    pub h2_size: f32,
    /// Minimum font size of any header; below `h1_size` it must also be bold
    pub h3_size: f32,
    /// Blocks above this fraction of the page height are running headers
    pub page_header_ratio: f32,
    /// Blocks below this fraction of the page height are running footers
    pub footer_ratio: f32,
    /// Blocks below this fraction may be footnotes
    pub footnote_ratio: f32,
    /// Footnotes are smaller than this font size
    pub footnote_max_size: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            h1_size: 16.0,
            h2_size: 14.0,
            h3_size: 12.0,
            page_header_ratio: 0.1,
            footer_ratio: 0.9,
            footnote_ratio: 0.8,
            footnote_max_size: 10.0,
        }
    }
}

/// Outcome of every role test for one block, computed independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Predicates {
    /// Header level if the block is a header
    pub header: Option<u8>,
    pub footer: bool,
    pub page_header: bool,
    pub footnote: bool,
}

type RoleRule = fn(&Predicates) -> Option<Role>;

/// Role precedence, highest first. The first rule that matches decides.
const PRECEDENCE: [RoleRule; 4] = [
    |p| p.header.map(|level| Role::Header { level }),
    |p| p.footer.then_some(Role::PageFooter),
    |p| p.page_header.then_some(Role::PageHeader),
    |p| p.footnote.then_some(Role::Footnote),
];

impl Predicates {
    /// Resolve the predicates to exactly one role.
    pub fn role(&self) -> Role {
        PRECEDENCE
            .iter()
            .find_map(|rule| rule(self))
            .unwrap_or(Role::Body)
    }
}

/// Assigns a [`Role`] to text blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockClassifier {
    config: ClassifierConfig,
}

impl BlockClassifier {
    /// Create a classifier with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Evaluate every role test for a block.
    ///
    /// A non-positive page height disables the positional tests.
    pub fn predicates(&self, block: &TextBlock, page_height: f32) -> Predicates {
        let c = &self.config;
        let size = block.avg_font_size;
        let y = block.y_position;

        let header = (size >= c.h3_size && (block.bold || size >= c.h1_size)).then(|| {
            if size >= c.h1_size {
                1
            } else if size >= c.h2_size {
                2
            } else {
                3
            }
        });

        if page_height.is_nan() || page_height <= 0.0 {
            return Predicates {
                header,
                ..Default::default()
            };
        }

        Predicates {
            header,
            footer: y > c.footer_ratio * page_height,
            page_header: y < c.page_header_ratio * page_height,
            footnote: y > c.footnote_ratio * page_height && size < c.footnote_max_size,
        }
    }

    /// Role for a block on a page of the given height.
    pub fn classify(&self, block: &TextBlock, page_height: f32) -> Role {
        self.predicates(block, page_height).role()
    }

    /// Classify every block in place.
    pub fn apply(&self, blocks: &mut [TextBlock], page_height: f32) {
        for block in blocks.iter_mut() {
            block.role = self.classify(block, page_height);
            log::debug!(
                "Page {} block at y={:.1} size={:.1} -> {:?}",
                block.page_number,
                block.y_position,
                block.avg_font_size,
                block.role
            );
        }
    }
}
