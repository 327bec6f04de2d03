//! Embedded images and the text recognized in them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An embedded raster image written to the extractor's scratch directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Ordinal on its page, in enumeration order (1-indexed)
    pub index: u32,
    /// File name inside the scratch directory
    pub file_name: String,
    /// Full path of the PNG file; valid until the extractor is cleaned up
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageRecord {
    /// Scratch file name for an image, e.g. `page_2_image_1.png`.
    pub fn file_name_for(page_number: u32, index: u32) -> String {
        format!("page_{}_image_{}.png", page_number, index)
    }
}

/// Text recognized in one [`ImageRecord`], referenced by `(page_number, image_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOcrResult {
    pub page_number: u32,
    pub image_index: u32,
    pub file_name: String,
    /// Recognized text, trimmed and never blank
    pub extracted_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_for() {
        assert_eq!(ImageRecord::file_name_for(2, 1), "page_2_image_1.png");
    }
}
