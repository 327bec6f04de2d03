//! PDF parsing: page text dictionaries, block extraction, classification
//! and table reconstruction.

mod blocks;
mod classify;
mod layout;
mod options;
pub mod raw;
mod source;
mod table_detector;
mod tables;

pub use blocks::{extract_blocks, raw_text_fallback};
pub use classify::{BlockClassifier, ClassifierConfig, Predicates};
pub use layout::{build_text_page, LayoutAnalyzer};
pub use options::{ErrorMode, ExtractMode, ExtractOptions, DEFAULT_OCR_LANGUAGE};
pub use raw::RawTextPage;
pub use source::{ImageRef, LopdfSource, PdfSource, Pixmap};
pub use table_detector::{NativeTable, TableDetector, TableDetectorConfig};
pub use tables::{fallback_rows, line_texts, TableReconstructor};
