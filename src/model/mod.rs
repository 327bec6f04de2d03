//! Document model types for extracted PDF knowledge.
//!
//! The model is built once per input file and is read-only afterwards.
//! Renderers and downstream consumers only ever see these types.

mod block;
mod document;
mod image;
mod page;
mod table;

pub use block::{collapse_whitespace, BBox, Role, TextBlock, TextSpan};
pub use document::{DocumentMetadata, DocumentModel, ExtractionSummary};
pub use image::{ImageOcrResult, ImageRecord};
pub use page::PageRecord;
pub use table::{markdown_table, Table, TableSource};
