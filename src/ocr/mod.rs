//! Embedded image extraction and OCR.

mod associator;
mod engine;
mod scratch;

pub use associator::ImageAssociator;
pub use engine::{OcrEngine, TesseractEngine};
pub use scratch::ScratchDir;
