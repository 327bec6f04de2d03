//! Image extraction and OCR for one page.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use super::engine::OcrEngine;
use crate::error::{Error, Result};
use crate::model::{ImageOcrResult, ImageRecord};
use crate::parser::PdfSource;

/// Images with this many color channels (CMYK and wider) are skipped.
const MAX_COLOR_COMPONENTS: u8 = 3;

/// Writes a page's images to scratch storage and attaches OCR text to them.
pub struct ImageAssociator<'a> {
    scratch: &'a Path,
    engine: Option<Arc<dyn OcrEngine>>,
    language: &'a str,
    timeout: Option<Duration>,
}

impl<'a> ImageAssociator<'a> {
    /// Associator that writes images into `scratch` and runs no OCR.
    pub fn new(scratch: &'a Path) -> Self {
        Self {
            scratch,
            engine: None,
            language: "",
            timeout: None,
        }
    }

    /// Enable OCR with the given engine and language hint.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>, language: &'a str) -> Self {
        self.engine = Some(engine);
        self.language = language;
        self
    }

    /// Abandon OCR of a single image after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the page's images as PNG files.
    ///
    /// Indexes follow the source's enumeration order, starting at 1. An image
    /// that is CMYK (or wider) or fails to decode is skipped and keeps its
    /// index unused.
    pub fn extract_images(&self, source: &dyn PdfSource, page_number: u32) -> Vec<ImageRecord> {
        let refs = match source.images(page_number) {
            Ok(refs) => refs,
            Err(e) => {
                log::warn!("Could not list images on page {}: {}", page_number, e);
                return vec![];
            }
        };

        let mut records = Vec::with_capacity(refs.len());
        for (i, image) in refs.iter().enumerate() {
            let index = i as u32 + 1;
            let pixmap = match source.materialize(image) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("Skipping image {} on page {}: {}", index, page_number, e);
                    continue;
                }
            };
            if pixmap.color_components > MAX_COLOR_COMPONENTS {
                log::debug!(
                    "Skipping image {} on page {}: {} color components",
                    index,
                    page_number,
                    pixmap.color_components
                );
                continue;
            }

            let file_name = ImageRecord::file_name_for(page_number, index);
            let path = self.scratch.join(&file_name);
            if let Err(e) = pixmap.save_png(&path) {
                log::warn!("Could not write {}: {}", file_name, e);
                continue;
            }

            records.push(ImageRecord {
                page_number,
                index,
                file_name,
                path,
                width: pixmap.width,
                height: pixmap.height,
            });
        }
        records
    }

    /// Run OCR on each image.
    ///
    /// Failures and timeouts are logged and produce no result; so does text
    /// that is only whitespace.
    pub fn recognize(&self, images: &[ImageRecord]) -> Vec<ImageOcrResult> {
        let Some(engine) = &self.engine else {
            return vec![];
        };

        images
            .iter()
            .filter_map(|image| match self.run_engine(engine, &image.path) {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        log::debug!("No text recognized in {}", image.file_name);
                        return None;
                    }
                    Some(ImageOcrResult {
                        page_number: image.page_number,
                        image_index: image.index,
                        file_name: image.file_name.clone(),
                        extracted_text: text.to_string(),
                    })
                }
                Err(e) => {
                    log::warn!("{} failed on {}: {}", engine.name(), image.file_name, e);
                    None
                }
            })
            .collect()
    }

    fn run_engine(&self, engine: &Arc<dyn OcrEngine>, path: &Path) -> Result<String> {
        let Some(timeout) = self.timeout else {
            return engine.recognize(path, self.language);
        };
        if let Some(result) = engine.recognize_within(path, self.language, timeout) {
            return result;
        }

        // The engine cannot stop itself; stop waiting and leave the worker behind
        let (tx, rx) = bounded(1);
        let worker = Arc::clone(engine);
        let path: PathBuf = path.to_path_buf();
        let language = self.language.to_string();
        thread::Builder::new()
            .name("pdfknow-ocr".to_string())
            .spawn(move || {
                // The receiver is gone after a timeout
                let _ = tx.send(worker.recognize(&path, &language));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::OcrTimeout(timeout.as_millis())),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Ocr("OCR worker exited without a result".to_string()))
            }
        }
    }
}
