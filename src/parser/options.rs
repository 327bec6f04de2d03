//! Extraction options and configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::classify::ClassifierConfig;
use crate::error::{Error, Result};

/// Default OCR language hint (Japanese + English).
pub const DEFAULT_OCR_LANGUAGE: &str = "jpn+eng";

/// Options for extracting PDF documents.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Which optional enrichments run after the core pipeline
    pub mode: ExtractMode,

    /// How loudly per-page anomalies are reported
    pub error_mode: ErrorMode,

    /// Language hint passed to the OCR engine
    pub ocr_language: String,

    /// Per-image OCR timeout (None = wait indefinitely)
    pub ocr_timeout: Option<Duration>,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Block classification thresholds
    pub classifier: ClassifierConfig,

    /// Directory in which the scratch directory is created (None = system temp)
    pub scratch_parent: Option<PathBuf>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extract mode.
    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    /// Text, structure and tables only.
    pub fn raw(mut self) -> Self {
        self.mode = ExtractMode::Raw;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Set the OCR language hint (e.g. "eng", "jpn+eng").
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = language.into();
        self
    }

    /// Set the per-image OCR timeout.
    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = Some(timeout);
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set classifier thresholds.
    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    /// Create the scratch directory under `dir` instead of the system temp dir.
    pub fn with_scratch_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Detailed,
            error_mode: ErrorMode::Lenient,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_timeout: Some(Duration::from_secs(60)),
            parallel: true,
            classifier: ClassifierConfig::default(),
            scratch_parent: None,
        }
    }
}

/// How per-page anomalies are reported.
///
/// This only selects the log level. A failing page never aborts the
/// document in either mode; it is replaced by an empty page record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Log page failures at error level
    Strict,
    /// Log page failures as warnings
    #[default]
    Lenient,
}

/// Which enrichments run on top of text, structure and table extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Text blocks, roles, tables and raw text only
    Raw,
    /// Raw plus embedded images written to the scratch directory
    Standard,
    /// Standard plus OCR of every extracted image
    #[default]
    Detailed,
}

impl ExtractMode {
    pub fn extracts_images(&self) -> bool {
        matches!(self, ExtractMode::Standard | ExtractMode::Detailed)
    }

    pub fn runs_ocr(&self) -> bool {
        matches!(self, ExtractMode::Detailed)
    }

    /// Parse a mode name ("raw", "standard", "detailed").
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ExtractMode::Raw),
            "standard" => Ok(ExtractMode::Standard),
            "detailed" => Ok(ExtractMode::Detailed),
            other => Err(Error::Config(format!("unknown extraction mode: {}", other))),
        }
    }
}
