//! JSON configuration file, merged over built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Settings read from `--config`. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub log_level: String,
    pub ocr_language: String,
    pub ocr_timeout_secs: u64,
    pub formats: Vec<String>,
    pub mode: String,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            log_level: "warn".to_string(),
            ocr_language: pdfknow::parser::DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_timeout_secs: 60,
            formats: vec!["markdown".to_string()],
            mode: "detailed".to_string(),
            parallel: true,
        }
    }
}

impl Config {
    /// Load a config file.
    ///
    /// Returns the defaults plus a warning message when the file is missing
    /// or is not valid JSON. The logger is not running yet, so the caller
    /// reports the warning.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                return (
                    Self::default(),
                    Some(format!("cannot read config {}: {}; using defaults", path.display(), e)),
                )
            }
        };
        match serde_json::from_str::<Config>(&data) {
            Ok(mut config) => {
                config.output_dir = expand_home(&config.output_dir);
                (config, None)
            }
            Err(e) => (
                Self::default(),
                Some(format!("invalid JSON in config {}: {}; using defaults", path.display(), e)),
            ),
        }
    }
}

/// Expand a leading `~` to `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
