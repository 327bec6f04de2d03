//! Scratch storage for extracted images.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

const PREFIX: &str = "pdfknow_";

/// A private directory owned by one extractor.
///
/// The directory is removed by [`close`](ScratchDir::close), or on drop if
/// `close` was never called.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a new directory under the system temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        log::debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a new directory under `parent`.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(parent)?;
        log::debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a file inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Delete the directory and everything in it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("Removed scratch directory {}", path.display());
        Ok(())
    }
}
