//! OCR engines.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// How often a running tesseract process is checked against its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Recognizes text in an image file.
///
/// Implementations may fail; callers treat a failure as "no text".
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image` using a language hint such as `"jpn+eng"`.
    fn recognize(&self, image: &Path, language: &str) -> Result<String>;

    /// Recognize text, stopping the work once `timeout` has elapsed.
    ///
    /// Returns `None` when the engine cannot stop its own work. The caller
    /// then runs [`recognize`](OcrEngine::recognize) on a worker thread and
    /// stops waiting after the timeout.
    fn recognize_within(
        &self,
        _image: &Path,
        _language: &str,
        _timeout: Duration,
    ) -> Option<Result<String>> {
        None
    }

    /// Short engine name used in logs.
    fn name(&self) -> &str {
        "ocr"
    }
}

/// Runs the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    /// OCR engine mode (`--oem`)
    oem: u8,
    /// Page segmentation mode (`--psm`)
    psm: u8,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            oem: 3,
            psm: 6,
        }
    }
}

impl TesseractEngine {
    /// Use the `tesseract` binary found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tesseract binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    /// Whether the binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl TesseractEngine {
    /// Run tesseract on `image`. With a timeout, the process is killed and
    /// reaped once the deadline passes.
    fn run(&self, image: &Path, language: &str, timeout: Option<Duration>) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(["-l", language])
            .args(["--oem", &self.oem.to_string()])
            .args(["--psm", &self.psm.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Ocr(format!("failed to run {}: {}", self.binary.display(), e)))?;

        // Drain both pipes so a chatty process never blocks on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match timeout {
            Some(timeout) => wait_until(&mut child, timeout)?,
            None => child.wait()?,
        };
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::Ocr(format!(
                "tesseract exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Path, language: &str) -> Result<String> {
        self.run(image, language, None)
    }

    fn recognize_within(
        &self,
        image: &Path,
        language: &str,
        timeout: Duration,
    ) -> Option<Result<String>> {
        Some(self.run(image, language, Some(timeout)))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Wait for `child`, killing it when `timeout` elapses first.
fn wait_until(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            // Reap it so no process outlives the scratch directory
            let _ = child.wait();
            return Err(Error::OcrTimeout(timeout.as_millis()));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
