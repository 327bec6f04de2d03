//! pdfknow CLI - structural PDF extraction tool

mod config;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfknow::{
    render, ErrorMode, ExtractMode, ExtractOptions, JsonFormat, PdfExtractor,
    RenderOptions, TesseractEngine,
};

use config::Config;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfknow")]
#[command(version)]
#[command(about = "Extract headers, tables, footnotes and image text from PDF documents", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "PDFKNOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one or more PDFs
    Extract {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Extraction mode
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Output formats (repeat or comma-separate)
        #[arg(short, long = "format", value_enum, value_delimiter = ',')]
        formats: Vec<Format>,

        /// OCR language hint (e.g. "eng", "jpn+eng")
        #[arg(long, env = "PDFKNOW_OCR_LANG")]
        lang: Option<String>,

        /// Per-image OCR timeout in seconds
        #[arg(long, value_name = "SECS")]
        ocr_timeout: Option<u64>,

        /// Process pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Log page failures as errors
        #[arg(long)]
        strict: bool,

        /// Skip body paragraphs of this many characters or fewer
        #[arg(long, value_name = "CHARS")]
        min_paragraph: Option<usize>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Text, structure and tables
    Raw,
    /// Raw plus embedded images
    Standard,
    /// Standard plus OCR of every image
    Detailed,
}

impl From<Mode> for ExtractMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Raw => ExtractMode::Raw,
            Mode::Standard => ExtractMode::Standard,
            Mode::Detailed => ExtractMode::Detailed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Markdown (.md)
    #[value(alias = "md")]
    Markdown,
    /// Full document model (.json)
    Json,
    /// Formatted plain text (.txt)
    #[value(alias = "txt")]
    Text,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Json => "json",
            Format::Text => "txt",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let (config, config_warning) = match &cli.config {
        Some(path) => Config::load(path),
        None => (Config::default(), None),
    };
    init_logger(cli.verbose, &config.log_level);
    if let Some(warning) = config_warning {
        log::warn!("{}", warning);
    }

    let result = match cli.command {
        Commands::Extract {
            files,
            output,
            mode,
            formats,
            lang,
            ocr_timeout,
            sequential,
            strict,
            min_paragraph,
        } => {
            let settings = Settings::merge(
                &config,
                output,
                mode,
                formats,
                lang,
                ocr_timeout,
                sequential,
            );
            cmd_extract(&files, &settings, strict, min_paragraph)
        }
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool, config_level: &str) {
    let default = if verbose { "debug" } else { config_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Command-line flags merged over the config file.
#[derive(Debug)]
struct Settings {
    output_dir: PathBuf,
    mode: ExtractMode,
    formats: Vec<Format>,
    ocr_language: String,
    ocr_timeout: Duration,
    parallel: bool,
}

impl Settings {
    fn merge(
        config: &Config,
        output: Option<PathBuf>,
        mode: Option<Mode>,
        formats: Vec<Format>,
        lang: Option<String>,
        ocr_timeout: Option<u64>,
        sequential: bool,
    ) -> Self {
        let mode = match mode {
            Some(mode) => mode.into(),
            None => ExtractMode::parse(&config.mode).unwrap_or_else(|e| {
                log::warn!("{}; using detailed", e);
                ExtractMode::Detailed
            }),
        };

        let formats = if formats.is_empty() {
            config
                .formats
                .iter()
                .filter_map(|name| match Format::from_str(name, true) {
                    Ok(format) => Some(format),
                    Err(_) => {
                        log::warn!("Unsupported output format in config: {}", name);
                        None
                    }
                })
                .collect()
        } else {
            formats
        };

        Self {
            output_dir: output.unwrap_or_else(|| config.output_dir.clone()),
            mode,
            formats,
            ocr_language: lang.unwrap_or_else(|| config.ocr_language.clone()),
            ocr_timeout: Duration::from_secs(ocr_timeout.unwrap_or(config.ocr_timeout_secs)),
            parallel: config.parallel && !sequential,
        }
    }
}

fn cmd_extract(
    files: &[PathBuf],
    settings: &Settings,
    strict: bool,
    min_paragraph: Option<usize>,
) -> CliResult<()> {
    if settings.formats.is_empty() {
        return Err("no output formats selected".into());
    }

    let options = ExtractOptions::new()
        .with_mode(settings.mode)
        .with_ocr_language(settings.ocr_language.clone())
        .with_ocr_timeout(settings.ocr_timeout)
        .with_parallel(settings.parallel)
        .with_error_mode(if strict {
            ErrorMode::Strict
        } else {
            ErrorMode::Lenient
        });

    if settings.mode.runs_ocr() && !TesseractEngine::new().is_available() {
        log::warn!("tesseract not found on PATH; images will have no OCR text");
    }

    let mut render_options = RenderOptions::new();
    if let Some(chars) = min_paragraph {
        render_options = render_options.with_min_paragraph_chars(chars);
    }
    let extractor = PdfExtractor::new(options)?.with_render_options(render_options);

    fs::create_dir_all(&settings.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    for (file, stem) in files.iter().zip(output_stems(files)) {
        pb.set_message(file.display().to_string());
        match process_file(&extractor, file, &stem, settings) {
            Ok(written) => {
                pb.println(format!("{} {}", "✓".green(), file.display()));
                for path in written {
                    pb.println(format!("  {} {}", "└─".dimmed(), path.display()));
                }
            }
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", "✗".red(), file.display(), e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    extractor.cleanup()?;

    let done = files.len() - failed;
    println!(
        "\n{} {} of {} files extracted to {}",
        "Done!".green().bold(),
        done,
        files.len(),
        settings.output_dir.display()
    );

    if failed > 0 {
        return Err(format!("{} file(s) failed", failed).into());
    }
    Ok(())
}

/// Output base names for the input files.
///
/// Inputs sharing a file stem (`a/doc.pdf`, `b/doc.pdf`) get `_2`, `_3`, ...
/// suffixes so their outputs do not overwrite each other.
fn output_stems(files: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let stem = file
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let mut name = stem.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{}_{}", stem, n);
            }
            if name != stem {
                log::warn!("{} shares its name with another input; writing {}.*", file.display(), name);
            }
            name
        })
        .collect()
}

/// Extract one file and write every requested format. Returns the written paths.
fn process_file(
    extractor: &PdfExtractor,
    file: &Path,
    stem: &str,
    settings: &Settings,
) -> CliResult<Vec<PathBuf>> {
    let doc = extractor.extract_file(file)?;

    let mut written = Vec::new();
    for &format in &settings.formats {
        let content = match format {
            Format::Markdown => doc.markdown.clone(),
            Format::Json => render::to_json(&doc, JsonFormat::Pretty)?,
            Format::Text => render::to_text(&doc),
        };
        let path = settings
            .output_dir
            .join(format!("{}.{}", stem, format.extension()));
        fs::write(&path, content)?;
        written.push(path);
    }

    let images = doc.images();
    if !images.is_empty() {
        let images_dir = settings.output_dir.join(format!("{}_images", stem));
        fs::create_dir_all(&images_dir)?;
        for image in images {
            if let Err(e) = fs::copy(&image.path, images_dir.join(&image.file_name)) {
                log::warn!("Could not copy {}: {}", image.file_name, e);
            }
        }
        written.push(images_dir);
    }

    Ok(written)
}

fn cmd_info(input: &Path) -> CliResult<()> {
    let options = ExtractOptions::new().raw();
    let doc = pdfknow::extract_file_with_options(input, options)?;
    let meta = &doc.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), meta.pdf_version);
    println!("{}: {}", "Pages".bold(), meta.total_pages);
    println!("{}: {} bytes", "Size".bold(), meta.file_size);

    let optional = [
        ("Title", &meta.title),
        ("Author", &meta.author),
        ("Subject", &meta.subject),
        ("Keywords", &meta.keywords),
        ("Creator", &meta.creator),
        ("Producer", &meta.producer),
        ("Created", &meta.creation_date),
        ("Modified", &meta.modification_date),
    ];
    for (label, value) in optional {
        if !value.is_empty() {
            println!("{}: {}", label.bold(), value);
        }
    }

    let summary = doc.summary();
    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Text blocks".bold(), summary.total_text_blocks);
    println!("{}: {}", "Headers".bold(), summary.total_headers);
    println!("{}: {}", "Tables".bold(), summary.total_tables);
    println!("{}: {}", "Footnotes".bold(), summary.total_footnotes);
    println!(
        "{}: {}",
        "Characters".bold(),
        doc.plain_text().chars().count()
    );
    println!(
        "{}: {:.2}s",
        "Extraction time".bold(),
        summary.extraction_time
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfknow".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Structural PDF extraction tool");
    println!();
    println!("License: MIT");
}
