//! Integration tests for the extraction pipeline over scripted page sources.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use pdfknow::error::{Error, Result};
use pdfknow::parser::raw::{RawBlock, RawLine, RawSpan, RawTextPage};
use pdfknow::parser::{ImageRef, NativeTable, Pixmap};
use pdfknow::{
    BBox, ErrorMode, ExtractMode, ExtractOptions, FileInfo, OcrEngine, PdfExtractor,
    PdfSource, Role, TableSource,
};

const WIDTH: f32 = 612.0;
const HEIGHT: f32 = 792.0;

/// One text line: text, font size, bold, distance from the page top.
type Line = (&'static str, f32, bool, f32);

#[derive(Clone, Default)]
struct FakePage {
    lines: Vec<Line>,
    /// `None` makes native table detection fail
    tables: Option<Vec<NativeTable>>,
    images: u32,
    broken: bool,
}

impl FakePage {
    fn text(lines: Vec<Line>) -> Self {
        Self {
            lines,
            tables: Some(vec![]),
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct FakeSource {
    pages: Vec<FakePage>,
    info: BTreeMap<String, String>,
}

impl FakeSource {
    fn page(&self, page: u32) -> Result<&FakePage> {
        self.pages
            .get(page as usize - 1)
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }
}

impl PdfSource for FakeSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<(f32, f32)> {
        self.page(page).map(|_| (WIDTH, HEIGHT))
    }

    fn text_dict(&self, page: u32) -> Result<RawTextPage> {
        let fake = self.page(page)?;
        if fake.broken {
            return Err(Error::TextExtract("malformed block dictionary".to_string()));
        }
        let blocks = fake
            .lines
            .iter()
            .map(|&(text, size, bold, y)| {
                let bbox = [72.0, y, 72.0 + text.len() as f32 * size * 0.5, y + size];
                RawBlock {
                    bbox: Some(bbox),
                    lines: vec![RawLine {
                        bbox: Some(bbox),
                        spans: vec![RawSpan {
                            text: Some(text.to_string()),
                            size: Some(size),
                            flags: Some(RawSpan::flags_for(bold, false)),
                            font: Some("Helvetica".to_string()),
                            bbox: Some(bbox),
                            color: Some(0),
                        }],
                    }],
                }
            })
            .collect();
        Ok(RawTextPage {
            width: Some(WIDTH),
            height: Some(HEIGHT),
            blocks,
        })
    }

    fn plain_text(&self, page: u32) -> Result<String> {
        let fake = self.page(page)?;
        Ok(fake
            .lines
            .iter()
            .map(|l| l.0)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn find_tables(&self, page: u32) -> Result<Vec<NativeTable>> {
        self.page(page)?
            .tables
            .clone()
            .ok_or_else(|| Error::TableDetect("detector crashed".to_string()))
    }

    fn images(&self, page: u32) -> Result<Vec<ImageRef>> {
        Ok((1..=self.page(page)?.images)
            .map(|i| ImageRef {
                id: page * 100 + i,
                name: format!("Im{}", i),
            })
            .collect())
    }

    fn materialize(&self, _image: &ImageRef) -> Result<Pixmap> {
        Ok(Pixmap {
            width: 2,
            height: 2,
            color_components: 1,
            has_alpha: false,
            samples: vec![0, 255, 255, 0],
        })
    }

    fn info(&self) -> BTreeMap<String, String> {
        self.info.clone()
    }

    fn version(&self) -> String {
        "1.7".to_string()
    }
}

/// Fails on every second image of a page; otherwise echoes the file name.
struct FakeOcr;

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &Path, _language: &str) -> Result<String> {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.ends_with("image_2.png") {
            return Err(Error::Ocr("engine crashed".to_string()));
        }
        Ok(format!("  text of {}\n", name))
    }
}

fn extractor(options: ExtractOptions) -> PdfExtractor {
    PdfExtractor::new(options)
        .unwrap()
        .with_ocr_engine(Arc::new(FakeOcr))
}

fn sample_source() -> FakeSource {
    let mut info = BTreeMap::new();
    info.insert("Title".to_string(), "Quarterly Review".to_string());
    info.insert("CreationDate".to_string(), "D:20240301120000Z".to_string());

    let mut table_page = FakePage::text(vec![("Results", 14.0, true, 100.0)]);
    table_page.tables = Some(vec![
        NativeTable {
            rows: vec![],
            bbox: BBox::default(),
        },
        NativeTable {
            rows: vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["1".to_string(), "2".to_string()],
            ],
            bbox: BBox::new(72.0, 200.0, 300.0, 260.0),
        },
    ]);

    FakeSource {
        pages: vec![
            FakePage::text(vec![
                ("Quarterly Review", 18.0, false, 100.0),
                ("Revenue grew in every region this quarter.", 11.0, false, 300.0),
                ("1 Unaudited figures", 8.0, false, 680.0),
                ("Page 1", 9.0, false, 760.0),
            ]),
            table_page,
            FakePage::text(vec![("Page 3", 9.0, false, 760.0)]),
        ],
        info,
    }
}

#[test]
fn test_pages_classified_and_ordered() {
    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&sample_source(), FileInfo::named("review.pdf", 2048))
        .unwrap();

    let numbers: Vec<u32> = doc.pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let roles: Vec<Role> = doc.pages[0].blocks.iter().map(|b| b.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::Header { level: 1 },
            Role::Body,
            Role::Footnote,
            Role::PageFooter
        ]
    );
    assert_eq!(doc.pages[1].blocks[0].role, Role::Header { level: 2 });
}

#[test]
fn test_document_views_are_page_concatenations() {
    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&sample_source(), FileInfo::named("review.pdf", 2048))
        .unwrap();

    let expected_headers: Vec<_> = doc.pages.iter().flat_map(|p| p.headers()).collect();
    assert_eq!(doc.headers(), expected_headers);
    let expected_tables: Vec<_> = doc.pages.iter().flat_map(|p| &p.tables).collect();
    assert_eq!(doc.tables(), expected_tables);
    let expected_footnotes: Vec<_> = doc.pages.iter().flat_map(|p| p.footnotes()).collect();
    assert_eq!(doc.footnotes(), expected_footnotes);
    assert_eq!(doc.headers().len(), 2);
}

#[test]
fn test_empty_native_tables_dropped() {
    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&sample_source(), FileInfo::named("review.pdf", 2048))
        .unwrap();

    let tables = &doc.pages[1].tables;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].index, 1);
    assert_eq!(tables[0].source, TableSource::Native);
    assert_eq!(tables[0].markdown, "| A | B |\n| --- | --- |\n| 1 | 2 |");
}

#[test]
fn test_fallback_table_when_native_detection_fails() {
    let mut page = FakePage::text(vec![
        ("Name    Score", 11.0, false, 200.0),
        ("Alice   90", 11.0, false, 214.0),
    ]);
    page.tables = None;
    let source = FakeSource {
        pages: vec![page],
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&source, FileInfo::named("scores.pdf", 10))
        .unwrap();

    let tables = &doc.pages[0].tables;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].source, TableSource::TextAlignment);
    assert_eq!(
        tables[0].rows,
        vec![vec!["Name", "Score"], vec!["Alice", "90"]]
    );
    assert_eq!(tables[0].bbox, BBox::page(WIDTH, HEIGHT));
}

#[test]
fn test_no_fallback_when_native_finds_nothing() {
    let source = FakeSource {
        pages: vec![FakePage::text(vec![
            ("Name    Score", 11.0, false, 200.0),
            ("Alice   90", 11.0, false, 214.0),
        ])],
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&source, FileInfo::named("scores.pdf", 10))
        .unwrap();
    assert!(doc.pages[0].tables.is_empty());
}

#[test]
fn test_ocr_failure_isolated_to_one_image() {
    let mut page = FakePage::text(vec![("Figures", 11.0, false, 300.0)]);
    page.images = 3;
    let source = FakeSource {
        pages: vec![page],
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new().sequential());
    let doc = extractor
        .extract_source(&source, FileInfo::named("figs.pdf", 10))
        .unwrap();

    let page = &doc.pages[0];
    assert_eq!(page.images.len(), 3);
    assert!(page.images.iter().all(|i| i.path.exists()));

    let indexes: Vec<u32> = page.ocr_results.iter().map(|r| r.image_index).collect();
    assert_eq!(indexes, vec![1, 3]);
    assert_eq!(page.ocr_results[0].extracted_text, "text of page_1_image_1.png");
    assert!(doc.markdown.contains("### [Figure 3: Extracted Text]"));
    assert!(!doc.markdown.contains("Figure 2"));
}

#[test]
fn test_standard_mode_skips_ocr() {
    let mut page = FakePage::text(vec![("Figures", 11.0, false, 300.0)]);
    page.images = 2;
    let source = FakeSource {
        pages: vec![page],
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new().with_mode(ExtractMode::Standard));
    let doc = extractor
        .extract_source(&source, FileInfo::named("figs.pdf", 10))
        .unwrap();
    assert_eq!(doc.pages[0].images.len(), 2);
    assert!(doc.pages[0].ocr_results.is_empty());
}

#[test]
fn test_broken_page_does_not_abort_document() {
    let mut source = sample_source();
    source.pages[1].broken = true;

    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&source, FileInfo::named("review.pdf", 2048))
        .unwrap();

    assert_eq!(doc.page_count(), 3);
    assert!(doc.pages[1].blocks.is_empty());
    assert!(doc.pages[1].tables.is_empty());
    assert!(!doc.pages[0].blocks.is_empty());
}

#[test]
fn test_strict_mode_only_changes_reporting() {
    let mut source = sample_source();
    source.pages[1].broken = true;

    let lenient = extractor(ExtractOptions::new().raw())
        .extract_source(&source, FileInfo::named("review.pdf", 2048))
        .unwrap();
    let strict = extractor(ExtractOptions::new().raw().with_error_mode(ErrorMode::Strict))
        .extract_source(&source, FileInfo::named("review.pdf", 2048))
        .unwrap();

    assert_eq!(strict.page_count(), 3);
    assert!(strict.pages[1].blocks.is_empty());
    for (a, b) in strict.pages.iter().zip(&lenient.pages) {
        assert_eq!(a.blocks, b.blocks);
        assert_eq!(a.tables, b.tables);
    }
    assert_eq!(strict.markdown, lenient.markdown);
}

#[test]
fn test_markdown_skips_pages_without_content() {
    let extractor = extractor(ExtractOptions::new().raw());
    let doc = extractor
        .extract_source(&sample_source(), FileInfo::named("review.pdf", 2048))
        .unwrap();

    assert!(doc.markdown.starts_with("# Quarterly Review\n"));
    assert!(doc.markdown.contains("## Page 1"));
    assert!(doc.markdown.contains("## Page 2"));
    assert!(!doc.markdown.contains("## Page 3"));
    assert!(doc.markdown.contains("- **File Size:** 2,048 bytes"));
    assert!(doc.markdown.contains("- **Created:** 2024-03-01T12:00:00+00:00"));
}

#[test]
fn test_metadata_defaults_to_empty() {
    let extractor = extractor(ExtractOptions::new().raw());
    let source = FakeSource {
        pages: vec![FakePage::text(vec![])],
        ..Default::default()
    };
    let doc = extractor
        .extract_source(&source, FileInfo::named("bare.pdf", 1))
        .unwrap();

    assert_eq!(doc.metadata.title, "");
    assert_eq!(doc.metadata.author, "");
    assert_eq!(doc.metadata.pdf_version, "1.7");
    assert_eq!(doc.metadata.total_pages, 1);
    assert!(!doc.metadata.extraction_timestamp.is_empty());
}

#[test]
fn test_parallel_matches_sequential() {
    let source = sample_source();
    let parallel = extractor(ExtractOptions::new().raw())
        .extract_source(&source, FileInfo::named("review.pdf", 2048))
        .unwrap();
    let sequential = extractor(ExtractOptions::new().raw().sequential())
        .extract_source(&source, FileInfo::named("review.pdf", 2048))
        .unwrap();

    assert_eq!(parallel.pages.len(), sequential.pages.len());
    for (a, b) in parallel.pages.iter().zip(&sequential.pages) {
        assert_eq!(a.page_number, b.page_number);
        assert_eq!(a.blocks, b.blocks);
        assert_eq!(a.tables, b.tables);
    }
}

#[test]
fn test_ocr_view_is_page_concatenation() {
    let pages = [3, 2, 3]
        .into_iter()
        .map(|images| {
            let mut page = FakePage::text(vec![("Figures", 11.0, false, 300.0)]);
            page.images = images;
            page
        })
        .collect();
    let source = FakeSource {
        pages,
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new());
    let doc = extractor
        .extract_source(&source, FileInfo::named("figs.pdf", 10))
        .unwrap();

    let expected: Vec<_> = doc.pages.iter().flat_map(|p| &p.ocr_results).collect();
    assert_eq!(doc.ocr_results(), expected);

    let keys: Vec<(u32, u32)> = doc
        .ocr_results()
        .iter()
        .map(|r| (r.page_number, r.image_index))
        .collect();
    assert_eq!(keys, vec![(1, 1), (1, 3), (2, 1), (3, 1), (3, 3)]);
    assert_eq!(doc.ocr_results()[2].extracted_text, "text of page_2_image_1.png");
    assert_eq!(doc.summary().ocr_processed_images, 5);
}

#[test]
fn test_cleanup_removes_scratch_after_failure() {
    let parent = tempfile::tempdir().unwrap();
    let extractor = extractor(ExtractOptions::new().with_scratch_parent(parent.path()));
    let scratch = extractor.scratch_dir().to_path_buf();
    assert!(scratch.starts_with(parent.path()));

    assert!(extractor.extract_bytes(b"not a pdf", "bad.pdf").is_err());
    assert!(scratch.exists());

    extractor.cleanup().unwrap();
    assert!(!scratch.exists());
}

#[test]
fn test_documents_get_separate_image_directories() {
    let mut page = FakePage::text(vec![("Figures", 11.0, false, 300.0)]);
    page.images = 1;
    let source = FakeSource {
        pages: vec![page],
        ..Default::default()
    };

    let extractor = extractor(ExtractOptions::new().with_mode(ExtractMode::Standard));
    let first = extractor
        .extract_source(&source, FileInfo::named("a.pdf", 1))
        .unwrap();
    let second = extractor
        .extract_source(&source, FileInfo::named("b.pdf", 1))
        .unwrap();

    let a = &first.pages[0].images[0].path;
    let b = &second.pages[0].images[0].path;
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
}
