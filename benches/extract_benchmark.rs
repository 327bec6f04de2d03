//! Benchmarks for classification, rendering and raw extraction.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pdfknow::model::{BBox, DocumentMetadata, DocumentModel, PageRecord, Table, TableSource};
use pdfknow::parser::{fallback_rows, BlockClassifier};
use pdfknow::{ExtractOptions, MarkdownRenderer, RenderOptions, TextBlock, TextSpan};

/// Creates a minimal synthetic PDF with the given number of pages.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut content = String::new();
    content.push_str("%PDF-1.4\n");
    content.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", i * 2 + 3)).collect();
    content.push_str(&format!(
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        page_count
    ));

    let mut next_obj = 3;
    for i in 0..page_count {
        let page_obj = next_obj;
        let content_obj = next_obj + 1;
        next_obj += 2;

        content.push_str(&format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R >>\nendobj\n",
            page_obj, content_obj
        ));

        let text = format!(
            "BT /F1 18 Tf 72 720 Td (Section {}) Tj ET \
             BT /F1 11 Tf 72 600 Td (Body text for benchmark page {}.) Tj ET \
             BT /F1 9 Tf 280 30 Td (Page {}) Tj ET",
            i + 1,
            i + 1,
            i + 1
        );
        content.push_str(&format!(
            "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            content_obj,
            text.len(),
            text
        ));
    }

    // Placeholder offsets; the parser rebuilds the xref table
    let xref_offset = content.len();
    content.push_str(&format!("xref\n0 {}\n", next_obj));
    content.push_str("0000000000 65535 f \n");
    for _ in 1..next_obj {
        content.push_str("0000000000 00000 n \n");
    }
    content.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        next_obj, xref_offset
    ));

    content.into_bytes()
}

fn block(page: u32, i: usize) -> TextBlock {
    let size = [18.0, 14.0, 11.0, 8.0][i % 4];
    let y = (i * 37 % 792) as f32;
    let span = TextSpan {
        text: format!("Block {} with some text", i),
        font_size: size,
        font: "Helvetica".to_string(),
        bold: i % 3 == 0,
        italic: false,
        bbox: BBox::new(72.0, y, 400.0, y + size),
        color: 0,
    };
    let text = span.text.clone();
    TextBlock::new(page, vec![span], text, BBox::new(72.0, y, 400.0, y + size))
}

fn synthetic_document(pages: u32) -> DocumentModel {
    let classifier = BlockClassifier::new();
    let pages = (1..=pages)
        .map(|n| {
            let mut page = PageRecord::new(n, 612.0, 792.0);
            page.blocks = (0..40).map(|i| block(n, i)).collect();
            classifier.apply(&mut page.blocks, 792.0);
            page.tables.push(Table::new(
                n,
                1,
                vec![
                    vec!["Region".to_string(), "Q1".to_string(), "Q2".to_string()],
                    vec!["North".to_string(), "10".to_string(), "12".to_string()],
                ],
                BBox::default(),
                TableSource::Native,
            ));
            page
        })
        .collect();
    let metadata = DocumentMetadata {
        file_name: "bench.pdf".to_string(),
        total_pages: 20,
        ..Default::default()
    };
    DocumentModel::new(metadata, pages)
}

fn bench_classification(c: &mut Criterion) {
    let classifier = BlockClassifier::new();
    let blocks: Vec<TextBlock> = (0..500).map(|i| block(1, i)).collect();

    c.bench_function("classify_500_blocks", |b| {
        b.iter(|| {
            let mut blocks = blocks.clone();
            classifier.apply(black_box(&mut blocks), 792.0);
            blocks
        });
    });
}

fn bench_fallback_rows(c: &mut Criterion) {
    let lines: Vec<String> = (0..200)
        .map(|i| {
            if i % 2 == 0 {
                format!("Item {}    {}    {}", i, i * 3, i * 7)
            } else {
                format!("Plain sentence number {} without columns.", i)
            }
        })
        .collect();

    c.bench_function("fallback_rows_200_lines", |b| {
        b.iter(|| fallback_rows(black_box(&lines)));
    });
}

fn bench_markdown(c: &mut Criterion) {
    let doc = synthetic_document(20);
    let renderer = MarkdownRenderer::new(RenderOptions::default());

    c.bench_function("render_markdown_20_pages", |b| {
        b.iter(|| renderer.render(black_box(&doc)));
    });
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_extraction");

    for page_count in [1, 5, 10] {
        let data = create_test_pdf(page_count);
        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| {
                let options = ExtractOptions::new().raw();
                let _ = pdfknow::extract_bytes(black_box(&data), "bench.pdf", options);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classification,
    bench_fallback_rows,
    bench_markdown,
    bench_extraction,
);
criterion_main!(benches);
