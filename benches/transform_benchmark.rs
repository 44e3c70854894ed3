//! Benchmarks for parsing, layout transform and rendering.
//!
//! Run with: cargo bench
//!
//! The input is synthetic USFM with a configurable number of chapters.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use usfmconv::{
    build_toc, render, transform, Assembler, FormatConfig, MarkerParser, NoProgress,
    OutputFormat, RawOptions, UsfmParser,
};

/// Creates a synthetic book with the given number of chapters.
fn create_test_usfm(code: &str, chapters: usize) -> String {
    let mut usfm = format!("\\id {code}\n\\h Book {code}\n\\mt1 Book {code}\n");
    for c in 1..=chapters {
        usfm.push_str(&format!("\\c {c}\n\\s1 Section {c}\n\\p\n"));
        for v in 1..=30 {
            usfm.push_str(&format!(
                "\\v {v} In the beginning \\w word|strong=\"H{v}\"\\w* was spoken\\f + \\ft Note {c}:{v}\\f*\n"
            ));
        }
    }
    usfm
}

fn full_config() -> FormatConfig {
    let raw = RawOptions::new()
        .with_chapter_break(true)
        .with_verse_break(true)
        .with_footnotes(true)
        .with_table_of_contents(true);
    FormatConfig::build(&raw).expect("valid options")
}

fn bench_parsing(c: &mut Criterion) {
    let parser = UsfmParser::new();
    let mut group = c.benchmark_group("usfm_parsing");

    for chapters in [1, 10, 50] {
        let source = create_test_usfm("GEN", chapters);
        group.bench_function(format!("{}_chapters", chapters), |b| {
            b.iter(|| parser.parse(black_box(&source)))
        });
    }

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let sources: Vec<(String, String)> = ["GEN", "EXO", "LEV", "NUM", "DEU"]
        .iter()
        .map(|code| (format!("{code}.usfm"), create_test_usfm(code, 20)))
        .collect();
    let document = Assembler::new()
        .assemble_sources(&sources, &mut NoProgress)
        .expect("synthetic input parses");
    let config = full_config();

    c.bench_function("transform_5_books", |b| {
        b.iter(|| transform(black_box(&document), black_box(&config)))
    });

    let layout = transform(&document, &config).expect("well-formed document");
    c.bench_function("toc_5_books", |b| {
        b.iter(|| build_toc(black_box(&layout), black_box(&config)))
    });
}

fn bench_rendering(c: &mut Criterion) {
    let sources = [("GEN.usfm", create_test_usfm("GEN", 20))];
    let document = Assembler::new()
        .assemble_sources(&sources, &mut NoProgress)
        .expect("synthetic input parses");
    let config = full_config();
    let layout = transform(&document, &config).expect("well-formed document");
    let toc = build_toc(&layout, &config);

    let mut group = c.benchmark_group("rendering");
    for format in OutputFormat::ALL {
        group.bench_function(format.extension(), |b| {
            b.iter(|| render(format, black_box(&document), black_box(&layout), &toc))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parsing, bench_transform, bench_rendering);
criterion_main!(benches);
