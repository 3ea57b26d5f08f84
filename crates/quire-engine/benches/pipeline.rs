use criterion::{Criterion, criterion_group, criterion_main};
use quire_config::EditorConfig;
use quire_engine::{Catalog, Cmd, Editor, ParseMode, Parser, UnparseOptions, unparse::unparse};
mod common;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    let catalog = Catalog::standard(EditorConfig::default());
    let markup = common::generate_markup(100);
    let paste = common::generate_word_paste(200);

    group.bench_function("markup", |b| {
        let parser = Parser::new(&catalog);
        b.iter(|| {
            let parsed = parser.parse(std::hint::black_box(&markup), ParseMode::Markup);
            std::hint::black_box(parsed);
        });
    });

    group.bench_function("word_paste", |b| {
        let parser = Parser::new(&catalog);
        b.iter(|| {
            let parsed = parser.parse(std::hint::black_box(&paste), ParseMode::Markup);
            std::hint::black_box(parsed);
        });
    });

    group.finish();
}

fn bench_unparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("unparse");
    group.sample_size(10);

    let catalog = Catalog::standard(EditorConfig::default());
    let parsed = Parser::new(&catalog).parse_markup(&common::generate_markup(100));

    group.bench_function("storage", |b| {
        b.iter(|| {
            let out = unparse(
                &catalog,
                std::hint::black_box(&parsed.document.tree),
                UnparseOptions::storage(),
            );
            std::hint::black_box(out);
        });
    });

    group.finish();
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    group.sample_size(10);

    group.bench_function("insert_and_record", |b| {
        let mut editor = Editor::default();
        editor.load(&common::generate_markup(20));
        b.iter(|| {
            let patch = editor.apply(Cmd::InsertText {
                at: std::hint::black_box(5),
                text: std::hint::black_box("x".to_string()),
            });
            let trigger = editor.on_mutation_batch(&patch.changes);
            std::hint::black_box(trigger);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_unparse, bench_typing);
criterion_main!(benches);
