//! Benchmarks for entity extraction
//!
//! Run with: cargo bench --package data-loader
//!
//! Uses a synthetic dataset so the benchmark runs without the crawled CSV.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{extract_entities, Column, MovieRow};

fn synthetic_rows(count: usize) -> Vec<MovieRow> {
    (0..count)
        .map(|i| {
            let cast: Vec<String> = (0..8).map(|j| format!("Actor {}", (i * 7 + j) % 5000)).collect();
            let cast_refs: Vec<&str> = cast.iter().map(String::as_str).collect();
            let director = format!("Director {}", i % 900);
            let writer = format!("Writer {}", i % 1200);
            MovieRow::new(format!("Movie {}", i))
                .at(i)
                .with_list(Column::Cast, &cast_refs)
                .with_list(Column::PrincipleCast, &cast_refs[..3])
                .with_list(Column::Director, &[director.as_str()])
                .with_list(Column::Writers, &[writer.as_str()])
                .with_list(Column::Genres, &["Drama", "Crime"])
        })
        .collect()
}

fn bench_extract_entities(c: &mut Criterion) {
    let rows = synthetic_rows(10_000);

    c.bench_function("extract_entities_10k_rows", |b| {
        b.iter(|| {
            let extraction = extract_entities(black_box(&rows));
            black_box(extraction)
        })
    });
}

fn bench_decode_cells(c: &mut Criterion) {
    let rows = synthetic_rows(1_000);

    c.bench_function("decode_row_entities_1k_rows", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(row.entities().unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_extract_entities, bench_decode_cells);
criterion_main!(benches);
