//! Developer benchmark, not part of the correctness suite: each
//! `bench_function` skips itself when its fixture file is absent, so
//! `cargo bench` still succeeds on a checkout without generated fixtures.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use framecore::csv;
use std::fs;
use std::path::Path;

fn bench_parse_file(c: &mut Criterion, name: &str, path: &str) {
    if !Path::new(path).exists() {
        return;
    }
    let bytes = fs::read(path).unwrap();
    c.bench_function(name, |b| b.iter(|| csv::parse_csv_buffer(black_box(&bytes))));
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_parse_file(c, "parsing tests/fixtures/filtering.csv", "tests/fixtures/filtering.csv");
    bench_parse_file(c, "parsing tests/fixtures/quoting.csv", "tests/fixtures/quoting.csv");
    bench_parse_file(c, "parsing benches/fixture_large.csv", "benches/fixture_large.csv");
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
