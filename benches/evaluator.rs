//! Developer benchmark for the expression evaluator. Type deduction is
//! folded inline into table construction rather than run as a standalone
//! pass, so there's nothing analogous to benchmark on its own. Skips
//! itself when its fixture is absent.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use framecore::table::HeaderPolicy;
use std::path::Path;

pub fn criterion_benchmark(c: &mut Criterion) {
    let path = "tests/fixtures/filtering.csv";
    if !Path::new(path).exists() {
        return;
    }
    let raw = framecore::parse_csv_file(path).unwrap();
    let table = framecore::csv_to_table(raw, HeaderPolicy::TakeFirstRowAsHeaders, None).unwrap();

    c.bench_function("filter: a > b", |b| {
        b.iter(|| {
            framecore::filter(
                black_box(&table),
                r#"{"predicate": "gt", "arguments": [{"column": "a"}, {"column": "b"}]}"#,
            )
        })
    });

    c.bench_function("each: plus(times(a, 2), 4)", |b| {
        b.iter(|| {
            framecore::each(
                black_box(&table),
                r#"{"operation": "plus", "arguments": [{"operation": "times", "arguments": [{"column": "a"}, 2]}, 4]}"#,
            )
        })
    });

    c.bench_function("dropNA", |b| b.iter(|| framecore::drop_na(black_box(&table))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
