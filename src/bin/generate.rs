//! Generates a synthetic CSV fixture with a header row and 8 columns (two
//! each of int, float, bool-as-string, and alphanumeric string), with
//! occasional empty cells to exercise null handling. Run with
//! `cargo run --bin generate -- <path> <rows>`.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use std::env;
use std::fs::File;
use std::io::prelude::*;

fn main() {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).cloned().unwrap_or_else(|| "fixture.csv".to_string());
    let rows: usize = args
        .get(2)
        .map(|s| s.parse().expect("row count must be a non-negative integer"))
        .unwrap_or(10_000);

    let mut f = File::create(&path).unwrap();
    let mut rng = thread_rng();

    writeln!(f, "int_a,int_b,float_a,float_b,bool_a,bool_b,str_a,str_b").unwrap();

    for _ in 0..rows {
        let s1: String = rng.sample_iter(&Alphanumeric).take(12).collect();
        let s2: String = rng.sample_iter(&Alphanumeric).take(12).collect();
        let line = format!(
            "{},{},{},{},{},{},{},{}\n",
            maybe_empty(&mut rng, rng.gen::<i32>().to_string()),
            maybe_empty(&mut rng, rng.gen::<i32>().to_string()),
            maybe_empty(&mut rng, rng.gen_range(-100.0, 100.0).to_string()),
            maybe_empty(&mut rng, rng.gen_range(-100.0, 100.0).to_string()),
            rng.gen_range::<i32, i32, i32>(0, 2),
            rng.gen_range::<i32, i32, i32>(0, 2),
            s1,
            s2,
        );
        f.write_all(line.as_bytes()).unwrap();
    }
}

/// Drops the value roughly one time in twenty, to give generated fixtures
/// some nullable columns.
fn maybe_empty(rng: &mut impl Rng, value: String) -> String {
    if rng.gen_range(0, 20) == 0 {
        String::new()
    } else {
        value
    }
}
