//! # framecore
//!
//! `framecore` is an in-memory columnar dataframe engine. It reads CSV
//! text into a typed, nullable, column-oriented [`Table`](array::Table),
//! and evaluates a small JSON expression DSL against that table to either
//! produce a new column (`each`) or select a subset of rows (`filter`).
//!
//! # Usage
//!
//! ```no_run
//! use framecore::table::HeaderPolicy;
//!
//! let raw = framecore::parse_csv_file("data.csv").unwrap();
//! let table = framecore::csv_to_table(raw, HeaderPolicy::TakeFirstRowAsHeaders, None).unwrap();
//! let filtered = framecore::filter(&table, r#"{"predicate": "gt", "arguments": [{"column": "a"}, 0]}"#).unwrap();
//! println!("{} rows survived", filtered.num_rows());
//! ```
//!
//! The columnar-binary file loader/saver, the CLI, and the benchmarking
//! harness are external collaborators layered on top of this crate, not
//! part of it.

pub mod array;
pub mod csv;
pub mod error;
pub mod expr;
pub mod filter;
pub mod number;
pub mod table;
pub mod types;

pub use error::Error;

use array::Table;
use csv::RawCsv;
use table::HeaderPolicy;
use types::ColumnType;

/// Parses an in-memory CSV buffer.
pub fn parse_csv_buffer(bytes: &[u8]) -> Result<RawCsv, Error> {
    csv::parse_csv_buffer(bytes)
}

/// Reads and parses a CSV file.
pub fn parse_csv_file(path: impl AsRef<std::path::Path>) -> Result<RawCsv, Error> {
    csv::parse_csv_file(path)
}

/// Materializes a parsed CSV buffer into a typed `Table`.
pub fn csv_to_table(
    raw: RawCsv,
    header_policy: HeaderPolicy,
    type_overrides: Option<&[Option<ColumnType>]>,
) -> Result<Table, Error> {
    let rows = raw.rows()?;
    table::csv_to_table(rows, header_policy, type_overrides)
}

/// Classifies a single cell's logical type.
pub fn deduce_type(cell: &str) -> Option<array::DataType> {
    types::deduce_type(cell)
}

/// Evaluates a DSL expression row-wise, producing a value column.
pub fn each(table: &Table, json_expr: &str) -> Result<array::Array, Error> {
    let parsed = expr::parse(json_expr, table.schema())?;
    expr::each(table, &parsed)
}

/// Evaluates a DSL predicate/boolean expression and keeps only the
/// matching rows.
pub fn filter(table: &Table, json_expr: &str) -> Result<Table, Error> {
    let parsed = expr::parse(json_expr, table.schema())?;
    filter::filter(table, &parsed)
}

/// Keeps only rows where every column is non-null.
pub fn drop_na(table: &Table) -> Result<Table, Error> {
    filter::drop_na(table)
}

/// Reads one row out of `table` as one string per column, with a null
/// sentinel.
pub fn row_at(table: &Table, index: usize) -> Vec<String> {
    table::row_at(table, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use table::HeaderPolicy;

    #[test]
    fn end_to_end_csv_to_filtered_table() {
        let raw = parse_csv_buffer(b"a,b,c\n-1,5,foo\n2,10,bar\n3,0,baz\n-4,-10,\n5,-5,1\n").unwrap();
        let table = csv_to_table(raw, HeaderPolicy::TakeFirstRowAsHeaders, None).unwrap();
        assert_eq!(table.num_rows(), 5);

        let result = filter(&table, r#"{"predicate": "gt", "arguments": [{"column": "a"}, {"column": "b"}]}"#).unwrap();
        assert_eq!(result.num_rows(), 3);
    }

    #[test]
    fn row_at_uses_na_sentinel_for_nulls() {
        let raw = parse_csv_buffer(b"a\n1\n\n3\n").unwrap();
        let table = csv_to_table(raw, HeaderPolicy::TakeFirstRowAsHeaders, None).unwrap();
        assert_eq!(row_at(&table, 1), vec!["NA".to_string()]);
        assert_eq!(row_at(&table, 0), vec!["1".to_string()]);
    }
}
