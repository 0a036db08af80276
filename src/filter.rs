//! Row-filter utilities: applying a boolean mask to a `Table`, and
//! dropping rows with any null column.

use crate::array::{
    Array, BooleanArray, ChunkCursor, ChunkedArray, Float64Array, Int64Array, StringArray, Table,
};
use crate::expr::{mask, Expr};
use crate::Error;

/// Produces a new Table containing exactly the rows where `mask` is
/// valid-and-true, preserving column order, names, and the order of
/// surviving rows.
pub fn apply_mask(table: &Table, mask: &BooleanArray) -> Result<Table, Error> {
    let keep: Vec<usize> = (0..table.num_rows())
        .filter(|&i| mask.is_valid(i) && mask.values[i])
        .collect();
    select_rows(table, &keep)
}

/// Evaluates `expr` as a mask and applies it to `table`: shorthand for
/// `apply_mask(table, mask(table, expr))`.
pub fn filter(table: &Table, expr: &Expr) -> Result<Table, Error> {
    let m = mask(table, expr)?;
    apply_mask(table, &m)
}

/// Keeps only rows where every column is non-null at that row. Walks each
/// column with a [`ChunkCursor`] rather than flattening first, so chunk
/// boundaries never need to be materialized.
pub fn drop_na(table: &Table) -> Result<Table, Error> {
    let num_rows = table.num_rows();
    let mut cursors: Vec<ChunkCursor<'_>> = table.columns().iter().map(|c| ChunkCursor::new(c.chunks())).collect();

    let mut keep = Vec::with_capacity(num_rows);
    for row in 0..num_rows {
        let mut all_valid = true;
        for cursor in &cursors {
            let (chunk, offset) = cursor.current().expect("row within bounds");
            if !chunk.is_valid(offset) {
                all_valid = false;
            }
        }
        if all_valid {
            keep.push(row);
        }
        for cursor in &mut cursors {
            cursor.advance();
        }
    }

    select_rows(table, &keep)
}

fn select_rows(table: &Table, keep: &[usize]) -> Result<Table, Error> {
    let mut new_columns = Vec::with_capacity(table.num_columns());
    for column in table.columns() {
        let flat = column.to_flat_array();
        new_columns.push(ChunkedArray::from_array(select_array(&flat, keep)));
    }
    Table::try_new(table.schema().clone(), new_columns)
}

fn select_array(array: &Array, keep: &[usize]) -> Array {
    match array {
        Array::Int64(a) => {
            let mut out = Int64Array::empty(a.validity.is_some());
            for &i in keep {
                if a.is_valid(i) {
                    out.push_value(a.values[i]);
                } else {
                    out.push_null();
                }
            }
            Array::Int64(out)
        }
        Array::Float64(a) => {
            let mut out = Float64Array::empty(a.validity.is_some());
            for &i in keep {
                if a.is_valid(i) {
                    out.push_value(a.values[i]);
                } else {
                    out.push_null();
                }
            }
            Array::Float64(out)
        }
        Array::String(a) => {
            let mut out = StringArray::empty(a.validity.is_some());
            for &i in keep {
                if a.is_valid(i) {
                    out.push_value(a.values[i].clone());
                } else {
                    out.push_null();
                }
            }
            Array::String(out)
        }
        Array::Boolean(a) => {
            let mut out = BooleanArray::empty(a.validity.is_some());
            for &i in keep {
                if a.is_valid(i) {
                    out.push_value(a.values[i]);
                } else {
                    out.push_null();
                }
            }
            Array::Boolean(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{DataType, Field, Schema};
    use crate::expr::parse;

    fn fixture_table() -> Table {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("c", DataType::String, false),
        ]);
        let columns = vec![
            ChunkedArray::from_array(Array::Int64(Int64Array::new(
                vec![1, 0, 3, 0, 5],
                Some(vec![true, false, true, false, true].into_iter().collect()),
            ))),
            ChunkedArray::from_array(Array::String(StringArray::all_valid(
                vec!["a", "b", "c", "d", "e"].into_iter().map(String::from).collect(),
            ))),
        ];
        Table::try_new(schema, columns).unwrap()
    }

    #[test]
    fn drop_na_removes_null_rows() {
        let table = fixture_table();
        let result = drop_na(&table).unwrap();
        assert_eq!(result.num_rows(), 3);
        if let Array::Int64(a) = result.column(0).to_flat_array() {
            assert_eq!(a.values, vec![1, 3, 5]);
        } else {
            panic!("expected int64 column");
        }
    }

    #[test]
    fn drop_na_is_idempotent() {
        let table = fixture_table();
        let once = drop_na(&table).unwrap();
        let twice = drop_na(&once).unwrap();
        assert_eq!(once.num_rows(), twice.num_rows());
    }

    #[test]
    fn filter_with_always_true_is_identity() {
        let table = fixture_table();
        let expr = parse(r#"{"predicate": "eq", "arguments": [1, 1]}"#, table.schema()).unwrap();
        let result = filter(&table, &expr).unwrap();
        assert_eq!(result.num_rows(), table.num_rows());
    }

    #[test]
    fn filter_with_always_false_is_empty() {
        let table = fixture_table();
        let expr = parse(r#"{"predicate": "eq", "arguments": [1, 2]}"#, table.schema()).unwrap();
        let result = filter(&table, &expr).unwrap();
        assert_eq!(result.num_rows(), 0);
    }
}
