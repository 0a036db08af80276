//! Table materialization: turning the scanner's `Vec<Vec<Cell>>` into a
//! typed, columnar [`Table`].

use crate::array::{
    Array, BooleanArray, ChunkedArray, DataType, Field, Float64Array, Int64Array, Schema,
    StringArray, Table,
};
use crate::csv::Cell;
use crate::number::{parse_float64, parse_int64};
use crate::types::{fold_column_type, ColumnType};
use crate::Error;

/// Where column names come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// The first row supplies field names; deduction runs over the rest.
    TakeFirstRowAsHeaders,
    /// Fabricate `"0"`, `"1"`, …; deduction runs over every row.
    GenerateColumnNames,
}

/// Builds a [`Table`] from scanned CSV rows.
///
/// Ragged rows (a row with fewer or more cells than the widest row) are
/// normalized by padding short rows with empty cells and truncating long
/// rows to the column count: every column ends up with exactly one cell
/// per data row, with short rows treated as trailing missing fields.
pub fn csv_to_table<'a>(
    rows: Vec<Vec<Cell<'a>>>,
    header_policy: HeaderPolicy,
    type_overrides: Option<&[Option<ColumnType>]>,
) -> Result<Table, Error> {
    let (names, data_rows) = match header_policy {
        HeaderPolicy::TakeFirstRowAsHeaders => {
            let mut rows = rows;
            if rows.is_empty() {
                return Table::try_new(Schema::new(Vec::new()), Vec::new());
            }
            let header = rows.remove(0);
            let names: Vec<String> = header.iter().map(|c| c.to_string()).collect();
            (names, rows)
        }
        HeaderPolicy::GenerateColumnNames => {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let names = (0..width).map(|i| i.to_string()).collect();
            (names, rows)
        }
    };

    let num_columns = names.len();
    let num_rows = data_rows.len();

    let mut fields = Vec::with_capacity(num_columns);
    let mut columns = Vec::with_capacity(num_columns);

    for col_idx in 0..num_columns {
        let cells: Vec<&str> = data_rows
            .iter()
            .map(|row| row.get(col_idx).map(|c| c.as_ref()).unwrap_or(""))
            .collect();

        let column_type = match type_overrides.and_then(|o| o.get(col_idx)).and_then(|o| *o) {
            Some(forced) => forced,
            None => fold_column_type(cells.iter().copied()),
        };

        // `nullable` is always recomputed from the cells actually present,
        // even for a forced override: an override only pins `data_type`,
        // it can't make an empty cell stop being NA.
        let (array, saw_na) = materialize_column(&cells, column_type.data_type)?;
        let field = Field::new(names[col_idx].clone(), column_type.data_type, saw_na);

        fields.push(field);
        columns.push(ChunkedArray::from_array(array));
    }

    debug_assert!(columns.iter().all(|c: &ChunkedArray| c.len() == num_rows));
    Table::try_new(Schema::new(fields), columns)
}

/// Returns one [`Scalar::to_string`]-formatted value per column at `index`,
/// with `Scalar::Null`'s `Display` impl ("NA") acting as the null sentinel.
pub fn row_at(table: &Table, index: usize) -> Vec<String> {
    (0..table.num_columns())
        .map(|col| table.column(col).scalar_at(index).to_string())
        .collect()
}

/// Materializes `cells` as `data_type`, treating an empty cell as NA
/// uniformly across every type (matching `deduce_cell_type`'s own
/// "empty is always NA" rule). Returns the array alongside whether any
/// cell was actually empty, so the caller can set `Field::nullable` from
/// what the data showed rather than from a caller-supplied hint.
fn materialize_column(cells: &[&str], data_type: DataType) -> Result<(Array, bool), Error> {
    let mut saw_na = false;
    match data_type {
        DataType::Int64 => {
            let mut array = Int64Array::empty(false);
            for cell in cells {
                if cell.is_empty() {
                    saw_na = true;
                    array.push_null();
                    continue;
                }
                match parse_int64(cell) {
                    Some(v) => array.push_value(v),
                    None => {
                        return Err(Error::type_error(format!(
                            "cell '{}' does not match forced column type int64",
                            cell
                        )))
                    }
                }
            }
            Ok((Array::Int64(array), saw_na))
        }
        DataType::Float64 => {
            let mut array = Float64Array::empty(false);
            for cell in cells {
                if cell.is_empty() {
                    saw_na = true;
                    array.push_null();
                    continue;
                }
                match parse_float64(cell) {
                    Some(v) => array.push_value(v),
                    None => {
                        return Err(Error::type_error(format!(
                            "cell '{}' does not match forced column type float64",
                            cell
                        )))
                    }
                }
            }
            Ok((Array::Float64(array), saw_na))
        }
        DataType::String => {
            let mut array = StringArray::empty(false);
            for cell in cells {
                if cell.is_empty() {
                    saw_na = true;
                    array.push_null();
                } else {
                    array.push_value((*cell).to_string());
                }
            }
            Ok((Array::String(array), saw_na))
        }
        DataType::Boolean => {
            // Never deduced from CSV, but a forced override could name it;
            // treat "true"/"false" literally for completeness.
            let mut array = BooleanArray::empty(false);
            for cell in cells {
                if cell.is_empty() {
                    saw_na = true;
                    array.push_null();
                    continue;
                }
                match cell.parse::<bool>() {
                    Ok(v) => array.push_value(v),
                    Err(_) => {
                        return Err(Error::type_error(format!(
                            "cell '{}' does not match forced column type boolean",
                            cell
                        )))
                    }
                }
            }
            Ok((Array::Boolean(array), saw_na))
        }
    }
}
