//! Type deduction: classifying cells and folding per-column
//! classifications into one [`ColumnType`].

use crate::array::DataType;
use crate::number::{parse_float64, parse_int64};

/// The classification of a single cell, before folding across a column.
/// Distinct from [`DataType`] because a cell (unlike a materialized
/// column) can be `Na`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Na,
    Int64,
    Float64,
    String,
}

/// Classifies one cell: empty is `Na`, otherwise the most specific
/// numeric type that parses the whole cell, falling back to `String`.
pub fn deduce_cell_type(cell: &str) -> CellType {
    if cell.is_empty() {
        return CellType::Na;
    }
    if parse_int64(cell).is_some() {
        return CellType::Int64;
    }
    if parse_float64(cell).is_some() {
        return CellType::Float64;
    }
    CellType::String
}

/// Classifies one cell as a logical type, with `None` standing in for NA
/// — a cell-level classification has no "column is all NA, default to
/// nullable string" fallback to apply.
pub fn deduce_type(cell: &str) -> Option<DataType> {
    match deduce_cell_type(cell) {
        CellType::Na => None,
        CellType::Int64 => Some(DataType::Int64),
        CellType::Float64 => Some(DataType::Float64),
        CellType::String => Some(DataType::String),
    }
}

/// The deduced type of a whole column, folded from its cells' [`CellType`]
/// classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    pub data_type: DataType,
    pub nullable: bool,
    /// True if every cell in the column was empty.
    pub all_na: bool,
}

impl ColumnType {
    /// The type a column of nothing but empty cells materializes as:
    /// a nullable string, unless the caller overrides it.
    pub fn all_na_default() -> Self {
        ColumnType {
            data_type: DataType::String,
            nullable: true,
            all_na: true,
        }
    }
}

/// One step of the column-type fold: `Na ∪ T = T`,
/// `Int64 ∪ Float64 = Float64`, `String ∪ anything = String`.
fn fold_cell_type(acc: Option<CellType>, cell: CellType) -> Option<CellType> {
    match (acc, cell) {
        (None, t) => Some(t),
        (Some(CellType::Na), t) => Some(t),
        (Some(a), CellType::Na) => Some(a),
        (Some(CellType::String), _) | (Some(_), CellType::String) => Some(CellType::String),
        (Some(CellType::Int64), CellType::Float64) | (Some(CellType::Float64), CellType::Int64) => {
            Some(CellType::Float64)
        }
        (Some(a), b) if a == b => Some(a),
        (Some(_), _) => Some(CellType::String),
    }
}

/// Folds a sequence of per-cell classifications into a column's
/// [`ColumnType`].
pub fn fold_column_type<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut folded: Option<CellType> = None;
    let mut saw_na = false;

    for cell in cells {
        let cell_type = deduce_cell_type(cell);
        if cell_type == CellType::Na {
            saw_na = true;
        }
        folded = fold_cell_type(folded, cell_type);
    }

    match folded {
        None | Some(CellType::Na) => ColumnType::all_na_default(),
        Some(CellType::Int64) => ColumnType {
            data_type: DataType::Int64,
            nullable: saw_na,
            all_na: false,
        },
        Some(CellType::Float64) => ColumnType {
            data_type: DataType::Float64,
            nullable: saw_na,
            all_na: false,
        },
        Some(CellType::String) => ColumnType {
            data_type: DataType::String,
            nullable: saw_na,
            all_na: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduces_individual_cells() {
        assert_eq!(deduce_cell_type(""), CellType::Na);
        assert_eq!(deduce_cell_type("5"), CellType::Int64);
        assert_eq!(deduce_cell_type("5.0"), CellType::Float64);
        assert_eq!(deduce_cell_type("five"), CellType::String);
    }

    #[test]
    fn folds_mixed_column_scenario() {
        let first_two = fold_column_type(vec!["5", "5.0"]);
        assert_eq!(first_two.data_type, DataType::Float64);
        assert!(!first_two.nullable);

        let all_four = fold_column_type(vec!["5", "5.0", "five", ""]);
        assert_eq!(all_four.data_type, DataType::String);
        assert!(all_four.nullable);
    }

    #[test]
    fn all_na_column_defaults_to_nullable_string() {
        let ty = fold_column_type(vec!["", "", ""]);
        assert_eq!(ty.data_type, DataType::String);
        assert!(ty.nullable);
        assert!(ty.all_na);
    }

    #[test]
    fn deduce_type_maps_na_to_none() {
        assert_eq!(deduce_type(""), None);
        assert_eq!(deduce_type("5"), Some(DataType::Int64));
        assert_eq!(deduce_type("5.5"), Some(DataType::Float64));
        assert_eq!(deduce_type("abc"), Some(DataType::String));
    }

    #[test]
    fn all_int_column_is_not_nullable() {
        let ty = fold_column_type(vec!["1", "2", "3"]);
        assert_eq!(ty.data_type, DataType::Int64);
        assert!(!ty.nullable);
    }
}
