//! Evaluation: walking the AST over a `Table` to produce a value column
//! (`each`) or a boolean column (`mask`).

use crate::array::{Array, Bitmap, BooleanArray, DataType, Float64Array, Int64Array, Scalar, StringArray, Table};
use crate::expr::{ArithOp, BoolOp, Expr, PredOp};
use crate::Error;

/// A column produced mid-evaluation: either a conceptually constant
/// literal (never materialized) or a fully materialized array.
enum EvalColumn {
    Literal(Scalar),
    Materialized(Array),
}

impl EvalColumn {
    fn data_type(&self) -> DataType {
        match self {
            EvalColumn::Literal(s) => match s {
                Scalar::Int64(_) => DataType::Int64,
                Scalar::Float64(_) => DataType::Float64,
                Scalar::String(_) => DataType::String,
                Scalar::Boolean(_) => DataType::Boolean,
                Scalar::Null => DataType::String,
            },
            EvalColumn::Materialized(a) => a.data_type(),
        }
    }

    fn scalar_at(&self, row: usize) -> Scalar {
        match self {
            EvalColumn::Literal(s) => s.clone(),
            EvalColumn::Materialized(a) => a.scalar_at(row),
        }
    }
}

/// Evaluates `expr` over `table`, producing a value column.
pub fn each(table: &Table, expr: &Expr) -> Result<Array, Error> {
    match eval(expr, table)? {
        EvalColumn::Materialized(array) => Ok(array),
        EvalColumn::Literal(scalar) => Ok(broadcast_scalar(&scalar, table.num_rows())),
    }
}

/// Evaluates `expr` over `table`, producing a boolean column (used by
/// `filter`). Errors if `expr` does not produce a boolean result.
pub fn mask(table: &Table, expr: &Expr) -> Result<BooleanArray, Error> {
    match each(table, expr)? {
        Array::Boolean(array) => Ok(array),
        other => Err(Error::type_error(format!(
            "expression must produce a boolean column, got {}",
            other.data_type()
        ))),
    }
}

fn broadcast_scalar(scalar: &Scalar, len: usize) -> Array {
    match scalar {
        Scalar::Int64(v) => Array::Int64(Int64Array::all_valid(vec![*v; len])),
        Scalar::Float64(v) => Array::Float64(Float64Array::all_valid(vec![*v; len])),
        Scalar::String(v) => Array::String(StringArray::all_valid(vec![v.clone(); len])),
        Scalar::Boolean(v) => Array::Boolean(BooleanArray::all_valid(vec![*v; len])),
        Scalar::Null => {
            let mut array = StringArray::empty(true);
            for _ in 0..len {
                array.push_null();
            }
            Array::String(array)
        }
    }
}

fn eval(expr: &Expr, table: &Table) -> Result<EvalColumn, Error> {
    match expr {
        Expr::Literal(scalar) => Ok(EvalColumn::Literal(scalar.clone())),
        Expr::ColumnRef(name) => {
            let column = table
                .column_by_name(name)
                .ok_or_else(|| Error::dsl_shape(format!("unknown column '{}'", name)))?;
            Ok(EvalColumn::Materialized(column.to_flat_array()))
        }
        Expr::Operation(op, args) => Ok(EvalColumn::Materialized(eval_arith(*op, args, table)?)),
        Expr::Predicate(op, args) => Ok(EvalColumn::Materialized(eval_predicate(*op, args, table)?)),
        Expr::Boolean(op, args) => Ok(EvalColumn::Materialized(eval_boolean(*op, args, table)?)),
    }
}

fn scalar_as_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Int64(v) => Some(*v as f64),
        Scalar::Float64(v) => Some(*v),
        Scalar::Null => None,
        _ => None,
    }
}

fn scalar_as_i64(scalar: &Scalar) -> Option<i64> {
    match scalar {
        Scalar::Int64(v) => Some(*v),
        Scalar::Null => None,
        _ => None,
    }
}

/// Arithmetic operations: numeric promotion to DOUBLE if any operand is
/// DOUBLE; null propagation; division/mod by zero is a hard error, not a
/// null.
fn eval_arith(op: ArithOp, args: &[Expr], table: &Table) -> Result<Array, Error> {
    let row_count = table.num_rows();
    let cols: Vec<EvalColumn> = args.iter().map(|a| eval(a, table)).collect::<Result<_, _>>()?;
    let promote_to_float = cols.iter().any(|c| c.data_type() == DataType::Float64);

    if promote_to_float {
        let mut values = Vec::with_capacity(row_count);
        let mut validity = Bitmap::with_capacity(row_count);
        for row in 0..row_count {
            let operands: Vec<Option<f64>> = cols.iter().map(|c| scalar_as_f64(&c.scalar_at(row))).collect();
            if operands.iter().any(Option::is_none) {
                values.push(0.0);
                validity.push(false);
                continue;
            }
            let vals: Vec<f64> = operands.into_iter().map(Option::unwrap).collect();
            values.push(apply_arith_f64(op, &vals)?);
            validity.push(true);
        }
        Ok(Array::Float64(Float64Array::new(values, Some(validity))))
    } else {
        let mut values = Vec::with_capacity(row_count);
        let mut validity = Bitmap::with_capacity(row_count);
        for row in 0..row_count {
            let operands: Vec<Option<i64>> = cols.iter().map(|c| scalar_as_i64(&c.scalar_at(row))).collect();
            if operands.iter().any(Option::is_none) {
                values.push(0);
                validity.push(false);
                continue;
            }
            let vals: Vec<i64> = operands.into_iter().map(Option::unwrap).collect();
            values.push(apply_arith_i64(op, &vals)?);
            validity.push(true);
        }
        Ok(Array::Int64(Int64Array::new(values, Some(validity))))
    }
}

fn apply_arith_f64(op: ArithOp, vals: &[f64]) -> Result<f64, Error> {
    Ok(match op {
        ArithOp::Plus => vals[0] + vals[1],
        ArithOp::Minus => vals[0] - vals[1],
        ArithOp::Times => vals[0] * vals[1],
        ArithOp::Divide => {
            if vals[1] == 0.0 {
                return Err(Error::DivisionByZero);
            }
            vals[0] / vals[1]
        }
        ArithOp::Mod => {
            if vals[1] == 0.0 {
                return Err(Error::DivisionByZero);
            }
            vals[0] % vals[1]
        }
        ArithOp::Negate => -vals[0],
    })
}

/// Rust's native `/` and `%` on `i64` already truncate toward zero and
/// match the sign of the dividend, so no custom arithmetic is needed
/// here.
fn apply_arith_i64(op: ArithOp, vals: &[i64]) -> Result<i64, Error> {
    Ok(match op {
        ArithOp::Plus => vals[0] + vals[1],
        ArithOp::Minus => vals[0] - vals[1],
        ArithOp::Times => vals[0] * vals[1],
        ArithOp::Divide => {
            if vals[1] == 0 {
                return Err(Error::DivisionByZero);
            }
            vals[0] / vals[1]
        }
        ArithOp::Mod => {
            if vals[1] == 0 {
                return Err(Error::DivisionByZero);
            }
            vals[0] % vals[1]
        }
        ArithOp::Negate => -vals[0],
    })
}

fn eval_predicate(op: PredOp, args: &[Expr], table: &Table) -> Result<Array, Error> {
    let row_count = table.num_rows();
    let cols: Vec<EvalColumn> = args.iter().map(|a| eval(a, table)).collect::<Result<_, _>>()?;

    let mut values = Vec::with_capacity(row_count);
    let mut validity = Bitmap::with_capacity(row_count);

    match op {
        PredOp::Eq | PredOp::Ne | PredOp::Lt | PredOp::Le | PredOp::Gt | PredOp::Ge => {
            let is_string = cols[0].data_type() == DataType::String;
            let is_int = cols[0].data_type() == DataType::Int64 && cols[1].data_type() == DataType::Int64;
            for row in 0..row_count {
                let left = cols[0].scalar_at(row);
                let right = cols[1].scalar_at(row);
                if matches!(left, Scalar::Null) || matches!(right, Scalar::Null) {
                    values.push(false);
                    validity.push(false);
                    continue;
                }
                let result = if is_string {
                    let (l, r) = (scalar_as_str(&left), scalar_as_str(&right));
                    compare_ord(op, l.cmp(r))
                } else if is_int {
                    // Compare as i64 rather than promoting through f64: f64
                    // only has 53 bits of integer precision, so two distinct
                    // i64 values above 2^53 could otherwise compare equal.
                    let (l, r) = (
                        scalar_as_i64(&left).expect("non-null int64 scalar"),
                        scalar_as_i64(&right).expect("non-null int64 scalar"),
                    );
                    compare_ord(op, l.cmp(&r))
                } else {
                    let (l, r) = (
                        scalar_as_f64(&left).expect("non-null numeric scalar"),
                        scalar_as_f64(&right).expect("non-null numeric scalar"),
                    );
                    compare_ord(op, l.partial_cmp(&r).unwrap_or(std::cmp::Ordering::Less))
                };
                values.push(result);
                validity.push(true);
            }
        }
        PredOp::StartsWith | PredOp::EndsWith | PredOp::Matches => {
            let pattern = match &args[1] {
                Expr::Literal(Scalar::String(s)) => s.clone(),
                _ => unreachable!("parser guarantees a string literal pattern"),
            };
            let regex = if op == PredOp::Matches {
                Some(
                    regex::Regex::new(&format!("^(?:{})$", pattern))
                        .map_err(|e| Error::type_error(format!("invalid regex pattern: {}", e)))?,
                )
            } else {
                None
            };
            for row in 0..row_count {
                let left = cols[0].scalar_at(row);
                if matches!(left, Scalar::Null) {
                    values.push(false);
                    validity.push(false);
                    continue;
                }
                let text = scalar_as_str(&left);
                let result = match op {
                    PredOp::StartsWith => text.starts_with(pattern.as_str()),
                    PredOp::EndsWith => text.ends_with(pattern.as_str()),
                    PredOp::Matches => regex.as_ref().unwrap().is_match(text),
                    _ => unreachable!(),
                };
                values.push(result);
                validity.push(true);
            }
        }
    }

    Ok(Array::Boolean(BooleanArray::new(values, Some(validity))))
}

fn scalar_as_str(scalar: &Scalar) -> &str {
    match scalar {
        Scalar::String(s) => s.as_str(),
        _ => "",
    }
}

fn compare_ord(op: PredOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        PredOp::Eq => ordering == Equal,
        PredOp::Ne => ordering != Equal,
        PredOp::Lt => ordering == Less,
        PredOp::Le => ordering != Greater,
        PredOp::Gt => ordering == Greater,
        PredOp::Ge => ordering != Less,
        _ => unreachable!(),
    }
}

/// Three-valued AND: `AND(null, false) = false`, `AND(null, true) = null`,
/// `AND(true, true) = true`.
fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Three-valued OR: `OR(null, true) = true`, `OR(null, false) = null`,
/// `OR(false, false) = false`.
fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn eval_boolean(op: BoolOp, args: &[Expr], table: &Table) -> Result<Array, Error> {
    let row_count = table.num_rows();
    let cols: Vec<EvalColumn> = args.iter().map(|a| eval(a, table)).collect::<Result<_, _>>()?;

    let mut values = Vec::with_capacity(row_count);
    let mut validity = Bitmap::with_capacity(row_count);

    for row in 0..row_count {
        let operands: Vec<Option<bool>> = cols
            .iter()
            .map(|c| match c.scalar_at(row) {
                Scalar::Boolean(b) => Some(b),
                Scalar::Null => None,
                _ => unreachable!("parser guarantees boolean operands"),
            })
            .collect();

        let result = match op {
            BoolOp::Not => operands[0].map(|b| !b),
            BoolOp::And => operands.into_iter().fold(Some(true), and3),
            BoolOp::Or => operands.into_iter().fold(Some(false), or3),
        };

        match result {
            Some(b) => {
                values.push(b);
                validity.push(true);
            }
            None => {
                values.push(false);
                validity.push(false);
            }
        }
    }

    Ok(Array::Boolean(BooleanArray::new(values, Some(validity))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ChunkedArray, Field, Schema};
    use crate::expr::parse;

    fn fixture_table() -> Table {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Int64, false),
            Field::new("c", DataType::String, false),
            Field::new("d", DataType::Float64, true),
        ]);
        let columns = vec![
            ChunkedArray::from_array(Array::Int64(Int64Array::all_valid(vec![-1, 2, 3, -4, 5]))),
            ChunkedArray::from_array(Array::Int64(Int64Array::all_valid(vec![5, 10, 0, -10, -5]))),
            ChunkedArray::from_array(Array::String(StringArray::all_valid(
                vec!["foo", "bar", "baz", "", "1"].into_iter().map(String::from).collect(),
            ))),
            ChunkedArray::from_array(Array::Float64(Float64Array::new(
                vec![1.0, 2.0, 0.0, 4.0, 0.0],
                Some(Bitmap::from_iter(vec![true, true, false, true, false])),
            ))),
        ];
        Table::try_new(schema, columns).unwrap()
    }

    #[test]
    fn filter_with_mixed_types_scenario() {
        let table = fixture_table();
        let expr = parse(r#"{"predicate": "gt", "arguments": [{"column": "a"}, {"column": "b"}]}"#, table.schema()).unwrap();
        let m = mask(&table, &expr).unwrap();
        let selected: Vec<usize> = (0..5).filter(|&i| m.is_valid(i) && m.values[i]).collect();
        assert_eq!(selected, vec![2, 3, 4]);
    }

    #[test]
    fn int64_equality_does_not_lose_precision_above_2_53() {
        let schema = Schema::new(vec![Field::new("a", DataType::Int64, false)]);
        let table = Table::try_new(
            schema,
            vec![ChunkedArray::from_array(Array::Int64(Int64Array::all_valid(vec![9007199254740993])))],
        )
        .unwrap();
        // As f64, both sides round to the same value; as i64 they differ.
        let expr = parse(
            r#"{"predicate": "eq", "arguments": [{"column": "a"}, 9007199254740992]}"#,
            table.schema(),
        )
        .unwrap();
        let m = mask(&table, &expr).unwrap();
        assert!(!m.values[0]);
    }

    #[test]
    fn predicate_against_string_literal_scenario() {
        let table = fixture_table();
        let expr = parse(r#"{"predicate": "eq", "arguments": [{"column": "c"}, "baz"]}"#, table.schema()).unwrap();
        let m = mask(&table, &expr).unwrap();
        let selected: Vec<usize> = (0..5).filter(|&i| m.is_valid(i) && m.values[i]).collect();
        assert_eq!(selected, vec![2]);
    }

    #[test]
    fn nested_arithmetic_scenario() {
        let table = fixture_table();
        let expr = parse(
            r#"{"operation": "plus", "arguments": [{"operation": "times", "arguments": [{"column": "a"}, 2]}, 4]}"#,
            table.schema(),
        )
        .unwrap();
        let result = each(&table, &expr).unwrap();
        if let Array::Float64(a) = result {
            assert_eq!(a.values, vec![2.0, 8.0, 10.0, -4.0, 14.0]);
        } else {
            panic!("expected a float64 column");
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let table = fixture_table();
        let expr = parse(r#"{"operation": "divide", "arguments": [{"column": "a"}, 0]}"#, table.schema()).unwrap();
        let err = each(&table, &expr).unwrap_err();
        assert!(matches!(err, Error::DivisionByZero));
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        let table = fixture_table();
        let expr = parse(r#"{"operation": "plus", "arguments": [{"column": "d"}, 1]}"#, table.schema()).unwrap();
        let result = each(&table, &expr).unwrap();
        if let Array::Float64(a) = result {
            assert!(a.is_valid(0));
            assert!(!a.is_valid(2));
        } else {
            panic!("expected a float64 column");
        }
    }

    #[test]
    fn chunking_invariance_for_three_valued_mask() {
        // Ints 0..9 with nulls at i % 3 == 0, first as one array, then as
        // chunks of sizes 1, 2, 3, 4 (10 rows total via 1+2+3+4).
        let n = 10;
        let values: Vec<i64> = (0..n as i64).collect();
        let validity: Bitmap = (0..n).map(|i| i % 3 != 0).collect();

        let single_schema = Schema::new(vec![Field::new("a", DataType::Int64, true)]);
        let single = Table::try_new(
            single_schema.clone(),
            vec![ChunkedArray::from_array(Array::Int64(Int64Array::new(
                values.clone(),
                Some(validity.clone()),
            )))],
        )
        .unwrap();

        let mut chunks = Vec::new();
        let mut start = 0;
        for size in [1, 2, 3, 4] {
            let end = start + size;
            chunks.push(Array::Int64(Int64Array::new(
                values[start..end].to_vec(),
                Some((start..end).map(|i| validity.get(i)).collect()),
            )));
            start = end;
        }
        let chunked = Table::try_new(single_schema, vec![ChunkedArray::new(chunks)]).unwrap();

        let expr = parse(
            r#"{"predicate": "eq", "arguments": [{"operation": "mod", "arguments": [{"column": "a"}, 2]}, 0]}"#,
            single.schema(),
        )
        .unwrap();

        let mask_single = mask(&single, &expr).unwrap();
        let mask_chunked = mask(&chunked, &expr).unwrap();

        let selected_single: Vec<usize> = (0..n).filter(|&i| mask_single.is_valid(i) && mask_single.values[i]).collect();
        let selected_chunked: Vec<usize> = (0..n).filter(|&i| mask_chunked.is_valid(i) && mask_chunked.values[i]).collect();
        assert_eq!(selected_single, selected_chunked);

        let expected: Vec<usize> = (0..n).filter(|&i| i % 3 != 0 && i % 2 == 0).collect();
        assert_eq!(selected_single, expected);
    }
}
