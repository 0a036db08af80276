//! JSON DSL → AST parsing with arity and type validation.
//!
//! Type checking happens during parsing rather than as a separate pass:
//! each recursive call both builds an [`Expr`] node and infers its result
//! [`DataType`], so a mismatch (string column compared to a numeric
//! literal, a non-literal regex pattern, a non-boolean operand to `and`)
//! is reported at the point it occurs, against the schema the expression
//! will actually be evaluated over.

use serde_json::Value;

use crate::array::{DataType, Scalar, Schema};
use crate::expr::{ArithOp, BoolOp, Expr, PredOp};
use crate::Error;

/// Parses a DSL expression from a JSON document, validating it against
/// `schema`.
pub fn parse(json: &str, schema: &Schema) -> Result<Expr, Error> {
    let value: Value = serde_json::from_str(json)?;
    let (expr, _kind) = parse_value(&value, schema)?;
    Ok(expr)
}

fn is_numeric(dt: DataType) -> bool {
    matches!(dt, DataType::Int64 | DataType::Float64)
}

fn parse_value(value: &Value, schema: &Schema) -> Result<(Expr, DataType), Error> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok((Expr::Literal(Scalar::Int64(i)), DataType::Int64))
            } else {
                let f = n.as_f64().ok_or_else(|| {
                    Error::dsl_shape(format!("number literal '{}' is out of range", n))
                })?;
                Ok((Expr::Literal(Scalar::Float64(f)), DataType::Float64))
            }
        }
        Value::String(s) => Ok((Expr::Literal(Scalar::String(s.clone())), DataType::String)),
        Value::Object(map) => {
            if let Some(column) = map.get("column") {
                if map.len() != 1 {
                    return Err(Error::dsl_shape(
                        "a column reference must have exactly one key: 'column'",
                    ));
                }
                let name = column
                    .as_str()
                    .ok_or_else(|| Error::dsl_shape("'column' must be a string"))?;
                let index = schema
                    .index_of(name)
                    .ok_or_else(|| Error::dsl_shape(format!("unknown column '{}'", name)))?;
                let data_type = schema.field(index).data_type;
                return Ok((Expr::ColumnRef(name.to_string()), data_type));
            }

            if let Some(op_name) = map.get("operation") {
                return parse_operation(op_name, map, schema);
            }

            if let Some(pred_name) = map.get("predicate") {
                return parse_predicate(pred_name, map, schema);
            }

            if let Some(bool_name) = map.get("boolean") {
                return parse_boolean(bool_name, map, schema);
            }

            Err(Error::dsl_shape(
                "object must have one of 'column', 'operation', 'predicate', or 'boolean'",
            ))
        }
        other => Err(Error::dsl_shape(format!(
            "unexpected JSON value in DSL position: {}",
            other
        ))),
    }
}

fn parse_arguments(map: &serde_json::Map<String, Value>, schema: &Schema) -> Result<Vec<(Expr, DataType)>, Error> {
    let args = map
        .get("arguments")
        .ok_or_else(|| Error::dsl_shape("missing 'arguments'"))?
        .as_array()
        .ok_or_else(|| Error::dsl_shape("'arguments' must be an array"))?;
    args.iter().map(|a| parse_value(a, schema)).collect()
}

fn check_keys(map: &serde_json::Map<String, Value>, expected: &[&str]) -> Result<(), Error> {
    if map.len() != expected.len() || !expected.iter().all(|k| map.contains_key(*k)) {
        return Err(Error::dsl_shape(format!(
            "object must have exactly the keys: {}",
            expected.join(", ")
        )));
    }
    Ok(())
}

fn parse_operation(
    name: &Value,
    map: &serde_json::Map<String, Value>,
    schema: &Schema,
) -> Result<(Expr, DataType), Error> {
    check_keys(map, &["operation", "arguments"])?;
    let name = name
        .as_str()
        .ok_or_else(|| Error::dsl_shape("'operation' must be a string"))?;
    let (op, arity) = match name {
        "plus" => (ArithOp::Plus, 2),
        "minus" => (ArithOp::Minus, 2),
        "times" => (ArithOp::Times, 2),
        "divide" => (ArithOp::Divide, 2),
        "mod" => (ArithOp::Mod, 2),
        "negate" => (ArithOp::Negate, 1),
        other => return Err(Error::dsl_shape(format!("unknown operation '{}'", other))),
    };

    let args = parse_arguments(map, schema)?;
    if args.len() != arity {
        return Err(Error::dsl_shape(format!(
            "operation '{}' expects {} argument(s), got {}",
            name,
            arity,
            args.len()
        )));
    }
    for (_, kind) in &args {
        if !is_numeric(*kind) {
            return Err(Error::type_error(format!(
                "operation '{}' requires numeric operands",
                name
            )));
        }
    }
    let result_kind = if args.iter().any(|(_, k)| *k == DataType::Float64) {
        DataType::Float64
    } else {
        DataType::Int64
    };
    let exprs = args.into_iter().map(|(e, _)| e).collect();
    Ok((Expr::Operation(op, exprs), result_kind))
}

fn parse_predicate(
    name: &Value,
    map: &serde_json::Map<String, Value>,
    schema: &Schema,
) -> Result<(Expr, DataType), Error> {
    check_keys(map, &["predicate", "arguments"])?;
    let name = name
        .as_str()
        .ok_or_else(|| Error::dsl_shape("'predicate' must be a string"))?;
    let op = match name {
        "eq" => PredOp::Eq,
        "ne" => PredOp::Ne,
        "lt" => PredOp::Lt,
        "le" => PredOp::Le,
        "gt" => PredOp::Gt,
        "ge" => PredOp::Ge,
        "startsWith" => PredOp::StartsWith,
        "endsWith" => PredOp::EndsWith,
        "matches" => PredOp::Matches,
        other => return Err(Error::dsl_shape(format!("unknown predicate '{}'", other))),
    };

    let args = parse_arguments(map, schema)?;
    if args.len() != 2 {
        return Err(Error::dsl_shape(format!(
            "predicate '{}' expects 2 arguments, got {}",
            name,
            args.len()
        )));
    }

    let (left, left_kind) = &args[0];
    let (right, right_kind) = &args[1];

    match op {
        PredOp::Eq | PredOp::Ne | PredOp::Lt | PredOp::Le | PredOp::Gt | PredOp::Ge => {
            let same_category = (is_numeric(*left_kind) && is_numeric(*right_kind))
                || (*left_kind == DataType::String && *right_kind == DataType::String);
            if !same_category {
                return Err(Error::type_error(format!(
                    "predicate '{}' requires both operands to be the same category (numeric or string)",
                    name
                )));
            }
        }
        PredOp::StartsWith | PredOp::EndsWith | PredOp::Matches => {
            if *left_kind != DataType::String {
                return Err(Error::type_error(format!(
                    "predicate '{}' requires a string left operand",
                    name
                )));
            }
            let pattern = match right {
                Expr::Literal(Scalar::String(s)) => s,
                _ => {
                    return Err(Error::type_error(format!(
                        "predicate '{}' requires a string literal as its second argument",
                        name
                    )))
                }
            };
            if op == PredOp::Matches {
                regex::Regex::new(&format!("^(?:{})$", pattern))
                    .map_err(|e| Error::type_error(format!("invalid regex pattern '{}': {}", pattern, e)))?;
            }
        }
    }

    let exprs = vec![left.clone(), right.clone()];
    Ok((Expr::Predicate(op, exprs), DataType::Boolean))
}

fn parse_boolean(
    name: &Value,
    map: &serde_json::Map<String, Value>,
    schema: &Schema,
) -> Result<(Expr, DataType), Error> {
    check_keys(map, &["boolean", "arguments"])?;
    let name = name
        .as_str()
        .ok_or_else(|| Error::dsl_shape("'boolean' must be a string"))?;
    let (op, min_arity) = match name {
        "and" => (BoolOp::And, 2),
        "or" => (BoolOp::Or, 2),
        "not" => (BoolOp::Not, 1),
        other => return Err(Error::dsl_shape(format!("unknown boolean operator '{}'", other))),
    };

    let args = parse_arguments(map, schema)?;
    let arity_ok = if op == BoolOp::Not {
        args.len() == 1
    } else {
        args.len() >= min_arity
    };
    if !arity_ok {
        return Err(Error::dsl_shape(format!(
            "boolean operator '{}' expects {} argument(s), got {}",
            name,
            if op == BoolOp::Not { "1".to_string() } else { format!("at least {}", min_arity) },
            args.len()
        )));
    }
    for (_, kind) in &args {
        if *kind != DataType::Boolean {
            return Err(Error::type_error(format!(
                "boolean operator '{}' requires boolean operands",
                name
            )));
        }
    }
    let exprs = args.into_iter().map(|(e, _)| e).collect();
    Ok((Expr::Boolean(op, exprs), DataType::Boolean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("c", DataType::String, false),
        ])
    }

    #[test]
    fn parses_column_ref() {
        let expr = parse(r#"{"column": "a"}"#, &schema()).unwrap();
        assert_eq!(expr, Expr::ColumnRef("a".to_string()));
    }

    #[test]
    fn unknown_column_is_dsl_shape_error() {
        let err = parse(r#"{"column": "zzz"}"#, &schema()).unwrap_err();
        assert!(matches!(err, Error::DslShape(_)));
    }

    #[test]
    fn nested_arithmetic_parses() {
        let expr = parse(
            r#"{"operation": "plus", "arguments": [{"operation": "times", "arguments": [{"column": "a"}, 2]}, 4]}"#,
            &schema(),
        )
        .unwrap();
        match expr {
            Expr::Operation(ArithOp::Plus, args) => assert_eq!(args.len(), 2),
            _ => panic!("expected plus operation"),
        }
    }

    #[test]
    fn string_vs_numeric_literal_is_type_error() {
        let err = parse(r#"{"predicate": "eq", "arguments": [{"column": "c"}, 8]}"#, &schema()).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn or_with_one_argument_is_dsl_shape_error() {
        let err = parse(
            r#"{"boolean": "or", "arguments": [{"predicate": "eq", "arguments": [{"column": "a"}, 1]}]}"#,
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DslShape(_)));
    }

    #[test]
    fn matches_requires_string_literal_pattern() {
        let err = parse(
            r#"{"predicate": "matches", "arguments": [{"column": "c"}, {"column": "c"}]}"#,
            &schema(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }
}
