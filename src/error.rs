//! The crate's unified error type.
//!
//! Every public entry point returns `Result<_, Error>`. Lower-level modules
//! define their own cause-specific error (currently just [`CsvSyntaxError`])
//! and fold it into `Error` via `#[from]`, the way a layered `thiserror`
//! error type typically composes.


/// A syntax error raised while scanning a CSV buffer.
#[derive(Debug, thiserror::Error)]
pub enum CsvSyntaxError {
    /// A quoted field was opened (with `"`) but never closed before the end
    /// of the input.
    #[error("unterminated quoted field starting at byte offset {0}")]
    UnterminatedQuotedField(usize),
}

/// The crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed CSV input.
    #[error("CSV syntax error: {0}")]
    CsvSyntax(#[from] CsvSyntaxError),

    /// The DSL payload was not valid JSON.
    #[error("invalid DSL JSON: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    /// The JSON was well-formed but didn't match the DSL grammar: unknown
    /// operator, wrong arity, missing `arguments`, unknown column.
    #[error("invalid DSL expression: {0}")]
    DslShape(String),

    /// A type mismatch: string vs. numeric comparison, a non-literal regex
    /// pattern, a non-boolean operand to a boolean operator, a cell that
    /// doesn't match a forced column type override.
    #[error("type error: {0}")]
    Type(String),

    /// Division or modulo by zero encountered while evaluating an
    /// expression.
    #[error("division by zero")]
    DivisionByZero,

    /// A filesystem error while opening or reading a CSV file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn dsl_shape(message: impl Into<String>) -> Self {
        Error::DslShape(message.into())
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Error::Type(message.into())
    }
}

/// Helper so callers can format `Error`'s inner messages without reaching
/// into the enum directly (used by the CLI).
impl Error {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::CsvSyntax(_) => "CsvSyntaxError",
            Error::JsonSyntax(_) => "JsonSyntaxError",
            Error::DslShape(_) => "DslShapeError",
            Error::Type(_) => "TypeError",
            Error::DivisionByZero => "DivisionByZero",
            Error::Io(_) => "IoError",
        }
    }
}

