//! Formula error types

use thiserror::Error;

use crate::cache::CellKey;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula compilation or evaluation.
///
/// Spreadsheet errors such as `#DIV/0!` are values, not variants here.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Token kind the evaluator has no operation for
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    /// A value was cached twice for the same cell
    #[error("Value for {0} is already cached")]
    CacheConflict(CellKey),

    /// Circular reference
    #[error("Circular reference detected at {0}")]
    CircularReference(CellKey),

    /// Reference chain deeper than the configured limit
    #[error("Formula references nested deeper than {0} cells")]
    RecursionLimit(usize),

    /// Error from the cell store
    #[error(transparent)]
    Cell(#[from] gridcalc_core::Error),
}
