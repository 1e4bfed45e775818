//! Error types for gridcalc-core

use thiserror::Error;

use crate::cell::CellType;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridcalc-core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u16),

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// A cell was read as a type it does not currently hold
    #[error("Cannot get a {expected} value from a {actual} cell")]
    TypeMismatch {
        expected: CellType,
        actual: CellType,
    },

    /// Text could not be read as a number
    #[error("Cannot read '{0}' as a number")]
    InvalidNumber(String),

    /// Numeric cell type code outside the known set
    #[error("Unknown cell type code: {0}")]
    UnknownCellType(i32),

    /// Operation not valid for the object's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed rich text formatting run
    #[error("Invalid rich text run: {0}")]
    InvalidRichText(String),

    /// No cell exists at the given position
    #[error("No cell at {0}")]
    CellNotFound(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: CellType, actual: CellType) -> Self {
        Error::TypeMismatch { expected, actual }
    }
}
