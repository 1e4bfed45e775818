//! # gridcalc-core
//!
//! Core data structures for the gridcalc formula engine.
//!
//! This crate provides the fundamental types used throughout gridcalc:
//! - [`Cell`] and [`CellValue`] - Typed cell contents with a single type transition gate
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Token`] - Compiled formula tokens in reverse Polish order
//! - [`Workbook`], [`Worksheet`], [`Row`] - The sheet/row/cell index
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellType, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "42").unwrap();
//!
//! // Convert the text in place, keeping its value
//! let cell = sheet.cell_at_mut(0, 0).unwrap();
//! cell.set_cell_type(CellType::Numeric, true).unwrap();
//! assert_eq!(cell.numeric_value().unwrap(), 42.0);
//! ```

pub mod cell;
pub mod date;
pub mod error;
pub mod row;
pub mod token;
pub mod validation;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    Cell, CellAddress, CellError, CellRange, CellType, CellValue, FontRun, FormulaCell, RichText,
    SharedString, Transition,
};
pub use error::{Error, Result};
pub use row::Row;
pub use token::{FunctionId, OperatorKind, Token};
pub use validation::{
    ComparisonOperator, DataValidation, DvConstraint, ValidationErrorStyle, ValidationType,
};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (BIFF8 limit)
pub const MAX_ROWS: u32 = 65_536;

/// Maximum number of columns in a worksheet (BIFF8 limit)
pub const MAX_COLS: u16 = 256;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
