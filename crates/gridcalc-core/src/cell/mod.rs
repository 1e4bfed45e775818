//! Cell-related types and utilities
//!
//! This module contains:
//! - [`Cell`] - A cell with its type transition gate
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`RichText`] - Text with font runs

mod address;
mod data;
mod rich_text;
mod value;

pub use address::{CellAddress, CellRange};
pub use data::{Cell, Transition};
pub use rich_text::{FontRun, RichText};
pub use value::{
    format_number, parse_number, CellError, CellType, CellValue, FormulaCell, SharedString,
};
