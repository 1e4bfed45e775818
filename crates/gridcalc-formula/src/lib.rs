//! # gridcalc-formula
//!
//! Formula compiler and evaluator for gridcalc.
//!
//! This crate provides:
//! - Formula compilation (text → RPN [`Token`](gridcalc_core::Token)s) and rendering back to text
//! - The operation dispatch table for operators and built-in functions
//! - A per-evaluator cache of computed cell values
//! - The recursive workbook evaluator with cycle detection
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::Workbook;
//! use gridcalc_formula::{compile_formula, CalculatedValue, WorkbookEvaluator};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A2", 5.0).unwrap();
//! sheet.set_cell_formula_tokens("A1", compile_formula("A2+1").unwrap()).unwrap();
//!
//! let mut evaluator = WorkbookEvaluator::new();
//! let value = evaluator.evaluate(&workbook, 0, 0, 0).unwrap();
//! assert_eq!(value, Some(CalculatedValue::Numeric(6.0)));
//! ```

pub mod cache;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod operation;
pub mod value;

pub use cache::{CellKey, EvaluationCache};
pub use compiler::{compile_formula, render_formula, MAX_NESTING};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{EvaluatorOptions, WorkbookEvaluator};
pub use operation::{
    ArithmeticOperator, FunctionOperation, Operation, RelationalOperator, UnaryOperator,
};
pub use value::{CalculatedValue, FormulaValue};
