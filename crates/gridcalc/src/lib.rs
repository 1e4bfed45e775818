//! # gridcalc
//!
//! Typed spreadsheet cells with a caching formula evaluator.
//!
//! gridcalc models HSSF-style cells whose type changes go through a single
//! transition gate, and evaluates formulas stored as compiled tokens.
//!
//! ## Features
//!
//! - Cell types Numeric, Text, Formula, Blank, Boolean and Error with strict accessors
//! - Formula compilation and rendering
//! - Per-evaluator value cache, invalidated whenever the workbook changes
//! - Cycle detection and a configurable reference depth limit
//! - Data validation constraints
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A2", 5.0).unwrap();
//! sheet.set_cell_formula("A1", "=A2+1").unwrap();
//!
//! let mut evaluator = FormulaEvaluator::new();
//! let value = evaluator.evaluate(&workbook, 0, 0, 0).unwrap();
//! assert_eq!(value, Some(CalculatedValue::Numeric(6.0)));
//!
//! // Store the result in the formula cell
//! let result_type = evaluator.evaluate_formula_cell(&mut workbook, 0, 0, 0).unwrap();
//! assert_eq!(result_type, Some(CellType::Numeric));
//! ```

pub mod calculation;
pub mod evaluator;
pub mod formula_text;
pub mod prelude;

pub use calculation::{EvaluationStats, WorkbookCalculationExt};
pub use evaluator::FormulaEvaluator;
pub use formula_text::WorksheetFormulaExt;

// Re-export core types
pub use gridcalc_core::{
    // Cell types
    Cell,
    CellAddress,
    CellError,
    CellRange,
    CellType,
    CellValue,
    // Data validation types
    ComparisonOperator,
    DataValidation,
    DvConstraint,
    // Error types
    Error,
    FontRun,
    FormulaCell,
    FunctionId,
    OperatorKind,
    Result,
    RichText,
    Row,
    Token,
    Transition,
    ValidationErrorStyle,
    ValidationType,
    // Main types
    Workbook,
    WorkbookSettings,
    Worksheet,
    // Constants
    MAX_COLS,
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export formula types
pub use gridcalc_formula::{
    compile_formula, render_formula, CalculatedValue, CellKey, EvaluationCache, EvaluatorOptions,
    FormulaError, FormulaResult, FormulaValue, WorkbookEvaluator,
};
