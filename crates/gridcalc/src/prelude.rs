//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    CalculatedValue,
    Cell,
    CellAddress,
    CellError,
    CellRange,
    CellType,
    CellValue,
    // Data validation types
    DataValidation,
    DvConstraint,
    // Error types
    Error,
    // Evaluation types
    EvaluationStats,
    EvaluatorOptions,
    FormulaError,
    FormulaEvaluator,
    FormulaResult,
    Result,
    ValidationType,
    // Main types
    Workbook,
    // Extension traits
    WorkbookCalculationExt,
    Worksheet,
    WorksheetFormulaExt,
};
