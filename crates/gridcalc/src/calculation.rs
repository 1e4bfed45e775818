//! Whole-workbook calculation
//!
//! # Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_value("A2", 20.0).unwrap();
//! sheet.set_cell_formula("A3", "=A1+A2").unwrap();
//!
//! let stats = workbook.calculate().unwrap();
//! assert_eq!(stats.cells_evaluated, 1);
//! ```

use crate::{EvaluatorOptions, FormulaEvaluator, FormulaResult, Workbook};

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells evaluated successfully
    pub cells_evaluated: usize,
    /// Evaluated cells whose result is an error value such as `#DIV/0!`
    pub error_values: usize,
    /// Cells whose evaluation failed and now hold `#VALUE!`
    pub failures: usize,
}

/// Extension trait for Workbook to add calculation methods
pub trait WorkbookCalculationExt {
    /// Evaluate every formula and store the results as cached values
    fn calculate(&mut self) -> FormulaResult<EvaluationStats>;

    /// Calculate all formulas with custom options
    fn calculate_with_options(&mut self, options: EvaluatorOptions) -> FormulaResult<EvaluationStats>;
}

impl WorkbookCalculationExt for Workbook {
    fn calculate(&mut self) -> FormulaResult<EvaluationStats> {
        self.calculate_with_options(EvaluatorOptions::default())
    }

    fn calculate_with_options(&mut self, options: EvaluatorOptions) -> FormulaResult<EvaluationStats> {
        FormulaEvaluator::with_options(options).evaluate_all_formula_cells(self)
    }
}
