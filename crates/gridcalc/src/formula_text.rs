//! Formula text on worksheets
//!
//! Cells store compiled tokens; these helpers compile on the way in and
//! render on the way out.

use crate::{compile_formula, render_formula, CellAddress, FormulaResult, Transition, Worksheet};

/// Extension trait for Worksheet to work with formula text
pub trait WorksheetFormulaExt {
    /// Compile `formula` (with or without the leading `=`) into the cell
    fn set_cell_formula(&mut self, address: &str, formula: &str) -> FormulaResult<Transition>;

    /// Same as [`set_cell_formula`](Self::set_cell_formula) by row and column
    fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str)
        -> FormulaResult<Transition>;

    /// Formula text of a cell without the leading `=`, or `None` when the
    /// cell is missing or not a formula
    fn cell_formula(&self, address: &str) -> FormulaResult<Option<String>>;
}

impl WorksheetFormulaExt for Worksheet {
    fn set_cell_formula(&mut self, address: &str, formula: &str) -> FormulaResult<Transition> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    fn set_cell_formula_at(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
    ) -> FormulaResult<Transition> {
        let tokens = compile_formula(formula)?;
        Ok(self.set_cell_formula_tokens_at(row, col, tokens)?)
    }

    fn cell_formula(&self, address: &str) -> FormulaResult<Option<String>> {
        let tokens = match self.cell(address)? {
            Some(cell) if cell.value().is_formula() => cell.formula_tokens()?,
            _ => return Ok(None),
        };
        render_formula(tokens).map(Some)
    }
}
