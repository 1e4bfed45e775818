//! Client-facing formula evaluator
//!
//! Wraps a [`WorkbookEvaluator`] with the modes that write results back
//! into the workbook and the invalidation hooks clients call after editing
//! cells.

use gridcalc_core::{Cell, CellType, CellValue, Error, Workbook};
use gridcalc_formula::{
    compile_formula, CalculatedValue, CellKey, EvaluationCache, EvaluatorOptions, FormulaResult,
    WorkbookEvaluator,
};

use crate::calculation::EvaluationStats;

/// Evaluates formulas in a workbook and commits results
///
/// One evaluator serves one workbook at a time. Its cache is cleared by
/// the hooks below and, independently, whenever the workbook reports a new
/// generation.
#[derive(Debug, Default)]
pub struct FormulaEvaluator {
    inner: WorkbookEvaluator,
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            inner: WorkbookEvaluator::with_options(options),
        }
    }

    /// Values computed so far
    pub fn cache(&self) -> &EvaluationCache {
        self.inner.cache()
    }

    /// Evaluate a cell without changing it. Missing and blank cells give
    /// `None`.
    pub fn evaluate(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> FormulaResult<Option<CalculatedValue>> {
        self.inner.evaluate(workbook, sheet, row, col)
    }

    /// Evaluate a formula cell and store the result as its cached value.
    ///
    /// The cell stays a formula. Returns the type of the result, or `None`
    /// when the cell is not a formula.
    pub fn evaluate_formula_cell(
        &mut self,
        workbook: &mut Workbook,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> FormulaResult<Option<CellType>> {
        if !is_formula_cell(workbook, sheet, row, col)? {
            return Ok(None);
        }
        let value = match self.inner.evaluate(workbook, sheet, row, col)? {
            Some(value) => value,
            None => return Ok(None),
        };

        let result_type = value.cell_type();
        store_result(workbook, sheet, row, col, value)?;
        self.inner.sync_generation(workbook.generation());
        Ok(Some(result_type))
    }

    /// Evaluate a formula cell and replace the formula with its result.
    ///
    /// Non-formula cells are returned untouched; a missing cell gives
    /// `None`. Replacing a formula invalidates every cached value.
    ///
    /// Like [`Row::cell_mut`](crate::Row::cell_mut), the returned reference
    /// bypasses row re-registration: change the cell's type afterwards
    /// through [`Worksheet::update_cell`](crate::Worksheet::update_cell)
    /// rather than through this reference.
    pub fn evaluate_in_cell<'w>(
        &mut self,
        workbook: &'w mut Workbook,
        sheet: usize,
        row: u32,
        col: u16,
    ) -> FormulaResult<Option<&'w mut Cell>> {
        if is_formula_cell(workbook, sheet, row, col)? {
            if let Some(value) = self.inner.evaluate(workbook, sheet, row, col)? {
                let worksheet = worksheet_mut(workbook, sheet)?;
                worksheet.update_cell(row, col, move |cell| {
                    let transition = cell.set_cell_type(value.cell_type(), false)?;
                    match value {
                        CalculatedValue::Numeric(n) => cell.set_numeric_value(n)?,
                        CalculatedValue::Text(s) => cell.set_text_value(Some(s.as_str()))?,
                        CalculatedValue::Boolean(b) => cell.set_boolean_value(b)?,
                        CalculatedValue::Error(e) => cell.set_error_value(e)?,
                    };
                    Ok(transition)
                })?;
                self.inner.clear_cache();
            }
        }

        Ok(workbook
            .worksheet_mut(sheet)
            .and_then(|ws| ws.cell_at_mut(row, col)))
    }

    /// Evaluate every formula cell of every sheet and store the results as
    /// cached values.
    ///
    /// A cell whose evaluation fails is logged, counted and given `#VALUE!`;
    /// the pass goes on with the next cell.
    pub fn evaluate_all_formula_cells(
        &mut self,
        workbook: &mut Workbook,
    ) -> FormulaResult<EvaluationStats> {
        let mut stats = EvaluationStats::default();

        let keys: Vec<CellKey> = workbook
            .worksheets()
            .enumerate()
            .flat_map(|(sheet, ws)| {
                ws.formula_cells()
                    .map(move |(row, col, _)| CellKey::new(sheet, row, col))
            })
            .collect();
        stats.formula_count = keys.len();

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = match self.inner.evaluate(workbook, key.sheet, key.row, key.col) {
                Ok(Some(value)) => {
                    stats.cells_evaluated += 1;
                    if value.error_value().is_some() {
                        stats.error_values += 1;
                    }
                    value
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("failed to evaluate {}: {}", key, e);
                    stats.failures += 1;
                    CalculatedValue::Error(gridcalc_core::CellError::Value)
                }
            };
            results.push((key, value));
        }

        for (key, value) in results {
            store_result(workbook, key.sheet, key.row, key.col, value)?;
        }
        self.inner.sync_generation(workbook.generation());

        log::debug!(
            "evaluated {} of {} formula cells ({} failed)",
            stats.cells_evaluated,
            stats.formula_count,
            stats.failures
        );
        Ok(stats)
    }

    /// Compile and evaluate formula text in the context of `sheet` without
    /// changing any cell
    pub fn evaluate_formula_text(
        &mut self,
        workbook: &Workbook,
        sheet: usize,
        text: &str,
    ) -> FormulaResult<CalculatedValue> {
        let tokens = compile_formula(text)?;
        self.inner.evaluate_tokens(workbook, sheet, &tokens)
    }

    /// Drop every cached value
    pub fn clear_all_cached_result_values(&mut self) {
        self.inner.clear_cache();
    }

    /// A formula was set on the cell
    pub fn notify_set_formula(&mut self, sheet: usize, row: u32, col: u16) {
        self.invalidate("formula set", CellKey::new(sheet, row, col));
    }

    /// The cell's value changed
    pub fn notify_update_cell(&mut self, sheet: usize, row: u32, col: u16) {
        self.invalidate("cell updated", CellKey::new(sheet, row, col));
    }

    /// The cell was removed
    pub fn notify_delete_cell(&mut self, sheet: usize, row: u32, col: u16) {
        self.invalidate("cell deleted", CellKey::new(sheet, row, col));
    }

    /// A plain value was written to the cell
    pub fn set_cached_plain_value(&mut self, sheet: usize, row: u32, col: u16, value: &CellValue) {
        log::trace!("plain value {:?}", value);
        self.invalidate("plain value set", CellKey::new(sheet, row, col));
    }

    // Invalidation is all-or-nothing
    fn invalidate(&mut self, reason: &str, key: CellKey) {
        log::debug!("{} at {}; clearing evaluation cache", reason, key);
        self.inner.clear_cache();
    }
}

fn is_formula_cell(workbook: &Workbook, sheet: usize, row: u32, col: u16) -> FormulaResult<bool> {
    let worksheet = workbook
        .worksheet(sheet)
        .ok_or(Error::SheetOutOfBounds(sheet, workbook.sheet_count()))?;
    Ok(worksheet
        .cell_at(row, col)
        .map_or(false, |cell| cell.cell_type() == CellType::Formula))
}

fn worksheet_mut(
    workbook: &mut Workbook,
    sheet: usize,
) -> FormulaResult<&mut gridcalc_core::Worksheet> {
    let count = workbook.sheet_count();
    workbook
        .worksheet_mut(sheet)
        .ok_or_else(|| Error::SheetOutOfBounds(sheet, count).into())
}

fn store_result(
    workbook: &mut Workbook,
    sheet: usize,
    row: u32,
    col: u16,
    value: CalculatedValue,
) -> FormulaResult<()> {
    worksheet_mut(workbook, sheet)?.set_formula_result(row, col, value.into())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_core::CellError;
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 10.0).unwrap();
        sheet
            .set_cell_formula_tokens("B1", compile_formula("A1*2").unwrap())
            .unwrap();
        sheet
            .set_cell_formula_tokens("C1", compile_formula("A1&\"!\"").unwrap())
            .unwrap();
        workbook
    }

    #[test]
    fn test_evaluate_formula_cell_keeps_formula() {
        let mut workbook = workbook();
        let mut evaluator = FormulaEvaluator::new();

        let ty = evaluator.evaluate_formula_cell(&mut workbook, 0, 0, 2).unwrap();
        assert_eq!(ty, Some(CellType::Text));

        let cell = workbook.worksheet(0).unwrap().cell_at(0, 2).unwrap();
        assert_eq!(cell.cell_type(), CellType::Formula);
        assert_eq!(cell.cached_formula_result_type().unwrap(), CellType::Text);
        assert_eq!(cell.text_value().unwrap(), "10!");

        // Writing the result did not throw away the cache
        assert!(!evaluator.cache().is_empty());
        assert_eq!(evaluator.evaluate_formula_cell(&mut workbook, 0, 0, 0).unwrap(), None);
    }

    #[test]
    fn test_evaluate_in_cell_replaces_formula() {
        let mut workbook = workbook();
        let mut evaluator = FormulaEvaluator::new();

        let cell = evaluator
            .evaluate_in_cell(&mut workbook, 0, 0, 1)
            .unwrap()
            .unwrap();
        assert_eq!(cell.cell_type(), CellType::Numeric);
        assert_eq!(cell.numeric_value().unwrap(), 20.0);
        assert!(cell.formula_tokens().is_err());
        assert!(evaluator.cache().is_empty());

        assert!(evaluator.evaluate_in_cell(&mut workbook, 0, 5, 5).unwrap().is_none());
        let plain = evaluator.evaluate_in_cell(&mut workbook, 0, 0, 0).unwrap().unwrap();
        assert_eq!(plain.numeric_value().unwrap(), 10.0);
    }

    #[test]
    fn test_retype_evaluated_cell_through_worksheet() {
        let mut workbook = workbook();
        let mut evaluator = FormulaEvaluator::new();
        evaluator.evaluate_in_cell(&mut workbook, 0, 0, 1).unwrap();

        let sheet = workbook.worksheet_mut(0).unwrap();
        let t = sheet
            .update_cell(0, 1, |cell| cell.set_cell_type(CellType::Text, true))
            .unwrap();
        assert!(t.type_changed());

        let cell = sheet.cell("B1").unwrap().unwrap();
        assert_eq!(cell.cell_type(), CellType::Text);
        assert_eq!(cell.text_value().unwrap(), "20");
        assert_eq!(sheet.row(0).unwrap().physical_cell_count(), 3);
    }

    #[test]
    fn test_evaluate_all_counts_failures() {
        let mut workbook = workbook();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet
            .set_cell_formula_tokens("D1", compile_formula("E1").unwrap())
            .unwrap();
        sheet
            .set_cell_formula_tokens("E1", compile_formula("D1").unwrap())
            .unwrap();
        sheet
            .set_cell_formula_tokens("F1", compile_formula("1/0").unwrap())
            .unwrap();

        let stats = FormulaEvaluator::new()
            .evaluate_all_formula_cells(&mut workbook)
            .unwrap();
        assert_eq!(stats.formula_count, 5);
        assert_eq!(stats.cells_evaluated, 3);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.error_values, 1);

        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.cell("B1").unwrap().unwrap().numeric_value().unwrap(), 20.0);
        assert_eq!(
            sheet.cell("D1").unwrap().unwrap().error_value().unwrap(),
            Some(CellError::Value)
        );
        assert_eq!(
            sheet.cell("F1").unwrap().unwrap().error_value().unwrap(),
            Some(CellError::Div0)
        );
    }

    #[test]
    fn test_hooks_clear_cache() {
        let workbook = workbook();
        let mut evaluator = FormulaEvaluator::new();
        evaluator.evaluate(&workbook, 0, 0, 1).unwrap();
        assert_eq!(evaluator.cache().len(), 2);

        evaluator.notify_update_cell(0, 0, 0);
        assert!(evaluator.cache().is_empty());

        evaluator.evaluate(&workbook, 0, 0, 1).unwrap();
        evaluator.set_cached_plain_value(0, 0, 0, &CellValue::Numeric(1.0));
        assert!(evaluator.cache().is_empty());
    }

    #[test]
    fn test_evaluate_formula_text() {
        let workbook = workbook();
        let mut evaluator = FormulaEvaluator::new();
        assert_eq!(
            evaluator.evaluate_formula_text(&workbook, 0, "=SUM(A1:B1)").unwrap(),
            CalculatedValue::Numeric(30.0)
        );
        assert!(evaluator.evaluate_formula_text(&workbook, 0, "=SUM(").is_err());
    }
}
