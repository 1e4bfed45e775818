//! Worksheets: sparse rows of cells plus per-sheet validation rules

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellValue, Transition};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::token::Token;
use crate::validation::DataValidation;

/// One named sheet. Rows are created on first write and keyed by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    validations: Vec<DataValidation>,
}

impl Worksheet {
    /// Empty sheet; names are only checked when the sheet joins a workbook
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            validations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    /// Row at `index`, created empty on first use
    pub fn create_row(&mut self, index: u32) -> Result<&mut Row> {
        match self.rows.entry(index) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(Row::new(index)?)),
        }
    }

    /// Drops the row together with every cell in it
    pub fn remove_row(&mut self, index: u32) -> Option<Row> {
        self.rows.remove(&index)
    }

    /// Present rows in ascending order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn physical_row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at an A1 address; `Ok(None)` when nothing is stored there
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    pub fn cell_at_mut(&mut self, row: u32, col: u16) -> Option<&mut Cell> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(col))
    }

    /// Cell at (row, col), created blank (with its row) if missing
    pub fn create_cell(&mut self, row: u32, col: u16) -> Result<&mut Cell> {
        CellAddress::check_bounds(row, col)?;
        self.create_row(row)?.create_cell(col)
    }

    /// Write a plain value at an A1 address
    pub fn set_cell_value<V: Into<CellValue>>(
        &mut self,
        address: &str,
        value: V,
    ) -> Result<Transition> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Write a plain value at (row, col).
    ///
    /// Scalars written to a formula cell replace its cached result; a
    /// formula value replaces the whole cell.
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<Transition> {
        let value = value.into();
        self.update_cell(row, col, move |cell| match value {
            CellValue::Blank => cell.set_blank(),
            CellValue::Numeric(n) => cell.set_numeric_value(n),
            CellValue::Text(text) => cell.set_rich_text_value(text),
            CellValue::Boolean(b) => cell.set_boolean_value(b),
            CellValue::Error(e) => cell.set_error_value(e),
            CellValue::Formula(formula) => {
                let transition = cell.set_formula_tokens(formula.tokens().to_vec())?;
                cell.set_cached_formula_result(formula.cached_result().clone())?;
                Ok(transition)
            }
        })
    }

    /// Make the cell a formula with already compiled tokens
    pub fn set_cell_formula_tokens(
        &mut self,
        address: &str,
        tokens: Vec<Token>,
    ) -> Result<Transition> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_tokens_at(addr.row, addr.col, tokens)
    }

    pub fn set_cell_formula_tokens_at(
        &mut self,
        row: u32,
        col: u16,
        tokens: Vec<Token>,
    ) -> Result<Transition> {
        self.update_cell(row, col, move |cell| cell.set_formula_tokens(tokens))
    }

    /// Run a gated mutation on the cell, creating it first if needed.
    ///
    /// The row re-files the cell when the mutation changed its type.
    pub fn update_cell<F>(&mut self, row: u32, col: u16, f: F) -> Result<Transition>
    where
        F: FnOnce(&mut Cell) -> Result<Transition>,
    {
        CellAddress::check_bounds(row, col)?;
        self.create_row(row)?.update_cell(col, f)
    }

    pub fn remove_cell(&mut self, address: &str) -> Result<Option<Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.remove_cell_at(addr.row, addr.col))
    }

    /// The row stays even if it becomes empty
    pub fn remove_cell_at(&mut self, row: u32, col: u16) -> Option<Cell> {
        self.rows.get_mut(&row).and_then(|r| r.remove_cell(col))
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::physical_cell_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Present cells, row by row
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.values().flat_map(Row::cells)
    }

    /// Present cells inside `range`, row by row
    pub fn cells_in(&self, range: &CellRange) -> impl Iterator<Item = &Cell> {
        let cols = range.start.col..=range.end.col;
        self.rows
            .range(range.start.row..=range.end.row)
            .flat_map(move |(_, row)| row.cells_in(cols.clone()))
    }

    /// `(row, col, tokens)` for every formula cell
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &[Token])> {
        self.iter_cells().filter_map(|cell| match cell.value() {
            CellValue::Formula(formula) => Some((cell.row(), cell.col(), formula.tokens())),
            _ => None,
        })
    }

    /// Replace the cached result of an existing formula cell
    pub fn set_formula_result(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        match self.cell_at_mut(row, col) {
            Some(cell) => cell.set_cached_formula_result(value),
            None => Err(Error::CellNotFound(CellAddress::new(row, col).to_string())),
        }
    }

    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.validations.push(validation);
    }

    pub fn data_validations(&self) -> &[DataValidation] {
        &self.validations
    }

    /// First rule whose ranges cover the cell
    pub fn data_validation_at(&self, row: u32, col: u16) -> Option<&DataValidation> {
        self.validations.iter().find(|v| v.applies_to(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellError, CellType};
    use crate::validation::DvConstraint;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_worksheet_is_empty() {
        let ws = Worksheet::new("Data");
        assert_eq!(ws.name(), "Data");
        assert!(ws.is_empty());
        assert_eq!(ws.physical_row_count(), 0);
    }

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value("B1", 42.0).unwrap();
        ws.set_cell_value("C1", true).unwrap();
        ws.set_cell_value("D1", CellError::Na).unwrap();

        assert_eq!(ws.cell("A1").unwrap().unwrap().text_value().unwrap(), "Hello");
        assert_eq!(ws.cell_at(0, 1).unwrap().value(), &CellValue::Numeric(42.0));
        assert!(ws.cell_at(0, 2).unwrap().boolean_value().unwrap());
        assert_eq!(ws.cell("D1").unwrap().unwrap().error_value().unwrap(), Some(CellError::Na));
        assert!(ws.cell("Z9").unwrap().is_none());
        assert_eq!(ws.cell_count(), 4);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ws = Worksheet::new("Test");
        assert!(matches!(
            ws.set_cell_value_at(70_000, 0, 1.0),
            Err(Error::RowOutOfBounds(70_000, 65535))
        ));
        assert!(ws.create_cell(0, 300).is_err());
        assert!(ws.set_cell_value("A70000", 1.0).is_err());
        assert!(ws.is_empty());
    }

    #[test]
    fn test_formula_cells() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula_tokens_at(2, 1, vec![Token::Int(5)]).unwrap();
        ws.set_cell_value_at(0, 0, 1.0).unwrap();

        let formulas: Vec<_> = ws.formula_cells().map(|(r, c, t)| (r, c, t.len())).collect();
        assert_eq!(formulas, vec![(2, 1, 1)]);

        // Freshly created formula cells start with a cached zero
        let cached = |ws: &Worksheet| ws.cell_at(2, 1).unwrap().value().effective_value().clone();
        assert_eq!(cached(&ws), CellValue::Numeric(0.0));

        ws.set_formula_result(2, 1, CellValue::Numeric(5.0)).unwrap();
        assert_eq!(cached(&ws), CellValue::Numeric(5.0));
        assert!(ws.set_formula_result(0, 0, CellValue::Blank).is_err());
        assert!(matches!(
            ws.set_formula_result(9, 9, CellValue::Blank),
            Err(Error::CellNotFound(_))
        ));
    }

    #[test]
    fn test_scalar_on_formula_updates_cache() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula_tokens("B2", vec![Token::Int(1)]).unwrap();
        let t = ws.set_cell_value("B2", "cached").unwrap();
        assert!(!t.type_changed());
        let cell = ws.cell("B2").unwrap().unwrap();
        assert_eq!(cell.cell_type(), CellType::Formula);
        assert_eq!(cell.text_value().unwrap(), "cached");
    }

    #[test]
    fn test_remove_cells_and_rows() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(5, 3, "A").unwrap();
        ws.set_cell_value_at(10, 7, "B").unwrap();

        assert_eq!(ws.rows().map(Row::index).collect::<Vec<_>>(), vec![5, 10]);

        let inside: Vec<_> = ws
            .cells_in(&CellRange::parse("A1:E20").unwrap())
            .map(|c| c.address().to_string())
            .collect();
        assert_eq!(inside, vec!["D6"]);

        assert!(ws.remove_cell("D6").unwrap().is_some());
        assert!(ws.remove_cell_at(5, 3).is_none());
        assert!(ws.remove_row(10).is_some());
        assert!(ws.is_empty());
        assert_eq!(ws.physical_row_count(), 1);
    }

    #[test]
    fn test_data_validations() {
        let mut ws = Worksheet::new("Test");
        let validation = DataValidation::new(DvConstraint::explicit_list(["Yes", "No"]))
            .with_range(CellRange::parse("A1:A10").unwrap());
        ws.add_data_validation(validation);

        assert!(ws.data_validation_at(4, 0).is_some());
        assert!(ws.data_validation_at(4, 1).is_none());
        assert!(ws.data_validation_at(10, 0).is_none());
        assert_eq!(ws.data_validations().len(), 1);
    }
}
