//! Rows own their cells

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::cell::{Cell, CellType, Transition};
use crate::error::{Error, Result};
use crate::MAX_ROWS;

/// Sparse cells of one row, keyed by column
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    index: u32,
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    pub fn new(index: u32) -> Result<Self> {
        if index >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(index, MAX_ROWS - 1));
        }
        Ok(Self {
            index,
            cells: BTreeMap::new(),
        })
    }

    /// 0-based
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Mutable access to an existing cell.
    ///
    /// Type changes made through the returned reference skip row
    /// re-registration; prefer [`Row::set_cell_type`].
    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Cell at `col`, created blank if missing
    pub fn create_cell(&mut self, col: u16) -> Result<&mut Cell> {
        match self.cells.entry(col) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(Cell::new(self.index, col)?)),
        }
    }

    pub fn remove_cell(&mut self, col: u16) -> Option<Cell> {
        self.cells.remove(&col)
    }

    /// Change a cell's type and re-register it if the tag changed
    pub fn set_cell_type(
        &mut self,
        col: u16,
        new_type: CellType,
        preserve_value: bool,
    ) -> Result<Transition> {
        self.update_cell(col, |cell| cell.set_cell_type(new_type, preserve_value))
    }

    /// Apply a mutation that may change the cell's type, creating the cell
    /// if needed.
    ///
    /// When the type tag changes the old entry is removed and the updated
    /// cell inserted in its place. A freshly created cell has no old entry.
    pub fn update_cell<F>(&mut self, col: u16, f: F) -> Result<Transition>
    where
        F: FnOnce(&mut Cell) -> Result<Transition>,
    {
        let created = !self.cells.contains_key(&col);
        let cell = self.create_cell(col)?;
        let transition = f(cell)?;
        if transition.type_changed() && !created {
            self.replace_entry(col);
        }
        Ok(transition)
    }

    fn replace_entry(&mut self, col: u16) {
        if let Some(cell) = self.cells.remove(&col) {
            log::trace!("re-registering {} as {}", cell.address(), cell.cell_type());
            self.cells.insert(col, cell);
        }
    }

    /// First column with a cell
    pub fn first_cell_num(&self) -> Option<u16> {
        self.cells.keys().next().copied()
    }

    /// One past the last column with a cell
    pub fn last_cell_num(&self) -> Option<u16> {
        self.cells.keys().next_back().map(|c| c + 1)
    }

    pub fn physical_cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in column order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Present cells whose column falls in `cols`
    pub fn cells_in(&self, cols: RangeInclusive<u16>) -> impl Iterator<Item = &Cell> {
        self.cells.range(cols).map(|(_, cell)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_cell_is_blank_and_idempotent() {
        let mut row = Row::new(4).unwrap();
        row.create_cell(2).unwrap().set_numeric_value(1.0).unwrap();
        let cell = row.create_cell(2).unwrap();
        assert_eq!(cell.value(), &CellValue::Numeric(1.0));
        assert_eq!((cell.row(), cell.col()), (4, 2));
        assert_eq!(row.physical_cell_count(), 1);
    }

    #[test]
    fn test_cell_bounds() {
        assert!(Row::new(65536).is_err());
        let mut row = Row::new(0).unwrap();
        assert!(matches!(
            row.create_cell(256),
            Err(Error::ColumnOutOfBounds(256, 255))
        ));
    }

    #[test]
    fn test_set_cell_type_through_row() {
        let mut row = Row::new(0).unwrap();
        let t = row.set_cell_type(3, CellType::Boolean, true).unwrap();
        assert!(t.type_changed());
        assert_eq!(row.cell(3).unwrap().value(), &CellValue::Boolean(false));

        let t = row.set_cell_type(3, CellType::Boolean, true).unwrap();
        assert!(!t.type_changed());
    }

    #[test]
    fn test_failed_update_keeps_cell() {
        let mut row = Row::new(0).unwrap();
        row.create_cell(0).unwrap().set_text_value(Some("x")).unwrap();
        assert!(row.set_cell_type(0, CellType::Numeric, true).is_err());
        assert_eq!(row.cell(0).unwrap().text_value().unwrap(), "x");
    }

    #[test]
    fn test_cell_span() {
        let mut row = Row::new(0).unwrap();
        assert_eq!(row.first_cell_num(), None);
        row.create_cell(7).unwrap();
        row.create_cell(3).unwrap();
        assert_eq!(row.first_cell_num(), Some(3));
        assert_eq!(row.last_cell_num(), Some(8));

        row.remove_cell(7);
        assert_eq!(row.last_cell_num(), Some(4));
        assert_eq!(row.cells().count(), 1);
        row.create_cell(5).unwrap();
        let cols: Vec<_> = row.cells_in(4..=9).map(Cell::col).collect();
        assert_eq!(cols, vec![5]);
    }
}
