//! The sheet index

use chrono::NaiveDateTime;

use crate::cell::{CellAddress, Transition};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// An ordered set of uniquely named worksheets plus workbook settings
///
/// Every
/// mutable access bumps [`Workbook::generation`], which lets derived data
/// such as formula results notice that inputs may have changed.
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    settings: WorkbookSettings,
    generation: u64,
}

impl Workbook {
    /// New workbook holding a single empty "Sheet1"
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
            settings: WorkbookSettings::default(),
            generation: 0,
        }
    }

    /// Modification counter; changes whenever the workbook may have changed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Mutable sheet access; counts as a modification even if nothing is written
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.touch();
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.get(self.sheet_index(name)?)
    }

    /// Position of the sheet called `name`, ignoring ASCII case
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a sheet named `SheetN`, picking the first free N
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = (self.worksheets.len() + 1..)
            .map(|n| format!("Sheet{}", n))
            .find(|name| self.sheet_index(name).is_none())
            .unwrap_or_default();
        self.add_worksheet_with_name(&name)
    }

    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        let index = self.worksheets.len();
        self.insert_worksheet(index, name)?;
        Ok(index)
    }

    /// Insert a new sheet so that it ends up at `index`
    pub fn insert_worksheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index > self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.check_new_name(name, None)?;
        self.worksheets.insert(index, Worksheet::new(name));
        self.touch();
        Ok(())
    }

    /// Drop a sheet together with all of its cells
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        self.check_index(index)?;
        self.touch();
        Ok(self.worksheets.remove(index))
    }

    pub fn move_worksheet(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let sheet = self.worksheets.remove(from);
        self.worksheets.insert(to, sheet);
        self.touch();
        Ok(())
    }

    /// Rename a sheet. References written against the old name stop resolving.
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        self.check_index(index)?;
        self.check_new_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        self.touch();
        Ok(())
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        self.touch();
        &mut self.settings
    }

    /// Store a date in a cell as a serial in this workbook's date system
    pub fn set_cell_date(
        &mut self,
        sheet: usize,
        address: &str,
        value: NaiveDateTime,
    ) -> Result<Transition> {
        let addr = CellAddress::parse(address)?;
        self.check_index(sheet)?;
        let date_1904 = self.settings.date_1904;
        self.touch();
        self.worksheets[sheet].update_cell(addr.row, addr.col, |cell| {
            cell.set_date_value(value, date_1904)
        })
    }

    /// Read a cell as a date in this workbook's date system.
    ///
    /// Missing and blank cells read as `None`.
    pub fn cell_date(&self, sheet: usize, address: &str) -> Result<Option<NaiveDateTime>> {
        let addr = CellAddress::parse(address)?;
        self.check_index(sheet)?;
        self.worksheets[sheet]
            .cell_at(addr.row, addr.col)
            .map_or(Ok(None), |cell| cell.date_value(self.settings.date_1904))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.worksheets.len() {
            Ok(())
        } else {
            Err(Error::SheetOutOfBounds(index, self.worksheets.len()))
        }
    }

    /// Name rules plus uniqueness; `keep` is the sheet being renamed, if any
    fn check_new_name(&self, name: &str, keep: Option<usize>) -> Result<()> {
        check_sheet_name(name)?;
        match self.sheet_index(name) {
            Some(existing) if Some(existing) != keep => {
                Err(Error::DuplicateSheetName(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// 1 to 31 characters, none of `: \ / ? * [ ]`
fn check_sheet_name(name: &str) -> Result<()> {
    const FORBIDDEN: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

    let problem = if name.is_empty() {
        Some("empty".to_string())
    } else if name.chars().count() > MAX_SHEET_NAME_LEN {
        Some(format!("longer than {} characters", MAX_SHEET_NAME_LEN))
    } else {
        name.chars()
            .find(|c| FORBIDDEN.contains(c))
            .map(|c| format!("contains '{}'", c))
    };
    match problem {
        Some(why) => Err(Error::InvalidSheetName(format!("'{}' is {}", name, why))),
        None => Ok(()),
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
}
