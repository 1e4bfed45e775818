//! A single cell and its type transition gate

use chrono::NaiveDateTime;

use super::value::{format_number, parse_number};
use super::{CellAddress, CellError, CellType, CellValue, FormulaCell, RichText};
use crate::date;
use crate::error::{Error, Result};
use crate::token::Token;

/// Outcome of a type transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Type before the transition
    pub previous: CellType,
    /// Type after the transition
    pub current: CellType,
    /// A formula's tokens were dropped; evaluation caches built on them are stale
    pub formula_discarded: bool,
}

impl Transition {
    /// Whether the type tag actually changed
    pub fn type_changed(&self) -> bool {
        self.previous != self.current
    }

    fn unchanged(ty: CellType) -> Self {
        Self {
            previous: ty,
            current: ty,
            formula_discarded: false,
        }
    }
}

/// A cell: coordinates, style and a typed value
///
/// Every change of type goes through [`Cell::set_cell_type`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    row: u32,
    col: u16,
    style_index: u16,
    value: CellValue,
}

impl Cell {
    /// Create a blank cell
    pub fn new(row: u32, col: u16) -> Result<Self> {
        CellAddress::check_bounds(row, col)?;
        Ok(Self {
            row,
            col,
            style_index: 0,
            value: CellValue::Blank,
        })
    }

    /// Create a blank cell with a style
    pub fn with_style(row: u32, col: u16, style_index: u16) -> Result<Self> {
        let mut cell = Self::new(row, col)?;
        cell.style_index = style_index;
        Ok(cell)
    }

    /// Row index (0-based)
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column index (0-based)
    pub fn col(&self) -> u16 {
        self.col
    }

    /// Relative A1 address of this cell
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }

    /// Style index; travels with the cell through every type change
    pub fn style_index(&self) -> u16 {
        self.style_index
    }

    /// Set the style index
    pub fn set_style_index(&mut self, style_index: u16) {
        self.style_index = style_index;
    }

    /// Current value
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Current type tag
    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    /// Type of the cached result of a formula cell
    pub fn cached_formula_result_type(&self) -> Result<CellType> {
        match &self.value {
            CellValue::Formula(f) => Ok(f.cached_result_type()),
            other => Err(Error::type_mismatch(CellType::Formula, other.cell_type())),
        }
    }

    // === Type transition gate ===

    /// Change the cell's type.
    ///
    /// With `preserve_value` the current value is carried over where a
    /// sensible conversion exists; otherwise the new type starts from its
    /// zero value. Re-entering the current type keeps the payload in place.
    /// On error the cell is left untouched.
    pub fn set_cell_type(&mut self, new_type: CellType, preserve_value: bool) -> Result<Transition> {
        let previous = self.cell_type();
        if previous == new_type {
            return Ok(Transition::unchanged(previous));
        }

        let next = if preserve_value {
            self.converted(new_type)?
        } else if new_type == CellType::Formula && previous == CellType::Blank {
            seeded_formula()
        } else {
            zero_value(new_type)
        };

        let formula_discarded = previous == CellType::Formula && !next.is_formula();
        if formula_discarded {
            log::debug!(
                "formula discarded at {} ({} -> {})",
                self.address(),
                previous,
                next.cell_type()
            );
        }

        self.value = next;
        Ok(Transition {
            previous,
            current: self.cell_type(),
            formula_discarded,
        })
    }

    /// Same as [`Cell::set_cell_type`] but takes a numeric type code
    pub fn set_cell_type_code(&mut self, code: i32, preserve_value: bool) -> Result<Transition> {
        self.set_cell_type(CellType::from_code(code)?, preserve_value)
    }

    fn converted(&self, new_type: CellType) -> Result<CellValue> {
        let current = &self.value;
        Ok(match new_type {
            CellType::Blank => CellValue::Blank,
            CellType::Formula => match current {
                CellValue::Blank => seeded_formula(),
                scalar => CellValue::Formula(FormulaCell::with_cached(Vec::new(), scalar.clone())),
            },
            CellType::Numeric => CellValue::Numeric(to_number(current.effective_value())?),
            CellType::Text => match current.effective_value() {
                // A formula that never produced a result has no text to keep
                CellValue::Blank if current.is_formula() => CellValue::Blank,
                CellValue::Text(text) => CellValue::Text(text.clone()),
                other => CellValue::text(to_text(other)),
            },
            CellType::Boolean => CellValue::Boolean(to_bool(current.effective_value())),
            CellType::Error => CellValue::Error(CellError::Value),
        })
    }

    // === Typed setters ===
    //
    // On a formula cell the scalar setters replace the cached result and
    // keep the formula.

    /// Set a numeric value
    pub fn set_numeric_value(&mut self, value: f64) -> Result<Transition> {
        self.set_scalar(CellValue::Numeric(value))
    }

    /// Set a plain text value; `None` blanks the cell
    pub fn set_text_value(&mut self, value: Option<&str>) -> Result<Transition> {
        match value {
            Some(text) => self.set_scalar(CellValue::text(text)),
            None => self.set_cell_type(CellType::Blank, false),
        }
    }

    /// Set a formatted text value
    pub fn set_rich_text_value(&mut self, value: RichText) -> Result<Transition> {
        self.set_scalar(CellValue::Text(value))
    }

    /// Set a boolean value
    pub fn set_boolean_value(&mut self, value: bool) -> Result<Transition> {
        self.set_scalar(CellValue::Boolean(value))
    }

    /// Set an error value
    pub fn set_error_value(&mut self, value: CellError) -> Result<Transition> {
        self.set_scalar(CellValue::Error(value))
    }

    /// Set an error value from its BIFF code
    pub fn set_error_code(&mut self, code: u8) -> Result<Transition> {
        let error = CellError::from_code(code)
            .ok_or_else(|| Error::other(format!("unknown error code 0x{:02X}", code)))?;
        self.set_error_value(error)
    }

    /// Set a date as an Excel serial number
    pub fn set_date_value(&mut self, value: NaiveDateTime, date_1904: bool) -> Result<Transition> {
        self.set_numeric_value(date::to_serial(value, date_1904))
    }

    /// Make the cell a formula with the given tokens
    pub fn set_formula_tokens(&mut self, tokens: Vec<Token>) -> Result<Transition> {
        let transition = self.set_cell_type(CellType::Formula, false)?;
        if let CellValue::Formula(formula) = &mut self.value {
            formula.set_tokens(tokens);
        }
        Ok(transition)
    }

    /// Make the cell blank
    pub fn set_blank(&mut self) -> Result<Transition> {
        self.set_cell_type(CellType::Blank, false)
    }

    /// Store a computed result on a formula cell
    pub fn set_cached_formula_result(&mut self, value: CellValue) -> Result<()> {
        match &mut self.value {
            CellValue::Formula(formula) => {
                formula.set_cached_result(value);
                Ok(())
            }
            other => Err(Error::type_mismatch(CellType::Formula, other.cell_type())),
        }
    }

    fn set_scalar(&mut self, value: CellValue) -> Result<Transition> {
        if let CellValue::Formula(formula) = &mut self.value {
            formula.set_cached_result(value);
            return Ok(Transition::unchanged(CellType::Formula));
        }
        let transition = self.set_cell_type(value.cell_type(), false)?;
        self.value = value;
        Ok(transition)
    }

    // === Accessors ===
    //
    // Blank reads as 0 / "" / false. Formula cells answer from their
    // cached result. Any other mismatch is an error.

    /// Numeric value
    pub fn numeric_value(&self) -> Result<f64> {
        match self.value.effective_value() {
            CellValue::Blank => Ok(0.0),
            CellValue::Numeric(n) => Ok(*n),
            other => Err(self.mismatch(CellType::Numeric, other)),
        }
    }

    /// Text value
    pub fn text_value(&self) -> Result<&str> {
        self.rich_text_value()
            .map(|text| text.map_or("", |t| t.as_str()))
    }

    /// Formatted text value; `None` for a blank cell
    pub fn rich_text_value(&self) -> Result<Option<&RichText>> {
        match self.value.effective_value() {
            CellValue::Blank => Ok(None),
            CellValue::Text(text) => Ok(Some(text)),
            other => Err(self.mismatch(CellType::Text, other)),
        }
    }

    /// Boolean value
    pub fn boolean_value(&self) -> Result<bool> {
        match self.value.effective_value() {
            CellValue::Blank => Ok(false),
            CellValue::Boolean(b) => Ok(*b),
            other => Err(self.mismatch(CellType::Boolean, other)),
        }
    }

    /// Error value; `None` for a blank cell
    pub fn error_value(&self) -> Result<Option<CellError>> {
        match self.value.effective_value() {
            CellValue::Blank => Ok(None),
            CellValue::Error(e) => Ok(Some(*e)),
            other => Err(self.mismatch(CellType::Error, other)),
        }
    }

    /// Date value; `None` for a blank cell or a serial outside the date range
    pub fn date_value(&self, date_1904: bool) -> Result<Option<NaiveDateTime>> {
        if self.value.effective_value().is_blank() {
            return Ok(None);
        }
        let serial = self.numeric_value()?;
        Ok(date::from_serial(serial, date_1904))
    }

    /// Compiled formula tokens
    pub fn formula_tokens(&self) -> Result<&[Token]> {
        match &self.value {
            CellValue::Formula(formula) => Ok(formula.tokens()),
            other => Err(Error::type_mismatch(CellType::Formula, other.cell_type())),
        }
    }

    fn mismatch(&self, expected: CellType, found: &CellValue) -> Error {
        log::trace!("{} read as {} but holds {}", self.address(), expected, found.cell_type());
        Error::type_mismatch(expected, found.cell_type())
    }
}

fn zero_value(ty: CellType) -> CellValue {
    match ty {
        CellType::Blank => CellValue::Blank,
        CellType::Numeric => CellValue::Numeric(0.0),
        CellType::Text => CellValue::text(""),
        CellType::Boolean => CellValue::Boolean(false),
        CellType::Error => CellValue::Error(CellError::Value),
        CellType::Formula => CellValue::Formula(FormulaCell::new(Vec::new())),
    }
}

fn seeded_formula() -> CellValue {
    CellValue::Formula(FormulaCell::with_cached(Vec::new(), CellValue::Numeric(0.0)))
}

fn to_number(value: &CellValue) -> Result<f64> {
    match value {
        CellValue::Blank => Ok(0.0),
        CellValue::Numeric(n) => Ok(*n),
        CellValue::Text(text) => {
            parse_number(text.as_str()).ok_or_else(|| Error::InvalidNumber(text.to_string()))
        }
        other => Err(Error::type_mismatch(CellType::Numeric, other.cell_type())),
    }
}

fn to_text(value: &CellValue) -> String {
    match value {
        CellValue::Blank => String::new(),
        CellValue::Numeric(n) => format_number(*n),
        CellValue::Text(text) => text.to_string(),
        CellValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        CellValue::Error(e) => e.as_str().to_string(),
        CellValue::Formula(formula) => to_text(formula.cached_result()),
    }
}

// Error and blank become false; there is no principled conversion for them.
fn to_bool(value: &CellValue) -> bool {
    match value {
        CellValue::Boolean(b) => *b,
        CellValue::Numeric(n) => *n != 0.0,
        CellValue::Text(text) => text.as_str().trim().eq_ignore_ascii_case("true"),
        CellValue::Blank | CellValue::Error(_) => false,
        CellValue::Formula(formula) => to_bool(formula.cached_result()),
    }
}
