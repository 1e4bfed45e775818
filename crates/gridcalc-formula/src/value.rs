//! Values produced while evaluating formulas

use std::fmt;

use gridcalc_core::cell::{format_number, parse_number};
use gridcalc_core::{CellError, CellType, CellValue};

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
    /// Result of referencing a blank or missing cell
    Blank,
    /// Values of an area reference, row by row
    Array(Vec<Vec<FormulaValue>>),
}

impl FormulaValue {
    /// Convert to number the way arithmetic operators do.
    ///
    /// Blank is 0, booleans are 0/1 and numeric text is parsed. Anything
    /// else has no numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::Text(s) => parse_number(s),
            FormulaValue::Blank => Some(0.0),
            FormulaValue::Error(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Text(s) => {
                if s.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else {
                    None
                }
            }
            FormulaValue::Blank => Some(false),
            FormulaValue::Error(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Render as text, as concatenation does
    pub fn as_text(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Blank => String::new(),
            FormulaValue::Array(_) => CellError::Value.to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Iterate over the scalar values: an array yields its elements, a
    /// scalar yields itself
    pub fn scalars(&self) -> Box<dyn Iterator<Item = &FormulaValue> + '_> {
        match self {
            FormulaValue::Array(rows) => Box::new(rows.iter().flatten()),
            scalar => Box::new(std::iter::once(scalar)),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    /// Plain cell contents; a formula reads as its cached result
    fn from(value: &CellValue) -> Self {
        match value.effective_value() {
            CellValue::Blank => FormulaValue::Blank,
            CellValue::Numeric(n) => FormulaValue::Number(*n),
            CellValue::Text(s) => FormulaValue::Text(s.as_str().to_string()),
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Error(e) => FormulaValue::Error(*e),
            // Cached results are never formulas
            CellValue::Formula(_) => FormulaValue::Blank,
        }
    }
}

/// Final scalar result of evaluating a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CalculatedValue {
    Numeric(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl CalculatedValue {
    /// Package an evaluation result: blank becomes 0 and an array, which
    /// cannot live in one cell, becomes `#VALUE!`
    pub fn from_value(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => CalculatedValue::Numeric(n),
            FormulaValue::Text(s) => CalculatedValue::Text(s),
            FormulaValue::Boolean(b) => CalculatedValue::Boolean(b),
            FormulaValue::Error(e) => CalculatedValue::Error(e),
            FormulaValue::Blank => CalculatedValue::Numeric(0.0),
            FormulaValue::Array(_) => CalculatedValue::Error(CellError::Value),
        }
    }

    /// Cell type a cell holding this value would have
    pub fn cell_type(&self) -> CellType {
        match self {
            CalculatedValue::Numeric(_) => CellType::Numeric,
            CalculatedValue::Text(_) => CellType::Text,
            CalculatedValue::Boolean(_) => CellType::Boolean,
            CalculatedValue::Error(_) => CellType::Error,
        }
    }

    pub fn number_value(&self) -> Option<f64> {
        match self {
            CalculatedValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            CalculatedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn boolean_value(&self) -> Option<bool> {
        match self {
            CalculatedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn error_value(&self) -> Option<CellError> {
        match self {
            CalculatedValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<CalculatedValue> for CellValue {
    fn from(value: CalculatedValue) -> Self {
        match value {
            CalculatedValue::Numeric(n) => CellValue::Numeric(n),
            CalculatedValue::Text(s) => CellValue::text(s),
            CalculatedValue::Boolean(b) => CellValue::Boolean(b),
            CalculatedValue::Error(e) => CellValue::Error(e),
        }
    }
}

impl From<CalculatedValue> for FormulaValue {
    fn from(value: CalculatedValue) -> Self {
        match value {
            CalculatedValue::Numeric(n) => FormulaValue::Number(n),
            CalculatedValue::Text(s) => FormulaValue::Text(s),
            CalculatedValue::Boolean(b) => FormulaValue::Boolean(b),
            CalculatedValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl fmt::Display for CalculatedValue {
    /// Debug-friendly rendering: text is quoted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculatedValue::Numeric(n) => f.write_str(&format_number(*n)),
            CalculatedValue::Text(s) => write!(f, "\"{}\"", s),
            CalculatedValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CalculatedValue::Error(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number_coercion() {
        assert_eq!(FormulaValue::Blank.as_number(), Some(0.0));
        assert_eq!(FormulaValue::Boolean(true).as_number(), Some(1.0));
        assert_eq!(FormulaValue::Text(" 2.5 ".into()).as_number(), Some(2.5));
        assert_eq!(FormulaValue::Text("abc".into()).as_number(), None);
        assert_eq!(FormulaValue::Error(CellError::Na).as_number(), None);
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(FormulaValue::Number(3.0).as_text(), "3");
        assert_eq!(FormulaValue::Number(0.5).as_text(), "0.5");
        assert_eq!(FormulaValue::Boolean(false).as_text(), "FALSE");
        assert_eq!(FormulaValue::Error(CellError::Div0).as_text(), "#DIV/0!");
        assert_eq!(FormulaValue::Blank.as_text(), "");
    }

    #[test]
    fn test_packaging() {
        assert_eq!(
            CalculatedValue::from_value(FormulaValue::Blank),
            CalculatedValue::Numeric(0.0)
        );
        assert_eq!(
            CalculatedValue::from_value(FormulaValue::Array(vec![vec![FormulaValue::Number(1.0)]])),
            CalculatedValue::Error(CellError::Value)
        );
        let text = CalculatedValue::from_value(FormulaValue::Text("x".into()));
        assert_eq!(text.cell_type(), CellType::Text);
        assert_eq!(text.text_value(), Some("x"));
        assert_eq!(text.to_string(), "\"x\"");
    }

    #[test]
    fn test_from_cell_value() {
        let mut formula = gridcalc_core::FormulaCell::new(Vec::new());
        formula.set_cached_result(CellValue::Numeric(7.0));
        assert_eq!(
            FormulaValue::from(&CellValue::Formula(formula)),
            FormulaValue::Number(7.0)
        );
        assert_eq!(FormulaValue::from(&CellValue::text("a")), FormulaValue::Text("a".into()));
    }

    #[test]
    fn test_scalars() {
        let array = FormulaValue::Array(vec![
            vec![FormulaValue::Number(1.0), FormulaValue::Blank],
            vec![FormulaValue::Number(2.0), FormulaValue::Text("x".into())],
        ]);
        assert_eq!(array.scalars().count(), 4);
        assert_eq!(FormulaValue::Number(1.0).scalars().count(), 1);
    }
}
