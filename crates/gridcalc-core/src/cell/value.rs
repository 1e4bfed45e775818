//! Cell value types

use std::fmt;
use std::sync::Arc;

use crate::cell::RichText;
use crate::error::{Error, Result};
use crate::token::Token;

/// The type tag of a cell
///
/// Numeric codes match the legacy binary format's cell type constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    /// Number (dates are numbers too)
    Numeric,
    /// Text, possibly with formatting runs
    Text,
    /// Formula with a cached result
    Formula,
    /// No value
    Blank,
    /// TRUE/FALSE
    Boolean,
    /// Error code (#DIV/0!, ...)
    Error,
}

impl CellType {
    /// All cell types, in code order
    pub const ALL: [CellType; 6] = [
        CellType::Numeric,
        CellType::Text,
        CellType::Formula,
        CellType::Blank,
        CellType::Boolean,
        CellType::Error,
    ];

    /// Get the numeric type code
    pub fn code(self) -> i32 {
        match self {
            CellType::Numeric => 0,
            CellType::Text => 1,
            CellType::Formula => 2,
            CellType::Blank => 3,
            CellType::Boolean => 4,
            CellType::Error => 5,
        }
    }

    /// Look up a cell type by its numeric code
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(CellType::Numeric),
            1 => Ok(CellType::Text),
            2 => Ok(CellType::Formula),
            3 => Ok(CellType::Blank),
            4 => Ok(CellType::Boolean),
            5 => Ok(CellType::Error),
            other => Err(Error::UnknownCellType(other)),
        }
    }

    /// Get the type name for error messages
    pub fn name(self) -> &'static str {
        match self {
            CellType::Numeric => "numeric",
            CellType::Text => "text",
            CellType::Formula => "formula",
            CellType::Blank => "blank",
            CellType::Boolean => "boolean",
            CellType::Error => "error",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents the value stored in a cell
///
/// Exactly one payload exists for any tag, so the type and the stored value
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Blank,

    /// Numeric value (all numbers stored as f64, including dates)
    Numeric(f64),

    /// Text value
    Text(RichText),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula with cached result
    Formula(FormulaCell),
}

impl CellValue {
    /// Create a new plain text value
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        CellValue::Text(RichText::plain(s))
    }

    /// Create a new formula value from compiled tokens
    pub fn formula(tokens: Vec<Token>) -> Self {
        CellValue::Formula(FormulaCell::new(tokens))
    }

    /// Get the type tag of this value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Blank => CellType::Blank,
            CellValue::Numeric(_) => CellType::Numeric,
            CellValue::Text(_) => CellType::Text,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Error(_) => CellType::Error,
            CellValue::Formula(_) => CellType::Formula,
        }
    }

    /// Check if the cell is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Get the effective value (cached value for formulas, value otherwise)
    pub fn effective_value(&self) -> &CellValue {
        match self {
            CellValue::Formula(f) => f.cached_result(),
            _ => self,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Numeric(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s.as_str()),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Formula(formula) => write!(f, "{}", formula.cached_result()),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Numeric(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Numeric(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl From<RichText> for CellValue {
    fn from(s: RichText) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Formula payload: compiled tokens plus the last computed result
///
/// The cached result is always a scalar; its tag is the formula's
/// cached result type. A cached [`CellValue::Blank`] means no result
/// has been computed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    tokens: Vec<Token>,
    cached: Box<CellValue>,
}

impl FormulaCell {
    /// Create a formula with no cached result
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_cached(tokens, CellValue::Blank)
    }

    /// Create a formula with a cached result
    pub fn with_cached(tokens: Vec<Token>, cached: CellValue) -> Self {
        let mut formula = Self {
            tokens,
            cached: Box::new(CellValue::Blank),
        };
        formula.set_cached_result(cached);
        formula
    }

    /// Compiled tokens
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Replace the compiled tokens, keeping the cached result
    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }

    /// The last computed result
    pub fn cached_result(&self) -> &CellValue {
        &self.cached
    }

    /// Type of the last computed result
    pub fn cached_result_type(&self) -> CellType {
        self.cached.cell_type()
    }

    /// Store a new cached result. A nested formula contributes its own cached result.
    pub fn set_cached_result(&mut self, value: CellValue) {
        *self.cached = match value {
            CellValue::Formula(inner) => *inner.cached,
            scalar => scalar,
        };
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NULL! - Intersection of two ranges is empty
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
        }
    }

    /// Parse an error string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            _ => None,
        }
    }

    /// Get the numeric error code (for BIFF format)
    pub fn code(&self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::Div0 => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::Na => 0x2A,
        }
    }

    /// Look up an error by its BIFF code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(CellError::Null),
            0x07 => Some(CellError::Div0),
            0x0F => Some(CellError::Value),
            0x17 => Some(CellError::Ref),
            0x1D => Some(CellError::Name),
            0x24 => Some(CellError::Num),
            0x2A => Some(CellError::Na),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a number as locale-independent cell text
///
/// Integral values print without a fraction; everything else uses the
/// shortest representation that reads back to the same `f64`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return CellError::Num.as_str().to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse cell text as a locale-independent decimal number
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Rust also accepts "inf"/"NaN", which are not numbers in a cell
    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Interned string for memory efficiency
///
/// Strings are often repeated across cells (e.g., "Yes", "No").
/// Using `Arc<str>` allows sharing the same string data across multiple cells.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SharedString {
    fn default() -> Self {
        SharedString::new("")
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SharedString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SharedString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SharedString::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_type_codes() {
        for ty in CellType::ALL {
            assert_eq!(CellType::from_code(ty.code()).unwrap(), ty);
        }
        assert_eq!(CellType::Numeric.code(), 0);
        assert_eq!(CellType::Blank.code(), 3);
        assert_eq!(CellType::from_code(6), Err(Error::UnknownCellType(6)));
        assert_eq!(CellType::from_code(-1), Err(Error::UnknownCellType(-1)));
    }

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(42), CellValue::Numeric(42.0));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert_eq!(CellValue::from("hello").cell_type(), CellType::Text);
        assert_eq!(CellValue::from(CellError::Na).to_string(), "#N/A");
    }

    #[test]
    fn test_formula_cache_is_never_a_formula() {
        let inner = FormulaCell::with_cached(vec![Token::Int(1)], CellValue::Numeric(1.0));
        let outer = FormulaCell::with_cached(vec![Token::Int(2)], CellValue::Formula(inner));

        assert_eq!(outer.cached_result(), &CellValue::Numeric(1.0));
        assert_eq!(outer.cached_result_type(), CellType::Numeric);
        assert_eq!(FormulaCell::new(vec![]).cached_result_type(), CellType::Blank);
    }

    #[test]
    fn test_cell_error_codes() {
        assert_eq!(CellError::Div0.code(), 0x07);
        assert_eq!(CellError::Na.code(), 0x2A);
        assert_eq!(CellError::from_code(0x17), Some(CellError::Ref));
        assert_eq!(CellError::from_code(0x01), None);
    }

    #[test]
    fn test_cell_error_parse() {
        assert_eq!(CellError::from_str("#DIV/0!"), Some(CellError::Div0));
        assert_eq!(CellError::from_str("#n/a"), Some(CellError::Na));
        assert_eq!(CellError::from_str("invalid"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1.5e20), "150000000000000000000");
        assert_eq!(format_number(2.0 / 3.0), "0.6666666666666666");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("-1.5e3"), Some(-1500.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }
}
