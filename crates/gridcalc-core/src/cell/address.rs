//! A1-style cell addresses and rectangular ranges

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Columns run A..IV and rows 1..65536. The optional `$` prefix marks
/// an absolute reference, which only matters when rendering formula text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// 0-based row
    pub row: u32,
    /// 0-based column (A=0, IV=255)
    pub col: u16,
    /// `$` before the row number
    pub row_absolute: bool,
    /// `$` before the column letters
    pub col_absolute: bool,
}

impl CellAddress {
    /// Relative address at `row`, `col`
    pub fn new(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, false, false)
    }

    /// Address with explicit `$` flags
    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// `$A$1` style address
    pub fn absolute(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, true, true)
    }

    /// Fails unless `row`/`col` fit the 65536 x 256 grid
    pub fn check_bounds(row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            Err(Error::RowOutOfBounds(row, MAX_ROWS - 1))
        } else if col >= MAX_COLS {
            Err(Error::ColumnOutOfBounds(u32::from(col), MAX_COLS - 1))
        } else {
            Ok(())
        }
    }

    /// Parse `A1`, `$A1`, `A$1` or `$A$1` (letters are case-insensitive)
    ///
    /// ```
    /// use gridcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$b$2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = |why: &str| Error::InvalidAddress(format!("{} in '{}'", why, text));

        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(split);
        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("no row number"));
        }

        let col = column_index(letters)?;
        let row = match digits.parse::<u32>() {
            Ok(0) | Err(_) => return Err(invalid("bad row number")),
            Ok(n) => n - 1,
        };
        Self::check_bounds(row, col)?;
        Ok(Self::with_absolute(row, col, row_absolute, col_absolute))
    }

    /// `A1` text, with `$` markers where set
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }
}

/// Column letters for a 0-based index (0 -> A, 26 -> AA)
fn column_letters(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut out = Vec::new();
    while n > 0 {
        let digit = (n - 1) % 26;
        out.push(char::from(b'A' + digit as u8));
        n = (n - 1) / 26;
    }
    out.into_iter().rev().collect()
}

/// 0-based column index for letters like `a`, `Z`, `IV`
fn column_index(letters: &str) -> Result<u16> {
    let mut index: u32 = 0;
    for b in letters.bytes() {
        index = index
            .saturating_mul(26)
            .saturating_add(u32::from(b.to_ascii_uppercase() - b'A') + 1);
    }
    let col = index.saturating_sub(1);
    u16::try_from(col)
        .ok()
        .filter(|c| *c < MAX_COLS)
        .ok_or(Error::ColumnOutOfBounds(col, MAX_COLS - 1))
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_mark = if self.col_absolute { "$" } else { "" };
        let row_mark = if self.row_absolute { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            col_mark,
            column_letters(self.col),
            row_mark,
            self.row + 1
        )
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular block of cells (e.g., "A1:B10")
///
/// `start` is always the top-left corner and `end` the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range spanning two corners given in any order
    ///
    /// Each corner keeps the `$` flags it was written with.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let start = CellAddress {
            row: a.row.min(b.row),
            col: a.col.min(b.col),
            ..a
        };
        let end = CellAddress {
            row: a.row.max(b.row),
            col: a.col.max(b.col),
            ..b
        };
        Self { start, end }
    }

    /// Relative range from corner indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Parse `A1:B10`; a lone `A1` gives a one-cell range
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        match text.split_once(':') {
            None => {
                let addr = CellAddress::parse(text)?;
                Ok(Self::new(addr, addr))
            }
            Some((a, b)) => {
                let corner = |part: &str| {
                    CellAddress::parse(part)
                        .map_err(|e| Error::InvalidRange(format!("{}: {}", text, e)))
                };
                Ok(Self::new(corner(a)?, corner(b)?))
            }
        }
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// `A1:B10` text, or just `A1` for a one-cell range
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            self.start.fmt(f)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(255), "IV");

        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("az").unwrap(), 51);
        assert_eq!(column_index("IV").unwrap(), 255);
        assert!(matches!(
            column_index("IW"),
            Err(Error::ColumnOutOfBounds(256, 255))
        ));
    }

    #[test]
    fn test_parse_absolute_markers() {
        let addr = CellAddress::parse("B2").unwrap();
        assert_eq!((addr.row, addr.col), (1, 1));
        assert!(!addr.row_absolute && !addr.col_absolute);

        let addr = CellAddress::parse(" $A7 ").unwrap();
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = CellAddress::parse("IV65536").unwrap();
        assert_eq!((addr.row, addr.col), (65535, 255));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "A", "1", "A0", "A-1", "A1B", "$$A1", "A$"] {
            assert!(
                matches!(CellAddress::parse(bad), Err(Error::InvalidAddress(_))),
                "{}",
                bad
            );
        }
        assert!(matches!(
            CellAddress::parse("A65537"),
            Err(Error::RowOutOfBounds(65536, 65535))
        ));
        assert!(matches!(
            CellAddress::parse("XFD1"),
            Err(Error::ColumnOutOfBounds(..))
        ));
    }

    #[test]
    fn test_check_bounds() {
        assert!(CellAddress::check_bounds(65535, 255).is_ok());
        assert!(CellAddress::check_bounds(65536, 0).is_err());
        assert!(CellAddress::check_bounds(0, 256).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(CellAddress::absolute(0, 0).to_a1_string(), "$A$1");
        assert_eq!(CellAddress::with_absolute(4, 27, true, false).to_string(), "AB$5");
        assert_eq!(CellRange::parse("a1:$b$2").unwrap().to_a1_string(), "A1:$B$2");
        assert_eq!(CellRange::parse("C3").unwrap().to_string(), "C3");
    }

    #[test]
    fn test_range_corners_are_ordered() {
        let range = CellRange::parse("B3:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(2, 1));
        assert_eq!((range.row_count(), range.col_count()), (3, 2));
        assert!(range.contains(&CellAddress::new(1, 1)));
        assert!(!range.contains(&CellAddress::new(3, 0)));
        assert!(matches!(
            CellRange::parse("A1:ZZZ9"),
            Err(Error::InvalidRange(_))
        ));
    }
}
