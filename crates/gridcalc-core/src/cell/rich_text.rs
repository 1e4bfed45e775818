//! Formatted text

use std::fmt;

use crate::cell::SharedString;
use crate::error::{Error, Result};

/// A formatting run: font `font_index` applies from character `start`
/// up to the next run (or the end of the text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontRun {
    /// First character (not byte) covered by the run
    pub start: usize,
    /// Index into the workbook's font table
    pub font_index: u16,
}

/// Text plus ordered font runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RichText {
    text: SharedString,
    runs: Vec<FontRun>,
}

impl RichText {
    /// Unformatted text
    pub fn plain<S: AsRef<str>>(text: S) -> Self {
        Self {
            text: SharedString::new(text),
            runs: Vec::new(),
        }
    }

    /// Text backed by an already interned string
    pub fn shared(text: SharedString) -> Self {
        Self {
            text,
            runs: Vec::new(),
        }
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Get the underlying shared string
    pub fn shared_string(&self) -> &SharedString {
        &self.text
    }

    /// Number of characters
    pub fn char_len(&self) -> usize {
        self.text.as_str().chars().count()
    }

    /// Formatting runs, sorted by start position
    pub fn runs(&self) -> &[FontRun] {
        &self.runs
    }

    /// Number of formatting runs
    pub fn num_formatting_runs(&self) -> usize {
        self.runs.len()
    }

    /// Apply `font_index` from character `start` onwards.
    ///
    /// A run already starting at `start` is replaced.
    pub fn apply_font(&mut self, start: usize, font_index: u16) -> Result<()> {
        let len = self.char_len();
        if start >= len {
            return Err(Error::InvalidRichText(format!(
                "run start {} is past the end of {} characters",
                start, len
            )));
        }
        match self.runs.binary_search_by_key(&start, |r| r.start) {
            Ok(pos) => self.runs[pos].font_index = font_index,
            Err(pos) => self.runs.insert(pos, FontRun { start, font_index }),
        }
        Ok(())
    }

    /// Builder form of [`RichText::apply_font`]
    pub fn with_font(mut self, start: usize, font_index: u16) -> Result<Self> {
        self.apply_font(start, font_index)?;
        Ok(self)
    }

    /// Font in effect at character `index`, if any run covers it
    pub fn font_at(&self, index: usize) -> Option<u16> {
        self.runs
            .iter()
            .take_while(|r| r.start <= index)
            .last()
            .map(|r| r.font_index)
    }

    /// Drop all formatting runs
    pub fn clear_formatting(&mut self) {
        self.runs.clear();
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RichText {
    fn from(s: &str) -> Self {
        RichText::plain(s)
    }
}

impl From<String> for RichText {
    fn from(s: String) -> Self {
        RichText::plain(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_runs_stay_sorted() {
        let mut text = RichText::plain("Hello World");
        text.apply_font(6, 2).unwrap();
        text.apply_font(0, 1).unwrap();
        text.apply_font(6, 3).unwrap();

        assert_eq!(
            text.runs(),
            &[
                FontRun {
                    start: 0,
                    font_index: 1
                },
                FontRun {
                    start: 6,
                    font_index: 3
                },
            ]
        );
        assert_eq!(text.font_at(3), Some(1));
        assert_eq!(text.font_at(10), Some(3));
    }

    #[test]
    fn test_run_past_end_rejected() {
        let mut text = RichText::plain("abc");
        assert!(matches!(
            text.apply_font(3, 1),
            Err(Error::InvalidRichText(_))
        ));
        assert_eq!(text.num_formatting_runs(), 0);
    }

    #[test]
    fn test_char_positions() {
        let text = RichText::plain("héllo").with_font(4, 7).unwrap();
        assert_eq!(text.char_len(), 5);
        assert_eq!(text.font_at(3), None);
        assert_eq!(text.font_at(4), Some(7));
    }
}
