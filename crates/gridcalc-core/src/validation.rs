//! Data validation
//!
//! A [`DvConstraint`] describes what may be entered into a cell: a list of
//! allowed values, a numeric/date/time/text-length comparison, or a custom
//! formula. A [`DataValidation`] attaches a constraint to cell ranges.
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellRange, DataValidation, DvConstraint, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//!
//! let validation = DataValidation::new(DvConstraint::explicit_list(["Yes", "No", "Maybe"]))
//!     .with_range(CellRange::parse("A1:A10").unwrap())
//!     .with_error_message("Invalid value", "Please select from the list");
//!
//! sheet.add_data_validation(validation);
//! assert!(sheet.data_validation_at(3, 0).is_some());
//! ```

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// Kinds of data validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationType {
    /// Any value allowed
    #[default]
    Any,
    /// Whole numbers
    Integer,
    /// Decimal numbers
    Decimal,
    /// Value from a list
    List,
    /// Date serials
    Date,
    /// Time fractions
    Time,
    /// Length of the text
    TextLength,
    /// Custom formula returning TRUE/FALSE
    Formula,
}

impl ValidationType {
    /// BIFF DV record type code
    pub fn code(self) -> u8 {
        match self {
            ValidationType::Any => 0,
            ValidationType::Integer => 1,
            ValidationType::Decimal => 2,
            ValidationType::List => 3,
            ValidationType::Date => 4,
            ValidationType::Time => 5,
            ValidationType::TextLength => 6,
            ValidationType::Formula => 7,
        }
    }

    /// Whether constraints of this type compare against one or two values
    pub fn uses_operator(self) -> bool {
        matches!(
            self,
            ValidationType::Integer
                | ValidationType::Decimal
                | ValidationType::Date
                | ValidationType::Time
                | ValidationType::TextLength
        )
    }
}

/// Comparison operators for validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonOperator {
    /// Value must be between formula1 and formula2
    #[default]
    Between,
    /// Value must NOT be between formula1 and formula2
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonOperator {
    /// BIFF DV record operator code
    pub fn code(self) -> u8 {
        match self {
            ComparisonOperator::Between => 0,
            ComparisonOperator::NotBetween => 1,
            ComparisonOperator::Equal => 2,
            ComparisonOperator::NotEqual => 3,
            ComparisonOperator::GreaterThan => 4,
            ComparisonOperator::LessThan => 5,
            ComparisonOperator::GreaterOrEqual => 6,
            ComparisonOperator::LessOrEqual => 7,
        }
    }

    /// Check if this operator requires two values
    pub fn requires_two_values(self) -> bool {
        matches!(
            self,
            ComparisonOperator::Between | ComparisonOperator::NotBetween
        )
    }
}

/// What a data validation accepts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DvConstraint {
    validation_type: ValidationType,
    operator: ComparisonOperator,
    formula1: Option<String>,
    formula2: Option<String>,
    explicit_list_values: Option<Vec<String>>,
}

impl DvConstraint {
    /// A dropdown of literal values
    pub fn explicit_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            validation_type: ValidationType::List,
            explicit_list_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A dropdown whose values come from a formula (usually a range reference)
    pub fn formula_list(formula: impl Into<String>) -> Self {
        Self {
            validation_type: ValidationType::List,
            formula1: Some(formula.into()),
            ..Self::default()
        }
    }

    /// A comparison constraint.
    ///
    /// `validation_type` must be one of the comparison types; `formula2` is
    /// required when the operator is a between operator.
    pub fn numeric(
        validation_type: ValidationType,
        operator: ComparisonOperator,
        formula1: impl Into<String>,
        formula2: Option<String>,
    ) -> Result<Self> {
        if !validation_type.uses_operator() {
            return Err(Error::InvalidState(format!(
                "{:?} constraints do not compare values",
                validation_type
            )));
        }
        if operator.requires_two_values() && formula2.is_none() {
            return Err(Error::InvalidState(format!(
                "{:?} needs a second value",
                operator
            )));
        }
        Ok(Self {
            validation_type,
            operator,
            formula1: Some(formula1.into()),
            formula2,
            explicit_list_values: None,
        })
    }

    /// A custom formula that must evaluate to TRUE
    pub fn custom_formula(formula: impl Into<String>) -> Self {
        Self {
            validation_type: ValidationType::Formula,
            formula1: Some(formula.into()),
            ..Self::default()
        }
    }

    pub fn validation_type(&self) -> ValidationType {
        self.validation_type
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    /// Change the comparison operator of a comparison constraint
    pub fn set_operator(&mut self, operator: ComparisonOperator) -> Result<()> {
        if !self.validation_type.uses_operator() {
            return Err(Error::InvalidState(format!(
                "cannot set an operator on a {:?} constraint",
                self.validation_type
            )));
        }
        self.operator = operator;
        Ok(())
    }

    pub fn formula1(&self) -> Option<&str> {
        self.formula1.as_deref()
    }

    pub fn formula2(&self) -> Option<&str> {
        self.formula2.as_deref()
    }

    /// Replace the first formula. On a list constraint this drops the
    /// explicit values.
    pub fn set_formula1(&mut self, formula: impl Into<String>) {
        self.formula1 = Some(formula.into());
        self.explicit_list_values = None;
    }

    pub fn set_formula2(&mut self, formula: Option<String>) {
        self.formula2 = formula;
    }

    /// Explicit dropdown values, if this is an explicit list
    pub fn explicit_list_values(&self) -> Option<&[String]> {
        self.explicit_list_values.as_deref()
    }

    /// Replace the explicit dropdown values. Only list constraints have them.
    pub fn set_explicit_list_values<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.validation_type != ValidationType::List {
            return Err(Error::InvalidState(format!(
                "cannot set explicit list values on a {:?} constraint",
                self.validation_type
            )));
        }
        self.explicit_list_values = Some(values.into_iter().map(Into::into).collect());
        self.formula1 = None;
        Ok(())
    }

    pub fn is_explicit_list(&self) -> bool {
        self.explicit_list_values.is_some()
    }
}

/// A constraint applied to cell ranges, with its alert settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    pub constraint: DvConstraint,
    /// Cell ranges this validation applies to
    pub ranges: Vec<CellRange>,
    /// Allow blank/empty cells
    pub allow_blank: bool,
    /// Show dropdown for list validation
    pub show_dropdown: bool,
    /// Show error alert when invalid data entered
    pub show_error_alert: bool,
    pub error_style: ValidationErrorStyle,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
}

impl DataValidation {
    /// Create a validation for `constraint` covering no cells yet
    pub fn new(constraint: DvConstraint) -> Self {
        Self {
            constraint,
            ranges: Vec::new(),
            allow_blank: true,
            show_dropdown: true,
            show_error_alert: true,
            error_style: ValidationErrorStyle::Stop,
            error_title: None,
            error_message: None,
        }
    }

    /// Add a cell range to this validation
    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    /// Set whether blank cells are allowed
    pub fn with_allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Set an error message (shown when invalid data entered)
    pub fn with_error_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.show_error_alert = true;
        self.error_title = Some(title.into());
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_style(mut self, style: ValidationErrorStyle) -> Self {
        self.error_style = style;
        self
    }

    /// Check if this validation applies to a specific cell
    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        let addr = CellAddress::new(row, col);
        self.ranges.iter().any(|range| range.contains(&addr))
    }
}

/// Error alert styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    /// Reject invalid data
    #[default]
    Stop,
    /// Warn but allow
    Warning,
    /// Just inform
    Information,
}
