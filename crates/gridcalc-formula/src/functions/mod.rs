//! Built-in functions
//!
//! Arguments arrive already evaluated. A single-cell reference argument is
//! passed as a 1x1 array so aggregates can tell referenced values from
//! literals; scalar functions look through it with [`single`].

pub mod logical;
pub mod math;
pub mod text;

use gridcalc_core::{CellError, FunctionId};

use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

/// Implementation of a built-in function
pub fn implementation(id: FunctionId) -> FunctionImpl {
    match id {
        FunctionId::Count => math::fn_count,
        FunctionId::Sum => math::fn_sum,
        FunctionId::Average => math::fn_average,
        FunctionId::Min => math::fn_min,
        FunctionId::Max => math::fn_max,
        FunctionId::Product => math::fn_product,
        FunctionId::Sqrt => math::fn_sqrt,
        FunctionId::Abs => math::fn_abs,
        FunctionId::Int => math::fn_int,
        FunctionId::Round => math::fn_round,
        FunctionId::Mod => math::fn_mod,
        FunctionId::If => logical::fn_if,
        FunctionId::And => logical::fn_and,
        FunctionId::Or => logical::fn_or,
        FunctionId::Not => logical::fn_not,
        FunctionId::True => logical::fn_true,
        FunctionId::False => logical::fn_false,
        FunctionId::IsNa => logical::fn_isna,
        FunctionId::IsError => logical::fn_iserror,
        FunctionId::IsBlank => logical::fn_isblank,
        FunctionId::Len => text::fn_len,
        FunctionId::Lower => text::fn_lower,
        FunctionId::Upper => text::fn_upper,
        FunctionId::Concatenate => text::fn_concatenate,
    }
}

/// The scalar behind an argument: a 1x1 array is its only element, a
/// larger array is `#VALUE!`
pub fn single(value: &FormulaValue) -> FormulaValue {
    match value {
        FormulaValue::Array(rows) => match rows.as_slice() {
            [row] if row.len() == 1 => row[0].clone(),
            _ => FormulaValue::Error(CellError::Value),
        },
        other => other.clone(),
    }
}

/// Numeric argument of a scalar function
pub(crate) fn number_arg(value: &FormulaValue) -> Result<f64, CellError> {
    match single(value) {
        FormulaValue::Error(e) => Err(e),
        v => v.as_number().ok_or(CellError::Value),
    }
}

/// Boolean argument of a scalar function
pub(crate) fn bool_arg(value: &FormulaValue) -> Result<bool, CellError> {
    match single(value) {
        FormulaValue::Error(e) => Err(e),
        v => v.as_bool().ok_or(CellError::Value),
    }
}

/// Text argument of a scalar function
pub(crate) fn text_arg(value: &FormulaValue) -> Result<String, CellError> {
    match single(value) {
        FormulaValue::Error(e) => Err(e),
        v => Ok(v.as_text()),
    }
}

/// Turn a scalar result or an error value into a function result
pub(crate) fn finish<T: Into<FormulaValue>>(
    result: Result<T, CellError>,
) -> FormulaResult<FormulaValue> {
    Ok(match result {
        Ok(v) => v.into(),
        Err(e) => FormulaValue::Error(e),
    })
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_function_has_an_implementation() {
        for id in FunctionId::ALL {
            let (min, _) = id.arity();
            let args = vec![FormulaValue::Number(1.0); min as usize];
            assert!(implementation(*id)(&args).is_ok(), "{} failed", id);
        }
    }

    #[test]
    fn test_single() {
        let one = FormulaValue::Array(vec![vec![FormulaValue::Number(4.0)]]);
        assert_eq!(single(&one), FormulaValue::Number(4.0));
        let two = FormulaValue::Array(vec![vec![FormulaValue::Number(4.0), FormulaValue::Blank]]);
        assert_eq!(single(&two), FormulaValue::Error(CellError::Value));
        assert_eq!(single(&FormulaValue::Blank), FormulaValue::Blank);
    }
}
