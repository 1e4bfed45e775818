//! Text functions

use super::{finish, text_arg};
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// LEN(text) - Number of characters
pub fn fn_len(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(text_arg(&args[0]).map(|s| s.chars().count() as f64))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(text_arg(&args[0]).map(|s| s.to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(text_arg(&args[0]).map(|s| s.to_uppercase()))
}

/// CONCATENATE(text1, ...) - The first error among the arguments wins
pub fn fn_concatenate(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let joined = args
        .iter()
        .map(text_arg)
        .collect::<Result<String, _>>();
    finish(joined)
}
