//! Logical and information functions

use gridcalc_core::CellError;

use super::{bool_arg, finish, single};
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// IF function
///
/// Both branches have already been evaluated; the condition only picks one.
/// An omitted branch yields the condition's own boolean.
pub fn fn_if(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let condition = match bool_arg(&args[0]) {
        Ok(b) => b,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    let branch = if condition { args.get(1) } else { args.get(2) };
    Ok(branch
        .cloned()
        .unwrap_or(FormulaValue::Boolean(condition)))
}

/// Booleans seen by AND/OR. Referenced text is ignored; literal text must
/// read as TRUE or FALSE.
fn collect_bools(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut values = Vec::new();

    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for cell in rows.iter().flatten() {
                    match cell {
                        FormulaValue::Boolean(b) => values.push(*b),
                        FormulaValue::Number(n) => values.push(*n != 0.0),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Error(e) => return Err(*e),
            FormulaValue::Blank => {}
            other => values.push(other.as_bool().ok_or(CellError::Value)?),
        }
    }

    if values.is_empty() {
        return Err(CellError::Value);
    }
    Ok(values)
}

/// AND function
pub fn fn_and(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_bools(args).map(|v| v.iter().all(|b| *b)))
}

/// OR function
pub fn fn_or(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_bools(args).map(|v| v.iter().any(|b| *b)))
}

/// NOT function
pub fn fn_not(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(bool_arg(&args[0]).map(|b| !b))
}

/// TRUE() - Returns the logical value TRUE
pub fn fn_true(_args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(true))
}

/// FALSE() - Returns the logical value FALSE
pub fn fn_false(_args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(false))
}

pub fn fn_isna(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        single(&args[0]),
        FormulaValue::Error(CellError::Na)
    )))
}

pub fn fn_iserror(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(single(&args[0]).is_error()))
}

pub fn fn_isblank(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        single(&args[0]),
        FormulaValue::Blank
    )))
}
