//! Math functions

use gridcalc_core::CellError;

use super::{finish, number_arg};
use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// Numbers an aggregate sees. Literal arguments contribute booleans and
/// numeric text; referenced values contribute numbers only.
fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();

    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for cell in rows.iter().flatten() {
                    match cell {
                        FormulaValue::Number(n) => numbers.push(*n),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {} // Ignore non-numeric
                    }
                }
            }
            FormulaValue::Error(e) => return Err(*e),
            FormulaValue::Blank => {}
            other => numbers.push(other.as_number().ok_or(CellError::Value)?),
        }
    }

    Ok(numbers)
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|n| n.iter().sum::<f64>()))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).and_then(|n| {
        if n.is_empty() {
            Err(CellError::Div0)
        } else {
            Ok(n.iter().sum::<f64>() / n.len() as f64)
        }
    }))
}

/// MIN function
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|n| n.into_iter().reduce(f64::min).unwrap_or(0.0)))
}

/// MAX function
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|n| n.into_iter().reduce(f64::max).unwrap_or(0.0)))
}

/// PRODUCT function. No numbers at all gives 0.
pub fn fn_product(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|n| {
        if n.is_empty() {
            0.0
        } else {
            n.iter().product()
        }
    }))
}

/// COUNT function. Never fails; errors are simply not counted.
pub fn fn_count(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let mut count = 0usize;

    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                count += rows
                    .iter()
                    .flatten()
                    .filter(|v| matches!(v, FormulaValue::Number(_)))
                    .count();
            }
            FormulaValue::Number(_) | FormulaValue::Boolean(_) => count += 1,
            FormulaValue::Text(_) if arg.as_number().is_some() => count += 1,
            _ => {}
        }
    }

    Ok(FormulaValue::Number(count as f64))
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(number_arg(&args[0]).map(f64::abs))
}

/// SQRT function
pub fn fn_sqrt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(number_arg(&args[0]).and_then(|n| {
        if n < 0.0 {
            Err(CellError::Num)
        } else {
            Ok(n.sqrt())
        }
    }))
}

/// INT function: round down to the nearest integer
pub fn fn_int(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    finish(number_arg(&args[0]).map(f64::floor))
}

/// ROUND function, half away from zero
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let rounded = number_arg(&args[0]).and_then(|number| {
        let digits = number_arg(&args[1])?.trunc() as i32;
        // For negative digits, we round to the left of the decimal point
        let multiplier = 10_f64.powi(digits);
        Ok((number * multiplier).round() / multiplier)
    });
    finish(rounded)
}

/// MOD function. The result takes the sign of the divisor.
pub fn fn_mod(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let result = number_arg(&args[0]).and_then(|n| {
        let d = number_arg(&args[1])?;
        if d == 0.0 {
            return Err(CellError::Div0);
        }
        Ok(n - d * (n / d).floor())
    });
    finish(result)
}
