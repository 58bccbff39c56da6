//! Math functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// Collect the numeric arguments, ignoring non-numeric values
fn numeric_args(args: &[FormulaValue]) -> Vec<f64> {
    args.iter().filter_map(|v| v.as_number()).collect()
}

/// Optional digit-count argument, defaulting to 0
fn digits_arg(args: &[FormulaValue], idx: usize) -> FormulaResult<i32> {
    match args.get(idx) {
        Some(v) => Ok(v.to_number()?.trunc() as i32),
        None => Ok(0),
    }
}

/// Round half away from zero: ROUND(2.5) = 3, ROUND(-2.5) = -3
pub(crate) fn round_half_away(n: f64, digits: i32) -> f64 {
    let multiplier = 10_f64.powi(digits);
    if n >= 0.0 {
        (n * multiplier + 0.5).floor() / multiplier
    } else {
        (n * multiplier - 0.5).ceil() / multiplier
    }
}

/// SUM(number1, [number2], ...)
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let total: f64 = numeric_args(args).iter().sum();
    Ok(FormulaValue::Number(total))
}

/// AVERAGE(number1, [number2], ...)
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numeric_args(args);
    if numbers.is_empty() {
        return Err(FormulaError::DivisionByZero);
    }
    let total: f64 = numbers.iter().sum();
    Ok(FormulaValue::Number(total / numbers.len() as f64))
}

/// COUNT(value1, [value2], ...) - Counts the numeric arguments
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .filter(|v| matches!(v, FormulaValue::Number(_)))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// MIN(number1, [number2], ...)
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let min = numeric_args(args).into_iter().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |m| m.min(n)))
    });
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX(number1, [number2], ...)
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let max = numeric_args(args).into_iter().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |m| m.max(n)))
    });
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// MOD(number, divisor) - Remainder after division
///
/// Uses number - divisor * floor(number/divisor), so the result carries the
/// sign of the divisor, unlike Rust's % operator.
pub fn fn_mod(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let divisor = args[1].to_number()?;

    if divisor == 0.0 {
        return Err(FormulaError::DivisionByZero);
    }

    Ok(FormulaValue::Number(
        number - divisor * (number / divisor).floor(),
    ))
}

/// ROUND(number, [num_digits]) - Round half away from zero
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let digits = digits_arg(args, 1)?;
    Ok(FormulaValue::Number(round_half_away(number, digits)))
}

/// ROUNDUP(number, [num_digits]) - Round away from zero
pub fn fn_roundup(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let digits = digits_arg(args, 1)?;

    let multiplier = 10_f64.powi(digits);
    let result = if number >= 0.0 {
        (number * multiplier).ceil() / multiplier
    } else {
        (number * multiplier).floor() / multiplier
    };
    Ok(FormulaValue::Number(result))
}

/// ROUNDDOWN(number, [num_digits]) - Round toward zero
pub fn fn_rounddown(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let digits = digits_arg(args, 1)?;

    let multiplier = 10_f64.powi(digits);
    Ok(FormulaValue::Number((number * multiplier).trunc() / multiplier))
}

/// LOG(number, [base]) - Logarithm of a number, base 10 by default
pub fn fn_log(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let base = match args.get(1) {
        Some(v) => v.to_number()?,
        None => 10.0,
    };

    if number <= 0.0 {
        return Err(FormulaError::Argument(format!(
            "LOG of non-positive number: {}",
            number
        )));
    }
    if base <= 0.0 || base == 1.0 {
        return Err(FormulaError::Argument(format!("Invalid LOG base: {}", base)));
    }

    Ok(FormulaValue::Number(number.ln() / base.ln()))
}

/// MINUS(a, b) - Function form of subtraction
pub fn fn_minus(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let a = args[0].to_number()?;
    let b = args[1].to_number()?;
    Ok(FormulaValue::Number(a - b))
}

/// MULTIPLY(a, b) - Function form of multiplication
pub fn fn_multiply(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let a = args[0].to_number()?;
    let b = args[1].to_number()?;
    Ok(FormulaValue::Number(a * b))
}

/// DIVIDE(a, b) - Function form of division
pub fn fn_divide(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let a = args[0].to_number()?;
    let b = args[1].to_number()?;

    if b == 0.0 {
        return Err(FormulaError::DivisionByZero);
    }

    Ok(FormulaValue::Number(a / b))
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let power = args[1].to_number()?;

    let result = number.powf(power);
    // Cases like 0^(-1) or negative^(non-integer)
    if result.is_nan() || result.is_infinite() {
        return Err(FormulaError::Evaluation(format!(
            "Invalid exponentiation: POWER({}, {})",
            number, power
        )));
    }

    Ok(FormulaValue::Number(result))
}

/// SQRT(number) - Positive square root
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    if number < 0.0 {
        return Err(FormulaError::Argument(format!(
            "SQRT of negative number: {}",
            number
        )));
    }
    Ok(FormulaValue::Number(number.sqrt()))
}

/// PI()
pub fn fn_pi(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(std::f64::consts::PI))
}
