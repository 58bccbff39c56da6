//! Text functions

use super::math::round_half_away;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

fn to_int_trunc(v: &FormulaValue) -> Option<i64> {
    v.as_number().map(|n| n.trunc() as i64)
}

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

/// Insert thousands separators into a plain decimal rendering
fn group_thousands(s: &str) -> String {
    let (int_part, frac_part) = match s.find('.') {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    grouped + frac_part
}

fn format_number(n: f64, format: &str) -> String {
    match format {
        "$#,##0.00" => {
            let body = group_thousands(&format!("{:.2}", round_half_away(n.abs(), 2)));
            if n < 0.0 {
                format!("-${}", body)
            } else {
                format!("${}", body)
            }
        }
        "#,##0.00" => {
            let body = group_thousands(&format!("{:.2}", round_half_away(n.abs(), 2)));
            if n < 0.0 {
                format!("-{}", body)
            } else {
                body
            }
        }
        "#,##0" => {
            let body = group_thousands(&format!("{}", round_half_away(n.abs(), 0) as i64));
            if n < 0.0 {
                format!("-{}", body)
            } else {
                body
            }
        }
        "0.00" => format!("{:.2}", round_half_away(n, 2)),
        "0" => format!("{}", round_half_away(n, 0) as i64),
        // Unrecognized formats fall back to the plain rendering
        _ => FormulaValue::Number(n).as_string(),
    }
}

/// TEXT(number, format) - Render a number using a display format
///
/// Recognized formats: "$#,##0.00", "#,##0.00", "#,##0", "0.00" and "0".
/// Non-numeric values pass through as their string rendering.
pub fn fn_text(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let format = args[1].as_string();
    let number = match args[0].as_number() {
        Some(n) => n,
        None => return Ok(FormulaValue::String(args[0].as_string())),
    };
    Ok(FormulaValue::String(format_number(number, &format)))
}

/// CONCATENATE(value1, [value2], ...)
pub fn fn_concatenate(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let mut result = String::new();
    for arg in args {
        result.push_str(&arg.as_string());
    }
    Ok(FormulaValue::String(result))
}

/// REPLACE(old_text, start_num, num_chars, new_text)
///
/// Replaces num_chars characters starting at the 1-based start_num.
pub fn fn_replace(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let start = to_int_trunc(&args[1])
        .ok_or_else(|| FormulaError::Argument("REPLACE: start must be a number".into()))?;
    let count = to_int_trunc(&args[2])
        .ok_or_else(|| FormulaError::Argument("REPLACE: count must be a number".into()))?;
    let new_text = args[3].as_string();

    if start < 1 || count < 0 {
        return Err(FormulaError::Argument(format!(
            "Invalid REPLACE range: start {}, count {}",
            start, count
        )));
    }

    let start0 = (start - 1) as usize;
    let chars: Vec<char> = text.chars().collect();
    let tail_from = start0.saturating_add(count as usize).min(chars.len());

    let mut result: String = chars.iter().take(start0.min(chars.len())).collect();
    result.push_str(&new_text);
    result.extend(chars.iter().skip(tail_from).copied());
    Ok(FormulaValue::String(result))
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
///
/// Replaces every occurrence, or only the given 1-based instance.
pub fn fn_substitute(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let old_text = args[1].as_string();
    let new_text = args[2].as_string();

    let instance = match args.get(3) {
        Some(v) => {
            let n = to_int_trunc(v)
                .ok_or_else(|| FormulaError::Argument("SUBSTITUTE: instance must be a number".into()))?;
            if n < 1 {
                return Err(FormulaError::Argument(format!(
                    "SUBSTITUTE: instance must be >= 1, got {}",
                    n
                )));
            }
            Some(n as usize)
        }
        None => None,
    };

    if old_text.is_empty() {
        return Ok(FormulaValue::String(text));
    }

    match instance {
        None => Ok(FormulaValue::String(text.replace(&old_text, &new_text))),
        Some(target) => {
            let mut result = String::with_capacity(text.len());
            let mut rest = text.as_str();
            let mut seen = 0usize;

            while let Some(idx) = rest.find(&old_text) {
                seen += 1;
                if seen == target {
                    result.push_str(&rest[..idx]);
                    result.push_str(&new_text);
                    result.push_str(&rest[idx + old_text.len()..]);
                    return Ok(FormulaValue::String(result));
                }
                result.push_str(&rest[..idx + old_text.len()]);
                rest = &rest[idx + old_text.len()..];
            }

            // Instance not present, text unchanged
            result.push_str(rest);
            Ok(FormulaValue::String(result))
        }
    }
}

/// SEARCH(find_text, within_text, [start_num])
///
/// Case-insensitive. Returns the 1-based character position, or an
/// evaluation error when the text is not found.
pub fn fn_search(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let find_text = args[0].as_string().to_lowercase();
    let within_text = args[1].as_string().to_lowercase();

    let start = match args.get(2) {
        Some(v) => to_int_trunc(v)
            .ok_or_else(|| FormulaError::Argument("SEARCH: start must be a number".into()))?,
        None => 1,
    };
    if start < 1 {
        return Err(FormulaError::Argument(format!(
            "SEARCH: start must be >= 1, got {}",
            start
        )));
    }

    let start0 = (start - 1) as usize;
    let within_chars: Vec<char> = within_text.chars().collect();
    if start0 > within_chars.len() {
        return Err(FormulaError::Evaluation(format!(
            "SEARCH: start {} beyond end of text",
            start
        )));
    }

    let haystack: String = within_chars[start0..].iter().collect();
    match haystack.find(&find_text) {
        Some(byte_idx) => {
            let char_offset = haystack[..byte_idx].chars().count();
            Ok(FormulaValue::Number((start0 + char_offset + 1) as f64))
        }
        None => Err(FormulaError::Evaluation(format!(
            "SEARCH: '{}' not found",
            args[0].as_string()
        ))),
    }
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let num_chars = match args.get(1) {
        Some(v) => to_int_trunc(v)
            .ok_or_else(|| FormulaError::Argument("LEFT: count must be a number".into()))?,
        None => 1,
    };
    if num_chars < 0 {
        return Err(FormulaError::Argument(format!(
            "LEFT: count must be >= 0, got {}",
            num_chars
        )));
    }
    Ok(FormulaValue::String(take_left(&text, num_chars as usize)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let num_chars = match args.get(1) {
        Some(v) => to_int_trunc(v)
            .ok_or_else(|| FormulaError::Argument("RIGHT: count must be a number".into()))?,
        None => 1,
    };
    if num_chars < 0 {
        return Err(FormulaError::Argument(format!(
            "RIGHT: count must be >= 0, got {}",
            num_chars
        )));
    }
    Ok(FormulaValue::String(take_right(&text, num_chars as usize)))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    Ok(FormulaValue::Number(text.chars().count() as f64))
}

/// REPT(text, number_times)
pub fn fn_rept(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let times = to_int_trunc(&args[1])
        .ok_or_else(|| FormulaError::Argument("REPT: count must be a number".into()))?;
    if times < 0 {
        return Err(FormulaError::Argument(format!(
            "REPT: count must be >= 0, got {}",
            times
        )));
    }
    // Spreadsheet cells cap text at 32767 chars
    if (text.len() as u64).saturating_mul(times as u64) > 32767 {
        return Err(FormulaError::Argument(
            "REPT: result would exceed 32767 chars".into(),
        ));
    }
    Ok(FormulaValue::String(text.repeat(times as usize)))
}

/// TRIM(text) - Strips leading/trailing spaces and collapses runs inside
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(FormulaValue::String(collapsed))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(args[0].as_string().to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(args[0].as_string().to_lowercase()))
}
