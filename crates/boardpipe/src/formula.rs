//! Formula column evaluation
//!
//! A formula column computes its value from other columns of the same item.
//! The source expression lives in the column settings with `{columnId}`
//! placeholders; each placeholder is resolved through the dispatcher, the
//! expression is repaired from source-language syntax to the expression
//! grammar, then parsed and evaluated.
//!
//! Evaluation never fails the column: division by zero reads as `0` and any
//! other problem logs a warning and leaves the column's value unchanged.

use crate::dispatch;
use boardpipe_core::{ColumnMap, ColumnValue, RawColumn};
use boardpipe_formula::evaluator::TIMESTAMP_FORMAT;
use boardpipe_formula::{
    evaluate, parse_formula, EvaluationContext, FormulaError, FormulaResult, FormulaValue,
};
use lazy_regex::{regex, regex_replace_all};
use std::collections::{HashMap, HashSet};

/// Evaluate a formula column to a concrete value.
pub(crate) fn evaluate_formula_column(
    raw: &RawColumn,
    map: &ColumnMap,
    visiting: &mut HashSet<String>,
) -> ColumnValue {
    // The API computes some formulas upstream; "null" is its way of saying
    // it did not
    if let Some(display) = &raw.display_value {
        if display != "null" {
            return ColumnValue::Str(display.clone());
        }
    }

    let formula = match raw.settings().and_then(|settings| settings.formula) {
        Some(formula) => formula,
        None => return dispatch::raw_value(raw),
    };

    let expression = match substitute_references(&formula, map, visiting) {
        Some(substituted) => substituted,
        None => return dispatch::raw_value(raw),
    };
    let expression = collapse_bracket_literals(&normalize_equality(&expression));

    match parse_and_evaluate(&expression) {
        Ok(value) => value,
        Err(FormulaError::DivisionByZero) => ColumnValue::Int(0),
        Err(err) => {
            tracing::warn!(
                "Formula evaluation failed for column {}: {} (formula: {:?}, evaluated: {:?})",
                raw.id,
                err,
                formula,
                expression
            );
            dispatch::raw_value(raw)
        }
    }
}

/// Replace every `{columnId}` placeholder with the referenced column's
/// normalized value.
///
/// All references resolve before any substitution happens; a reference that
/// is missing from the map, or already being resolved further up the call
/// stack, aborts with `None`.
fn substitute_references(
    formula: &str,
    map: &ColumnMap,
    visiting: &mut HashSet<String>,
) -> Option<String> {
    let placeholder = regex!(r"\{([^{}]+)\}");

    let mut literals: HashMap<String, String> = HashMap::new();
    for caps in placeholder.captures_iter(formula) {
        let reference = match caps.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };
        if literals.contains_key(reference) {
            continue;
        }
        let column = dispatch::resolve(strip_label_suffix(reference), map, visiting)?;
        literals.insert(reference.to_string(), substitution_literal(&column.value));
    }

    let substituted = placeholder.replace_all(formula, |caps: &regex::Captures| {
        match caps.get(1).and_then(|m| literals.get(m.as_str())) {
            Some(literal) => literal.clone(),
            None => String::new(),
        }
    });
    Some(substituted.into_owned())
}

/// Strip the optional trailing `#Labels`-style modifier from a placeholder
fn strip_label_suffix(reference: &str) -> &str {
    match reference.find('#') {
        Some(pos) => &reference[..pos],
        None => reference,
    }
}

/// Render a normalized column value as an expression literal.
///
/// Null and empty values read as `0` so arithmetic over half-filled boards
/// keeps working. Mirror references contribute their aggregate. Label lists
/// render in the source language's bracket form, which the single-element
/// collapse below turns back into a scalar.
fn substitution_literal(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Mirror(mirror) => substitution_literal(&mirror.display_value),
        ColumnValue::Null => "0".to_string(),
        ColumnValue::Str(s) if s.is_empty() => "0".to_string(),
        ColumnValue::Bool(true) => "TRUE".to_string(),
        ColumnValue::Bool(false) => "FALSE".to_string(),
        ColumnValue::Int(n) => n.to_string(),
        ColumnValue::Float(n) => n.to_string(),
        ColumnValue::Str(s) => quoted(s),
        ColumnValue::StrList(labels) => bracket_literal(labels),
        other => quoted(&other.to_string()),
    }
}

/// Double-quoted string literal with embedded double quotes doubled
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn bracket_literal(labels: &[String]) -> String {
    let quoted: Vec<String> = labels.iter().map(|label| format!("'{}'", label)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Rewrite single `=` to `==` outside string literals.
///
/// The source formula language compares with a single equals sign; `<=`,
/// `>=`, `!=` and an already-doubled `==` stay as they are.
fn normalize_equality(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut result = String::with_capacity(expression.len() + 4);
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == '\\' && i + 1 < chars.len() {
                    result.push(c);
                    result.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                if c == q {
                    quote = None;
                }
                result.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    result.push(c);
                }
                '=' => {
                    let prev = if i > 0 { chars.get(i - 1) } else { None };
                    let compound = matches!(prev, Some('<') | Some('>') | Some('!') | Some('='))
                        || chars.get(i + 1) == Some(&'=');
                    if compound {
                        result.push('=');
                    } else {
                        result.push_str("==");
                    }
                }
                _ => result.push(c),
            },
        }
        i += 1;
    }
    result
}

/// Collapse a single-element bracket literal `['x']` to the bare `'x'`.
///
/// The source language produces these for label lookups and expects them to
/// evaluate as scalars. Multi-element lists stay bracketed and fail to
/// parse, which degrades the column to its previous value.
fn collapse_bracket_literals(expression: &str) -> String {
    regex_replace_all!(r"\['([^']*)'\]", expression, |_, label| format!(
        "'{}'",
        label
    ))
    .into_owned()
}

fn parse_and_evaluate(expression: &str) -> FormulaResult<ColumnValue> {
    let ast = parse_formula(expression)?;
    let result = evaluate(&ast, &EvaluationContext::new())?;
    Ok(column_value(result))
}

/// Map an evaluation result back to a column value.
///
/// Whole numbers come back as ints, mirroring the numeric column rule that
/// keeps int and float apart.
fn column_value(result: FormulaValue) -> ColumnValue {
    match result {
        FormulaValue::Number(n) => {
            if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
                ColumnValue::Int(n as i64)
            } else {
                ColumnValue::Float(n)
            }
        }
        FormulaValue::String(s) => ColumnValue::Str(s),
        FormulaValue::Boolean(b) => ColumnValue::Bool(b),
        FormulaValue::Timestamp(ts) => ColumnValue::Str(ts.format(TIMESTAMP_FORMAT).to_string()),
        FormulaValue::Null => ColumnValue::Null,
    }
}
