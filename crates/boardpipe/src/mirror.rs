//! Mirror column aggregation
//!
//! A mirror column shows values from linked items on a connected board. The
//! display value carries those values as one comma-separated string; the
//! aggregation function configured in the column settings folds them into a
//! single number. Without a function the display value passes through.

use boardpipe_core::{AggregateFn, ColumnValue, MirrorValue, RawColumn, TEXT_SEPARATOR};
use std::cmp::Ordering;

/// Aggregate a mirror column into its `{display_value, mirrored_items}`
/// output object.
pub(crate) fn aggregate_mirror_column(raw: &RawColumn) -> ColumnValue {
    let mirrored_items = raw.mirrored_items.clone().unwrap_or_default();
    let aggregate = match raw.settings().and_then(|settings| settings.aggregate()) {
        Some(function) => apply(function, raw),
        None => ColumnValue::from_text(raw.display_value.clone()),
    };
    ColumnValue::Mirror(MirrorValue::new(aggregate, mirrored_items))
}

fn apply(function: AggregateFn, raw: &RawColumn) -> ColumnValue {
    let display = raw.display_value.as_deref().unwrap_or_default();
    let tokens: Vec<&str> = display
        .split(TEXT_SEPARATOR)
        .filter(|token| !token.trim().is_empty())
        .collect();

    // Count works over the raw tokens; everything else needs them numeric
    let numbers = || coerce_numbers(&tokens, &raw.id);
    match function {
        AggregateFn::Count => ColumnValue::Int(tokens.len() as i64),
        AggregateFn::Sum => ColumnValue::Float(numbers().iter().sum()),
        AggregateFn::Average => float_or_null(average(&numbers())),
        AggregateFn::Min => float_or_null(extremum(numbers(), f64::min)),
        AggregateFn::Max => float_or_null(extremum(numbers(), f64::max)),
        AggregateFn::Median => float_or_null(median(numbers())),
    }
}

/// Parse display tokens as numbers, skipping anything that does not parse
fn coerce_numbers(tokens: &[&str], column_id: &str) -> Vec<f64> {
    let mut numbers = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.trim().parse::<f64>() {
            Ok(n) => numbers.push(n),
            Err(_) => {
                tracing::debug!(
                    "Skipping unparseable mirror value {:?} in column {}",
                    token,
                    column_id
                );
            }
        }
    }
    numbers
}

/// An aggregate over no values has no result
fn float_or_null(aggregate: Option<f64>) -> ColumnValue {
    aggregate.map_or(ColumnValue::Null, ColumnValue::Float)
}

fn average(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    let total: f64 = numbers.iter().sum();
    Some(total / numbers.len() as f64)
}

fn extremum(numbers: Vec<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    numbers
        .into_iter()
        .fold(None, |acc, n| Some(acc.map_or(n, |m| pick(m, n))))
}

fn median(mut numbers: Vec<f64>) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        Some(numbers[mid])
    } else {
        Some((numbers[mid - 1] + numbers[mid]) / 2.0)
    }
}
