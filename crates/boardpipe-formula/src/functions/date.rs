//! Date/time functions
//!
//! Date functions operate on timestamp values. Text arguments are accepted
//! wherever a timestamp is expected and parsed from the canonical
//! renderings. DATEVALUE is the exception: it returns a serial number in
//! the 1900 date system.

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

/// Timestamp renderings accepted for text arguments
const TIMESTAMP_PARSE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Date renderings DATEVALUE understands, tried in order
const DATEVALUE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

fn parse_timestamp_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    // Zone-annotated rendering, e.g. "2024-03-05 10:00:00 +0000"
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_utc());
    }
    for fmt in TIMESTAMP_PARSE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }

    None
}

/// Accept a timestamp value, or text in a known format
fn coerce_timestamp(v: &FormulaValue) -> FormulaResult<NaiveDateTime> {
    match v {
        FormulaValue::Timestamp(ts) => Ok(*ts),
        FormulaValue::String(s) => parse_timestamp_text(s)
            .ok_or_else(|| FormulaError::Argument(format!("Cannot interpret '{}' as a date", s))),
        _ => Err(FormulaError::Argument(format!(
            "Cannot interpret {:?} as a date",
            v
        ))),
    }
}

/// Like coerce_timestamp, but also accepts bare times ("09:30")
fn coerce_time_or_timestamp(v: &FormulaValue) -> FormulaResult<NaiveDateTime> {
    if let FormulaValue::String(s) = v {
        let s = s.trim();
        for fmt in ["%H:%M:%S", "%H:%M"] {
            if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
                // Anchor bare times on a shared date so differences work
                return Ok(NaiveDate::default().and_time(t));
            }
        }
    }
    coerce_timestamp(v)
}

fn to_i64_trunc(v: &FormulaValue) -> FormulaResult<i64> {
    Ok(v.to_number()?.trunc() as i64)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays between two dates, inclusive on both ends; negative when the
/// end precedes the start
fn workdays_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        return -workdays_between(end, start);
    }
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !is_weekend(day) {
            count += 1;
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    count
}

/// Serial number in the 1900 date system (2008-01-01 is 39448)
fn date_serial(date: NaiveDate) -> i64 {
    let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
    (date - base).num_days() + 2
}

/// DATE(year, month, day) - Timestamp at midnight of the given date
pub fn fn_date(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let year = to_i64_trunc(&args[0])?;
    let month = to_i64_trunc(&args[1])?;
    let day = to_i64_trunc(&args[2])?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(FormulaError::Argument(format!(
            "DATE({}, {}, {}) is not a valid date",
            year, month, day
        )));
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(|| {
        FormulaError::Argument(format!("DATE({}, {}, {}) is not a valid date", year, month, day))
    })?;

    Ok(FormulaValue::Timestamp(date.and_time(NaiveTime::MIN)))
}

/// DAYS(end_date, start_date) - Whole days between two dates
pub fn fn_days(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let end = coerce_timestamp(&args[0])?.date();
    let start = coerce_timestamp(&args[1])?.date();
    Ok(FormulaValue::Number((end - start).num_days() as f64))
}

/// WORKDAYS(end_date, start_date) - Weekdays between two dates, inclusive
pub fn fn_workdays(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let end = coerce_timestamp(&args[0])?.date();
    let start = coerce_timestamp(&args[1])?.date();
    Ok(FormulaValue::Number(workdays_between(start, end) as f64))
}

/// WORKDAY(start_date, num_days) - The date num_days weekdays from the start
pub fn fn_workday(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let start = coerce_timestamp(&args[0])?.date();
    let offset = to_i64_trunc(&args[1])?;

    // The step loop visits every day in between
    if offset.unsigned_abs() > 1_000_000 {
        return Err(FormulaError::Argument(format!(
            "WORKDAY: offset {} out of range",
            offset
        )));
    }

    let mut remaining = offset.abs();
    let mut day = start;
    while remaining > 0 {
        let next = if offset > 0 {
            day.succ_opt()
        } else {
            day.pred_opt()
        };
        day = next.ok_or_else(|| FormulaError::Evaluation("Date out of range".into()))?;
        if !is_weekend(day) {
            remaining -= 1;
        }
    }

    Ok(FormulaValue::Timestamp(day.and_time(NaiveTime::MIN)))
}

/// TODAY() - Midnight of the context clock's date
pub fn fn_today(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Timestamp(
        ctx.now.date().and_time(NaiveTime::MIN),
    ))
}

/// FORMAT_DATE(date, [format]) - Render a date with a strftime format
///
/// The format defaults to "%Y-%m-%d".
pub fn fn_format_date(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    let format = match args.get(1) {
        Some(v) => v.as_string(),
        None => "%Y-%m-%d".to_string(),
    };

    // Formatting through write! so a bad specifier surfaces as an error
    // instead of a panic
    use std::fmt::Write;
    let mut out = String::new();
    match write!(&mut out, "{}", ts.format(&format)) {
        Ok(()) => Ok(FormulaValue::String(out)),
        Err(_) => Err(FormulaError::Argument(format!(
            "Invalid date format '{}'",
            format
        ))),
    }
}

/// YEAR(date)
pub fn fn_year(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.year() as f64))
}

/// MONTH(date)
pub fn fn_month(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.month() as f64))
}

/// WEEKNUM(date) - Week of the year, with weeks starting on Sunday
pub fn fn_weeknum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let date = coerce_timestamp(&args[0])?.date();
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .ok_or_else(|| FormulaError::Evaluation("Date out of range".into()))?;

    let week = (date.ordinal0() + jan1.weekday().num_days_from_sunday()) / 7 + 1;
    Ok(FormulaValue::Number(week as f64))
}

/// ISOWEEKNUM(date) - ISO-8601 week number
pub fn fn_isoweeknum(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let date = coerce_timestamp(&args[0])?.date();
    Ok(FormulaValue::Number(date.iso_week().week() as f64))
}

/// DAY(date)
pub fn fn_day(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.day() as f64))
}

/// HOUR(date)
pub fn fn_hour(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_time_or_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.hour() as f64))
}

/// MINUTE(date)
pub fn fn_minute(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_time_or_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.minute() as f64))
}

/// SECOND(date)
pub fn fn_second(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_time_or_timestamp(&args[0])?;
    Ok(FormulaValue::Number(ts.second() as f64))
}

/// ADD_DAYS(date, days)
pub fn fn_add_days(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    let days = to_i64_trunc(&args[1])?;
    let shifted = Duration::try_days(days)
        .and_then(|d| ts.checked_add_signed(d))
        .ok_or_else(|| {
            FormulaError::Argument(format!("ADD_DAYS: offset {} out of range", days))
        })?;
    Ok(FormulaValue::Timestamp(shifted))
}

/// SUBTRACT_DAYS(date, days)
pub fn fn_subtract_days(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let ts = coerce_timestamp(&args[0])?;
    let days = to_i64_trunc(&args[1])?;
    let shifted = Duration::try_days(days)
        .and_then(|d| ts.checked_sub_signed(d))
        .ok_or_else(|| {
            FormulaError::Argument(format!("SUBTRACT_DAYS: offset {} out of range", days))
        })?;
    Ok(FormulaValue::Timestamp(shifted))
}

/// ADD_MINUTES(date, minutes)
pub fn fn_add_minutes(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let ts = coerce_time_or_timestamp(&args[0])?;
    let minutes = to_i64_trunc(&args[1])?;
    let shifted = Duration::try_minutes(minutes)
        .and_then(|d| ts.checked_add_signed(d))
        .ok_or_else(|| {
            FormulaError::Argument(format!("ADD_MINUTES: offset {} out of range", minutes))
        })?;
    Ok(FormulaValue::Timestamp(shifted))
}

/// SUBTRACT_MINUTES(date, minutes)
pub fn fn_subtract_minutes(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let ts = coerce_time_or_timestamp(&args[0])?;
    let minutes = to_i64_trunc(&args[1])?;
    let shifted = Duration::try_minutes(minutes)
        .and_then(|d| ts.checked_sub_signed(d))
        .ok_or_else(|| {
            FormulaError::Argument(format!("SUBTRACT_MINUTES: offset {} out of range", minutes))
        })?;
    Ok(FormulaValue::Timestamp(shifted))
}

/// HOURS_DIFF(time1, time2) - Fractional hours between two times
///
/// Accepts bare times ("17:00") as well as full timestamps.
pub fn fn_hours_diff(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let a = coerce_time_or_timestamp(&args[0])?;
    let b = coerce_time_or_timestamp(&args[1])?;
    let seconds = (a - b).num_seconds();
    Ok(FormulaValue::Number(seconds as f64 / 3600.0))
}

/// DATEVALUE(date_text) - Serial number of a date given as text
pub fn fn_datevalue(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = args[0].as_string();
    let trimmed = text.trim();

    for fmt in DATEVALUE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(FormulaValue::Number(date_serial(date) as f64));
        }
    }

    Err(FormulaError::Argument(format!(
        "DATEVALUE: cannot parse '{}'",
        text
    )))
}
