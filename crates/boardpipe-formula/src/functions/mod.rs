//! Built-in formula functions
//!
//! The function set is closed: only the names registered here are callable,
//! and lookup is case sensitive.

pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use std::collections::HashMap;

/// Function implementation signature
///
/// Functions can consult the evaluation context (e.g. the clock used by
/// TODAY) to stay deterministic under test.
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Argument bounds and implementation of one registered function
pub struct FunctionDef {
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math();
        registry.register_logical();
        registry.register_text();
        registry.register_dates();

        registry
    }

    /// Look up a function by name (case sensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    fn add(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        let def = FunctionDef {
            min_args,
            max_args,
            implementation,
        };
        self.functions.insert(name, def);
    }

    fn register_math(&mut self) {
        self.add("SUM", 1, None, math::fn_sum);
        self.add("AVERAGE", 1, None, math::fn_average);
        self.add("COUNT", 1, None, math::fn_count);
        self.add("MIN", 1, None, math::fn_min);
        self.add("MAX", 1, None, math::fn_max);
        self.add("MOD", 2, Some(2), math::fn_mod);
        self.add("ROUND", 1, Some(2), math::fn_round);
        self.add("ROUNDUP", 1, Some(2), math::fn_roundup);
        self.add("ROUNDDOWN", 1, Some(2), math::fn_rounddown);
        self.add("LOG", 1, Some(2), math::fn_log);
        self.add("MINUS", 2, Some(2), math::fn_minus);
        self.add("MULTIPLY", 2, Some(2), math::fn_multiply);
        self.add("DIVIDE", 2, Some(2), math::fn_divide);
        self.add("POWER", 2, Some(2), math::fn_power);
        self.add("SQRT", 1, Some(1), math::fn_sqrt);
        self.add("PI", 0, Some(0), math::fn_pi);
    }

    fn register_logical(&mut self) {
        self.add("IF", 2, Some(3), logical::fn_if);
        // SWITCH takes value-result pairs plus an optional trailing default
        self.add("SWITCH", 3, None, logical::fn_switch);
        self.add("TRUE", 0, Some(0), logical::fn_true);
        self.add("FALSE", 0, Some(0), logical::fn_false);
    }

    fn register_text(&mut self) {
        self.add("TEXT", 2, Some(2), text::fn_text);
        self.add("CONCATENATE", 1, None, text::fn_concatenate);
        self.add("REPLACE", 4, Some(4), text::fn_replace);
        self.add("SUBSTITUTE", 3, Some(4), text::fn_substitute);
        // SEARCH is case insensitive
        self.add("SEARCH", 2, Some(3), text::fn_search);
        self.add("LEFT", 1, Some(2), text::fn_left);
        self.add("RIGHT", 1, Some(2), text::fn_right);
        self.add("LEN", 1, Some(1), text::fn_len);
        self.add("REPT", 2, Some(2), text::fn_rept);
        self.add("TRIM", 1, Some(1), text::fn_trim);
        self.add("UPPER", 1, Some(1), text::fn_upper);
        self.add("LOWER", 1, Some(1), text::fn_lower);
    }

    fn register_dates(&mut self) {
        self.add("DATE", 3, Some(3), date::fn_date);
        self.add("DAYS", 2, Some(2), date::fn_days);
        self.add("WORKDAYS", 2, Some(2), date::fn_workdays);
        self.add("WORKDAY", 2, Some(2), date::fn_workday);
        self.add("TODAY", 0, Some(0), date::fn_today);
        self.add("FORMAT_DATE", 1, Some(2), date::fn_format_date);
        self.add("YEAR", 1, Some(1), date::fn_year);
        self.add("MONTH", 1, Some(1), date::fn_month);
        self.add("WEEKNUM", 1, Some(1), date::fn_weeknum);
        self.add("ISOWEEKNUM", 1, Some(1), date::fn_isoweeknum);
        self.add("DAY", 1, Some(1), date::fn_day);
        self.add("HOUR", 1, Some(1), date::fn_hour);
        self.add("MINUTE", 1, Some(1), date::fn_minute);
        self.add("SECOND", 1, Some(1), date::fn_second);
        self.add("ADD_DAYS", 2, Some(2), date::fn_add_days);
        self.add("SUBTRACT_DAYS", 2, Some(2), date::fn_subtract_days);
        self.add("ADD_MINUTES", 2, Some(2), date::fn_add_minutes);
        self.add("SUBTRACT_MINUTES", 2, Some(2), date::fn_subtract_minutes);
        self.add("HOURS_DIFF", 2, Some(2), date::fn_hours_diff);
        self.add("DATEVALUE", 1, Some(1), date::fn_datevalue);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
