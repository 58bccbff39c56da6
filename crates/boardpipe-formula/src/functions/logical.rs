//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::{compare_values, EvaluationContext, FormulaValue};
use std::cmp::Ordering;

/// IF(condition, value_if_true, [value_if_false])
///
/// The condition uses truthiness: zero, empty text and null are false.
/// A missing else branch yields null.
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args[0].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(FormulaValue::Null))
    }
}

/// SWITCH(expression, value1, result1, [value2, result2, ...], [default])
pub fn fn_switch(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let expression = &args[0];

    // Value-result pairs follow the expression; a trailing odd argument
    // is the default
    let remaining = args.len() - 1;
    let has_default = remaining % 2 == 1;
    let num_pairs = remaining / 2;

    for pair_idx in 0..num_pairs {
        let value_idx = 1 + pair_idx * 2;
        if compare_values(expression, &args[value_idx]) == Some(Ordering::Equal) {
            return Ok(args[value_idx + 1].clone());
        }
    }

    if has_default {
        return Ok(args[args.len() - 1].clone());
    }

    Ok(FormulaValue::Null)
}

/// TRUE()
pub fn fn_true(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(true))
}

/// FALSE()
pub fn fn_false(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(false))
}
