//! Formula evaluator
//!
//! Walks a parsed formula and reduces it to a single value.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use chrono::{NaiveDateTime, Utc};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Render format for timestamp values
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Built-in function set, constructed on first use
static BUILTINS: OnceLock<FunctionRegistry> = OnceLock::new();

fn builtins() -> &'static FunctionRegistry {
    BUILTINS.get_or_init(FunctionRegistry::new)
}

/// Runtime value flowing through an evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Null,
}

impl FormulaValue {
    /// Numeric view of the value, when one exists
    ///
    /// Strings never convert implicitly; arithmetic on text is an error,
    /// text has to go through a parsing function first.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::Null => Some(0.0),
            _ => None,
        }
    }

    /// Numeric conversion for arithmetic, erroring on text and timestamps
    pub fn to_number(&self) -> FormulaResult<f64> {
        self.as_number()
            .ok_or_else(|| FormulaError::Evaluation(format!("Cannot convert {:?} to number", self)))
    }

    /// Truthiness for conditionals: zero, empty text and null are false
    pub fn is_truthy(&self) -> bool {
        match self {
            FormulaValue::Number(n) => *n != 0.0,
            FormulaValue::String(s) => !s.is_empty(),
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Timestamp(_) => true,
            FormulaValue::Null => false,
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => {
                // No trailing zeros for whole numbers
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            FormulaValue::Null => String::new(),
        }
    }
}

/// Ambient state functions may read during evaluation
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Clock consulted by TODAY(), in UTC. Pinnable for deterministic output.
    pub now: NaiveDateTime,
}

impl EvaluationContext {
    /// Create a context using the current UTC time
    pub fn new() -> Self {
        Self {
            now: Utc::now().naive_utc(),
        }
    }

    /// Create a context with a fixed clock
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce an expression tree to a single value
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Apply a binary operator to its two evaluated sides
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    match op {
        // Arithmetic operators
        BinaryOperator::Add => {
            // '+' concatenates when both sides are text
            if let (FormulaValue::String(l), FormulaValue::String(r)) = (&left_val, &right_val) {
                return Ok(FormulaValue::String(format!("{}{}", l, r)));
            }
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            Ok(FormulaValue::Number(l + r))
        }
        BinaryOperator::Subtract => {
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            Ok(FormulaValue::Number(l - r))
        }
        BinaryOperator::Multiply => {
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            Ok(FormulaValue::Number(l * r))
        }
        BinaryOperator::Divide => {
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            if r == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Ok(FormulaValue::Number(l / r))
        }
        BinaryOperator::Power => {
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            let result = l.powf(r);
            if result.is_nan() || result.is_infinite() {
                return Err(FormulaError::Evaluation(format!(
                    "Invalid exponentiation: {}^{}",
                    l, r
                )));
            }
            Ok(FormulaValue::Number(result))
        }

        // Equality never errors; values of different types are unequal
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Some(Ordering::Equal),
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Some(Ordering::Equal),
        )),

        // Ordering requires comparable types
        BinaryOperator::LessThan => {
            let ord = require_ordering(&left_val, &right_val)?;
            Ok(FormulaValue::Boolean(ord == Ordering::Less))
        }
        BinaryOperator::LessEqual => {
            let ord = require_ordering(&left_val, &right_val)?;
            Ok(FormulaValue::Boolean(ord != Ordering::Greater))
        }
        BinaryOperator::GreaterThan => {
            let ord = require_ordering(&left_val, &right_val)?;
            Ok(FormulaValue::Boolean(ord == Ordering::Greater))
        }
        BinaryOperator::GreaterEqual => {
            let ord = require_ordering(&left_val, &right_val)?;
            Ok(FormulaValue::Boolean(ord != Ordering::Less))
        }
    }
}

/// Compare two values, if their types are comparable
///
/// Numbers and booleans compare numerically, strings compare
/// lexicographically (case sensitive), timestamps chronologically.
/// Mixed types do not compare. SWITCH shares these semantics.
pub(crate) fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Option<Ordering> {
    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => l.partial_cmp(r),
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => Some(l.cmp(r)),
        (FormulaValue::Number(l), FormulaValue::Boolean(r)) => {
            l.partial_cmp(&(*r as i64 as f64))
        }
        (FormulaValue::Boolean(l), FormulaValue::Number(r)) => {
            (*l as i64 as f64).partial_cmp(r)
        }
        (FormulaValue::String(l), FormulaValue::String(r)) => Some(l.cmp(r)),
        (FormulaValue::Timestamp(l), FormulaValue::Timestamp(r)) => Some(l.cmp(r)),
        (FormulaValue::Null, FormulaValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn require_ordering(left: &FormulaValue, right: &FormulaValue) -> FormulaResult<Ordering> {
    compare_values(left, right).ok_or_else(|| {
        FormulaError::Evaluation(format!("Cannot compare {:?} with {:?}", left, right))
    })
}

/// Apply a unary operator to its evaluated operand
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Negate => {
            let n = val.to_number()?;
            Ok(FormulaValue::Number(-n))
        }
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    // Lookup is case sensitive; "sum" is not a function
    let func = builtins()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::new();
        evaluate(&ast, &ctx)
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(eval("42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("3.14").unwrap(), FormulaValue::Number(3.14));
        assert_eq!(
            eval("\"Hello\"").unwrap(),
            FormulaValue::String("Hello".into())
        );
        assert_eq!(eval("TRUE").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("FALSE").unwrap(), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_arithmetic_operators() {
        assert_eq!(eval("1+2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("10-3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("4*5").unwrap(), FormulaValue::Number(20.0));
        assert_eq!(eval("20/4").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("2^10").unwrap(), FormulaValue::Number(1024.0));
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(eval("1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("2+3*4-5").unwrap(), FormulaValue::Number(9.0));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-5").unwrap(), FormulaValue::Number(-5.0));
        assert_eq!(eval("--5").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("3--2").unwrap(), FormulaValue::Number(5.0));
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(eval("1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("1>2").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("5==5").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("5<>5").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("5!=4").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("5<=5").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("5>=6").unwrap(), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_string_comparison_case_sensitive() {
        assert_eq!(
            eval("\"apple\" < \"banana\"").unwrap(),
            FormulaValue::Boolean(true)
        );
        assert_eq!(eval("\"A\" == \"a\"").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(
            eval("\"Done\" == \"Done\"").unwrap(),
            FormulaValue::Boolean(true)
        );
    }

    #[test]
    fn test_mixed_type_equality() {
        // Different types are never equal, and never an error
        assert_eq!(eval("5 == \"5\"").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("5 != \"5\"").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_mixed_type_ordering_errors() {
        assert!(matches!(
            eval("\"a\" < 1"),
            Err(FormulaError::Evaluation(_))
        ));
    }

    #[test]
    fn test_plus_concatenates_strings() {
        assert_eq!(
            eval("\"Hello \" + \"World\"").unwrap(),
            FormulaValue::String("Hello World".into())
        );
        // Text plus number stays an error
        assert!(eval("\"Value: \" + 42").is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(eval("1/0"), Err(FormulaError::DivisionByZero)));
        assert!(matches!(eval("10/(3-3)"), Err(FormulaError::DivisionByZero)));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            eval("NOPE(1)"),
            Err(FormulaError::UnknownFunction(_))
        ));
        // Names are case sensitive
        assert!(matches!(
            eval("sum(1,2)"),
            Err(FormulaError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_argument_count() {
        assert!(matches!(
            eval("MOD(1)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
        assert!(matches!(
            eval("PI(1)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_as_string() {
        assert_eq!(FormulaValue::Number(4.0).as_string(), "4");
        assert_eq!(FormulaValue::Number(4.5).as_string(), "4.5");
        assert_eq!(FormulaValue::Boolean(true).as_string(), "TRUE");
        assert_eq!(FormulaValue::Null.as_string(), "");
    }

    #[test]
    fn test_is_truthy() {
        assert!(FormulaValue::Number(1.0).is_truthy());
        assert!(!FormulaValue::Number(0.0).is_truthy());
        assert!(FormulaValue::String("x".into()).is_truthy());
        assert!(!FormulaValue::String(String::new()).is_truthy());
        assert!(!FormulaValue::Null.is_truthy());
    }

    /// Evaluates with the clock pinned to `now` ("%Y-%m-%d %H:%M:%S").
    fn eval_at(formula: &str, now: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let now = NaiveDateTime::parse_from_str(now, "%Y-%m-%d %H:%M:%S").unwrap();
        evaluate(&ast, &EvaluationContext::fixed(now))
    }

    #[test]
    fn test_aggregate_functions() {
        assert_eq!(eval("SUM(1,2,3)").unwrap(), FormulaValue::Number(6.0));
        // Non-numeric arguments are skipped, not an error
        assert_eq!(eval("SUM(1,\"a\",3)").unwrap(), FormulaValue::Number(4.0));
        assert_eq!(eval("AVERAGE(2,4,6)").unwrap(), FormulaValue::Number(4.0));
        assert_eq!(eval("MIN(5,2,8,1)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("MAX(5,2,8,1)").unwrap(), FormulaValue::Number(8.0));
        assert_eq!(
            eval("COUNT(1,2,\"a\",3)").unwrap(),
            FormulaValue::Number(3.0)
        );
        assert!(matches!(
            eval("AVERAGE(\"a\")"),
            Err(FormulaError::DivisionByZero)
        ));
    }

    #[test]
    fn test_rounding_functions() {
        // Halves round away from zero
        assert_eq!(eval("ROUND(2.5)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("ROUND(-2.5)").unwrap(), FormulaValue::Number(-3.0));
        assert_eq!(eval("ROUND(2.567,2)").unwrap(), FormulaValue::Number(2.57));
        assert_eq!(eval("ROUNDUP(2.1)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("ROUNDUP(-2.1)").unwrap(), FormulaValue::Number(-3.0));
        assert_eq!(eval("ROUNDDOWN(2.9)").unwrap(), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_binary_function_forms() {
        assert_eq!(eval("MINUS(10,3)").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("MULTIPLY(4,5)").unwrap(), FormulaValue::Number(20.0));
        assert_eq!(eval("DIVIDE(8,2)").unwrap(), FormulaValue::Number(4.0));
        assert!(matches!(
            eval("DIVIDE(1,0)"),
            Err(FormulaError::DivisionByZero)
        ));
        assert_eq!(eval("POWER(2,8)").unwrap(), FormulaValue::Number(256.0));
        assert_eq!(eval("SQRT(16)").unwrap(), FormulaValue::Number(4.0));
        assert!(eval("SQRT(-1)").is_err());
    }

    #[test]
    fn test_mod_follows_divisor_sign() {
        assert_eq!(eval("MOD(10,3)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("MOD(-3,2)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("MOD(3,-2)").unwrap(), FormulaValue::Number(-1.0));
        assert!(matches!(
            eval("MOD(5,0)"),
            Err(FormulaError::DivisionByZero)
        ));
    }

    #[test]
    fn test_log() {
        assert_eq!(eval("ROUND(LOG(100),10)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("ROUND(LOG(8,2),10)").unwrap(), FormulaValue::Number(3.0));
        assert!(eval("LOG(0)").is_err());
        assert!(eval("LOG(100,1)").is_err());
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("IF(TRUE,1,2)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("IF(FALSE,1,2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(
            eval("IF(1>0,\"Yes\",\"No\")").unwrap(),
            FormulaValue::String("Yes".into())
        );
        // Empty text is false, and a missing else branch yields null
        assert_eq!(eval("IF(\"\",1,2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("IF(0,1)").unwrap(), FormulaValue::Null);
    }

    #[test]
    fn test_switch() {
        assert_eq!(
            eval("SWITCH(2,1,\"a\",2,\"b\",\"default\")").unwrap(),
            FormulaValue::String("b".into())
        );
        assert_eq!(
            eval("SWITCH(9,1,\"a\",2,\"b\",\"default\")").unwrap(),
            FormulaValue::String("default".into())
        );
        assert_eq!(eval("SWITCH(9,1,\"a\")").unwrap(), FormulaValue::Null);
        assert_eq!(
            eval("SWITCH(\"Done\",\"Done\",100,\"Stuck\",0)").unwrap(),
            FormulaValue::Number(100.0)
        );
    }

    #[test]
    fn test_text_functions() {
        assert_eq!(eval("LEN(\"abc\")").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(
            eval("LEFT(\"abcdef\",2)").unwrap(),
            FormulaValue::String("ab".into())
        );
        assert_eq!(
            eval("LEFT(\"abcdef\")").unwrap(),
            FormulaValue::String("a".into())
        );
        assert_eq!(
            eval("RIGHT(\"abcdef\",3)").unwrap(),
            FormulaValue::String("def".into())
        );
        assert_eq!(
            eval("UPPER(\"AbC\")").unwrap(),
            FormulaValue::String("ABC".into())
        );
        assert_eq!(
            eval("LOWER(\"AbC\")").unwrap(),
            FormulaValue::String("abc".into())
        );
        assert_eq!(
            eval("TRIM(\"  a   b  \")").unwrap(),
            FormulaValue::String("a b".into())
        );
        assert_eq!(
            eval("REPT(\"ab\",3)").unwrap(),
            FormulaValue::String("ababab".into())
        );
        assert_eq!(
            eval("CONCATENATE(\"a\",1,\"b\")").unwrap(),
            FormulaValue::String("a1b".into())
        );
    }

    #[test]
    fn test_rept_caps_result_length() {
        // 32767 chars is the most a cell holds
        assert_eq!(
            eval("LEN(REPT(\"ab\",16383))").unwrap(),
            FormulaValue::Number(32766.0)
        );
        assert!(eval("REPT(\"ab\",16384)").is_err());
        assert!(eval("REPT(\"abc\",99999999999999999999)").is_err());
    }

    #[test]
    fn test_replace_and_substitute() {
        assert_eq!(
            eval("REPLACE(\"abcdef\",2,3,\"XY\")").unwrap(),
            FormulaValue::String("aXYef".into())
        );
        // A count past the end swallows the whole tail
        assert_eq!(
            eval("REPLACE(\"abcdef\",2,99999999999999999999,\"X\")").unwrap(),
            FormulaValue::String("aX".into())
        );
        assert_eq!(
            eval("SUBSTITUTE(\"a-b-c\",\"-\",\"+\")").unwrap(),
            FormulaValue::String("a+b+c".into())
        );
        assert_eq!(
            eval("SUBSTITUTE(\"a-b-c\",\"-\",\"+\",2)").unwrap(),
            FormulaValue::String("a-b+c".into())
        );
    }

    #[test]
    fn test_search() {
        // Positions are 1-based and matching ignores case
        assert_eq!(eval("SEARCH(\"b\",\"abc\")").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("SEARCH(\"C\",\"abc\")").unwrap(), FormulaValue::Number(3.0));
        assert!(eval("SEARCH(\"z\",\"abc\")").is_err());
    }

    #[test]
    fn test_text_formats() {
        assert_eq!(
            eval("TEXT(1234.567,\"$#,##0.00\")").unwrap(),
            FormulaValue::String("$1,234.57".into())
        );
        assert_eq!(
            eval("TEXT(1234.567,\"#,##0\")").unwrap(),
            FormulaValue::String("1,235".into())
        );
        assert_eq!(
            eval("TEXT(1234.567,\"0\")").unwrap(),
            FormulaValue::String("1235".into())
        );
        assert_eq!(
            eval("TEXT(0.5,\"0.00\")").unwrap(),
            FormulaValue::String("0.50".into())
        );
        assert_eq!(
            eval("TEXT(-1234.5,\"$#,##0.00\")").unwrap(),
            FormulaValue::String("-$1,234.50".into())
        );
        // Unrecognized formats fall back to the plain rendering
        assert_eq!(
            eval("TEXT(42,\"yyyy\")").unwrap(),
            FormulaValue::String("42".into())
        );
    }

    #[test]
    fn test_date_construction() {
        assert_eq!(
            eval("FORMAT_DATE(DATE(2024,3,5))").unwrap(),
            FormulaValue::String("2024-03-05".into())
        );
        assert_eq!(
            eval("FORMAT_DATE(DATE(2024,3,5),\"%d/%m/%Y\")").unwrap(),
            FormulaValue::String("05/03/2024".into())
        );
        assert!(eval("DATE(2024,2,30)").is_err());
        assert!(eval("DATE(2024,13,1)").is_err());
    }

    #[test]
    fn test_date_components() {
        assert_eq!(
            eval("YEAR(\"2024-03-05\")").unwrap(),
            FormulaValue::Number(2024.0)
        );
        assert_eq!(
            eval("MONTH(\"2024-03-05\")").unwrap(),
            FormulaValue::Number(3.0)
        );
        assert_eq!(eval("DAY(\"2024-03-05\")").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(
            eval("HOUR(\"2024-03-05 14:30:15\")").unwrap(),
            FormulaValue::Number(14.0)
        );
        assert_eq!(
            eval("MINUTE(\"2024-03-05 14:30:15\")").unwrap(),
            FormulaValue::Number(30.0)
        );
        assert_eq!(
            eval("SECOND(\"2024-03-05 14:30:15\")").unwrap(),
            FormulaValue::Number(15.0)
        );
    }

    #[test]
    fn test_week_numbers() {
        assert_eq!(
            eval("WEEKNUM(\"2024-01-01\")").unwrap(),
            FormulaValue::Number(1.0)
        );
        assert_eq!(
            eval("WEEKNUM(\"2024-01-07\")").unwrap(),
            FormulaValue::Number(2.0)
        );
        assert_eq!(
            eval("ISOWEEKNUM(\"2024-01-01\")").unwrap(),
            FormulaValue::Number(1.0)
        );
    }

    #[test]
    fn test_date_arithmetic() {
        assert_eq!(
            eval("DAYS(\"2024-03-10\",\"2024-03-01\")").unwrap(),
            FormulaValue::Number(9.0)
        );
        assert_eq!(
            eval("FORMAT_DATE(ADD_DAYS(\"2024-03-05\",10))").unwrap(),
            FormulaValue::String("2024-03-15".into())
        );
        assert_eq!(
            eval("FORMAT_DATE(SUBTRACT_DAYS(\"2024-03-05\",5))").unwrap(),
            FormulaValue::String("2024-02-29".into())
        );
        assert_eq!(
            eval("FORMAT_DATE(ADD_MINUTES(\"2024-03-05 10:00:00\",30),\"%H:%M\")").unwrap(),
            FormulaValue::String("10:30".into())
        );
    }

    #[test]
    fn test_hours_diff() {
        assert_eq!(
            eval("HOURS_DIFF(\"17:00\",\"09:30\")").unwrap(),
            FormulaValue::Number(7.5)
        );
        assert_eq!(
            eval("HOURS_DIFF(\"2024-03-06 09:00:00\",\"2024-03-05 09:00:00\")").unwrap(),
            FormulaValue::Number(24.0)
        );
    }

    #[test]
    fn test_workdays() {
        // 2024-01-01 is a Monday, 2024-01-05 a Friday
        assert_eq!(
            eval("WORKDAYS(\"2024-01-05\",\"2024-01-01\")").unwrap(),
            FormulaValue::Number(5.0)
        );
        // The trailing weekend adds nothing
        assert_eq!(
            eval("WORKDAYS(\"2024-01-07\",\"2024-01-01\")").unwrap(),
            FormulaValue::Number(5.0)
        );
        assert_eq!(
            eval("WORKDAYS(\"2024-01-01\",\"2024-01-07\")").unwrap(),
            FormulaValue::Number(-5.0)
        );
        assert_eq!(
            eval("FORMAT_DATE(WORKDAY(\"2024-01-05\",1))").unwrap(),
            FormulaValue::String("2024-01-08".into())
        );
        assert_eq!(
            eval("FORMAT_DATE(WORKDAY(\"2024-01-08\",-1))").unwrap(),
            FormulaValue::String("2024-01-05".into())
        );
    }

    #[test]
    fn test_date_offset_out_of_range() {
        // Offsets the calendar cannot hold are errors
        assert!(eval("ADD_DAYS(\"2024-01-05\",99999999999999999999)").is_err());
        assert!(eval("SUBTRACT_DAYS(\"2024-01-05\",99999999999999999999)").is_err());
        assert!(eval("ADD_MINUTES(\"2024-01-05 10:00:00\",99999999999999999999)").is_err());
        assert!(eval("SUBTRACT_MINUTES(\"2024-01-05 10:00:00\",99999999999999999999)").is_err());
        // Fits in a duration but lands past the last representable date
        assert!(eval("ADD_DAYS(\"2024-01-05\",100000000000)").is_err());
        assert!(eval("WORKDAY(\"2024-01-05\",99999999999999999999)").is_err());
        assert!(eval("WORKDAY(\"2024-01-05\",-99999999999999999999)").is_err());
    }

    #[test]
    fn test_today_uses_context_clock() {
        assert_eq!(
            eval_at("FORMAT_DATE(TODAY())", "2024-06-15 10:30:00").unwrap(),
            FormulaValue::String("2024-06-15".into())
        );
        assert_eq!(
            eval_at("DAYS(TODAY(),\"2024-06-01\")", "2024-06-15 10:30:00").unwrap(),
            FormulaValue::Number(14.0)
        );
    }

    #[test]
    fn test_datevalue() {
        assert_eq!(
            eval("DATEVALUE(\"2008-01-01\")").unwrap(),
            FormulaValue::Number(39448.0)
        );
        assert_eq!(
            eval("DATEVALUE(\"01/15/2024\")").unwrap(),
            eval("DATEVALUE(\"2024-01-15\")").unwrap()
        );
        assert!(eval("DATEVALUE(\"not a date\")").is_err());
    }

    #[test]
    fn test_format_date_rejects_bad_format() {
        assert!(eval("FORMAT_DATE(DATE(2024,1,1),\"%Q\")").is_err());
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(
            eval("SUM(1,IF(TRUE,10,20),3)").unwrap(),
            FormulaValue::Number(14.0)
        );
        assert_eq!(
            eval("IF(SEARCH(\"b\",\"abc\")==2,\"found\",\"missing\")").unwrap(),
            FormulaValue::String("found".into())
        );
        assert_eq!(
            eval("CONCATENATE(UPPER(\"a\"),ROUND(1.5))").unwrap(),
            FormulaValue::String("A2".into())
        );
    }
}
