//! # boardpipe-formula
//!
//! Formula parser and evaluator for boardpipe column expressions.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value)
//! - The closed set of built-in functions (~50)
//!
//! Formulas arrive with column placeholders already substituted, so the
//! language has literals, operators and function calls but no references.
//!
//! ## Example
//!
//! ```rust,ignore
//! use boardpipe_formula::{evaluate, parse_formula, EvaluationContext};
//!
//! let ast = parse_formula("SUM(1,2,3) * 2")?;
//! let result = evaluate(&ast, &EvaluationContext::new())?;
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue};
pub use parser::parse_formula;
