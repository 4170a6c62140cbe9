#![warn(missing_docs)]
//! Derived-KPI formula logic.
//!
//! Derived KPIs are declared as textual arithmetic over existing KPI columns,
//! e.g. `"revenue/orders"`. Formulas are parsed into a small AST and evaluated
//! row-wise against coerced floating-point columns. The grammar is
//! deliberately restricted: identifiers, numeric literals, `+ - * /` and
//! parentheses. Nothing else is accepted, so untrusted formula strings can
//! never execute anything beyond column arithmetic.

mod formula;

pub use formula::{BinOp, Expr, FormulaError, parse_formula};
