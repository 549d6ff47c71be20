//! Formulary Expression Engine
//!
//! Parses and evaluates formula expressions such as `"$A + $B * 2"`:
//!
//! - **AST**: the node contract the parser produces
//! - **Parser**: nom grammar with the usual arithmetic precedence
//! - **Evaluator**: tree walk with label-based Union matching and
//!   null/NaN propagation
//! - **Funcs**: the closed built-in function registry
//!
//! # Example
//!
//! ```rust,ignore
//! use formulary::expr::Expr;
//!
//! let expr = Expr::parse("$A * 2 + abs($B)")?;
//! assert_eq!(expr.var_names, vec!["A", "B"]);
//! let results = expr.execute(&vars)?;
//! ```

mod ast;
mod error;
mod eval;
mod funcs;
mod parser;

pub use ast::{BinaryOp, Expr, ExprNode, UnaryOp};
pub use error::{ExprError, ExprResult};
pub use eval::Evaluator;
pub use funcs::BuiltinFunc;
pub use parser::parse_expression;
