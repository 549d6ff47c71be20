//! Expression error types
//!
//! Defines all error conditions that can occur while parsing or evaluating
//! a formula expression. Errors are always returned as values; the
//! evaluator never panics on an ill-formed tree.

use thiserror::Error;

use crate::value::ValueError;

/// Errors that can occur during expression parsing and evaluation
#[derive(Error, Debug)]
pub enum ExprError {
    /// Expression string could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Operator token not in the operator table
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// Function name not in the built-in registry
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Function called with the wrong number of arguments
    #[error("function '{function}' expects {expected} argument(s), got {got}")]
    BadArity {
        /// The function that was called
        function: String,
        /// How many arguments its signature takes
        expected: usize,
        /// How many were supplied
        got: usize,
    },

    /// A variable reference that the environment cannot resolve
    #[error("undefined variable '${0}'")]
    UndefinedVariable(String),

    /// A string literal used where a numeric operand is required
    #[error("cannot use string literal '{0}' as a numeric operand")]
    StringOperand(String),

    /// Value-layer failure during evaluation
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Result type alias for expression operations
pub type ExprResult<T> = Result<T, ExprError>;
