//! Expression Abstract Syntax Tree
//!
//! Defines the node contract the parser produces and the evaluator walks:
//! scalar literals, string literals, variable references, unary and binary
//! operations, and function calls.

use std::str::FromStr;

use crate::expr::error::{ExprError, ExprResult};
use crate::expr::parser::parse_expression;

/// A unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical not: 0 becomes 1, anything else becomes 0
    Not,
    /// Arithmetic negation
    Neg,
}

impl FromStr for UnaryOp {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "!" => Ok(UnaryOp::Not),
            "-" => Ok(UnaryOp::Neg),
            other => Err(ExprError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `==`, yields 0/1
    Eq,
    /// `!=`, yields 0/1
    Neq,
    /// `>`, yields 0/1
    Gt,
    /// `>=`, yields 0/1
    Gte,
    /// `<`, yields 0/1
    Lt,
    /// `<=`, yields 0/1
    Lte,
    /// `&&`, short-circuits on a falsy left operand
    And,
    /// `||`, short-circuits on a truthy left operand
    Or,
}

impl FromStr for BinaryOp {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(BinaryOp::Add),
            "-" => Ok(BinaryOp::Sub),
            "*" => Ok(BinaryOp::Mul),
            "/" => Ok(BinaryOp::Div),
            "%" => Ok(BinaryOp::Mod),
            "**" => Ok(BinaryOp::Pow),
            "==" => Ok(BinaryOp::Eq),
            "!=" => Ok(BinaryOp::Neq),
            ">" => Ok(BinaryOp::Gt),
            ">=" => Ok(BinaryOp::Gte),
            "<" => Ok(BinaryOp::Lt),
            "<=" => Ok(BinaryOp::Lte),
            "&&" => Ok(BinaryOp::And),
            "||" => Ok(BinaryOp::Or),
            other => Err(ExprError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

/// A node in a parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// A numeric literal
    Scalar(f64),
    /// A single-quoted string literal, only valid as a function argument
    String(String),
    /// A `$name` reference to another request's results
    Var(String),
    /// A unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        arg: Box<ExprNode>,
    },
    /// A binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<ExprNode>,
        /// Right operand
        rhs: Box<ExprNode>,
    },
    /// A call into the built-in function registry
    Func {
        /// Function name, resolved at evaluation time
        name: String,
        /// Argument expressions
        args: Vec<ExprNode>,
    },
}

impl ExprNode {
    /// Collect every `$name` referenced anywhere in the tree, in first
    /// appearance order, without duplicates.
    pub fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            ExprNode::Scalar(_) | ExprNode::String(_) => {}
            ExprNode::Var(name) => {
                if !out.iter().any(|v| v == name) {
                    out.push(name.clone());
                }
            }
            ExprNode::Unary { arg, .. } => arg.collect_vars(out),
            ExprNode::Binary { lhs, rhs, .. } => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            ExprNode::Func { args, .. } => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
        }
    }
}

/// A parsed expression, ready to be executed against a variable
/// environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Root of the parsed tree
    pub root: ExprNode,
    /// Names of every referenced variable, first appearance order
    pub var_names: Vec<String>,
}

impl Expr {
    /// Parse an expression string into a tree
    pub fn parse(input: &str) -> ExprResult<Self> {
        let root = parse_expression(input)?;
        let mut var_names = Vec::new();
        root.collect_vars(&mut var_names);
        Ok(Self { root, var_names })
    }
}
