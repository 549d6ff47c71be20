//! Built-in function registry
//!
//! A fixed, closed set of functions callable from formulas. Elementwise
//! functions take one variant argument and apply across Scalar, Number,
//! and Series alike; constant functions take no arguments and return a
//! label-less Scalar. Dispatch is statically typed per signature, so a
//! bad call returns an error instead of faulting mid-walk.

use std::str::FromStr;

use crate::expr::ast::ExprNode;
use crate::expr::error::{ExprError, ExprResult};
use crate::expr::eval::Evaluator;
use crate::value::{Number, Results, Scalar, Series, Value};

/// A function in the built-in registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunc {
    /// `abs(x)`, elementwise absolute value
    Abs,
    /// `log(x)`, elementwise natural logarithm
    Log,
    /// `round(x)`, elementwise round-half-away-from-zero
    Round,
    /// `floor(x)`, elementwise floor
    Floor,
    /// `ceil(x)`, elementwise ceiling
    Ceil,
    /// `nan()`, the NaN scalar
    Nan,
    /// `inf()`, the +Infinity scalar
    Inf,
    /// `infn()`, the -Infinity scalar
    Infn,
    /// `null()`, the null scalar
    Null,
}

impl FromStr for BuiltinFunc {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abs" => Ok(BuiltinFunc::Abs),
            "log" => Ok(BuiltinFunc::Log),
            "round" => Ok(BuiltinFunc::Round),
            "floor" => Ok(BuiltinFunc::Floor),
            "ceil" => Ok(BuiltinFunc::Ceil),
            "nan" => Ok(BuiltinFunc::Nan),
            "inf" => Ok(BuiltinFunc::Inf),
            "infn" => Ok(BuiltinFunc::Infn),
            "null" => Ok(BuiltinFunc::Null),
            other => Err(ExprError::UnknownFunction(other.to_string())),
        }
    }
}

/// Resolve `name` in the registry and invoke it on `args`
pub(crate) fn call_builtin(
    evaluator: &Evaluator<'_>,
    name: &str,
    args: &[ExprNode],
) -> ExprResult<Results> {
    let func: BuiltinFunc = name.parse()?;
    match func {
        BuiltinFunc::Abs => elementwise(evaluator, name, args, f64::abs),
        BuiltinFunc::Log => elementwise(evaluator, name, args, f64::ln),
        BuiltinFunc::Round => elementwise(evaluator, name, args, f64::round),
        BuiltinFunc::Floor => elementwise(evaluator, name, args, f64::floor),
        BuiltinFunc::Ceil => elementwise(evaluator, name, args, f64::ceil),
        BuiltinFunc::Nan => constant(name, args, Some(f64::NAN)),
        BuiltinFunc::Inf => constant(name, args, Some(f64::INFINITY)),
        BuiltinFunc::Infn => constant(name, args, Some(f64::NEG_INFINITY)),
        BuiltinFunc::Null => constant(name, args, None),
    }
}

fn check_arity(name: &str, args: &[ExprNode], expected: usize) -> ExprResult<()> {
    if args.len() != expected {
        return Err(ExprError::BadArity {
            function: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn constant(name: &str, args: &[ExprNode], value: Option<f64>) -> ExprResult<Results> {
    check_arity(name, args, 0)?;
    Ok(Results::scalar(value))
}

fn elementwise(
    evaluator: &Evaluator<'_>,
    name: &str,
    args: &[ExprNode],
    f: fn(f64) -> f64,
) -> ExprResult<Results> {
    check_arity(name, args, 1)?;
    let arg = evaluator.walk(&args[0])?;
    let mut results = Results::new();
    for value in arg.values {
        results.push(per_float(value, f)?);
    }
    Ok(results)
}

/// Apply `f` to every float in a value. A null input becomes NaN, which
/// is how elementwise functions have always treated missing samples
/// (unary operators, by contrast, keep null as null).
fn per_float(value: Value, f: fn(f64) -> f64) -> ExprResult<Value> {
    Ok(match value {
        Value::Scalar(s) => Value::Scalar(Scalar::new(Some(apply_or_nan(s.value, f)))),
        Value::Number(n) => Value::Number(Number::with_value(
            n.name,
            n.labels,
            Some(apply_or_nan(n.value, f)),
        )),
        Value::Series(s) => {
            let mut out = Series::with_capacity(
                s.name().to_string(),
                s.labels().clone(),
                s.time_nullable(),
                s.len(),
            );
            for (t, v) in s.points() {
                out.push_point(t, Some(apply_or_nan(v, f)))?;
            }
            Value::Series(out)
        }
    })
}

fn apply_or_nan(v: Option<f64>, f: fn(f64) -> f64) -> f64 {
    v.map_or(f64::NAN, f)
}
