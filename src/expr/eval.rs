//! Expression Evaluator
//!
//! A tree-walking interpreter over parsed expression trees. Binary
//! operations first pair up operands by label compatibility (the Union
//! step), then dispatch on the kind of each operand; the result is always
//! the "higher" kind of the two (Series over Number over Scalar).
//!
//! Null and NaN behavior is uniform throughout: a null operand produces a
//! null result, NaN propagates through every operator except `&&`/`||`,
//! which short-circuit on the left operand before any NaN check.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::expr::ast::{BinaryOp, Expr, ExprNode, UnaryOp};
use crate::expr::error::{ExprError, ExprResult};
use crate::expr::funcs;
use crate::value::{Labels, Number, Results, Scalar, Series, Value, ValueResult, Vars};

impl Expr {
    /// Execute the expression against a variable environment
    pub fn execute(&self, vars: &Vars) -> ExprResult<Results> {
        Evaluator::new(vars).execute(self)
    }
}

/// Walks a parsed expression tree against a variable environment
pub struct Evaluator<'a> {
    vars: &'a Vars,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over `vars`
    pub fn new(vars: &'a Vars) -> Self {
        Self { vars }
    }

    /// Evaluate a parsed expression
    pub fn execute(&self, expr: &Expr) -> ExprResult<Results> {
        self.walk(&expr.root)
    }

    pub(crate) fn walk(&self, node: &ExprNode) -> ExprResult<Results> {
        match node {
            ExprNode::Scalar(f) => Ok(Results::scalar(Some(*f))),
            ExprNode::String(s) => Err(ExprError::StringOperand(s.clone())),
            ExprNode::Var(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::UndefinedVariable(name.clone())),
            ExprNode::Unary { op, arg } => self.walk_unary(*op, arg),
            ExprNode::Binary { op, lhs, rhs } => self.walk_binary(*op, lhs, rhs),
            ExprNode::Func { name, args } => funcs::call_builtin(self, name, args),
        }
    }

    fn walk_unary(&self, op: UnaryOp, arg: &ExprNode) -> ExprResult<Results> {
        let operand = self.walk(arg)?;
        let mut results = Results::new();
        for val in operand.values {
            let new_val = match val {
                Value::Scalar(s) => {
                    Value::Scalar(Scalar::new(s.value.map(|f| unary_op(op, f))))
                }
                Value::Number(n) => Value::Number(Number::with_value(
                    n.name,
                    n.labels,
                    n.value.map(|f| unary_op(op, f)),
                )),
                Value::Series(s) => Value::Series(unary_series(op, &s)?),
            };
            results.push(new_val);
        }
        Ok(results)
    }

    fn walk_binary(&self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode) -> ExprResult<Results> {
        let left = self.walk(lhs)?;
        let right = self.walk(rhs)?;
        let unions = union(&left, &right);
        trace!(op = %op, unions = unions.len(), "dispatching binary operation");

        let mut results = Results::new();
        for uni in unions {
            let name = uni.labels.to_string();
            let value: Value = match (uni.a, uni.b) {
                // Scalar op Scalar stays a Scalar; everything else
                // produces the higher operand kind.
                (Value::Scalar(a), Value::Scalar(b)) => {
                    Value::Scalar(bi_scalar_scalar(op, a.value, b.value))
                }
                (Value::Scalar(a), Value::Number(b)) => {
                    bi_number(&name, &uni.labels, op, b.value, a.value, false).into()
                }
                (Value::Scalar(a), Value::Series(b)) => {
                    bi_series_scalar(&name, &uni.labels, op, b, a.value, false)?.into()
                }
                (Value::Number(a), Value::Scalar(b)) => {
                    bi_number(&name, &uni.labels, op, a.value, b.value, true).into()
                }
                (Value::Number(a), Value::Number(b)) => {
                    bi_number(&name, &uni.labels, op, a.value, b.value, true).into()
                }
                (Value::Number(a), Value::Series(b)) => {
                    bi_series_scalar(&name, &uni.labels, op, b, a.value, false)?.into()
                }
                (Value::Series(a), Value::Scalar(b)) => {
                    bi_series_scalar(&name, &uni.labels, op, a, b.value, true)?.into()
                }
                (Value::Series(a), Value::Number(b)) => {
                    bi_series_scalar(&name, &uni.labels, op, a, b.value, true)?.into()
                }
                (Value::Series(a), Value::Series(b)) => {
                    bi_series_series(&name, &uni.labels, op, a, b)?.into()
                }
            };
            results.push(value);
        }
        Ok(results)
    }
}

/// A pair of label-compatible operands for one binary operation
struct Union<'a> {
    labels: Labels,
    a: &'a Value,
    b: &'a Value,
}

/// Pair every label-compatible combination of left and right values.
///
/// Compatible pairs are: equal label sets, either side unlabeled, or one
/// side's pairs a strict subset of the other's (the union carries the
/// superset). Label sets of equal size that are not equal never match.
/// Each multi-valued side fans out, so one binary node can produce zero,
/// one, or many unions.
fn union<'a>(left: &'a Results, right: &'a Results) -> Vec<Union<'a>> {
    let mut unions = Vec::new();
    for a in left.iter() {
        for b in right.iter() {
            let a_labels = a.labels();
            let b_labels = b.labels();
            let labels = if a_labels == b_labels || a_labels.is_empty() || b_labels.is_empty() {
                if a_labels.is_empty() {
                    b_labels
                } else {
                    a_labels
                }
            } else if a_labels.len() == b_labels.len() {
                // Equal size but not equal pairs: no valid union.
                continue;
            } else if a_labels.contains_all(&b_labels) {
                a_labels
            } else if b_labels.contains_all(&a_labels) {
                b_labels
            } else {
                continue;
            };
            unions.push(Union { labels, a, b });
        }
    }
    unions
}

/// Apply a unary operator to a float. NaN propagates untouched.
fn unary_op(op: UnaryOp, a: f64) -> f64 {
    if a.is_nan() {
        return f64::NAN;
    }
    match op {
        UnaryOp::Not => {
            if a == 0.0 {
                1.0
            } else {
                0.0
            }
        }
        UnaryOp::Neg => -a,
    }
}

fn unary_series(op: UnaryOp, series: &Series) -> ValueResult<Series> {
    let mut out = Series::with_capacity(
        series.name().to_string(),
        series.labels().clone(),
        series.time_nullable(),
        series.len(),
    );
    for (t, v) in series.points() {
        out.push_point(t, v.map(|f| unary_op(op, f)))?;
    }
    Ok(out)
}

/// Apply a binary operator to two floats.
///
/// `&&`/`||` short-circuit on the left operand before the NaN check, so
/// `NaN || x` is 1 (NaN is truthy) and `0 && NaN` is 0. Every other
/// operator propagates NaN from either side. Comparisons yield 0/1.
pub(crate) fn binary_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Or if a != 0.0 => return 1.0,
        BinaryOp::And if a == 0.0 => return 0.0,
        _ => {}
    }
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Eq => bool_float(a == b),
        BinaryOp::Neq => bool_float(a != b),
        BinaryOp::Gt => bool_float(a > b),
        BinaryOp::Gte => bool_float(a >= b),
        BinaryOp::Lt => bool_float(a < b),
        BinaryOp::Lte => bool_float(a <= b),
        BinaryOp::And => bool_float(a != 0.0 && b != 0.0),
        BinaryOp::Or => bool_float(a != 0.0 || b != 0.0),
    }
}

fn bool_float(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn bi_scalar_scalar(op: BinaryOp, a: Option<f64>, b: Option<f64>) -> Scalar {
    match (a, b) {
        (Some(af), Some(bf)) => Scalar::new(Some(binary_op(op, af, bf))),
        _ => Scalar::new(None),
    }
}

fn bi_number(
    name: &str,
    labels: &Labels,
    op: BinaryOp,
    number: Option<f64>,
    scalar: Option<f64>,
    number_first: bool,
) -> Number {
    let value = match (number, scalar) {
        (Some(nf), Some(sf)) => Some(if number_first {
            binary_op(op, nf, sf)
        } else {
            binary_op(op, sf, nf)
        }),
        _ => None,
    };
    Number::with_value(name, labels.clone(), value)
}

fn bi_series_scalar(
    name: &str,
    labels: &Labels,
    op: BinaryOp,
    series: &Series,
    scalar: Option<f64>,
    series_first: bool,
) -> ValueResult<Series> {
    let mut out = Series::with_capacity(
        name.to_string(),
        labels.clone(),
        series.time_nullable(),
        series.len(),
    );
    for (t, v) in series.points() {
        let value = match (v, scalar) {
            (Some(f), Some(sv)) => Some(if series_first {
                binary_op(op, f, sv)
            } else {
                binary_op(op, sv, f)
            }),
            _ => None,
        };
        out.push_point(t, value)?;
    }
    Ok(out)
}

/// Apply the operator where both series carry the same timestamp; points
/// present in only one side are dropped, so the result can be shorter
/// than either input.
fn bi_series_series(
    name: &str,
    labels: &Labels,
    op: BinaryOp,
    a: &Series,
    b: &Series,
) -> ValueResult<Series> {
    let mut b_points: HashMap<DateTime<Utc>, Option<f64>> = HashMap::with_capacity(b.len());
    for (t, v) in b.points() {
        if let Some(t) = t {
            b_points.insert(t, v);
        }
    }

    let mut out = Series::new(name.to_string(), labels.clone());
    for (t, av) in a.points() {
        let t = match t {
            Some(t) => t,
            // A null timestamp can never match the other side.
            None => continue,
        };
        let bv = match b_points.get(&t) {
            Some(bv) => *bv,
            None => continue,
        };
        let value = match (av, bv) {
            (Some(af), Some(bf)) => Some(binary_op(op, af, bf)),
            _ => None,
        };
        out.push_point(Some(t), value)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(sec: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(sec, 0).unwrap()
    }

    fn make_series(
        name: &str,
        labels: Labels,
        points: &[(i64, Option<f64>)],
    ) -> Series {
        Series::from_points(name, labels, points.iter().map(|(t, v)| (ts(*t), *v)))
    }

    fn make_number(name: &str, labels: Labels, value: Option<f64>) -> Number {
        Number::with_value(name, labels, value)
    }

    fn eval(expr: &str, vars: &Vars) -> ExprResult<Results> {
        Expr::parse(expr).unwrap().execute(vars)
    }

    fn floats_eq(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => (x.is_nan() && y.is_nan()) || x == y,
            _ => false,
        }
    }

    fn values_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Scalar(x), Value::Scalar(y)) => floats_eq(x.value, y.value),
            (Value::Number(x), Value::Number(y)) => {
                x.name == y.name && x.labels == y.labels && floats_eq(x.value, y.value)
            }
            (Value::Series(x), Value::Series(y)) => {
                x.name() == y.name()
                    && x.labels() == y.labels()
                    && x.len() == y.len()
                    && x.points()
                        .zip(y.points())
                        .all(|((xt, xv), (yt, yv))| xt == yt && floats_eq(xv, yv))
            }
            _ => false,
        }
    }

    fn assert_results(got: &Results, want: &Results) {
        assert_eq!(got.len(), want.len(), "got {:?}, want {:?}", got, want);
        for (g, w) in got.iter().zip(want.iter()) {
            assert!(values_eq(g, w), "got {:?}, want {:?}", g, w);
        }
    }

    fn a_series() -> Vars {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![Value::Series(make_series(
                "temp",
                Labels::new(),
                &[(5, Some(2.0)), (10, Some(1.0))],
            ))]),
        );
        vars
    }

    #[test]
    fn test_scalar_literal() {
        let got = eval("1", &Vars::new()).unwrap();
        assert_results(&got, &Results::scalar(Some(1.0)));
    }

    #[test]
    fn test_unary_scalar() {
        let got = eval("! 1.2", &Vars::new()).unwrap();
        assert_results(&got, &Results::scalar(Some(0.0)));
    }

    #[test]
    fn test_scalar_op_scalar() {
        let got = eval("1 + 1", &Vars::new()).unwrap();
        assert_results(&got, &Results::scalar(Some(2.0)));
    }

    #[test]
    fn test_scalar_divide_by_zero() {
        let got = eval("1 / 0", &Vars::new()).unwrap();
        assert_results(&got, &Results::scalar(Some(f64::INFINITY)));
    }

    #[test]
    fn test_scalar_op_number() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("temp", Labels::new(), Some(2.0)).into()]),
        );
        let got = eval("1 + $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(3.0)).into()]),
        );

        let got = eval("$A - 3", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(-1.0)).into()]),
        );
    }

    #[test]
    fn test_number_op_number() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("temp", Labels::new(), Some(2.0)).into()]),
        );
        let got = eval("$A / $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(1.0)).into()]),
        );
    }

    #[test]
    fn test_unary_number() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("temp", Labels::new(), Some(2.0)).into()]),
        );
        let got = eval("- $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("temp", Labels::new(), Some(-2.0)).into()]),
        );
    }

    #[test]
    fn test_unary_series_twice() {
        let got = eval("! ! $A", &a_series()).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "temp",
                Labels::new(),
                &[(5, Some(1.0)), (10, Some(1.0))],
            ))]),
        );
    }

    #[test]
    fn test_scalar_op_series() {
        let want = Results::from(vec![Value::Series(make_series(
            "",
            Labels::new(),
            &[(5, Some(100.0)), (10, Some(99.0))],
        ))]);
        assert_results(&eval("98 + $A", &a_series()).unwrap(), &want);
        assert_results(&eval("$A + 98", &a_series()).unwrap(), &want);
    }

    #[test]
    fn test_series_op_series() {
        let got = eval("$A + $A", &a_series()).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(4.0)), (10, Some(2.0))],
            ))]),
        );
    }

    #[test]
    fn test_series_op_number_broadcast() {
        let mut vars = a_series();
        vars.insert(
            "B".to_string(),
            Results::from(vec![make_number(
                "volt",
                Labels::from_pairs([("id", "1")]),
                Some(7.0),
            )
            .into()]),
        );
        let want = Results::from(vec![Value::Series(make_series(
            "id=1",
            Labels::from_pairs([("id", "1")]),
            &[(5, Some(9.0)), (10, Some(8.0))],
        ))]);
        assert_results(&eval("$A + $B", &vars).unwrap(), &want);
        assert_results(&eval("$B + $A", &vars).unwrap(), &want);
    }

    #[test]
    fn test_series_op_series_label_union_fans_out() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![
                Value::Series(make_series(
                    "temp",
                    Labels::from_pairs([("sensor", "a"), ("turbine", "1")]),
                    &[(5, Some(6.0)), (10, Some(8.0))],
                )),
                Value::Series(make_series(
                    "temp",
                    Labels::from_pairs([("sensor", "b"), ("turbine", "1")]),
                    &[(5, Some(10.0)), (10, Some(16.0))],
                )),
            ]),
        );
        vars.insert(
            "B".to_string(),
            Results::from(vec![Value::Series(make_series(
                "efficiency",
                Labels::from_pairs([("turbine", "1")]),
                &[(5, Some(0.5)), (10, Some(0.2))],
            ))]),
        );

        let got = eval("$A * $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![
                Value::Series(make_series(
                    "sensor=a, turbine=1",
                    Labels::from_pairs([("sensor", "a"), ("turbine", "1")]),
                    &[(5, Some(6.0 * 0.5)), (10, Some(8.0 * 0.2))],
                )),
                Value::Series(make_series(
                    "sensor=b, turbine=1",
                    Labels::from_pairs([("sensor", "b"), ("turbine", "1")]),
                    &[(5, Some(10.0 * 0.5)), (10, Some(16.0 * 0.2))],
                )),
            ]),
        );
    }

    #[test]
    fn test_series_op_series_sparse_time_join_drops_points() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![Value::Series(make_series(
                "temp",
                Labels::new(),
                &[(5, Some(1.0)), (10, Some(2.0))],
            ))]),
        );
        vars.insert(
            "B".to_string(),
            Results::from(vec![Value::Series(make_series(
                "efficiency",
                Labels::new(),
                &[(5, Some(3.0)), (9, Some(4.0))],
            ))]),
        );

        let got = eval("$A + $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(4.0))],
            ))]),
        );
    }

    #[test]
    fn test_nan_propagation() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("", Labels::new(), Some(f64::NAN)).into()]),
        );

        // Unary on NaN is NaN.
        let got = eval("! $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(f64::NAN)).into()]),
        );

        // Any non-logical operator propagates NaN.
        let got = eval("1 * $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(f64::NAN)).into()]),
        );

        // || short-circuits on the truthy left operand before checking NaN.
        let got = eval("1 || $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(1.0)).into()]),
        );

        // && short-circuits on the falsy left operand the same way.
        let got = eval("0 && $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), Some(0.0)).into()]),
        );
    }

    #[test]
    fn test_nan_in_series() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![Value::Series(make_series(
                "temp",
                Labels::new(),
                &[(5, Some(2.0)), (10, Some(f64::NAN))],
            ))]),
        );

        let got = eval("1 - $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(-1.0)), (10, Some(f64::NAN))],
            ))]),
        );

        vars.insert(
            "B".to_string(),
            Results::from(vec![make_number("", Labels::new(), Some(0.0)).into()]),
        );
        let got = eval("$A == $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(0.0)), (10, Some(f64::NAN))],
            ))]),
        );

        vars.insert(
            "B".to_string(),
            Results::from(vec![make_number("", Labels::new(), Some(f64::NAN)).into()]),
        );
        let got = eval("$A + $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(f64::NAN)), (10, Some(f64::NAN))],
            ))]),
        );
    }

    #[test]
    fn test_null_scalars() {
        let vars = Vars::new();
        // Null stays null through unary and binary scalar operations.
        assert_results(&eval("! null()", &vars).unwrap(), &Results::scalar(None));
        assert_results(
            &eval("null() + null()", &vars).unwrap(),
            &Results::scalar(None),
        );
        assert_results(&eval("1 + null()", &vars).unwrap(), &Results::scalar(None));
    }

    #[test]
    fn test_null_in_series() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(1.0)), (10, None)],
            ))]),
        );

        let got = eval("- $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(-1.0)), (10, None)],
            ))]),
        );

        let got = eval("$A - $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(0.0)), (10, None)],
            ))]),
        );

        let got = eval("$A - 1", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(0.0)), (10, None)],
            ))]),
        );
    }

    #[test]
    fn test_null_numbers() {
        let mut vars = Vars::new();
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("", Labels::new(), None).into()]),
        );

        let got = eval("! $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), None).into()]),
        );

        let got = eval("$A + $A", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), None).into()]),
        );

        vars.insert(
            "B".to_string(),
            Results::from(vec![make_number("", Labels::new(), Some(1.0)).into()]),
        );
        let got = eval("$A * $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![make_number("", Labels::new(), None).into()]),
        );
    }

    #[test]
    fn test_null_number_against_series() {
        let mut vars = Vars::new();
        vars.insert(
            "B".to_string(),
            Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(1.0)), (10, None)],
            ))]),
        );

        // Non-null number: only the null sample stays null.
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("", Labels::new(), Some(1.0)).into()]),
        );
        let got = eval("$A * $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, Some(1.0)), (10, None)],
            ))]),
        );

        // Null number: every sample nulls out.
        vars.insert(
            "A".to_string(),
            Results::from(vec![make_number("", Labels::new(), None).into()]),
        );
        let got = eval("$A * $B", &vars).unwrap();
        assert_results(
            &got,
            &Results::from(vec![Value::Series(make_series(
                "",
                Labels::new(),
                &[(5, None), (10, None)],
            ))]),
        );
    }

    #[test]
    fn test_string_operand_is_an_error() {
        assert!(matches!(
            eval("1 + 'a'", &Vars::new()),
            Err(ExprError::StringOperand(_))
        ));
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        assert!(matches!(
            eval("$missing + 1", &Vars::new()),
            Err(ExprError::UndefinedVariable(_))
        ));
    }

    mod union {
        use super::super::union;
        use super::*;

        fn series_value(name: &str, labels: Labels) -> Value {
            Value::Series(make_series(name, labels, &[]))
        }

        fn union_labels(left: &Results, right: &Results) -> Vec<Labels> {
            union(left, right).into_iter().map(|u| u.labels).collect()
        }

        #[test]
        fn test_equal_tags_single_union() {
            let left = Results::from(vec![series_value("a", Labels::from_pairs([("id", "1")]))]);
            let right = Results::from(vec![series_value("b", Labels::from_pairs([("id", "1")]))]);
            assert_eq!(
                union_labels(&left, &right),
                vec![Labels::from_pairs([("id", "1")])]
            );
        }

        #[test]
        fn test_equal_keys_different_values_no_union() {
            let left = Results::from(vec![series_value("a", Labels::from_pairs([("id", "1")]))]);
            let right = Results::from(vec![series_value("b", Labels::from_pairs([("id", "2")]))]);
            assert!(union_labels(&left, &right).is_empty());
        }

        #[test]
        fn test_empty_results_no_union() {
            assert!(union_labels(&Results::new(), &Results::new()).is_empty());
        }

        #[test]
        fn test_incompatible_different_length_no_union() {
            let left = Results::from(vec![series_value("a", Labels::from_pairs([("ID", "1")]))]);
            let right = Results::from(vec![series_value(
                "b",
                Labels::from_pairs([("id", "1"), ("fish", "red snapper")]),
            )]);
            assert!(union_labels(&left, &right).is_empty());
        }

        #[test]
        fn test_subset_takes_superset_labels() {
            let sub = Labels::from_pairs([("id", "1")]);
            let sup = Labels::from_pairs([("id", "1"), ("fish", "herring")]);

            let left = Results::from(vec![series_value("a", sub.clone())]);
            let right = Results::from(vec![series_value("b", sup.clone())]);
            assert_eq!(union_labels(&left, &right), vec![sup.clone()]);

            // And symmetrically.
            let left = Results::from(vec![series_value("a", sup.clone())]);
            let right = Results::from(vec![series_value("b", sub)]);
            assert_eq!(union_labels(&left, &right), vec![sup]);
        }

        #[test]
        fn test_single_subset_against_many_fans_out() {
            let left = Results::from(vec![series_value("a", Labels::from_pairs([("id", "1")]))]);
            let right = Results::from(vec![
                series_value("b", Labels::from_pairs([("id", "1"), ("fish", "herring")])),
                series_value(
                    "b",
                    Labels::from_pairs([("id", "1"), ("fish", "red snapper")]),
                ),
            ]);
            assert_eq!(
                union_labels(&left, &right),
                vec![
                    Labels::from_pairs([("id", "1"), ("fish", "herring")]),
                    Labels::from_pairs([("id", "1"), ("fish", "red snapper")]),
                ]
            );
        }

        #[test]
        fn test_mixed_lengths_produce_three_unions() {
            let left = Results::from(vec![
                series_value("a", Labels::from_pairs([("id", "1")])),
                series_value("aa", Labels::from_pairs([("id", "1"), ("fish", "herring")])),
            ]);
            let right = Results::from(vec![
                series_value("b", Labels::from_pairs([("id", "1"), ("fish", "herring")])),
                series_value(
                    "bb",
                    Labels::from_pairs([("id", "1"), ("fish", "red snapper")]),
                ),
            ]);
            // "a" pairs with both right values; "aa" only with the equal
            // "b". The equal-length pair (aa, bb) is dropped.
            assert_eq!(
                union_labels(&left, &right),
                vec![
                    Labels::from_pairs([("id", "1"), ("fish", "herring")]),
                    Labels::from_pairs([("id", "1"), ("fish", "red snapper")]),
                    Labels::from_pairs([("id", "1"), ("fish", "herring")]),
                ]
            );
        }
    }
}
