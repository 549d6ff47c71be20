//! Series reduction
//!
//! Collapses a Series into a single Number. A null sample anywhere in the
//! series makes every reducer except `count` return NaN; an empty series
//! sums to 0.0 but has a NaN mean/min/max. Both edges are load-bearing
//! behavior covered by tests.

use std::str::FromStr;

use crate::value::error::{ValueError, ValueResult};
use crate::value::{Number, Series};

/// A function collapsing a Series to a single Number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Sum of all samples
    Sum,
    /// Arithmetic mean of all samples
    Mean,
    /// Smallest sample
    Min,
    /// Largest sample
    Max,
    /// Number of samples
    Count,
}

impl FromStr for Reducer {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Reducer::Sum),
            "mean" => Ok(Reducer::Mean),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            "count" => Ok(Reducer::Count),
            other => Err(ValueError::UnknownReducer(other.to_string())),
        }
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reducer::Sum => write!(f, "sum"),
            Reducer::Mean => write!(f, "mean"),
            Reducer::Min => write!(f, "min"),
            Reducer::Max => write!(f, "max"),
            Reducer::Count => write!(f, "count"),
        }
    }
}

/// Sum of the samples; NaN if any sample is null, 0.0 for an empty series
pub(crate) fn sum(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let mut acc = 0.0;
    for v in values {
        match v {
            Some(f) => acc += f,
            None => return f64::NAN,
        }
    }
    acc
}

/// Mean of the samples; NaN if any sample is null or the series is empty
pub(crate) fn mean(values: &[Option<f64>]) -> f64 {
    sum(values.iter().copied()) / values.len() as f64
}

/// Smallest sample; NaN if any sample is null or the series is empty
pub(crate) fn min(values: &[Option<f64>]) -> f64 {
    fold_ordered(values, |candidate, best| candidate < best)
}

/// Largest sample; NaN if any sample is null or the series is empty
pub(crate) fn max(values: &[Option<f64>]) -> f64 {
    fold_ordered(values, |candidate, best| candidate > best)
}

fn fold_ordered(values: &[Option<f64>], replaces: impl Fn(f64, f64) -> bool) -> f64 {
    let mut best = f64::NAN;
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(f) => {
                if i == 0 || replaces(*f, best) {
                    best = *f;
                }
            }
            None => return f64::NAN,
        }
    }
    best
}

impl Series {
    /// Collapse the series to a Number using the given reducer.
    ///
    /// The resulting Number is named `<reducer>_<series name>` and retains
    /// the series' label set.
    pub fn reduce(&self, reducer: Reducer) -> ValueResult<Number> {
        let values: Vec<Option<f64>> = self.points().map(|(_, v)| v).collect();
        let reduced = match reducer {
            Reducer::Sum => sum(values.iter().copied()),
            Reducer::Mean => mean(&values),
            Reducer::Min => min(&values),
            Reducer::Max => max(&values),
            Reducer::Count => values.len() as f64,
        };
        Ok(Number::with_value(
            format!("{}_{}", reducer, self.name()),
            self.labels().clone(),
            Some(reduced),
        ))
    }
}
