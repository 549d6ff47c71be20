//! Core types for the formulary value algebra
//!
//! This module defines the fundamental types passed between pipeline nodes:
//! - `Scalar`: a single unlabeled nullable float
//! - `Number`: a single labeled nullable float
//! - `Value`: the closed variant over Scalar, Number, and Series
//! - `Results`: the ordered values produced by one named request
//! - `Vars`: the shared environment mapping request names to Results
//! - `Labels` and `TimeRange`: supporting types used throughout

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::value::Series;

/// A set of key/value string pairs attached to a Number or Series.
///
/// Label sets drive operand matching for binary operations: two values are
/// only combined when their labels are equal, one side is unlabeled, or one
/// side's pairs are a strict subset of the other's. Keys are unique and kept
/// sorted so the display form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Create an empty label set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a label set from key/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Insert or replace a label
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a label value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the label set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether every key/value pair of `other` is present in `self`
    pub fn contains_all(&self, other: &Labels) -> bool {
        other
            .0
            .iter()
            .all(|(k, v)| self.0.get(k).map(|sv| sv == v).unwrap_or(false))
    }

    /// Iterate over pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for Labels {
    /// Renders as `k1=v1, k2=v2` in key order; names union results.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (k, v) in self.0.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// A time interval for a query, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start of the range, epoch milliseconds
    pub from: i64,
    /// Inclusive end of the range, epoch milliseconds
    pub to: i64,
}

impl TimeRange {
    /// Create a range from epoch-millisecond bounds
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// Start of the range as a UTC timestamp
    pub fn from_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.from).single().unwrap_or_else(Utc::now)
    }

    /// End of the range as a UTC timestamp
    pub fn to_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.to).single().unwrap_or_else(Utc::now)
    }

    /// Length of the range in milliseconds
    pub fn span_ms(&self) -> i64 {
        self.to - self.from
    }
}

/// The kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single unlabeled nullable float
    Scalar,
    /// A single labeled nullable float
    Number,
    /// A labeled sequence of timestamped nullable floats
    Series,
}

impl ValueKind {
    /// Static name, used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Number => "number",
            ValueKind::Series => "series",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unlabeled constant, produced by numeric literals and
/// scalar-only expressions. The value is nullable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    /// The held value; `None` is the null scalar
    pub value: Option<f64>,
}

impl Scalar {
    /// Create a scalar holding `value`
    pub fn new(value: Option<f64>) -> Self {
        Self { value }
    }
}

/// A single labeled nullable float, produced by reducing a Series or by
/// raw sources that yield single aggregate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Number {
    /// Display name of the number
    pub name: String,
    /// Label set used for operand matching
    pub labels: Labels,
    /// The held value; `None` is null
    pub value: Option<f64>,
}

impl Number {
    /// Create a number with no value set
    pub fn new(name: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            labels,
            value: None,
        }
    }

    /// Create a number holding `value`
    pub fn with_value(name: impl Into<String>, labels: Labels, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }
}

/// A value passed between pipeline nodes.
///
/// Every value is exactly one of the three kinds; operator dispatch in the
/// evaluator matches exhaustively over all combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A single unlabeled nullable float
    Scalar(Scalar),
    /// A single labeled nullable float
    Number(Number),
    /// A labeled sequence of timestamped nullable floats
    Series(Series),
}

impl Value {
    /// The kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Number(_) => ValueKind::Number,
            Value::Series(_) => ValueKind::Series,
        }
    }

    /// Display name; scalars are unnamed
    pub fn name(&self) -> &str {
        match self {
            Value::Scalar(_) => "",
            Value::Number(n) => &n.name,
            Value::Series(s) => s.name(),
        }
    }

    /// The label set; scalars are unlabeled
    pub fn labels(&self) -> Labels {
        match self {
            Value::Scalar(_) => Labels::new(),
            Value::Number(n) => n.labels.clone(),
            Value::Series(s) => s.labels().clone(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Series> for Value {
    fn from(s: Series) -> Self {
        Value::Series(s)
    }
}

/// The ordered values produced by one named request.
///
/// A single request may legitimately produce more than one value, e.g. a
/// raw query returning multiple series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// The produced values, in production order
    pub values: Vec<Value>,
}

impl Results {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create results holding a single scalar
    pub fn scalar(value: Option<f64>) -> Self {
        Self {
            values: vec![Value::Scalar(Scalar::new(value))],
        }
    }

    /// Append a value
    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the values
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl From<Vec<Value>> for Results {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// The shared environment holding the Results of every executed request,
/// keyed by request name. Built incrementally during the execution walk
/// and discarded afterwards.
pub type Vars = HashMap<String, Results>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_display_sorted() {
        let labels = Labels::from_pairs([("turbine", "1"), ("sensor", "a")]);
        assert_eq!(labels.to_string(), "sensor=a, turbine=1");
    }

    #[test]
    fn test_labels_contains_all() {
        let sup = Labels::from_pairs([("id", "1"), ("fish", "herring")]);
        let sub = Labels::from_pairs([("id", "1")]);

        assert!(sup.contains_all(&sub));
        assert!(!sub.contains_all(&sup));
        // Same key, different value is not contained.
        let other = Labels::from_pairs([("id", "2")]);
        assert!(!sup.contains_all(&other));
        // The empty set is contained in everything.
        assert!(sup.contains_all(&Labels::new()));
    }

    #[test]
    fn test_value_kind() {
        let v: Value = Scalar::new(Some(1.0)).into();
        assert_eq!(v.kind(), ValueKind::Scalar);
        assert_eq!(v.name(), "");
        assert!(v.labels().is_empty());

        let v: Value = Number::with_value("volt", Labels::from_pairs([("id", "1")]), Some(7.0)).into();
        assert_eq!(v.kind(), ValueKind::Number);
        assert_eq!(v.name(), "volt");
        assert_eq!(v.labels().get("id"), Some("1"));
    }

    #[test]
    fn test_results_scalar() {
        let res = Results::scalar(Some(2.0));
        assert_eq!(res.len(), 1);
        assert_eq!(res.values[0], Value::Scalar(Scalar::new(Some(2.0))));
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(0, 16_000);
        assert_eq!(range.span_ms(), 16_000);
        assert_eq!(range.from_utc().timestamp(), 0);
        assert_eq!(range.to_utc().timestamp(), 16);
    }
}
