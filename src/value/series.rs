//! The Series value type
//!
//! A Series is an ordered, timestamp-indexed sequence of nullable float
//! samples carrying a name and a label set. Timestamps are nullable or
//! non-nullable per series instance; values are always independently
//! nullable. The time and value vectors are kept at equal length by the
//! type's API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::error::{ValueError, ValueResult};
use crate::value::Labels;

/// An ordered sequence of (timestamp, nullable value) samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    labels: Labels,
    time_nullable: bool,
    times: Vec<Option<DateTime<Utc>>>,
    values: Vec<Option<f64>>,
}

impl Series {
    /// Create an empty series with a non-nullable time field
    pub fn new(name: impl Into<String>, labels: Labels) -> Self {
        Self::with_capacity(name, labels, false, 0)
    }

    /// Create an empty series, declaring whether timestamps may be null
    pub fn with_capacity(
        name: impl Into<String>,
        labels: Labels,
        time_nullable: bool,
        capacity: usize,
    ) -> Self {
        Self {
            name: name.into(),
            labels,
            time_nullable,
            times: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Build a series from concrete timestamps and nullable values
    pub fn from_points(
        name: impl Into<String>,
        labels: Labels,
        points: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
    ) -> Self {
        let mut series = Self::new(name, labels);
        for (t, v) in points {
            series.times.push(Some(t));
            series.values.push(v);
        }
        series
    }

    /// Series name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the series name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Label set
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Replace the label set
    pub fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }

    /// Whether this instance was declared with a nullable time field
    pub fn time_nullable(&self) -> bool {
        self.time_nullable
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.times.len(), self.values.len());
        self.times.len()
    }

    /// Check if the series has no samples
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The timestamp and value at `idx`
    pub fn get_point(&self, idx: usize) -> (Option<DateTime<Utc>>, Option<f64>) {
        (self.times[idx], self.values[idx])
    }

    /// The value at `idx`
    pub fn get_value(&self, idx: usize) -> Option<f64> {
        self.values[idx]
    }

    /// Append a sample, enforcing the nullable-time declaration
    pub fn push_point(&mut self, t: Option<DateTime<Utc>>, value: Option<f64>) -> ValueResult<()> {
        if t.is_none() && !self.time_nullable {
            return Err(ValueError::NullTimeNotAllowed {
                series: self.name.clone(),
            });
        }
        self.times.push(t);
        self.values.push(value);
        Ok(())
    }

    /// Iterate over (timestamp, value) samples in order
    pub fn points(&self) -> impl Iterator<Item = (Option<DateTime<Utc>>, Option<f64>)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Sort samples by time, oldest first (newest first when `desc`).
    ///
    /// A null timestamp cannot be ordered and is an error.
    pub fn sort_by_time(&mut self, desc: bool) -> ValueResult<()> {
        if self.times.iter().any(Option::is_none) {
            return Err(ValueError::NullTimestamp {
                series: self.name.clone(),
            });
        }
        let mut paired: Vec<(Option<DateTime<Utc>>, Option<f64>)> = self
            .times
            .drain(..)
            .zip(self.values.drain(..))
            .collect();
        paired.sort_by_key(|(t, _)| *t);
        if desc {
            paired.reverse();
        }
        for (t, v) in paired {
            self.times.push(t);
            self.values.push(v);
        }
        Ok(())
    }
}
