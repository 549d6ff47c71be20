//! Series resampling
//!
//! Re-buckets a Series onto a fixed-width time grid derived from a rule
//! string such as `"5S"` or `"1D"`. Buckets containing raw points are
//! downsampled; empty buckets are filled by the upsampling method.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::Duration;
use regex::Regex;

use crate::value::error::{ValueError, ValueResult};
use crate::value::reduce;
use crate::value::{Series, TimeRange};

/// How to collapse the raw points that fall inside one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downsampler {
    /// Sum of the bucket's points
    Sum,
    /// Mean of the bucket's points
    Mean,
    /// Smallest point in the bucket
    Min,
    /// Largest point in the bucket
    Max,
}

impl Downsampler {
    fn apply(&self, vals: &[f64]) -> f64 {
        let wrapped: Vec<Option<f64>> = vals.iter().map(|v| Some(*v)).collect();
        match self {
            Downsampler::Sum => reduce::sum(wrapped.iter().copied()),
            Downsampler::Mean => reduce::mean(&wrapped),
            Downsampler::Min => reduce::min(&wrapped),
            Downsampler::Max => reduce::max(&wrapped),
        }
    }
}

impl FromStr for Downsampler {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Downsampler::Sum),
            "mean" => Ok(Downsampler::Mean),
            "min" => Ok(Downsampler::Min),
            "max" => Ok(Downsampler::Max),
            other => Err(ValueError::UnknownResampleMethod(other.to_string())),
        }
    }
}

/// How to fill a bucket that no raw point falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsampler {
    /// Carry the last seen value forward (null if none yet seen)
    Pad,
    /// Take the next raw point's value (null if none remains)
    Backfilling,
    /// Always null
    Fillna,
}

impl FromStr for Upsampler {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pad" => Ok(Upsampler::Pad),
            "backfilling" => Ok(Upsampler::Backfilling),
            "fillna" => Ok(Upsampler::Fillna),
            other => Err(ValueError::UnknownResampleMethod(other.to_string())),
        }
    }
}

/// Unit aliases accepted by [`parse_rule`], longest first so the regex
/// alternation never truncates a match.
const UNIT_ALIASES: &[(&str, i64)] = &[
    ("min", 60_000_000_000),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("MS", 2_629_800_000_000_000),
    ("D", 86_400_000_000_000),
    ("W", 604_800_000_000_000),
    ("Y", 31_557_600_000_000_000),
    ("H", 3_600_000_000_000),
    ("T", 60_000_000_000),
    ("S", 1_000_000_000),
    ("L", 1_000_000),
    ("U", 1_000),
    ("N", 1),
];

fn rule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let aliases: Vec<&str> = UNIT_ALIASES.iter().map(|(alias, _)| *alias).collect();
        Regex::new(&format!(r"^(\d*)({})$", aliases.join("|"))).expect("static rule pattern")
    })
}

/// Parse a resample rule (`^(\d*)(alias)$`) into a bucket width.
///
/// A missing multiplier means 1, so `"S"` and `"1S"` are equivalent.
pub fn parse_rule(rule: &str) -> ValueResult<Duration> {
    let caps = rule_regex()
        .captures(rule)
        .ok_or_else(|| ValueError::InvalidResampleRule(rule.to_string()))?;

    let multiplier = match &caps[1] {
        "" => 1,
        digits => digits
            .parse::<i32>()
            .map_err(|_| ValueError::InvalidResampleRule(rule.to_string()))?,
    };

    let unit_ns = UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == &caps[2])
        .map(|(_, ns)| *ns)
        .expect("alias matched by the rule pattern");

    Duration::nanoseconds(unit_ns)
        .checked_mul(multiplier)
        .ok_or_else(|| ValueError::InvalidResampleRule(rule.to_string()))
}

impl Series {
    /// Resample the series onto the fixed grid described by `rule`,
    /// walking the query range one bucket at a time from its "from"
    /// boundary. Samples must be in ascending time order.
    pub fn resample(
        &self,
        rule: &str,
        downsampler: Downsampler,
        upsampler: Upsampler,
        range: TimeRange,
    ) -> ValueResult<Series> {
        let interval = parse_rule(rule)?;
        let from = range.from_utc();
        let to = range.to_utc();

        let interval_ns = interval.num_nanoseconds().unwrap_or(i64::MAX);
        let span_ns = (to - from).num_nanoseconds().unwrap_or(i64::MAX);
        let buckets = span_ns / interval_ns;
        if buckets <= 0 {
            return Err(ValueError::RangeTooShort {
                series: self.name().to_string(),
            });
        }

        let mut resampled = Series::with_capacity(
            self.name().to_string(),
            self.labels().clone(),
            false,
            buckets as usize + 1,
        );

        let mut bookmark = 0;
        let mut last_seen: Option<f64> = None;
        let mut idx: i64 = 0;
        let mut t = from;
        while t <= to && idx <= buckets {
            // Consume every raw point up to and including this boundary.
            let mut vals = Vec::new();
            let mut saw_point = false;
            while bookmark < self.len() {
                let (st, v) = self.get_point(bookmark);
                let st = st.ok_or_else(|| ValueError::NullTimestamp {
                    series: self.name().to_string(),
                })?;
                if st > t {
                    break;
                }
                bookmark += 1;
                saw_point = true;
                last_seen = v;
                if let Some(f) = v {
                    vals.push(f);
                }
            }

            let value = if !saw_point {
                match upsampler {
                    Upsampler::Pad => last_seen,
                    Upsampler::Backfilling => {
                        if bookmark == self.len() {
                            None
                        } else {
                            self.get_value(bookmark)
                        }
                    }
                    Upsampler::Fillna => None,
                }
            } else if vals.is_empty() {
                // The bucket held raw points but every one was null.
                None
            } else {
                Some(downsampler.apply(&vals))
            };

            resampled.push_point(Some(t), value)?;
            t = match t.checked_add_signed(interval) {
                Some(next) => next,
                None => break,
            };
            idx += 1;
        }
        Ok(resampled)
    }
}
