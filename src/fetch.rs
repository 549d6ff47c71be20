//! Data fetch capability
//!
//! Raw pipeline nodes delegate their data fetch to a host-provided
//! [`DataFetcher`]. The engine is agnostic to how the fetch is transported
//! (in-process call, RPC, or a local stub in tests); it only requires that
//! whatever comes back is shaped as wide [`SourceFrame`]s, which the raw
//! node splits into one Series per value column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::value::{Labels, Series, TimeRange, ValueError, ValueResult};

/// Cooperative cancellation flag for one pipeline run.
///
/// The engine checks it between nodes and threads it into the fetch
/// delegate; the core itself adds no timeout or retry behavior.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of the token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One raw data query handed to the fetch delegate
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// Name of the requesting pipeline node
    pub name: &'a str,
    /// The opaque query payload, as decoded from the wire
    pub query: &'a serde_json::Map<String, serde_json::Value>,
    /// The query time range
    pub range: TimeRange,
    /// Suggested sampling interval in milliseconds
    pub interval_ms: i64,
    /// Suggested cap on returned points
    pub max_datapoints: i64,
}

/// The capability the host must provide to resolve raw data nodes
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Execute a raw data query, returning zero or more wide frames.
    ///
    /// Errors are propagated verbatim into the pipeline as `FetchFailed`;
    /// implementations should honor `cancel` for long-running requests.
    async fn fetch(
        &self,
        request: FetchRequest<'_>,
        cancel: &CancelToken,
    ) -> anyhow::Result<Vec<SourceFrame>>;
}

/// A wide result returned by a data source: one time column plus one or
/// more named, labeled value columns of the same length.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// Frame name, used in error messages
    pub name: String,
    /// The shared time column; individual entries may be null
    pub times: Vec<Option<DateTime<Utc>>>,
    /// The value columns
    pub columns: Vec<SourceColumn>,
}

/// One value column of a [`SourceFrame`]
#[derive(Debug, Clone)]
pub struct SourceColumn {
    /// Series name this column becomes
    pub name: String,
    /// Label set drawn from the source's metadata
    pub labels: Labels,
    /// The samples, aligned with the frame's time column
    pub values: Vec<Option<f64>>,
}

impl SourceFrame {
    /// Build a single-column frame from concrete timestamps
    pub fn single(
        name: impl Into<String>,
        labels: Labels,
        points: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
    ) -> Self {
        let name = name.into();
        let (times, values): (Vec<_>, Vec<_>) =
            points.into_iter().map(|(t, v)| (Some(t), v)).unzip();
        Self {
            name: name.clone(),
            times,
            columns: vec![SourceColumn {
                name,
                labels,
                values,
            }],
        }
    }

    /// Split the wide frame into one Series per value column.
    ///
    /// Every column must match the time column's length; the split is the
    /// engine's output contract for raw nodes.
    pub fn into_series(self) -> ValueResult<Vec<Series>> {
        let mut all = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            if column.values.len() != self.times.len() {
                return Err(ValueError::ColumnLengthMismatch {
                    frame: self.name.clone(),
                    column: column.name.clone(),
                    expected: self.times.len(),
                    got: column.values.len(),
                });
            }
            let mut series =
                Series::with_capacity(column.name, column.labels, true, self.times.len());
            for (t, v) in self.times.iter().zip(column.values) {
                series.push_point(*t, v)?;
            }
            all.push(series);
        }
        Ok(all)
    }
}
