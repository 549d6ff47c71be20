//! Pipeline execution engine
//!
//! The engine is the crate's entry point for hosts: build a pipeline from
//! decoded requests, then execute it. Execution is strictly sequential —
//! nodes run one at a time in topological order, each writing its Results
//! into the shared environment before the next node runs. The only
//! suspension point is a raw node's delegated fetch; a failed or canceled
//! fetch aborts the whole pipeline.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::fetch::{CancelToken, DataFetcher, FetchRequest};
use crate::pipeline::command::RawRequest;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::graph::{self, Pipeline};
use crate::pipeline::node::{Node, NodeKind};
use crate::value::{Results, TimeRange, Vars};

/// Builds and executes formula pipelines against an injected data fetcher
pub struct Engine {
    fetcher: Arc<dyn DataFetcher>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with default configuration
    pub fn new(fetcher: Arc<dyn DataFetcher>) -> Self {
        Self::with_config(fetcher, EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(fetcher: Arc<dyn DataFetcher>, config: EngineConfig) -> Self {
        Self { fetcher, config }
    }

    /// Build a pipeline from decoded requests.
    ///
    /// Returns the ordered node list, or an error if a request is
    /// malformed, a reference does not resolve, or the dependencies form
    /// a cycle. Nothing executes until [`Engine::execute_pipeline`].
    pub fn build_pipeline(
        &self,
        requests: &[RawRequest],
        range: TimeRange,
    ) -> PipelineResult<Pipeline> {
        graph::build_pipeline(requests, range)
    }

    /// Execute a built pipeline, returning every node's Results keyed by
    /// request name.
    ///
    /// The first failing node aborts the rest; the caller never sees a
    /// partial result set.
    pub async fn execute_pipeline(
        &self,
        pipeline: &Pipeline,
        cancel: &CancelToken,
    ) -> PipelineResult<Vars> {
        let mut vars = Vars::new();
        for node in pipeline.iter() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Canceled);
            }
            debug!(node = %node.name, "executing pipeline node");
            let results = self
                .execute_node(node, &vars, cancel)
                .await
                .map_err(|source| PipelineError::NodeFailed {
                    name: node.name.clone(),
                    source: Box::new(source),
                })?;
            vars.insert(node.name.clone(), results);
        }
        info!(nodes = pipeline.len(), "pipeline executed");
        Ok(vars)
    }

    /// Build and execute in one call
    pub async fn run(
        &self,
        requests: &[RawRequest],
        range: TimeRange,
        cancel: &CancelToken,
    ) -> PipelineResult<Vars> {
        let pipeline = self.build_pipeline(requests, range)?;
        self.execute_pipeline(&pipeline, cancel).await
    }

    async fn execute_node(
        &self,
        node: &Node,
        vars: &Vars,
        cancel: &CancelToken,
    ) -> PipelineResult<Results> {
        match &node.kind {
            NodeKind::Formula(command) => command.execute(vars),
            NodeKind::Raw(raw) => {
                let request = FetchRequest {
                    name: &node.name,
                    query: &raw.query,
                    range: raw.range,
                    interval_ms: raw.interval_ms.unwrap_or(self.config.default_interval_ms),
                    max_datapoints: raw
                        .max_datapoints
                        .unwrap_or(self.config.default_max_datapoints),
                };
                let frames = self
                    .fetcher
                    .fetch(request, cancel)
                    .await
                    .map_err(|source| PipelineError::FetchFailed { source })?;

                let mut results = Results::new();
                for frame in frames {
                    for series in frame.into_series()? {
                        results.push(series);
                    }
                }
                Ok(results)
            }
        }
    }
}
