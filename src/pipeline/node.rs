//! Pipeline nodes
//!
//! A node is one named step of a pipeline: either a formula holding a
//! typed command, or a raw data query delegated to the host's fetch
//! capability. The two variants share the graph-local id and the
//! pipeline-unique name.

use crate::pipeline::command::Command;
use crate::value::TimeRange;

/// The payload of a pipeline node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A formula node holding a typed command
    Formula(Command),
    /// A raw data query resolved through the injected fetch capability
    Raw(RawQuery),
}

/// The fetch parameters of a raw data node
#[derive(Debug, Clone)]
pub struct RawQuery {
    /// The opaque query payload forwarded to the fetcher
    pub query: serde_json::Map<String, serde_json::Value>,
    /// The query time range
    pub range: TimeRange,
    /// Per-query sampling interval override, milliseconds
    pub interval_ms: Option<i64>,
    /// Per-query cap override on returned points
    pub max_datapoints: Option<i64>,
}

/// One named step of a pipeline
#[derive(Debug, Clone)]
pub struct Node {
    /// Graph-local identifier; meaningless outside one build/execute cycle
    pub id: usize,
    /// The request name, unique within the pipeline
    pub name: String,
    /// What the node does when executed
    pub kind: NodeKind,
}

impl Node {
    /// The names of the nodes this node depends on
    pub fn needed_vars(&self) -> &[String] {
        match &self.kind {
            NodeKind::Formula(command) => command.needed_vars(),
            NodeKind::Raw(_) => &[],
        }
    }

    /// Whether this node holds a formula command
    pub fn is_formula(&self) -> bool {
        matches!(self.kind, NodeKind::Formula(_))
    }
}
