//! Dependency graph builder
//!
//! Turns an ordered list of raw requests into a linear execution order:
//! classify each request as formula or raw, register it by name, wire one
//! edge per referenced name from producer to consumer, then order the
//! nodes topologically. Ties between nodes with no mutual ordering
//! constraint break by input position, so the same input list always
//! builds the same pipeline.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::pipeline::command::{Command, RawRequest};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{Node, NodeKind, RawQuery};
use crate::value::TimeRange;

/// An ordered set of nodes ready for sequential execution
#[derive(Debug, Clone)]
pub struct Pipeline {
    nodes: Vec<Node>,
}

impl Pipeline {
    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the pipeline has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the nodes in execution order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The node names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }
}

/// Build an executable pipeline from raw requests
pub fn build_pipeline(requests: &[RawRequest], range: TimeRange) -> PipelineResult<Pipeline> {
    let mut nodes = build_nodes(requests, range)?;
    let order = execution_order(&nodes)?;
    debug!(nodes = nodes.len(), "built pipeline");

    let mut rank = vec![0; order.len()];
    for (position, idx) in order.into_iter().enumerate() {
        rank[idx] = position;
    }
    nodes.sort_by_key(|node| rank[node.id]);
    Ok(Pipeline { nodes })
}

/// Classify every request and construct its node
fn build_nodes(requests: &[RawRequest], range: TimeRange) -> PipelineResult<Vec<Node>> {
    let mut nodes = Vec::with_capacity(requests.len());
    for (id, request) in requests.iter().enumerate() {
        let kind = if request.is_formula()? {
            NodeKind::Formula(Command::from_request(request, range)?)
        } else {
            NodeKind::Raw(RawQuery {
                query: request.query.clone(),
                range,
                interval_ms: request.opt_field_i64("intervalMs")?,
                max_datapoints: request.opt_field_i64("maxDataPoints")?,
            })
        };
        nodes.push(Node {
            id,
            name: request.name.clone(),
            kind,
        });
    }
    Ok(nodes)
}

/// Compute a dependency-consistent execution order over `nodes`.
///
/// Kahn's algorithm over in-degree counts; the ready set is a min-heap on
/// input position so unordered nodes keep their input order.
fn execution_order(nodes: &[Node]) -> PipelineResult<Vec<usize>> {
    // Name registry; duplicate names are not validated here, the last
    // registration wins.
    let mut registry: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        registry.insert(node.name.as_str(), node.id);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];
    for node in nodes {
        for needed in node.needed_vars() {
            let producer = *registry.get(needed.as_str()).ok_or_else(|| {
                PipelineError::UnresolvedDependency {
                    referrer: node.name.clone(),
                    missing: needed.clone(),
                }
            })?;
            if producer == node.id {
                return Err(PipelineError::SelfReference(node.name.clone()));
            }
            children[producer].push(node.id);
            in_degree[node.id] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &child in &children[idx] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(PipelineError::CyclicDependency);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(name: &str) -> RawRequest {
        request(name, json!({"datasource": "testdata"}))
    }

    fn math(name: &str, expression: &str) -> RawRequest {
        request(
            name,
            json!({"datasource": "__expr__", "type": "math", "expression": expression}),
        )
    }

    fn request(name: &str, query: serde_json::Value) -> RawRequest {
        match query {
            serde_json::Value::Object(map) => RawRequest::new(name, map),
            other => panic!("test query must be an object, got {:?}", other),
        }
    }

    fn range() -> TimeRange {
        TimeRange::new(0, 10_000)
    }

    #[test]
    fn test_dependency_free_nodes_keep_input_order() {
        let pipeline = build_pipeline(
            &[raw("A"), math("B", "$A + 1"), math("C", "$A * 2")],
            range(),
        )
        .unwrap();
        assert_eq!(pipeline.names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_producers_precede_consumers() {
        // Input order is reversed relative to the dependency chain.
        let pipeline = build_pipeline(
            &[math("C", "$B + 1"), math("B", "$A + 1"), raw("A")],
            range(),
        )
        .unwrap();
        let names = pipeline.names();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("A") < pos("B"));
        assert!(pos("B") < pos("C"));
    }

    #[test]
    fn test_three_node_cycle_detected() {
        let err = build_pipeline(
            &[math("A", "$B"), math("B", "$C"), math("C", "$A")],
            range(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::CyclicDependency));
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = build_pipeline(&[math("A", "$A + 1")], range()).unwrap_err();
        match err {
            PipelineError::SelfReference(name) => assert_eq!(name, "A"),
            other => panic!("expected SelfReference, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_dependency_names_both_sides() {
        let err = build_pipeline(&[math("B", "$A + 1")], range()).unwrap_err();
        match err {
            PipelineError::UnresolvedDependency { referrer, missing } => {
                assert_eq!(referrer, "B");
                assert_eq!(missing, "A");
            }
            other => panic!("expected UnresolvedDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let requests = [
            raw("A"),
            math("D", "$B + $C"),
            math("B", "$A + 1"),
            math("C", "$A * 2"),
        ];
        let first = build_pipeline(&requests, range()).unwrap();
        for _ in 0..10 {
            let again = build_pipeline(&requests, range()).unwrap();
            assert_eq!(first.names(), again.names());
        }
        assert_eq!(first.names(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_duplicate_names_resolve_to_last_registration() {
        // Duplicate names are not validated here; the last registration
        // wins for dependency resolution.
        let pipeline = build_pipeline(
            &[raw("X"), math("X", "1 + 1"), math("Y", "$X * 2")],
            range(),
        )
        .unwrap();
        assert_eq!(pipeline.len(), 3);
        let names = pipeline.names();
        let y_pos = names.iter().position(|n| *n == "Y").unwrap();
        // Y depends on the second X, which must precede it.
        assert!(y_pos == 2);
    }

    #[test]
    fn test_raw_node_carries_fetch_hints() {
        let pipeline = build_pipeline(
            &[request(
                "A",
                json!({"datasource": "testdata", "intervalMs": 250, "maxDataPoints": 100}),
            )],
            range(),
        )
        .unwrap();
        let node = pipeline.iter().next().unwrap();
        match &node.kind {
            NodeKind::Raw(rq) => {
                assert_eq!(rq.interval_ms, Some(250));
                assert_eq!(rq.max_datapoints, Some(100));
                assert_eq!(rq.range, range());
            }
            other => panic!("expected raw node, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_datasource_is_malformed() {
        let err = build_pipeline(&[request("A", json!({"type": "math"}))], range()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRequest { .. }));
    }
}
