//! Pipeline error types
//!
//! Defines all error conditions that can occur while building or executing
//! a pipeline. A build error aborts before any node executes; an execution
//! error aborts the remaining pipeline, so the caller always sees either a
//! complete result set or one descriptive error naming the offending
//! request.

use thiserror::Error;

use crate::expr::ExprError;
use crate::value::ValueError;

/// Errors that can occur during pipeline build and execution
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A raw request is missing a required field or carries the wrong type
    #[error("malformed request '{name}': {reason}")]
    MalformedRequest {
        /// Name of the offending request
        name: String,
        /// What is missing or mistyped
        reason: String,
    },

    /// A command's parameters failed validation at build time
    #[error("invalid command in request '{name}': {source}")]
    InvalidCommand {
        /// Name of the offending request
        name: String,
        /// The underlying validation failure
        #[source]
        source: ValueError,
    },

    /// A formula expression failed to parse at build time
    #[error("invalid expression in request '{name}': {source}")]
    InvalidExpression {
        /// Name of the offending request
        name: String,
        /// The underlying parse failure
        #[source]
        source: ExprError,
    },

    /// A formula references a name no request in the pipeline carries
    #[error("request '{referrer}' depends on '{missing}', which is not in the pipeline")]
    UnresolvedDependency {
        /// The referencing request
        referrer: String,
        /// The name that failed to resolve
        missing: String,
    },

    /// A formula references its own name
    #[error("request '{0}' references itself")]
    SelfReference(String),

    /// The dependency graph contains a cycle
    #[error("the pipeline's dependencies form a cycle")]
    CyclicDependency,

    /// A node failed while the pipeline was executing
    #[error("request '{name}': {source}")]
    NodeFailed {
        /// Name of the failing request
        name: String,
        /// What went wrong
        #[source]
        source: Box<PipelineError>,
    },

    /// The external data fetch failed or was canceled
    #[error("data fetch failed: {source}")]
    FetchFailed {
        /// The upstream error, propagated verbatim
        #[source]
        source: anyhow::Error,
    },

    /// The caller canceled the pipeline
    #[error("pipeline execution was canceled")]
    Canceled,

    /// Expression evaluation failed
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A value operation (reduce, resample, adaptation) failed
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
