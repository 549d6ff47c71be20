//! # Formulary
//!
//! Server-side formula engine - dependency-ordered evaluation of math,
//! reduction, and resampling expressions over labeled time-series data.
//!
//! Callers submit a set of named requests. Some are opaque data queries
//! resolved through an injected fetch capability; others are formulas
//! referencing other requests by name, such as `$A + $B`. Formulary
//! determines a valid execution order, runs each request exactly once with
//! its dependencies already resolved, and returns typed results keyed by
//! name.
//!
//! ## Features
//!
//! - **Dependency graph**: cycle/self-reference detection and stable
//!   topological ordering of requests
//! - **Expression engine**: parser and tree-walking evaluator with
//!   label-based broadcast matching between series
//! - **Value algebra**: Scalar/Number/Series with uniform null and NaN
//!   propagation
//! - **Reduce & resample**: statistical collapse and time-bucketed
//!   resampling of series
//!
//! ## Modules
//!
//! - [`value`]: the Scalar/Number/Series value type system
//! - [`expr`]: expression parser and evaluator
//! - [`pipeline`]: commands, dependency graph, and the execution engine
//! - [`fetch`]: the data fetch capability raw nodes delegate to
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use formulary::{CancelToken, Engine, RawRequest, TimeRange};
//!
//! let engine = Engine::new(Arc::new(my_fetcher));
//!
//! let requests = vec![
//!     RawRequest::new("A", my_datasource_query),
//!     RawRequest::new("B", formula_query("math", "$A * 2")),
//! ];
//!
//! let range = TimeRange::new(from_ms, to_ms);
//! let pipeline = engine.build_pipeline(&requests, range)?;
//! let vars = engine.execute_pipeline(&pipeline, &CancelToken::new()).await?;
//!
//! println!("B produced {} values", vars["B"].len());
//! ```

pub mod config;
pub mod expr;
pub mod fetch;
pub mod pipeline;
pub mod value;

// Re-export top-level types for convenience
pub use value::{
    Downsampler, Labels, Number, Reducer, Results, Scalar, Series, TimeRange, Upsampler, Value,
    ValueError, ValueKind, ValueResult, Vars,
};

pub use expr::{BinaryOp, Expr, ExprError, ExprNode, ExprResult, Evaluator, UnaryOp};

pub use pipeline::{
    build_pipeline, Command, CommandType, Engine, Node, NodeKind, Pipeline, PipelineError,
    PipelineResult, RawRequest, FORMULA_DATASOURCE,
};

pub use fetch::{CancelToken, DataFetcher, FetchRequest, SourceColumn, SourceFrame};

pub use config::{ConfigError, EngineConfig};
