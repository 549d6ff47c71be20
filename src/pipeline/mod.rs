//! Formulary Pipeline
//!
//! Builds and executes dependency-ordered pipelines over named requests:
//!
//! - **Command**: typed math/reduce/resample commands built from raw
//!   request descriptions
//! - **Node**: the formula/raw node variants sharing id and name
//! - **Graph**: dependency graph construction and topological ordering
//! - **Engine**: sequential execution against an injected data fetcher
//!
//! # Example
//!
//! ```rust,ignore
//! use formulary::pipeline::Engine;
//!
//! let engine = Engine::new(fetcher);
//! let pipeline = engine.build_pipeline(&requests, range)?;
//! let vars = engine.execute_pipeline(&pipeline, &cancel).await?;
//! ```

mod command;
mod engine;
mod error;
mod graph;
mod node;

pub use command::{
    Command, CommandType, MathCommand, RawRequest, ReduceCommand, ResampleCommand,
    FORMULA_DATASOURCE,
};
pub use engine::Engine;
pub use error::{PipelineError, PipelineResult};
pub use graph::{build_pipeline, Pipeline};
pub use node::{Node, NodeKind, RawQuery};
