//! Formulary Value Type System
//!
//! The tagged value algebra passed between pipeline nodes:
//!
//! - **Scalar**: a single unlabeled nullable float
//! - **Number**: a single labeled nullable float
//! - **Series**: a labeled, timestamp-indexed sequence of nullable floats
//!
//! Plus the containers (`Results`, `Vars`) and the statistical operations
//! over series (`reduce`, `resample`).

mod error;
mod reduce;
mod resample;
mod series;
mod types;

pub use error::{ValueError, ValueResult};
pub use reduce::Reducer;
pub use resample::{parse_rule, Downsampler, Upsampler};
pub use series::Series;
pub use types::{Labels, Number, Results, Scalar, TimeRange, Value, ValueKind, Vars};
