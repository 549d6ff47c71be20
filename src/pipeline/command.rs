//! Typed pipeline commands
//!
//! A formula request carries one of three commands: a math expression, a
//! series reduction, or a series resample. Commands are constructed from
//! the raw, loosely-typed request description with fail-fast validation,
//! and execute against the shared variable environment.

use std::str::FromStr;

use serde::Deserialize;

use crate::expr::{Expr, ExprError};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::value::{Downsampler, Reducer, Results, TimeRange, Upsampler, Value, ValueError, Vars};

/// The datasource discriminator marking a request as a formula rather
/// than a raw data query.
pub const FORMULA_DATASOURCE: &str = "__expr__";

/// A named request as decoded from the wire by the host layer: a unique
/// name plus a loosely-typed query payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    /// Unique name of the request within the pipeline
    pub name: String,
    /// The request's payload fields
    pub query: serde_json::Map<String, serde_json::Value>,
}

impl RawRequest {
    /// Create a request from a name and payload map
    pub fn new(name: impl Into<String>, query: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            query,
        }
    }

    /// The request's datasource discriminator
    pub fn datasource(&self) -> PipelineResult<&str> {
        self.field_str("datasource")
    }

    /// Whether this request is a formula rather than a raw data query
    pub fn is_formula(&self) -> PipelineResult<bool> {
        Ok(self.datasource()? == FORMULA_DATASOURCE)
    }

    /// Fetch a required string field, failing fast with a descriptive
    /// error naming the field and the request.
    pub fn field_str(&self, field: &str) -> PipelineResult<&str> {
        let value = self
            .query
            .get(field)
            .ok_or_else(|| PipelineError::MalformedRequest {
                name: self.name.clone(),
                reason: format!("no {} in query", field),
            })?;
        value.as_str().ok_or_else(|| PipelineError::MalformedRequest {
            name: self.name.clone(),
            reason: format!(
                "expected {} to be a string, got {}",
                field,
                json_type_name(value)
            ),
        })
    }

    /// Fetch an optional integer field
    pub fn opt_field_i64(&self, field: &str) -> PipelineResult<Option<i64>> {
        match self.query.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(|f| Some(f as i64))
                .ok_or_else(|| PipelineError::MalformedRequest {
                    name: self.name.clone(),
                    reason: format!(
                        "expected {} to be a number, got {}",
                        field,
                        json_type_name(value)
                    ),
                }),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The kind of a formula command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// A math expression over other requests' results
    Math,
    /// A statistical collapse of a series to a number
    Reduce,
    /// A time-bucketed resample of a series
    Resample,
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "math" => Ok(CommandType::Math),
            "reduce" => Ok(CommandType::Reduce),
            "resample" => Ok(CommandType::Resample),
            other => Err(format!("'{}' is not a formula command type", other)),
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandType::Math => write!(f, "math"),
            CommandType::Reduce => write!(f, "reduce"),
            CommandType::Resample => write!(f, "resample"),
        }
    }
}

/// A math expression command such as `"$A + $B / 2"`
#[derive(Debug, Clone)]
pub struct MathCommand {
    /// The expression as submitted
    pub raw_expression: String,
    /// The parsed expression
    pub expression: Expr,
}

/// A reduction command collapsing each series of one variable to a number
#[derive(Debug, Clone)]
pub struct ReduceCommand {
    /// The reduction to apply
    pub reducer: Reducer,
    /// Name of the variable to reduce
    pub var: String,
}

/// A resample command re-bucketing each series of one variable
#[derive(Debug, Clone)]
pub struct ResampleCommand {
    /// The bucket-width rule, e.g. `"5S"`
    pub rule: String,
    /// Name of the variable to resample
    pub var: String,
    /// How buckets with raw points are collapsed
    pub downsampler: Downsampler,
    /// How empty buckets are filled
    pub upsampler: Upsampler,
    /// The query time range the grid is walked over
    pub range: TimeRange,
}

/// A typed formula command, constructed from a raw request
#[derive(Debug, Clone)]
pub enum Command {
    /// Math expression
    Math(MathCommand),
    /// Series reduction
    Reduce(ReduceCommand),
    /// Series resample
    Resample(ResampleCommand),
}

impl Command {
    /// Build the typed command a formula request describes, validating
    /// field presence, field types, and command parameters up front.
    pub fn from_request(request: &RawRequest, range: TimeRange) -> PipelineResult<Command> {
        let type_str = request.field_str("type")?;
        let command_type =
            CommandType::from_str(type_str).map_err(|reason| PipelineError::MalformedRequest {
                name: request.name.clone(),
                reason,
            })?;

        match command_type {
            CommandType::Math => {
                let raw_expression = request.field_str("expression")?.to_string();
                let expression = Expr::parse(&raw_expression).map_err(|source| {
                    PipelineError::InvalidExpression {
                        name: request.name.clone(),
                        source,
                    }
                })?;
                Ok(Command::Math(MathCommand {
                    raw_expression,
                    expression,
                }))
            }
            CommandType::Reduce => {
                let var = variable_name(request.field_str("expression")?);
                let reducer = request
                    .field_str("reducer")?
                    .parse()
                    .map_err(|source| PipelineError::InvalidCommand {
                        name: request.name.clone(),
                        source,
                    })?;
                Ok(Command::Reduce(ReduceCommand { reducer, var }))
            }
            CommandType::Resample => {
                let var = variable_name(request.field_str("expression")?);
                let rule = request.field_str("rule")?.to_string();
                // Surface a bad rule at build time, not mid-execution.
                crate::value::parse_rule(&rule).map_err(|source| PipelineError::InvalidCommand {
                    name: request.name.clone(),
                    source,
                })?;
                let downsampler = request
                    .field_str("downsampler")?
                    .parse()
                    .map_err(|source| PipelineError::InvalidCommand {
                        name: request.name.clone(),
                        source,
                    })?;
                let upsampler = request
                    .field_str("upsampler")?
                    .parse()
                    .map_err(|source| PipelineError::InvalidCommand {
                        name: request.name.clone(),
                        source,
                    })?;
                Ok(Command::Resample(ResampleCommand {
                    rule,
                    var,
                    downsampler,
                    upsampler,
                    range,
                }))
            }
        }
    }

    /// The names of the variables this command reads
    pub fn needed_vars(&self) -> &[String] {
        match self {
            Command::Math(cmd) => &cmd.expression.var_names,
            Command::Reduce(cmd) => std::slice::from_ref(&cmd.var),
            Command::Resample(cmd) => std::slice::from_ref(&cmd.var),
        }
    }

    /// Execute the command against the environment. Every variable this
    /// command needs must already be present.
    pub fn execute(&self, vars: &Vars) -> PipelineResult<Results> {
        match self {
            Command::Math(cmd) => Ok(cmd.expression.execute(vars)?),
            Command::Reduce(cmd) => {
                let input = lookup(vars, &cmd.var)?;
                let mut results = Results::new();
                for value in input.iter() {
                    let series = require_series(value, "reduce")?;
                    results.push(series.reduce(cmd.reducer)?);
                }
                Ok(results)
            }
            Command::Resample(cmd) => {
                let input = lookup(vars, &cmd.var)?;
                let mut results = Results::new();
                for value in input.iter() {
                    let series = require_series(value, "resample")?;
                    results.push(series.resample(
                        &cmd.rule,
                        cmd.downsampler,
                        cmd.upsampler,
                        cmd.range,
                    )?);
                }
                Ok(results)
            }
        }
    }
}

/// Strip the `$` prefix from a variable reference field
fn variable_name(field: &str) -> String {
    field.trim_start_matches('$').to_string()
}

fn lookup<'a>(vars: &'a Vars, name: &str) -> PipelineResult<&'a Results> {
    vars.get(name)
        .ok_or_else(|| ExprError::UndefinedVariable(name.to_string()).into())
}

fn require_series<'a>(
    value: &'a Value,
    operation: &'static str,
) -> PipelineResult<&'a crate::value::Series> {
    match value {
        Value::Series(series) => Ok(series),
        other => Err(ValueError::TypeMismatch {
            operation,
            expected: "series",
            found: other.kind().as_str(),
        }
        .into()),
    }
}
