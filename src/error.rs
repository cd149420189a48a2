//! Error types for the evaluation engine and its ingestion boundary.
//!
//! Nothing here is fatal to the service. An unknown (parameter, stage) pair is
//! not an error at all; it classifies as [`Zone::Unknown`](crate::engine::Zone).

use crate::models::Parameter;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised at the edges of the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A reading is non-numeric or outside its physical range.
    #[error("Invalid measurement{}: {reason}", on_parameter(.parameter))]
    InvalidMeasurement {
        parameter: Option<Parameter>,
        reason: String,
    },

    /// A threshold override breaks the boundary ordering.
    #[error("Invalid threshold configuration for {parameter}: {reason}")]
    ConfigInvalid { parameter: Parameter, reason: String },

    /// A parameter or stage name that does not exist.
    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },
}

fn on_parameter(parameter: &Option<Parameter>) -> String {
    parameter.map(|p| format!(" ({p})")).unwrap_or_default()
}
