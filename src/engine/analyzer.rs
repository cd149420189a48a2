//! Whole-measurement analysis.
//!
//! Runs every parameter present on a measurement through the evaluator and
//! keeps the attention and critical results. Missing parameters and
//! parameters without a configured band are skipped silently.

use serde::Serialize;

use super::evaluator::{classify, Zone};
use super::thresholds::ThresholdConfig;
use crate::models::{Measurement, Parameter, Stage};

// ---

/// A non-normal classification for one parameter of one measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub parameter: Parameter,
    pub value: f64,
    /// Always [`Zone::Attention`] or [`Zone::Critical`].
    pub zone: Zone,
    pub severity: f64,
    pub message: String,
}

/// Analyze `measurement` for a basin named `basin_name` at `stage`.
///
/// Violations come back in fixed parameter priority order (temperature, pH,
/// oxygen, salinity, turbidity).
pub fn analyze(
    config: &ThresholdConfig,
    measurement: &Measurement,
    stage: Option<Stage>,
    basin_name: &str,
) -> Vec<Violation> {
    // ---
    let violations: Vec<Violation> = Parameter::ALL
        .iter()
        .filter_map(|&parameter| {
            let value = measurement.value(parameter).filter(|v| v.is_finite())?;
            let c = classify(config, parameter, value, stage);
            if !c.zone.is_violation() {
                return None;
            }
            Some(Violation {
                parameter,
                value,
                zone: c.zone,
                severity: c.severity,
                message: violation_message(parameter, c.zone, basin_name),
            })
        })
        .collect();

    tracing::debug!(
        measurement = %measurement.id,
        device = %measurement.device_id,
        violations = violations.len(),
        "Analyzed measurement"
    );

    violations
}

/// `"<Parameter> <zone> in basin <name>"`
pub fn violation_message(parameter: Parameter, zone: Zone, basin_name: &str) -> String {
    format!("{} {} in basin {}", parameter.label(), zone, basin_name)
}
