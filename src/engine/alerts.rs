//! Violation to alert mapping.
//!
//! Pure transform: one alert per violation, no deduplication, no I/O. The
//! serialized shape (`type`, `param`, `value`, `message`, `date`, `bassinId`,
//! `stade`) is what the alert list and reports group and filter on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analyzer::Violation;
use super::evaluator::Zone;
use crate::error::EngineError;
use crate::models::{Parameter, Stage};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" | "alerte" => Ok(AlertKind::Warning),
            "error" | "danger" | "critical" => Ok(AlertKind::Error),
            other => Err(EngineError::UnknownName {
                kind: "alert type",
                name: other.to_string(),
            }),
        }
    }
}

/// Alert record ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(rename = "param")]
    pub parameter: Parameter,
    pub value: f64,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "bassinId")]
    pub basin_id: String,
    #[serde(rename = "stade")]
    pub stage: Option<Stage>,
}

/// Where and when an analysis ran.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub basin_id: String,
    pub stage: Option<Stage>,
    pub analyzed_at: DateTime<Utc>,
}

/// Turn violations into alerts, one each, in the same order.
pub fn to_alerts(violations: &[Violation], context: &AlertContext) -> Vec<Alert> {
    // ---
    violations
        .iter()
        .map(|v| Alert {
            kind: match v.zone {
                Zone::Critical => AlertKind::Error,
                _ => AlertKind::Warning,
            },
            parameter: v.parameter,
            value: v.value,
            message: v.message.clone(),
            date: context.analyzed_at,
            basin_id: context.basin_id.clone(),
            stage: context.stage,
        })
        .collect()
}
