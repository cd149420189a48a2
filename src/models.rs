//! Data models shared by the engine, the storage layer and the HTTP routes.
//!
//! A [`Measurement`] is one validated sensor reading. It is created from a
//! [`RawMeasurement`] at the ingestion boundary and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

// ---

/// Water-quality parameter reported by basin sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Temperature,
    Ph,
    Oxygen,
    Salinity,
    Turbidity,
}

impl Parameter {
    /// All parameters, in alert priority order.
    pub const ALL: [Parameter; 5] = [
        Parameter::Temperature,
        Parameter::Ph,
        Parameter::Oxygen,
        Parameter::Salinity,
        Parameter::Turbidity,
    ];

    /// Wire / column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Ph => "ph",
            Parameter::Oxygen => "oxygen",
            Parameter::Salinity => "salinity",
            Parameter::Turbidity => "turbidity",
        }
    }

    /// Human-readable label used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Ph => "pH",
            Parameter::Oxygen => "Oxygen",
            Parameter::Salinity => "Salinity",
            Parameter::Turbidity => "Turbidity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Ph => "",
            Parameter::Oxygen => "mg/L",
            Parameter::Salinity => "ppt",
            Parameter::Turbidity => "NTU",
        }
    }

    /// Physically plausible range. Readings outside it are rejected at
    /// ingestion and never reach the engine.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            Parameter::Temperature => (-50.0, 100.0),
            Parameter::Ph => (0.0, 14.0),
            Parameter::Oxygen => (0.0, 50.0),
            Parameter::Salinity => (0.0, 100.0),
            Parameter::Turbidity => (0.0, 5000.0),
        }
    }

    /// Whether boundaries for this parameter vary with the lifecycle stage.
    pub fn is_stage_dependent(&self) -> bool {
        matches!(
            self,
            Parameter::Temperature | Parameter::Ph | Parameter::Oxygen
        )
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(Parameter::Temperature),
            "ph" => Ok(Parameter::Ph),
            "oxygen" | "dissolved_oxygen" => Ok(Parameter::Oxygen),
            "salinity" => Ok(Parameter::Salinity),
            "turbidity" => Ok(Parameter::Turbidity),
            other => Err(EngineError::UnknownName {
                kind: "parameter",
                name: other.to_string(),
            }),
        }
    }
}

/// Lifecycle stage of the fish held in a basin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "alevinage", alias = "nursery")]
    Nursery,
    #[serde(rename = "grossissement", alias = "grow-out")]
    GrowOut,
    #[serde(rename = "reproduction", alias = "broodstock")]
    Broodstock,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Nursery, Stage::GrowOut, Stage::Broodstock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Nursery => "alevinage",
            Stage::GrowOut => "grossissement",
            Stage::Broodstock => "reproduction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "alevinage" | "nursery" => Ok(Stage::Nursery),
            "grossissement" | "grow-out" | "growout" => Ok(Stage::GrowOut),
            "reproduction" | "broodstock" => Ok(Stage::Broodstock),
            other => Err(EngineError::UnknownName {
                kind: "stage",
                name: other.to_string(),
            }),
        }
    }
}

/// Basin identity and the context needed to analyze its readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basin {
    pub id: String,
    pub name: String,
    pub stage: Option<Stage>,
}

/// Raw measurement as posted by the ingestion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawMeasurement {
    // ---
    pub device_id: String,
    #[serde(default, alias = "bassinId")]
    pub basin_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub oxygen: Option<f64>,
    #[serde(default)]
    pub salinity: Option<f64>,
    #[serde(default)]
    pub turbidity: Option<f64>,
}

/// Validated, immutable sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Measurement {
    // ---
    pub id: Uuid,
    pub device_id: String,
    pub basin_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
    pub oxygen: Option<f64>,
    pub salinity: Option<f64>,
    pub turbidity: Option<f64>,
}

impl RawMeasurement {
    // ---
    /// Check every present value against its parameter's physical range.
    ///
    /// The whole record is rejected on the first invalid value. A missing
    /// timestamp is stamped with `received_at`.
    pub fn validate(self, received_at: DateTime<Utc>) -> Result<Measurement, EngineError> {
        // ---
        if self.device_id.trim().is_empty() {
            return Err(EngineError::InvalidMeasurement {
                parameter: None,
                reason: "device_id must not be empty".to_string(),
            });
        }

        let readings = [
            (Parameter::Temperature, self.temperature),
            (Parameter::Ph, self.ph),
            (Parameter::Oxygen, self.oxygen),
            (Parameter::Salinity, self.salinity),
            (Parameter::Turbidity, self.turbidity),
        ];

        for (parameter, value) in readings {
            let Some(value) = value else { continue };
            let (lo, hi) = parameter.valid_range();
            if !value.is_finite() {
                return Err(EngineError::InvalidMeasurement {
                    parameter: Some(parameter),
                    reason: "value is not a finite number".to_string(),
                });
            }
            if value < lo || value > hi {
                return Err(EngineError::InvalidMeasurement {
                    parameter: Some(parameter),
                    reason: format!("{value} outside [{lo}, {hi}]"),
                });
            }
        }

        Ok(Measurement {
            id: Uuid::new_v4(),
            device_id: self.device_id,
            basin_id: self.basin_id.filter(|b| !b.trim().is_empty()),
            timestamp: self.timestamp.unwrap_or(received_at),
            temperature: self.temperature,
            ph: self.ph,
            oxygen: self.oxygen,
            salinity: self.salinity,
            turbidity: self.turbidity,
        })
    }
}

impl Measurement {
    // ---
    /// Value reported for `parameter`, if the sensor sent one.
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Ph => self.ph,
            Parameter::Oxygen => self.oxygen,
            Parameter::Salinity => self.salinity,
            Parameter::Turbidity => self.turbidity,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn create_test_raw(temperature: Option<f64>, ph: Option<f64>) -> RawMeasurement {
        // ---
        RawMeasurement {
            device_id: "sensor-01".to_string(),
            basin_id: Some("B1".to_string()),
            timestamp: None,
            temperature,
            ph,
            oxygen: None,
            salinity: None,
            turbidity: None,
        }
    }

    #[test]
    fn test_validate_accepts_plausible_values() {
        // ---
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let m = create_test_raw(Some(24.0), Some(7.4)).validate(now).unwrap();

        assert_eq!(m.timestamp, now);
        assert_eq!(m.value(Parameter::Temperature), Some(24.0));
        assert_eq!(m.value(Parameter::Oxygen), None);
        assert_eq!(m.basin_id.as_deref(), Some("B1"));
    }

    #[test]
    fn test_validate_rejects_out_of_domain_ph() {
        // ---
        let now = Utc::now();
        let err = create_test_raw(Some(24.0), Some(20.0))
            .validate(now)
            .unwrap_err();

        match err {
            EngineError::InvalidMeasurement { parameter, .. } => {
                assert_eq!(parameter, Some(Parameter::Ph))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_nan_and_empty_device() {
        // ---
        let now = Utc::now();
        assert!(create_test_raw(Some(f64::NAN), None).validate(now).is_err());

        let mut raw = create_test_raw(None, None);
        raw.device_id = "  ".to_string();
        assert!(raw.validate(now).is_err());
    }

    #[test]
    fn test_stage_names_and_aliases() {
        // ---
        assert_eq!("grossissement".parse::<Stage>().unwrap(), Stage::GrowOut);
        assert_eq!("broodstock".parse::<Stage>().unwrap(), Stage::Broodstock);
        assert!("spawning".parse::<Stage>().is_err());

        let stage: Stage = serde_json::from_str("\"nursery\"").unwrap();
        assert_eq!(stage, Stage::Nursery);
        assert_eq!(serde_json::to_string(&stage).unwrap(), "\"alevinage\"");
    }

    #[test]
    fn test_parameter_metadata() {
        // ---
        assert_eq!(Parameter::Ph.label(), "pH");
        assert_eq!("PH".parse::<Parameter>().unwrap(), Parameter::Ph);
        assert!(Parameter::Oxygen.is_stage_dependent());
        assert!(!Parameter::Salinity.is_stage_dependent());
        assert_eq!(Parameter::Temperature.valid_range(), (-50.0, 100.0));
    }
}
