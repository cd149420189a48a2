//! Basin-level health from the latest measurement.
//!
//! The score is a flat penalty per violation (critical -30, attention -10)
//! clamped to `[0, 100]`. It deliberately ignores the graded severity so the
//! dashboard scale stays on 0/10/30-point steps.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::alerts::{to_alerts, Alert, AlertContext};
use super::analyzer::analyze;
use super::evaluator::Zone;
use super::thresholds::ThresholdConfig;
use crate::models::{Basin, Measurement};

// ---

pub const CRITICAL_PENALTY: i32 = 30;
pub const ATTENTION_PENALTY: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Normal,
    Warning,
    Critical,
}

/// Derived health of one basin. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasinStatus {
    pub status: HealthStatus,
    pub score: u8,
    pub alerts: Vec<Alert>,
}

impl BasinStatus {
    /// A basin without data is not flagged.
    pub fn no_data() -> Self {
        Self {
            status: HealthStatus::Normal,
            score: 100,
            alerts: Vec::new(),
        }
    }
}

/// Compute the status of `basin` from its recent measurements.
///
/// Only the newest measurement counts. Measurements explicitly tagged with
/// another basin are ignored.
pub fn status(
    config: &ThresholdConfig,
    basin: &Basin,
    recent: &[Measurement],
    analyzed_at: DateTime<Utc>,
) -> BasinStatus {
    // ---
    let latest = recent
        .iter()
        .filter(|m| m.basin_id.as_deref().map_or(true, |id| id == basin.id))
        .max_by_key(|m| m.timestamp);

    let Some(latest) = latest else {
        return BasinStatus::no_data();
    };

    let violations = analyze(config, latest, basin.stage, &basin.name);

    let penalty: i32 = violations
        .iter()
        .map(|v| match v.zone {
            Zone::Critical => CRITICAL_PENALTY,
            Zone::Attention => ATTENTION_PENALTY,
            _ => 0,
        })
        .sum();
    let score = (100 - penalty).clamp(0, 100) as u8;

    let status = if violations.iter().any(|v| v.zone == Zone::Critical) {
        HealthStatus::Critical
    } else if violations.iter().any(|v| v.zone == Zone::Attention) {
        HealthStatus::Warning
    } else {
        HealthStatus::Normal
    };

    let context = AlertContext {
        basin_id: basin.id.clone(),
        stage: basin.stage,
        analyzed_at,
    };

    BasinStatus {
        status,
        score,
        alerts: to_alerts(&violations, &context),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::Stage;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn basin() -> Basin {
        Basin {
            id: "B9".to_string(),
            name: "Hatchery 9".to_string(),
            stage: Some(Stage::GrowOut),
        }
    }

    fn reading(minutes: i64, temperature: f64, oxygen: f64) -> Measurement {
        // ---
        Measurement {
            id: Uuid::new_v4(),
            device_id: "sensor-1".to_string(),
            basin_id: Some("B9".to_string()),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            temperature: Some(temperature),
            ph: Some(7.5),
            oxygen: Some(oxygen),
            salinity: None,
            turbidity: None,
        }
    }

    #[test]
    fn test_empty_input_is_healthy() {
        // ---
        let s = status(&ThresholdConfig::default(), &basin(), &[], Utc::now());
        assert_eq!(s, BasinStatus::no_data());
        assert_eq!(s.score, 100);
    }

    #[test]
    fn test_one_critical_one_warning_scores_sixty() {
        // ---
        let recent = vec![reading(0, 24.0, 7.0), reading(10, 17.5, 4.5)];
        let s = status(&ThresholdConfig::default(), &basin(), &recent, Utc::now());

        assert_eq!(s.score, 60);
        assert_eq!(s.status, HealthStatus::Critical);
        assert_eq!(s.alerts.len(), 2);
    }

    #[test]
    fn test_only_latest_measurement_counts() {
        // ---
        let recent = vec![reading(30, 24.0, 7.0), reading(0, 17.5, 4.5)];
        let s = status(&ThresholdConfig::default(), &basin(), &recent, Utc::now());

        assert_eq!(s.status, HealthStatus::Normal);
        assert_eq!(s.score, 100);
        assert!(s.alerts.is_empty());
    }

    #[test]
    fn test_attention_only_is_warning() {
        // ---
        let s = status(&ThresholdConfig::default(), &basin(), &[reading(0, 29.0, 4.5)], Utc::now());
        assert_eq!(s.status, HealthStatus::Warning);
        assert_eq!(s.score, 80);
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        // ---
        let mut m = reading(0, 40.0, 1.0);
        m.ph = Some(3.0);
        m.salinity = Some(50.0);
        m.turbidity = Some(90.0);
        let s = status(&ThresholdConfig::default(), &basin(), &[m], Utc::now());

        assert_eq!(s.score, 0);
        assert_eq!(s.alerts.len(), 5);
    }

    #[test]
    fn test_other_basin_measurements_ignored() {
        // ---
        let mut foreign = reading(60, 40.0, 1.0);
        foreign.basin_id = Some("B1".to_string());
        let s = status(&ThresholdConfig::default(), &basin(), &[reading(0, 24.0, 7.0), foreign], Utc::now());

        assert_eq!(s.status, HealthStatus::Normal);
    }
}
