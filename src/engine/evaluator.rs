//! Per-parameter zone classification.
//!
//! A value is normal inside `[normal_low, normal_high]`, attention inside
//! `[attention_low, normal_low)` or `(normal_high, attention_high]`, and
//! critical beyond. Boundaries belong to the less severe zone. Within an
//! attention band the severity ramps linearly from 0 at the normal edge to
//! 1 at the critical edge.

use serde::{Deserialize, Serialize};

use super::thresholds::{BandSet, ThresholdConfig};
use crate::models::{Parameter, Stage};

// ---

/// Classification bucket for one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// No band configured for the (parameter, stage) pair.
    Unknown,
    Normal,
    Attention,
    Critical,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Unknown => "unknown",
            Zone::Normal => "normal",
            Zone::Attention => "attention",
            Zone::Critical => "critical",
        }
    }

    /// Attention and critical zones are violations.
    pub fn is_violation(&self) -> bool {
        matches!(self, Zone::Attention | Zone::Critical)
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone plus graded severity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub zone: Zone,
    pub severity: f64,
}

impl Classification {
    const UNKNOWN: Self = Self { zone: Zone::Unknown, severity: 0.0 };
    const NORMAL: Self = Self { zone: Zone::Normal, severity: 0.0 };
    const CRITICAL: Self = Self { zone: Zone::Critical, severity: 1.0 };

    fn attention(severity: f64) -> Self {
        Self {
            zone: Zone::Attention,
            severity: severity.clamp(0.0, 1.0),
        }
    }
}

/// Classify `value` for `parameter` at `stage` against `config`.
pub fn classify(config: &ThresholdConfig, parameter: Parameter, value: f64, stage: Option<Stage>) -> Classification {
    // ---
    match config.bands(parameter, stage) {
        Some(band) => classify_in(band, value),
        None => Classification::UNKNOWN,
    }
}

/// Classify `value` against a single band set.
pub fn classify_in(band: &BandSet, value: f64) -> Classification {
    // ---
    if value.is_nan() {
        return Classification::UNKNOWN;
    }

    if band.normal_low <= value && value <= band.normal_high {
        return Classification::NORMAL;
    }

    if band.attention_low <= value && value < band.normal_low {
        return Classification::attention(ramp(
            band.normal_low - value,
            band.normal_low - band.attention_low,
        ));
    }

    if band.normal_high < value && value <= band.attention_high {
        return Classification::attention(ramp(
            value - band.normal_high,
            band.attention_high - band.normal_high,
        ));
    }

    Classification::CRITICAL
}

/// Distance into a band over its width; a zero-width band is fully severe.
fn ramp(distance: f64, width: f64) -> f64 {
    if width <= 0.0 {
        1.0
    } else {
        distance / width
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn grow_out() -> ThresholdConfig {
        ThresholdConfig::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normal_band_is_zero_severity() {
        // ---
        let config = grow_out();
        for v in [20.0, 24.0, 28.0] {
            let c = classify(&config, Parameter::Temperature, v, Some(Stage::GrowOut));
            assert_eq!(c, Classification { zone: Zone::Normal, severity: 0.0 }, "{v}");
        }
    }

    #[test]
    fn test_below_attention_is_critical() {
        // ---
        let c = classify(&grow_out(), Parameter::Temperature, 17.5, Some(Stage::GrowOut));
        assert_eq!(c.zone, Zone::Critical);
        assert_eq!(c.severity, 1.0);

        let c = classify(&grow_out(), Parameter::Ph, 9.1, Some(Stage::GrowOut));
        assert_eq!(c.zone, Zone::Critical);
    }

    #[test]
    fn test_lower_attention_ramp() {
        // ---
        let c = classify(&grow_out(), Parameter::Oxygen, 4.5, Some(Stage::GrowOut));
        assert_eq!(c.zone, Zone::Attention);
        assert!(approx(c.severity, 0.5));
    }

    #[test]
    fn test_upper_attention_ramp() {
        // ---
        // Salinity normal [28, 32], attention up to 35.
        let c = classify(&grow_out(), Parameter::Salinity, 33.5, None);
        assert_eq!(c.zone, Zone::Attention);
        assert!(approx(c.severity, 0.5));
    }

    #[test]
    fn test_boundaries_belong_to_inner_zone() {
        // ---
        let config = grow_out();
        let at_attention_edge = classify(&config, Parameter::Oxygen, 4.0, Some(Stage::GrowOut));
        assert_eq!(at_attention_edge.zone, Zone::Attention);
        assert!(approx(at_attention_edge.severity, 1.0));

        let just_past = classify(&config, Parameter::Oxygen, 3.999, Some(Stage::GrowOut));
        assert_eq!(just_past.zone, Zone::Critical);

        let upper_edge = classify(&config, Parameter::Oxygen, 12.0, Some(Stage::GrowOut));
        assert_eq!(upper_edge.zone, Zone::Attention);
    }

    #[test]
    fn test_severity_is_monotonic_toward_critical() {
        // ---
        let band = BandSet::new(4.0, 5.0, 10.0, 12.0);
        let mut previous = 0.0;
        for step in 0..=20 {
            let v = 5.0 - step as f64 * 0.05;
            let c = classify_in(&band, v);
            assert!(c.severity >= previous, "severity dropped at {v}");
            previous = c.severity;
        }

        let mut previous = 0.0;
        for step in 0..=20 {
            let v = 10.0 + step as f64 * 0.1;
            let c = classify_in(&band, v);
            assert!(c.severity >= previous, "severity dropped at {v}");
            previous = c.severity;
        }
    }

    #[test]
    fn test_zero_width_attention_band_jumps_to_critical() {
        // ---
        let band = BandSet::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(classify_in(&band, 5.0).zone, Zone::Normal);
        assert_eq!(classify_in(&band, 4.99), Classification::CRITICAL);
        assert_eq!(classify_in(&band, 10.01), Classification::CRITICAL);
        assert!(approx(ramp(0.0, 0.0), 1.0));
    }

    #[test]
    fn test_missing_band_is_unknown() {
        // ---
        let config = ThresholdConfig::empty();
        let c = classify(&config, Parameter::Turbidity, 80.0, None);
        assert_eq!(c.zone, Zone::Unknown);
        assert_eq!(c.severity, 0.0);
    }

    #[test]
    fn test_classify_is_pure() {
        // ---
        let config = grow_out();
        let a = classify(&config, Parameter::Ph, 6.8, Some(Stage::GrowOut));
        let b = classify(&config, Parameter::Ph, 6.8, Some(Stage::GrowOut));
        assert_eq!(a, b);
    }

    #[test]
    fn test_stage_changes_outcome() {
        // ---
        let config = grow_out();
        let grow = classify(&config, Parameter::Temperature, 25.0, Some(Stage::GrowOut));
        let brood = classify(&config, Parameter::Temperature, 25.0, Some(Stage::Broodstock));
        assert_eq!(grow.zone, Zone::Normal);
        assert_eq!(brood.zone, Zone::Attention);
    }
}
