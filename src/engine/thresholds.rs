//! Threshold bands and their configuration.
//!
//! Every (parameter, stage) pair resolves to a [`BandSet`]: a normal band
//! framed by two attention bands, with everything beyond the attention bands
//! being critical. Temperature, pH and oxygen carry stage-specific defaults;
//! salinity and turbidity use one flat band for every stage.
//!
//! Operator overrides are parameter-scoped. Absent fields are taken from the
//! parameter's flat default, and the resulting band replaces the parameter
//! for every stage. An override whose band breaks the ordering
//! `attention_low <= normal_low <= normal_high <= attention_high` is rejected
//! and the defaults stay in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{Parameter, Stage};

// ---

/// Boundaries of the normal / attention / critical zones for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSet {
    pub attention_low: f64,
    pub normal_low: f64,
    pub normal_high: f64,
    pub attention_high: f64,
    /// Explicit critical boundaries, informational only. Anything past the
    /// attention band is already critical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,
}

impl BandSet {
    /// Four-boundary band set without explicit critical limits.
    pub const fn new(attention_low: f64, normal_low: f64, normal_high: f64, attention_high: f64) -> Self {
        Self {
            attention_low,
            normal_low,
            normal_high,
            attention_high,
            critical_low: None,
            critical_high: None,
        }
    }

    /// Check the ordering invariant.
    pub fn validate(&self) -> std::result::Result<(), String> {
        // ---
        let all = [
            Some(self.attention_low),
            Some(self.normal_low),
            Some(self.normal_high),
            Some(self.attention_high),
            self.critical_low,
            self.critical_high,
        ];
        if all.iter().flatten().any(|v| !v.is_finite()) {
            return Err("boundaries must be finite numbers".to_string());
        }
        if self.attention_low > self.normal_low {
            return Err(format!(
                "attention_low {} > normal_low {}",
                self.attention_low, self.normal_low
            ));
        }
        if self.normal_low > self.normal_high {
            return Err(format!(
                "normal_low {} > normal_high {}",
                self.normal_low, self.normal_high
            ));
        }
        if self.normal_high > self.attention_high {
            return Err(format!(
                "normal_high {} > attention_high {}",
                self.normal_high, self.attention_high
            ));
        }
        if let Some(c) = self.critical_low.filter(|c| *c > self.attention_low) {
            return Err(format!(
                "critical_low {} > attention_low {}",
                c, self.attention_low
            ));
        }
        if let Some(c) = self.critical_high.filter(|c| *c < self.attention_high) {
            return Err(format!(
                "critical_high {} < attention_high {}",
                c, self.attention_high
            ));
        }
        Ok(())
    }

    /// Apply the fields present in `over` on top of this band set.
    pub fn merged(&self, over: &ThresholdOverride) -> BandSet {
        BandSet {
            attention_low: over.warning_low.unwrap_or(self.attention_low),
            normal_low: over.min.unwrap_or(self.normal_low),
            normal_high: over.max.unwrap_or(self.normal_high),
            attention_high: over.warning_high.unwrap_or(self.attention_high),
            critical_low: over.critical_low.or(self.critical_low),
            critical_high: over.critical_high.or(self.critical_high),
        }
    }
}

/// Operator-supplied boundaries for one parameter, as stored by the
/// configuration collaborator.
///
/// `min`/`max` frame the normal band, `warning_low`/`warning_high` are the
/// outer edges of the attention bands. `critical_low`/`critical_high` are
/// informational: they are checked to sit outside the attention bands but
/// never move a classification, since every value past attention is critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThresholdOverride {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub warning_low: Option<f64>,
    #[serde(default)]
    pub warning_high: Option<f64>,
    #[serde(default)]
    pub critical_low: Option<f64>,
    #[serde(default)]
    pub critical_high: Option<f64>,
}

/// Effective threshold table, passed explicitly to the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    /// `None` stage is the flat, stage-independent band.
    bands: HashMap<(Parameter, Option<Stage>), BandSet>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        // ---
        let mut bands = HashMap::new();

        // Flat defaults, also used when a basin has no stage.
        bands.insert((Parameter::Temperature, None), BandSet::new(18.0, 20.0, 28.0, 30.0));
        bands.insert((Parameter::Ph, None), BandSet::new(6.5, 7.0, 8.0, 8.5));
        bands.insert((Parameter::Oxygen, None), BandSet::new(4.0, 5.0, 10.0, 12.0));
        bands.insert((Parameter::Salinity, None), BandSet::new(25.0, 28.0, 32.0, 35.0));
        bands.insert((Parameter::Turbidity, None), BandSet::new(0.0, 5.0, 30.0, 50.0));

        for (stage, temperature, ph, oxygen) in [
            (
                Stage::Nursery,
                BandSet::new(20.0, 22.0, 27.0, 29.0),
                BandSet::new(6.8, 7.0, 8.0, 8.3),
                BandSet::new(5.0, 6.0, 10.0, 12.0),
            ),
            (
                Stage::GrowOut,
                BandSet::new(18.0, 20.0, 28.0, 30.0),
                BandSet::new(6.5, 7.0, 8.0, 8.5),
                BandSet::new(4.0, 5.0, 10.0, 12.0),
            ),
            (
                Stage::Broodstock,
                BandSet::new(16.0, 18.0, 24.0, 26.0),
                BandSet::new(6.8, 7.2, 8.0, 8.4),
                BandSet::new(5.0, 6.0, 10.0, 12.0),
            ),
        ] {
            bands.insert((Parameter::Temperature, Some(stage)), temperature);
            bands.insert((Parameter::Ph, Some(stage)), ph);
            bands.insert((Parameter::Oxygen, Some(stage)), oxygen);
        }

        Self { bands }
    }
}

impl ThresholdConfig {
    /// A table with no bands at all; every lookup is unknown until filled.
    pub fn empty() -> Self {
        Self {
            bands: HashMap::new(),
        }
    }

    /// Insert one band set after checking its ordering.
    pub fn insert(&mut self, parameter: Parameter, stage: Option<Stage>, band: BandSet) -> Result<()> {
        // ---
        band.validate()
            .map_err(|reason| EngineError::ConfigInvalid { parameter, reason })?;
        self.bands.insert((parameter, stage), band);
        Ok(())
    }

    /// Band set for `parameter` at `stage`.
    ///
    /// Stage-dependent parameters look for a stage-specific band first and
    /// fall back to the flat band. `None` means no band exists.
    pub fn bands(&self, parameter: Parameter, stage: Option<Stage>) -> Option<&BandSet> {
        // ---
        if parameter.is_stage_dependent() {
            if let Some(band) = stage.and_then(|s| self.bands.get(&(parameter, Some(s)))) {
                return Some(band);
            }
        }
        self.bands.get(&(parameter, None))
    }

    /// Apply a parameter-scoped override to every band of that parameter.
    ///
    /// Missing fields are filled from the parameter's flat band. The merged
    /// band is validated once and then replaces the flat band and every
    /// stage band of the parameter. On `ConfigInvalid` nothing changes.
    pub fn apply_override(&mut self, parameter: Parameter, over: &ThresholdOverride) -> Result<()> {
        // ---
        let band = match self.bands.get(&(parameter, None)) {
            Some(flat) => {
                let merged = flat.merged(over);
                merged
                    .validate()
                    .map_err(|reason| EngineError::ConfigInvalid { parameter, reason })?;
                merged
            }
            // No default to merge into; the override must stand on its own.
            None => standalone_band(parameter, over)?,
        };

        self.bands.retain(|(p, _), _| *p != parameter);
        self.bands.insert((parameter, None), band);
        Ok(())
    }

    /// Build a configuration from the defaults plus a set of overrides.
    ///
    /// Invalid overrides are skipped with a warning and returned so the
    /// caller can surface them to operators.
    pub fn with_overrides<'a, I>(overrides: I) -> (Self, Vec<EngineError>)
    where
        I: IntoIterator<Item = (Parameter, &'a ThresholdOverride)>,
    {
        // ---
        let mut config = Self::default();
        let mut rejected = Vec::new();

        for (parameter, over) in overrides {
            if let Err(e) = config.apply_override(parameter, over) {
                tracing::warn!(%parameter, error = %e, "Rejected threshold override, keeping defaults");
                rejected.push(e);
            }
        }

        (config, rejected)
    }

    /// Effective bands for a stage, in parameter priority order.
    pub fn table(&self, stage: Option<Stage>) -> Vec<(Parameter, BandSet)> {
        Parameter::ALL
            .iter()
            .filter_map(|p| self.bands(*p, stage).map(|b| (*p, *b)))
            .collect()
    }
}

fn standalone_band(parameter: Parameter, over: &ThresholdOverride) -> Result<BandSet> {
    // ---
    let missing = || EngineError::ConfigInvalid {
        parameter,
        reason: "override has no default to complete it".to_string(),
    };
    let band = BandSet {
        attention_low: over.warning_low.ok_or_else(missing)?,
        normal_low: over.min.ok_or_else(missing)?,
        normal_high: over.max.ok_or_else(missing)?,
        attention_high: over.warning_high.ok_or_else(missing)?,
        critical_low: over.critical_low,
        critical_high: over.critical_high,
    };
    band.validate()
        .map_err(|reason| EngineError::ConfigInvalid { parameter, reason })?;
    Ok(band)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_defaults_cover_every_parameter_and_stage() {
        // ---
        let config = ThresholdConfig::default();
        for parameter in Parameter::ALL {
            for stage in Stage::ALL {
                let band = config.bands(parameter, Some(stage)).unwrap();
                assert!(band.validate().is_ok(), "{parameter}/{stage}");
            }
            assert!(config.bands(parameter, None).is_some());
        }
    }

    #[test]
    fn test_stage_specific_bands() {
        // ---
        let config = ThresholdConfig::default();
        let grow = config.bands(Parameter::Temperature, Some(Stage::GrowOut)).unwrap();
        let brood = config.bands(Parameter::Temperature, Some(Stage::Broodstock)).unwrap();

        assert_eq!(grow.attention_low, 18.0);
        assert!(brood.normal_high < grow.normal_high);

        // Salinity ignores the stage.
        assert_eq!(
            config.bands(Parameter::Salinity, Some(Stage::Nursery)),
            config.bands(Parameter::Salinity, Some(Stage::Broodstock)),
        );
    }

    #[test]
    fn test_override_replaces_parameter_for_all_stages() {
        // ---
        let over = ThresholdOverride {
            min: Some(21.0),
            max: Some(25.0),
            warning_low: Some(19.0),
            warning_high: Some(27.0),
            ..Default::default()
        };
        let (config, rejected) = ThresholdConfig::with_overrides([(Parameter::Temperature, &over)]);

        assert!(rejected.is_empty());
        for stage in Stage::ALL {
            let band = config.bands(Parameter::Temperature, Some(stage)).unwrap();
            assert_eq!(*band, BandSet::new(19.0, 21.0, 25.0, 27.0));
        }
        // Other parameters untouched.
        assert_eq!(
            config.bands(Parameter::Ph, None),
            ThresholdConfig::default().bands(Parameter::Ph, None)
        );
    }

    #[test]
    fn test_partial_override_keeps_default_fields() {
        // ---
        let over = ThresholdOverride {
            max: Some(33.0),
            warning_high: Some(36.0),
            ..Default::default()
        };
        let (config, rejected) = ThresholdConfig::with_overrides([(Parameter::Salinity, &over)]);

        assert!(rejected.is_empty());
        let band = config.bands(Parameter::Salinity, None).unwrap();
        assert_eq!(band.normal_low, 28.0);
        assert_eq!(band.normal_high, 33.0);
        assert_eq!(band.attention_high, 36.0);
    }

    #[test]
    fn test_misordered_override_is_rejected() {
        // ---
        let over = ThresholdOverride {
            min: Some(9.0),
            max: Some(7.0),
            ..Default::default()
        };
        let (config, rejected) = ThresholdConfig::with_overrides([(Parameter::Ph, &over)]);

        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            rejected[0],
            EngineError::ConfigInvalid { parameter: Parameter::Ph, .. }
        ));
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn test_partial_override_restating_defaults_is_accepted() {
        // ---
        let over = ThresholdOverride {
            min: Some(20.0),
            max: Some(28.0),
            ..Default::default()
        };
        let mut config = ThresholdConfig::default();
        config.apply_override(Parameter::Temperature, &over).unwrap();

        // The flat band now applies to every stage, broodstock included.
        for stage in Stage::ALL {
            let band = config.bands(Parameter::Temperature, Some(stage)).unwrap();
            assert_eq!(*band, BandSet::new(18.0, 20.0, 28.0, 30.0), "{stage}");
        }
    }

    #[test]
    fn test_partial_override_checked_against_flat_default() {
        // ---
        // Below the flat normal_high of 28.
        let over = ThresholdOverride {
            warning_high: Some(25.0),
            ..Default::default()
        };
        let mut config = ThresholdConfig::default();
        let err = config.apply_override(Parameter::Temperature, &over).unwrap_err();

        assert!(matches!(err, EngineError::ConfigInvalid { .. }));
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn test_explicit_critical_bounds_must_sit_outside_attention() {
        // ---
        let mut band = BandSet::new(4.0, 5.0, 10.0, 12.0);
        band.critical_low = Some(3.0);
        band.critical_high = Some(14.0);
        assert!(band.validate().is_ok());

        band.critical_high = Some(11.0);
        assert!(band.validate().is_err());
    }

    #[test]
    fn test_critical_bounds_do_not_move_classification() {
        // ---
        let over = ThresholdOverride {
            critical_high: Some(100.0),
            ..Default::default()
        };
        let mut config = ThresholdConfig::default();
        config.apply_override(Parameter::Salinity, &over).unwrap();

        let c = crate::engine::classify(&config, Parameter::Salinity, 40.0, None);
        assert_eq!(c.zone, crate::engine::Zone::Critical);
    }

    #[test]
    fn test_insert_rejects_invalid_band() {
        // ---
        let mut config = ThresholdConfig::empty();
        assert!(config
            .insert(Parameter::Oxygen, None, BandSet::new(6.0, 5.0, 10.0, 12.0))
            .is_err());
        assert!(config.bands(Parameter::Oxygen, None).is_none());
    }
}
