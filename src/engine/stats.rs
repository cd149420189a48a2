//! Min / max / average per parameter for history and report views.

use serde::Serialize;

use crate::models::{Measurement, Parameter};

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub parameter: Parameter,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: usize,
}

/// Summarize one parameter over `measurements`, ignoring missing and NaN
/// values. Results are rounded to two decimals.
pub fn summarize(measurements: &[Measurement], parameter: Parameter) -> Summary {
    // ---
    let values: Vec<f64> = measurements
        .iter()
        .filter_map(|m| m.value(parameter))
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Summary {
            parameter,
            min: None,
            max: None,
            avg: None,
            count: 0,
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;

    Summary {
        parameter,
        min: Some(round2(min)),
        max: Some(round2(max)),
        avg: Some(round2(avg)),
        count: values.len(),
    }
}

/// One summary per parameter, in priority order.
pub fn summarize_all(measurements: &[Measurement]) -> Vec<Summary> {
    Parameter::ALL
        .iter()
        .map(|p| summarize(measurements, *p))
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn with_temperature(t: Option<f64>) -> Measurement {
        Measurement {
            id: Uuid::new_v4(),
            device_id: "d".to_string(),
            basin_id: None,
            timestamp: Utc::now(),
            temperature: t,
            ph: None,
            oxygen: None,
            salinity: None,
            turbidity: None,
        }
    }

    #[test]
    fn test_nan_is_ignored() {
        // ---
        let ms = vec![
            with_temperature(Some(20.0)),
            with_temperature(Some(22.0)),
            with_temperature(Some(f64::NAN)),
        ];
        let s = summarize(&ms, Parameter::Temperature);

        assert_eq!(s.min, Some(20.0));
        assert_eq!(s.max, Some(22.0));
        assert_eq!(s.avg, Some(21.0));
        assert_eq!(s.count, 2);
    }

    #[test]
    fn test_no_values_gives_empty_summary() {
        // ---
        let s = summarize(&[with_temperature(None)], Parameter::Temperature);
        assert_eq!(s.count, 0);
        assert!(s.min.is_none() && s.max.is_none() && s.avg.is_none());
    }

    #[test]
    fn test_average_is_rounded() {
        // ---
        let ms = vec![
            with_temperature(Some(20.0)),
            with_temperature(Some(20.0)),
            with_temperature(Some(21.0)),
        ];
        assert_eq!(summarize(&ms, Parameter::Temperature).avg, Some(20.33));
    }

    #[test]
    fn test_summarize_all_covers_every_parameter() {
        // ---
        let all = summarize_all(&[with_temperature(Some(25.0))]);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].count, 1);
        assert!(all[1..].iter().all(|s| s.count == 0));
    }
}
