//! Ingestion boundary: `POST /measurements`.
//!
//! Validate, resolve the basin, analyze against the current thresholds,
//! then persist the measurement and its alerts together.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{error_response, load_thresholds, AppState};
use crate::engine::{analyze, to_alerts, Alert, AlertContext, ThresholdConfig};
use crate::models::{Basin, Measurement, RawMeasurement};
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/measurements", post(handler))
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    measurement_id: Uuid,
    alerts: Vec<Alert>,
}

/// What ingestion does with a validated measurement.
#[derive(Debug, PartialEq)]
enum IngestTarget {
    /// The basin exists: analyze and raise alerts.
    Analyze(Basin),
    /// No basin could be resolved: store the reading as is.
    StoreOnly,
    /// A basin id was given or mapped but no such basin exists.
    UnknownBasin(String),
}

/// An explicit basin id wins over the device's registered basin.
fn resolve_basin_id(explicit: Option<String>, registered: Option<String>) -> Option<String> {
    explicit.or(registered)
}

fn ingest_target(basin_id: Option<&str>, found: Option<Basin>) -> IngestTarget {
    // ---
    match (basin_id, found) {
        (None, _) => IngestTarget::StoreOnly,
        (Some(_), Some(basin)) => IngestTarget::Analyze(basin),
        (Some(id), None) => IngestTarget::UnknownBasin(id.to_string()),
    }
}

fn alerts_for(
    thresholds: &ThresholdConfig,
    measurement: &Measurement,
    basin: &Basin,
    analyzed_at: DateTime<Utc>,
) -> Vec<Alert> {
    // ---
    let violations = analyze(thresholds, measurement, basin.stage, &basin.name);
    let context = AlertContext {
        basin_id: basin.id.clone(),
        stage: basin.stage,
        analyzed_at,
    };
    to_alerts(&violations, &context)
}

async fn handler(
    State((pool, _config)): State<AppState>,
    Json(raw): Json<RawMeasurement>,
) -> impl IntoResponse {
    // ---
    let received_at = Utc::now();
    let device_id = raw.device_id.clone();

    // Step 1: Validate
    let mut measurement = match raw.validate(received_at) {
        Ok(m) => m,
        Err(e) => {
            warn!(device = %device_id, "Rejected measurement: {}", e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    // Step 2: Resolve the basin
    let registered = if measurement.basin_id.is_none() {
        match store::basin_for_device(&pool, &measurement.device_id).await {
            Ok(basin_id) => basin_id,
            Err(e) => {
                error!("Failed to resolve device {}: {}", measurement.device_id, e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to resolve device");
            }
        }
    } else {
        None
    };
    measurement.basin_id = resolve_basin_id(measurement.basin_id.take(), registered);

    let found = match measurement.basin_id.as_deref() {
        Some(basin_id) => match store::find_basin(&pool, basin_id).await {
            Ok(basin) => basin,
            Err(e) => {
                error!("Failed to load basin {}: {}", basin_id, e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load basin");
            }
        },
        None => None,
    };

    // Step 3: Analyze when the reading belongs to a known basin
    let alerts = match ingest_target(measurement.basin_id.as_deref(), found) {
        IngestTarget::UnknownBasin(basin_id) => {
            return error_response(StatusCode::NOT_FOUND, format!("Unknown basin: {basin_id}"));
        }
        IngestTarget::StoreOnly => {
            debug!(device = %measurement.device_id, "No basin for measurement, storing without analysis");
            Vec::new()
        }
        IngestTarget::Analyze(basin) => {
            let thresholds = match load_thresholds(&pool).await {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to load threshold overrides: {}", e);
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load thresholds");
                }
            };
            alerts_for(&thresholds, &measurement, &basin, received_at)
        }
    };

    // Step 4: Persist
    if let Err(e) = store::store_measurement(&pool, &measurement, &alerts).await {
        error!("Failed to store measurement {}: {}", measurement.id, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store measurement");
    }

    info!(
        measurement = %measurement.id,
        basin = measurement.basin_id.as_deref().unwrap_or("-"),
        alerts = alerts.len(),
        "Measurement ingested"
    );

    (
        StatusCode::CREATED,
        Json(IngestResponse {
            measurement_id: measurement.id,
            alerts,
        }),
    )
        .into_response()
}
