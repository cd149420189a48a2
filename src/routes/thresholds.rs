//! Effective thresholds and operator overrides.
//!
//! `GET /thresholds?stage=` shows the bands the engine would use right now.
//! `PUT /thresholds/{parameter}` stores an override after checking that it
//! keeps the band ordering valid, then answers with the table as reloaded
//! from storage. The override replaces the parameter for every stage.
//! `critical_low`/`critical_high` are stored and validated but do not change
//! classification.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{error_response, load_thresholds, AppState};
use crate::engine::{BandSet, ThresholdConfig, ThresholdOverride};
use crate::models::{Parameter, Stage};
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/thresholds", get(table_handler))
        .route("/thresholds/{parameter}", put(override_handler))
}

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    stage: Option<String>,
}

#[derive(Debug, Serialize)]
struct BandEntry {
    parameter: Parameter,
    unit: &'static str,
    #[serde(flatten)]
    bands: BandSet,
}

#[derive(Debug, Serialize)]
struct TableResponse {
    stage: Option<Stage>,
    bands: Vec<BandEntry>,
}

fn entries(config: &ThresholdConfig, stage: Option<Stage>) -> Vec<BandEntry> {
    config
        .table(stage)
        .into_iter()
        .map(|(parameter, bands)| BandEntry {
            parameter,
            unit: parameter.unit(),
            bands,
        })
        .collect()
}

async fn table_handler(
    Query(params): Query<TableQuery>,
    State((pool, _config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let stage = match params.stage.as_deref().map(str::parse::<Stage>).transpose() {
        Ok(s) => s,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match load_thresholds(&pool).await {
        Ok(config) => (
            StatusCode::OK,
            Json(TableResponse {
                stage,
                bands: entries(&config, stage),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to load threshold overrides: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load thresholds")
        }
    }
}

async fn override_handler(
    Path(parameter): Path<String>,
    State((pool, _config)): State<AppState>,
    Json(over): Json<ThresholdOverride>,
) -> impl IntoResponse {
    // ---
    let parameter = match parameter.parse::<Parameter>() {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // Overrides are checked against the defaults they will be merged into.
    let mut candidate = ThresholdConfig::default();
    if let Err(e) = candidate.apply_override(parameter, &over) {
        warn!("Refusing threshold override: {}", e);
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    if let Err(e) = store::upsert_override(&pool, parameter, &over).await {
        error!("Failed to store override for {}: {}", parameter, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store override");
    }

    let config = match load_thresholds(&pool).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to reload thresholds after override: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load thresholds");
        }
    };

    info!(%parameter, "Threshold override updated");
    (
        StatusCode::OK,
        Json(TableResponse {
            stage: None,
            bands: entries(&config, None),
        }),
    )
        .into_response()
}
