//! Read boundaries for one basin: health status and parameter statistics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use super::{error_response, load_thresholds, AppState};
use crate::engine::{status, summarize, summarize_all};
use crate::models::{Basin, Parameter};
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/basins/{id}/status", get(status_handler))
        .route("/basins/{id}/stats", get(stats_handler))
}

/// Query parameters for basin statistics
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Single parameter to summarize; all of them when absent.
    parameter: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

async fn basin_or_error(pool: &sqlx::PgPool, basin_id: &str) -> Result<Basin, Response> {
    // ---
    match store::find_basin(pool, basin_id).await {
        Ok(Some(basin)) => Ok(basin),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown basin: {basin_id}"),
        )),
        Err(e) => {
            error!("Failed to load basin {}: {}", basin_id, e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load basin"))
        }
    }
}

async fn status_handler(
    Path(basin_id): Path<String>,
    State((pool, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let basin = match basin_or_error(&pool, &basin_id).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let recent = match store::recent_measurements(&pool, &basin.id, config.status_window).await {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to load measurements for {}: {}", basin.id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load measurements");
        }
    };

    let thresholds = match load_thresholds(&pool).await {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to load threshold overrides: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load thresholds");
        }
    };

    let result = status(&thresholds, &basin, &recent, Utc::now());
    info!(basin = %basin.id, score = result.score, "Basin status computed");

    (StatusCode::OK, Json(result)).into_response()
}

async fn stats_handler(
    Path(basin_id): Path<String>,
    Query(params): Query<StatsQuery>,
    State((pool, _config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let parameter = match params.parameter.as_deref().map(str::parse::<Parameter>).transpose() {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let basin = match basin_or_error(&pool, &basin_id).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let measurements =
        match store::measurements_between(&pool, &basin.id, params.from, params.to).await {
            Ok(m) => m,
            Err(e) => {
                error!("Failed to load measurements for {}: {}", basin.id, e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load measurements");
            }
        };

    let summaries = match parameter {
        Some(p) => vec![summarize(&measurements, p)],
        None => summarize_all(&measurements),
    };

    (StatusCode::OK, Json(summaries)).into_response()
}
