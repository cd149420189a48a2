//! `GET /alerts`: stored alerts, filterable by type and basin.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use super::{error_response, AppState};
use crate::engine::AlertKind;
use crate::store;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/alerts", get(handler))
}

/// Query parameters for the alert list
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    basin: Option<String>,
    limit: Option<u32>,
}

async fn handler(
    Query(params): Query<AlertsQuery>,
    State((pool, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let kind = match params.kind.as_deref().map(str::parse::<AlertKind>).transpose() {
        Ok(k) => k,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let limit = params
        .limit
        .unwrap_or(config.alerts_limit)
        .min(config.alerts_limit);

    match store::list_alerts(&pool, kind, params.basin.as_deref(), limit).await {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => {
            error!("Failed to list alerts: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list alerts")
        }
    }
}
