//! HTTP gateway: merges every subrouter and owns the shared state type.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::engine::ThresholdConfig;
use crate::{store, Config};

mod alerts;
mod basins;
mod health;
mod measurements;
mod thresholds;

// ---

/// State shared by all routes.
pub type AppState = (PgPool, Config);

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(measurements::router())
        .merge(basins::router())
        .merge(alerts::router())
        .merge(thresholds::router())
        .merge(health::router())
        .with_state((pool, config))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON error response with the given status.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Threshold configuration for this request: defaults plus every stored
/// override that passes validation. Rejected overrides are logged.
async fn load_thresholds(pool: &PgPool) -> Result<ThresholdConfig, sqlx::Error> {
    // ---
    let overrides = store::load_overrides(pool).await?;
    let (config, rejected) =
        ThresholdConfig::with_overrides(overrides.iter().map(|(p, o)| (*p, o)));
    if !rejected.is_empty() {
        tracing::debug!("{} threshold override(s) ignored", rejected.len());
    }
    Ok(config)
}
