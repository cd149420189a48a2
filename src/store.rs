//! PostgreSQL access used by the routes.
//!
//! The engine never touches the database; handlers call in here before
//! analysis (basins, overrides, history) and after it (measurements, alerts).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::{Alert, AlertKind, ThresholdOverride};
use crate::models::{Basin, Measurement, Parameter, Stage};

// ---

#[derive(Debug, sqlx::FromRow)]
struct BasinRow {
    id: String,
    name: String,
    stage: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct OverrideRow {
    param: String,
    #[sqlx(flatten)]
    values: ThresholdOverride,
}

#[derive(Debug, sqlx::FromRow)]
struct AlertRow {
    kind: String,
    param: String,
    value: f64,
    message: String,
    created_at: DateTime<Utc>,
    basin_id: String,
    stage: Option<String>,
}

const MEASUREMENT_COLUMNS: &str = "id, device_id, basin_id, recorded_at AS timestamp, \
     temperature, ph, oxygen, salinity, turbidity";

/// Stage text from the database; unreadable values count as no stage.
fn parse_stage(raw: Option<String>, owner: &str) -> Option<Stage> {
    // ---
    let raw = raw?;
    match raw.parse::<Stage>() {
        Ok(stage) => Some(stage),
        Err(e) => {
            tracing::warn!("Ignoring stage of {}: {}", owner, e);
            None
        }
    }
}

pub async fn find_basin(pool: &PgPool, basin_id: &str) -> Result<Option<Basin>, sqlx::Error> {
    // ---
    let row: Option<BasinRow> = sqlx::query_as("SELECT id, name, stage FROM basins WHERE id = $1")
        .bind(basin_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| {
        let stage = parse_stage(r.stage, &r.id);
        Basin {
            id: r.id,
            name: r.name,
            stage,
        }
    }))
}

/// Basin a device is installed in, if it is registered.
pub async fn basin_for_device(pool: &PgPool, device_id: &str) -> Result<Option<String>, sqlx::Error> {
    // ---
    sqlx::query_scalar("SELECT basin_id FROM devices WHERE device_id = $1")
        .bind(device_id)
        .fetch_optional(pool)
        .await
}

/// All stored overrides with a recognised parameter name.
pub async fn load_overrides(pool: &PgPool) -> Result<Vec<(Parameter, ThresholdOverride)>, sqlx::Error> {
    // ---
    let rows: Vec<OverrideRow> = sqlx::query_as(
        r#"
        SELECT param, min, max, warning_low, warning_high, critical_low, critical_high
        FROM threshold_overrides
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| match r.param.parse::<Parameter>() {
            Ok(p) => Some((p, r.values)),
            Err(e) => {
                tracing::warn!("Skipping threshold override row: {}", e);
                None
            }
        })
        .collect())
}

pub async fn upsert_override(
    pool: &PgPool,
    parameter: Parameter,
    over: &ThresholdOverride,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO threshold_overrides (
            param, min, max, warning_low, warning_high, critical_low, critical_high, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, now())
        ON CONFLICT (param) DO UPDATE SET
            min = EXCLUDED.min,
            max = EXCLUDED.max,
            warning_low = EXCLUDED.warning_low,
            warning_high = EXCLUDED.warning_high,
            critical_low = EXCLUDED.critical_low,
            critical_high = EXCLUDED.critical_high,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(parameter.as_str())
    .bind(over.min)
    .bind(over.max)
    .bind(over.warning_low)
    .bind(over.warning_high)
    .bind(over.critical_low)
    .bind(over.critical_high)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write a measurement and the alerts derived from it in one transaction.
///
/// Safe to retry as a whole: the analysis is deterministic.
pub async fn store_measurement(
    pool: &PgPool,
    measurement: &Measurement,
    alerts: &[Alert],
) -> Result<(), sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO measurements (
            id, device_id, basin_id, recorded_at,
            temperature, ph, oxygen, salinity, turbidity
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(measurement.id)
    .bind(&measurement.device_id)
    .bind(&measurement.basin_id)
    .bind(measurement.timestamp)
    .bind(measurement.temperature)
    .bind(measurement.ph)
    .bind(measurement.oxygen)
    .bind(measurement.salinity)
    .bind(measurement.turbidity)
    .execute(&mut *tx)
    .await?;

    for alert in alerts {
        sqlx::query(
            r#"
            INSERT INTO alerts (
                id, measurement_id, kind, param, value, message,
                created_at, basin_id, stage
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(measurement.id)
        .bind(alert.kind.as_str())
        .bind(alert.parameter.as_str())
        .bind(alert.value)
        .bind(&alert.message)
        .bind(alert.date)
        .bind(&alert.basin_id)
        .bind(alert.stage.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Newest `limit` measurements for a basin.
pub async fn recent_measurements(
    pool: &PgPool,
    basin_id: &str,
    limit: u32,
) -> Result<Vec<Measurement>, sqlx::Error> {
    // ---
    let sql = format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM measurements \
         WHERE basin_id = $1 ORDER BY recorded_at DESC LIMIT $2"
    );
    sqlx::query_as(&sql)
        .bind(basin_id)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await
}

/// Measurements for a basin inside an optional time window.
pub async fn measurements_between(
    pool: &PgPool,
    basin_id: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<Measurement>, sqlx::Error> {
    // ---
    let sql = format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM measurements \
         WHERE basin_id = $1 \
           AND ($2::TIMESTAMPTZ IS NULL OR recorded_at >= $2) \
           AND ($3::TIMESTAMPTZ IS NULL OR recorded_at <= $3) \
         ORDER BY recorded_at"
    );
    sqlx::query_as(&sql)
        .bind(basin_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
}

/// Stored alerts, newest first.
pub async fn list_alerts(
    pool: &PgPool,
    kind: Option<AlertKind>,
    basin_id: Option<&str>,
    limit: u32,
) -> Result<Vec<Alert>, sqlx::Error> {
    // ---
    let rows: Vec<AlertRow> = sqlx::query_as(
        r#"
        SELECT kind, param, value, message, created_at, basin_id, stage
        FROM alerts
        WHERE ($1::TEXT IS NULL OR kind = $1)
          AND ($2::TEXT IS NULL OR basin_id = $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(kind.map(|k| k.as_str()))
    .bind(basin_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(alert_from_row).collect())
}

fn alert_from_row(row: AlertRow) -> Option<Alert> {
    // ---
    let parsed = row
        .kind
        .parse::<AlertKind>()
        .and_then(|kind| row.param.parse::<Parameter>().map(|p| (kind, p)));

    match parsed {
        Ok((kind, parameter)) => {
            let stage = parse_stage(row.stage, &row.basin_id);
            Some(Alert {
                kind,
                parameter,
                value: row.value,
                message: row.message,
                date: row.created_at,
                basin_id: row.basin_id,
                stage,
            })
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable alert row: {}", e);
            None
        }
    }
}
