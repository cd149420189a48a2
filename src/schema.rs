//! Database schema management for `basinwatch`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the basin and device lookup tables, the `measurements` and
/// `alerts` tables written by ingestion, and the operator-editable
/// `threshold_overrides` table. Safe to call on every startup; no-op if
/// objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS basins (
            id     TEXT PRIMARY KEY,
            name   TEXT NOT NULL,
            stage  TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id  TEXT PRIMARY KEY,
            basin_id   TEXT NOT NULL REFERENCES basins (id)
        );
        "#,
        // Ingested readings; immutable once written
        r#"
        CREATE TABLE IF NOT EXISTS measurements (
            id           UUID PRIMARY KEY,
            device_id    TEXT             NOT NULL,
            basin_id     TEXT,
            recorded_at  TIMESTAMPTZ      NOT NULL,
            temperature  DOUBLE PRECISION,
            ph           DOUBLE PRECISION,
            oxygen       DOUBLE PRECISION,
            salinity     DOUBLE PRECISION,
            turbidity    DOUBLE PRECISION
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id              UUID PRIMARY KEY,
            measurement_id  UUID             NOT NULL REFERENCES measurements (id),
            kind            TEXT             NOT NULL,
            param           TEXT             NOT NULL,
            value           DOUBLE PRECISION NOT NULL,
            message         TEXT             NOT NULL,
            created_at      TIMESTAMPTZ      NOT NULL,
            basin_id        TEXT             NOT NULL,
            stage           TEXT
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS threshold_overrides (
            param          TEXT PRIMARY KEY,
            min            DOUBLE PRECISION,
            max            DOUBLE PRECISION,
            warning_low    DOUBLE PRECISION,
            warning_high   DOUBLE PRECISION,
            critical_low   DOUBLE PRECISION,
            critical_high  DOUBLE PRECISION,
            updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_basin_time
            ON measurements (basin_id, recorded_at DESC);
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_basin_time
            ON alerts (basin_id, created_at DESC);
        "#,
    ];

    for sql in statements {
        sqlx::query(sql).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}
