//! Configuration loader for the `basinwatch` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Threshold overrides are not part of this: they
//! live in the database and are read per request.
use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Number of recent measurements fetched for a basin status.
    pub status_window: u32,

    /// Upper bound on alerts returned by the alert list.
    pub alerts_limit: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: 0.0.0.0:8080)
/// - `STATUS_WINDOW` – recent measurements per basin status (default: 20)
/// - `ALERTS_LIMIT` – max alerts per list request (default: 200)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let status_window = parse_env_u32!("STATUS_WINDOW", 20);
    let alerts_limit = parse_env_u32!("ALERTS_LIMIT", 200);

    let bind_addr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?;

    if status_window == 0 {
        return Err(anyhow!("STATUS_WINDOW must be at least 1"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        status_window,
        alerts_limit,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL   : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX    : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR      : {}", self.bind_addr);
        tracing::info!("  STATUS_WINDOW  : {}", self.status_window);
        tracing::info!("  ALERTS_LIMIT   : {}", self.alerts_limit);
    }
}

/// Replace the password part of a connection URL with `****`.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `postgres://host` has its scheme colon before the credentials.
            if !db_url[colon_pos..at_pos].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_mask_password() {
        // ---
        assert_eq!(
            mask_db_url("postgres://fish:s3cret@db:5432/farm"),
            "postgres://fish:****@db:5432/farm"
        );
    }

    #[test]
    fn test_mask_leaves_passwordless_urls() {
        // ---
        assert_eq!(mask_db_url("postgres://fish@db/farm"), "postgres://fish@db/farm");
        assert_eq!(mask_db_url("postgres://db/farm"), "postgres://db/farm");
    }
}
