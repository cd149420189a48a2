//! `basinwatch`: water-quality threshold evaluation and alerting for fish-farm
//! basins.
//!
//! The [`engine`] modules are pure and can be used on their own. The rest of
//! the crate is the HTTP service around them (EMBP: `main.rs` only talks to
//! `config`, `schema` and `routes`).

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::EngineError;
pub use models::{Basin, Measurement, Parameter, RawMeasurement, Stage};
