//! Threshold evaluation and alerting engine.
//!
//! Everything in here is a pure function of its inputs. I/O (loading
//! overrides, persisting alerts) happens in the caller before and after.

pub mod alerts;
pub mod analyzer;
pub mod evaluator;
pub mod stats;
pub mod status;
pub mod thresholds;

pub use alerts::{to_alerts, Alert, AlertContext, AlertKind};
pub use analyzer::{analyze, Violation};
pub use evaluator::{classify, Classification, Zone};
pub use stats::{summarize, summarize_all, Summary};
pub use status::{status, BasinStatus, HealthStatus};
pub use thresholds::{BandSet, ThresholdConfig, ThresholdOverride};
