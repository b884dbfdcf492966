//! Simulation - configuration, the period loop and its outputs
//!
//! See `engine.rs` for the period loop.

pub mod config;
pub mod engine;
pub mod metrics;
pub mod snapshot;

// Re-export main types for convenience
pub use config::{default_initial_balances, ConfigError, ModelConfig};
pub use engine::{Model, ModelState, SimulationError};
pub use metrics::PeriodMetrics;
pub use snapshot::{canonical_digest, PeriodSnapshot, RunStatus, RunSummary};
