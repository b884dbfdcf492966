//! Money System Core - Rust Engine
//!
//! Stock-flow consistent money system: a double-entry ledger over a chart
//! of sector accounts, flow builders that draft balanced transactions, and
//! a model that steps the economy period by period.
//!
//! # Architecture
//!
//! - **core**: Fixed-point money and the period clock
//! - **models**: Domain types (Account, Transaction, Ledger, EventLog)
//! - **flows**: Flow builders and behaviour rule sets
//! - **simulation**: Configuration, the period loop, snapshots and metrics
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 minor units (millionths of a unit)
//! 2. Every posted transaction nets to zero; every committed period
//!    satisfies assets = liabilities + equity for every sector
//! 3. Runs are deterministic: equal configuration, equal snapshots
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod core;
pub mod flows;
pub mod models;
pub mod simulation;

// Re-exports for convenience
pub use crate::core::money::{Amount, MINOR_UNITS_PER_UNIT};
pub use crate::core::time::PeriodClock;
pub use flows::{BehaviorRuleSet, FlowBuilder, FlowContext, FlowRecord, StandardRuleSet};
pub use models::{
    account::{account_id, Account, AccountClass, Sector},
    chart::{default_chart, AccountSpec},
    event::{Event, EventLog},
    ledger::{BalanceSheet, Ledger, LedgerError, LedgerMark},
    transaction::{
        EntryDraft, JournalEntry, PostedTransaction, TransactionDraft, TransactionId,
        TransactionRef,
    },
};
pub use simulation::{
    ConfigError, Model, ModelConfig, ModelState, PeriodMetrics, PeriodSnapshot, RunStatus,
    RunSummary, SimulationError,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn money_system_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::model::PyModel>()?;
    Ok(())
}
