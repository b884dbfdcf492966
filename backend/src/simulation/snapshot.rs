//! Period snapshots and run summaries
//!
//! Snapshots are the read-only output contract of the model: plotting,
//! export and reporting layers consume these structures and never the
//! ledger itself.
//!
//! # Critical Invariants
//!
//! - **Idempotence**: capturing the same committed period twice yields equal
//!   snapshots, including the digest
//! - **Determinism**: digests are computed over canonical (key-sorted) JSON,
//!   so equal state always hashes the same

use crate::core::money::Amount;
use crate::flows::FlowRecord;
use crate::models::account::Sector;
use crate::models::ledger::{BalanceSheet, Ledger};
use crate::simulation::engine::SimulationError;
use crate::simulation::metrics::PeriodMetrics;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// State of the economy at the end of a committed period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: u64,

    /// Every account balance, keyed by account id (minor units)
    pub balances: BTreeMap<String, Amount>,

    /// Per-sector aggregates
    pub balance_sheets: BTreeMap<Sector, BalanceSheet>,

    /// Flow amounts posted this period, keyed by builder name
    pub flows: FlowRecord,

    pub metrics: PeriodMetrics,

    /// Number of transactions in the journal after this period
    pub journal_len: usize,

    /// SHA-256 over period, balances and flows
    pub digest: String,
}

impl PeriodSnapshot {
    /// Read the ledger into a snapshot (no mutation)
    pub fn capture(
        period: u64,
        ledger: &Ledger,
        flows: FlowRecord,
    ) -> Result<Self, SimulationError> {
        let balances = ledger.balances();
        let balance_sheets = ledger.sector_balance_sheets();
        let metrics = PeriodMetrics::compute(&balances, &balance_sheets);
        let digest = canonical_digest(&(period, &balances, &flows))?;

        Ok(Self {
            period,
            balances,
            balance_sheets,
            flows,
            metrics,
            journal_len: ledger.journal_len(),
            digest,
        })
    }

    /// Balance of an account at the end of the period (zero if absent)
    pub fn balance(&self, account_id: &str) -> Amount {
        self.balances.get(account_id).copied().unwrap_or(0)
    }

    pub fn balance_sheet(&self, sector: Sector) -> Option<&BalanceSheet> {
        self.balance_sheets.get(&sector)
    }

    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| SimulationError::Serialization(e.to_string()))
    }
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Failed {
        /// Stable error kind (e.g. "UnknownAccountError")
        error_kind: String,
        failing_period: u64,
        message: String,
    },
}

/// What a CLI or report needs to decide on an exit code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub rule_set: String,
    pub config_hash: String,

    /// Last committed period
    pub final_period: u64,

    /// Periods committed by this call
    pub periods_run: u64,

    pub status: RunStatus,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Compute a deterministic SHA-256 of any serializable value
///
/// Object keys are sorted recursively before hashing, so map iteration
/// order never leaks into the digest.
pub fn canonical_digest<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    use serde_json::Value;

    let value = serde_json::to_value(value)
        .map_err(|e| SimulationError::Serialization(format!("Digest input failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::Serialization(format!("Digest input failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
