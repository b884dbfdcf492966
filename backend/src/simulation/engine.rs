//! Simulation engine - the period loop
//!
//! The [`Model`] owns the ledger, the configuration, the behaviour rule set,
//! the period clock, the event log and the snapshot history of one run.
//!
//! # Architecture
//!
//! ```text
//! For each period t:
//! 1. Read opening balances and mark the ledger
//! 2. Run every flow builder in the configured order:
//!    build draft -> post -> record flow amount
//! 3. Audit the SFC identity from the journal (full replay)
//! 4. Capture and store the snapshot, advance the clock
//! Any failure in 2-4 rolls the ledger back to the mark and halts the run.
//! ```
//!
//! # States
//!
//! `Initialized` -> `Stepping` -> `Stepped` -> ... -> `Finished`, with
//! `Failed` as the terminal state of a broken run.
//!
//! # Example
//!
//! ```rust
//! use money_system_core_rs::{Model, ModelConfig};
//!
//! let config = ModelConfig {
//!     max_periods: 12,
//!     ..ModelConfig::default()
//! };
//! let mut model = Model::standard(config).unwrap();
//!
//! let summary = model.run_to_end();
//! assert!(summary.is_success());
//! assert_eq!(summary.final_period, 12);
//! assert_eq!(model.history().len(), 13); // period 0 holds opening balances
//! ```

use crate::core::money::{from_units, Amount, WideAmount};
use crate::core::time::PeriodClock;
use crate::flows::{BehaviorRuleSet, FlowBuilder, FlowContext, FlowRecord, StandardRuleSet};
use crate::models::account::{account_id, AccountClass, Sector};
use crate::models::chart::{default_chart, AccountSpec};
use crate::models::event::{Event, EventLog};
use crate::models::ledger::{Ledger, LedgerError};
use crate::models::transaction::TransactionDraft;
use crate::simulation::config::{ConfigError, ModelConfig};
use crate::simulation::snapshot::{canonical_digest, PeriodSnapshot, RunStatus, RunSummary};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Errors and states
// ============================================================================

/// Errors that stop a run
///
/// Every variant is fatal: each one points at a defect in a flow builder, a
/// malformed chart or a malformed configuration, and retrying would fail
/// the same way.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not build opening ledger: {0}")]
    Setup(LedgerError),

    #[error("Period {period}: flow '{flow}' could not be posted: {source}")]
    Posting {
        period: u64,
        flow: String,
        source: LedgerError,
    },

    #[error("Period {period}: consistency audit failed: {source}")]
    Consistency { period: u64, source: LedgerError },

    #[error("Run already finished at period {period}")]
    Finished { period: u64 },

    #[error("Run halted after a failure in period {period}")]
    Halted { period: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimulationError {
    /// Stable error kind for run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::Config(_) => "ConfigError",
            SimulationError::Setup(source)
            | SimulationError::Posting { source, .. }
            | SimulationError::Consistency { source, .. } => source.kind(),
            SimulationError::Finished { .. } => "FinishedError",
            SimulationError::Halted { .. } => "HaltedError",
            SimulationError::Serialization(_) => "SerializationError",
        }
    }

    /// Period the error is attributed to, when it has one
    pub fn period(&self) -> Option<u64> {
        match self {
            SimulationError::Posting { period, .. }
            | SimulationError::Consistency { period, .. }
            | SimulationError::Finished { period }
            | SimulationError::Halted { period } => Some(*period),
            SimulationError::Setup(_) => Some(0),
            SimulationError::Config(_) | SimulationError::Serialization(_) => None,
        }
    }
}

/// Lifecycle state of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Opening balances posted, no period stepped yet
    Initialized,
    /// A period is being processed
    Stepping { period: u64 },
    /// A period was committed
    Stepped { period: u64 },
    /// The horizon was reached
    Finished { period: u64 },
    /// A period failed; the run is halted
    Failed { period: u64 },
}

// ============================================================================
// Model
// ============================================================================

/// One simulation run
///
/// The model is the only owner of its ledger; consumers read snapshots.
/// Independent runs (parameter sweeps) each build their own model, and a
/// model can be moved to another thread.
pub struct Model {
    /// Identifier of this run
    run_id: Uuid,

    config: ModelConfig,

    /// SHA-256 of the canonical configuration
    config_hash: String,

    ledger: Ledger,

    rules: Box<dyn BehaviorRuleSet>,

    /// Builders in the order they run each period
    flow_order: Vec<FlowBuilder>,

    clock: PeriodClock,

    state: ModelState,

    /// One snapshot per committed period, starting with period 0
    history: Vec<PeriodSnapshot>,

    event_log: EventLog,
}

impl Model {
    /// Create a model from a chart, a configuration and a rule set
    ///
    /// Validates the configuration, opens every account, posts the opening
    /// balances at period 0 and audits the result.
    ///
    /// # Errors
    ///
    /// * `Config` - invalid parameter, unknown flow name, an initial
    ///   balance for an account outside the chart, or a sector whose opening
    ///   net worth does not fit in an `Amount`
    /// * `Setup` - duplicate account ids, or an opening balance that cannot
    ///   be balanced (a sector with net worth but no equity account)
    pub fn new(
        chart: &[AccountSpec],
        config: ModelConfig,
        rules: Box<dyn BehaviorRuleSet>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let flow_order = rules.resolve_order(config.flow_order.as_deref())?;

        let mut ledger = Ledger::new();
        for spec in chart {
            ledger
                .open_account(spec.id.clone(), spec.sector, spec.class)
                .map_err(SimulationError::Setup)?;
        }

        let mut event_log = EventLog::new();
        event_log.log(Event::ChartLoaded {
            period: 0,
            num_accounts: ledger.num_accounts(),
        });

        if let Some(opening) = opening_balances(&ledger, &config)? {
            let flow_amount = opening.flow_amount();
            let label = opening.label().to_string();
            let num_entries = opening.entries().len();
            let tx_ref = ledger.post(opening).map_err(SimulationError::Setup)?;
            event_log.log(Event::TransactionPosted {
                period: 0,
                tx_id: tx_ref.id,
                flow: label.clone(),
                label,
                flow_amount,
                num_entries,
            });
        }
        ledger
            .validate_global_consistency()
            .map_err(SimulationError::Setup)?;

        let opening_snapshot = PeriodSnapshot::capture(0, &ledger, FlowRecord::new())?;
        event_log.log(Event::PeriodCommitted {
            period: 0,
            journal_len: ledger.journal_len(),
            digest: opening_snapshot.digest.clone(),
        });

        let config_hash = canonical_digest(&config)?;
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            rule_set = rules.name(),
            accounts = ledger.num_accounts(),
            max_periods = config.max_periods,
            "model initialized"
        );

        let clock =
            PeriodClock::new(config.max_periods).ok_or_else(|| ConfigError::InvalidParameter {
                name: "max_periods".to_string(),
                reason: "must be > 0".to_string(),
            })?;

        Ok(Self {
            run_id,
            clock,
            config,
            config_hash,
            ledger,
            rules,
            flow_order,
            state: ModelState::Initialized,
            history: vec![opening_snapshot],
            event_log,
        })
    }

    /// Model over the default chart with the standard rule set
    pub fn standard(config: ModelConfig) -> Result<Self, SimulationError> {
        Self::new(&default_chart(), config, Box::new(StandardRuleSet))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Last committed period
    pub fn current_period(&self) -> u64 {
        self.clock.current_period()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, ModelState::Finished { .. })
    }

    /// Read-only access to the ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rule_set_name(&self) -> &str {
        self.rules.name()
    }

    /// Names of the builders in the order they run
    pub fn flow_order(&self) -> Vec<&'static str> {
        self.flow_order.iter().map(|b| b.name).collect()
    }

    /// Snapshots of every committed period, period 0 first
    pub fn history(&self) -> &[PeriodSnapshot] {
        &self.history
    }

    pub fn snapshot(&self, period: u64) -> Option<&PeriodSnapshot> {
        self.history.get(usize::try_from(period).ok()?)
    }

    pub fn latest_snapshot(&self) -> &PeriodSnapshot {
        &self.history[self.history.len() - 1]
    }

    /// Capture the current committed state again
    ///
    /// Equal to the stored snapshot of the last committed period.
    pub fn capture_snapshot(&self) -> Result<PeriodSnapshot, SimulationError> {
        let latest = self.latest_snapshot();
        PeriodSnapshot::capture(latest.period, &self.ledger, latest.flows.clone())
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    // ========================================================================
    // Period loop
    // ========================================================================

    /// Step one period
    ///
    /// The period is atomic: either every builder posts and the audit
    /// passes, or the ledger is rolled back to the previous period and the
    /// model moves to `Failed`. Events of an aborted period are dropped too;
    /// the log keeps only the rejection and the abort.
    ///
    /// # Errors
    ///
    /// * `Posting` - a builder's draft was rejected by the ledger
    /// * `Consistency` - the end-of-period audit failed
    /// * `Finished` / `Halted` - the run cannot step any more
    pub fn step(&mut self) -> Result<&PeriodSnapshot, SimulationError> {
        match self.state {
            ModelState::Failed { period } => return Err(SimulationError::Halted { period }),
            ModelState::Finished { period } => return Err(SimulationError::Finished { period }),
            _ => {}
        }

        let period = self.clock.next_period();
        self.state = ModelState::Stepping { period };
        let mark = self.ledger.mark();
        let events_mark = self.event_log.len();

        let snapshot = match self.run_period(period) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.ledger.rollback(mark);
                self.event_log.truncate(events_mark);
                if let SimulationError::Posting { flow, source, .. } = &err {
                    self.event_log.log(Event::PostRejected {
                        period,
                        flow: flow.clone(),
                        reason: source.to_string(),
                    });
                }
                self.event_log.log(Event::PeriodAborted {
                    period,
                    reason: err.to_string(),
                });
                self.state = ModelState::Failed { period };
                tracing::warn!(period, error = %err, "period aborted, run halted");
                return Err(err);
            }
        };

        self.clock.advance();
        self.event_log.log(Event::PeriodCommitted {
            period,
            journal_len: snapshot.journal_len,
            digest: snapshot.digest.clone(),
        });
        tracing::info!(
            period,
            journal_len = snapshot.journal_len,
            money_m1 = %snapshot.metrics.money_m1,
            "period committed"
        );
        self.history.push(snapshot);

        if self.clock.is_finished() {
            self.state = ModelState::Finished { period };
            self.event_log.log(Event::RunFinished { period });
        } else {
            self.state = ModelState::Stepped { period };
        }

        Ok(self.latest_snapshot())
    }

    /// Post every builder's draft, audit, and capture the snapshot
    fn run_period(&mut self, period: u64) -> Result<PeriodSnapshot, SimulationError> {
        let opening = self.ledger.balances();
        let mut flows = FlowRecord::new();

        for builder in &self.flow_order {
            let draft = {
                let ctx = FlowContext {
                    period,
                    ledger: &self.ledger,
                    opening: &opening,
                    flows: &flows,
                    config: &self.config,
                };
                builder.build(&ctx)
            };

            let Some(draft) = draft else {
                flows.record(builder.name, 0);
                continue;
            };

            let draft = draft.at_period(period);
            let label = draft.label().to_string();
            let flow_amount = draft.flow_amount();
            let num_entries = draft.entries().len();

            match self.ledger.post(draft) {
                Ok(tx_ref) => {
                    flows.record(builder.name, flow_amount);
                    self.event_log.log(Event::TransactionPosted {
                        period,
                        tx_id: tx_ref.id,
                        flow: builder.name.to_string(),
                        label,
                        flow_amount,
                        num_entries,
                    });
                }
                Err(source) => {
                    return Err(SimulationError::Posting {
                        period,
                        flow: builder.name.to_string(),
                        source,
                    });
                }
            }
        }

        self.ledger
            .validate_global_consistency()
            .map_err(|source| SimulationError::Consistency { period, source })?;
        self.event_log.log(Event::ConsistencyVerified { period });

        PeriodSnapshot::capture(period, &self.ledger, flows)
    }

    /// Step up to `periods` times, stopping early at the horizon
    ///
    /// Stops at the first failure; the summary then names the error and the
    /// failing period, and the model keeps the last consistent period.
    pub fn run(&mut self, periods: u64) -> RunSummary {
        let mut periods_run = 0;
        let mut failure = None;

        for _ in 0..periods {
            if self.is_finished() {
                break;
            }
            match self.step() {
                Ok(_) => periods_run += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        self.summary(periods_run, failure)
    }

    /// Step until the configured horizon
    pub fn run_to_end(&mut self) -> RunSummary {
        let remaining = self.clock.remaining();
        self.run(remaining)
    }

    fn summary(&self, periods_run: u64, failure: Option<SimulationError>) -> RunSummary {
        let status = match failure {
            None => RunStatus::Completed,
            Some(err) => RunStatus::Failed {
                error_kind: err.kind().to_string(),
                failing_period: err.period().unwrap_or_else(|| self.clock.next_period()),
                message: err.to_string(),
            },
        };

        RunSummary {
            run_id: self.run_id,
            rule_set: self.rules.name().to_string(),
            config_hash: self.config_hash.clone(),
            final_period: self.clock.current_period(),
            periods_run,
            status,
        }
    }
}

/// Opening balances transaction
///
/// Non-equity accounts take their configured balances; each sector's first
/// equity account takes the sector's net worth. A sector with net worth but
/// no equity account gets an entry on `"<Sector>:Equity"`, which the ledger
/// rejects as unknown.
///
/// # Errors
///
/// * `UnknownAccount` - an initial balance names an account outside the chart
/// * `InvalidParameter` - a sector's opening net worth does not fit in an
///   `Amount`
fn opening_balances(
    ledger: &Ledger,
    config: &ModelConfig,
) -> Result<Option<TransactionDraft>, ConfigError> {
    let mut draft = TransactionDraft::new("opening_balances", 0);
    let mut net_worth: BTreeMap<Sector, WideAmount> = BTreeMap::new();

    for (id, &units) in &config.initial {
        let account = ledger
            .account(id)
            .map_err(|_| ConfigError::UnknownAccount { id: id.clone() })?;
        let amount = from_units(units);
        if account.class() == AccountClass::Equity || amount == 0 {
            continue;
        }
        *net_worth.entry(account.sector()).or_insert(0) +=
            WideAmount::from(account.class().sign()) * WideAmount::from(amount);
        draft = draft.with_entry(id.clone(), amount);
    }

    for (sector, worth) in net_worth {
        if worth == 0 {
            continue;
        }
        let equity_id = ledger
            .equity_account(sector)
            .map(|a| a.id().to_string())
            .unwrap_or_else(|| account_id(sector, "Equity"));
        let worth = Amount::try_from(worth).map_err(|_| ConfigError::InvalidParameter {
            name: "initial".to_string(),
            reason: format!(
                "opening net worth of {sector} exceeds the representable money range"
            ),
        })?;
        draft = draft.with_memo_entry(equity_id, worth, "opening net worth");
    }

    let total_assets: WideAmount = draft
        .entries()
        .iter()
        .filter(|e| {
            ledger
                .account(&e.account)
                .is_ok_and(|a| a.class() == AccountClass::Asset)
        })
        .map(|e| WideAmount::from(e.amount))
        .sum();
    let flow_amount = Amount::try_from(total_assets).unwrap_or(Amount::MAX);

    Ok((!draft.is_empty()).then(|| draft.with_flow_amount(flow_amount)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_model_is_send() {
        assert_send::<Model>();
    }

    #[test]
    fn test_new_model_is_initialized_and_consistent() {
        let model = Model::standard(ModelConfig::default()).unwrap();

        assert_eq!(model.state(), ModelState::Initialized);
        assert_eq!(model.current_period(), 0);
        assert_eq!(model.history().len(), 1);
        assert!(model.ledger().validate_global_consistency().is_ok());
        assert_eq!(model.rule_set_name(), "standard");
    }

    #[test]
    fn test_opening_equity_is_plugged_per_sector() {
        let model = Model::standard(ModelConfig::default()).unwrap();
        let ledger = model.ledger();

        assert_eq!(ledger.balance("Private:NetWorth").unwrap(), from_units(900.0));
        assert_eq!(ledger.balance("Government:GovEquity").unwrap(), from_units(-900.0));
        assert_eq!(ledger.balance("Bank:BankEquity").unwrap(), 0);
        assert_eq!(ledger.balance("CentralBank:CBEquity").unwrap(), 0);
    }

    #[test]
    fn test_unknown_initial_account_is_config_error() {
        let mut config = ModelConfig::default();
        config.initial.insert("Private:Gold".to_string(), 10.0);

        let err = Model::standard(config).err().unwrap();
        assert_eq!(
            err,
            SimulationError::Config(ConfigError::UnknownAccount {
                id: "Private:Gold".to_string()
            })
        );
    }

    #[test]
    fn test_step_after_finish_is_rejected() {
        let config = ModelConfig {
            max_periods: 1,
            ..ModelConfig::default()
        };
        let mut model = Model::standard(config).unwrap();
        model.step().unwrap();

        assert_eq!(model.state(), ModelState::Finished { period: 1 });
        assert_eq!(
            model.step().unwrap_err(),
            SimulationError::Finished { period: 1 }
        );
    }

    #[test]
    fn test_error_kind_follows_ledger_source() {
        let err = SimulationError::Posting {
            period: 3,
            flow: "x".to_string(),
            source: LedgerError::UnknownAccount {
                id: "Nowhere".to_string(),
            },
        };
        assert_eq!(err.kind(), "UnknownAccountError");
        assert_eq!(err.period(), Some(3));
    }
}
