//! Event logging for run auditing and replay.
//!
//! The model records every significant state change of a run as an
//! [`Event`]. The log answers questions like "which transactions did period
//! 7 post?" or "why did the run halt?" without touching ledger internals.
//!
//! # Event Types
//!
//! - **ChartLoaded**: accounts opened at construction
//! - **TransactionPosted**: a flow builder's draft was accepted
//! - **PostRejected**: the ledger refused a draft
//! - **ConsistencyVerified**: the end-of-period audit passed
//! - **PeriodCommitted** / **PeriodAborted**: outcome of a step
//! - **RunFinished**: the configured horizon was reached
//!
//! # Example
//!
//! ```rust
//! use money_system_core_rs::models::event::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::ConsistencyVerified { period: 3 });
//!
//! assert_eq!(log.events_at_period(3).len(), 1);
//! assert_eq!(log.events()[0].event_type(), "ConsistencyVerified");
//! ```

use crate::core::money::Amount;
use crate::models::transaction::TransactionId;
use serde::{Deserialize, Serialize};

/// A state change during a run
///
/// Every event carries the period it belongs to; events are logged in the
/// order they happen within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Chart of accounts opened
    ChartLoaded { period: u64, num_accounts: usize },

    /// Draft accepted and applied by the ledger
    TransactionPosted {
        period: u64,
        tx_id: TransactionId,
        flow: String,
        label: String,
        flow_amount: Amount,
        num_entries: usize,
    },

    /// Draft refused by the ledger
    PostRejected {
        period: u64,
        flow: String,
        reason: String,
    },

    /// Full re-derivation audit passed
    ConsistencyVerified { period: u64 },

    /// Period committed and snapshot captured
    PeriodCommitted {
        period: u64,
        journal_len: usize,
        digest: String,
    },

    /// Period abandoned; ledger rolled back to the previous period
    PeriodAborted { period: u64, reason: String },

    /// Run horizon reached
    RunFinished { period: u64 },
}

impl Event {
    /// Period the event belongs to
    pub fn period(&self) -> u64 {
        match self {
            Event::ChartLoaded { period, .. }
            | Event::TransactionPosted { period, .. }
            | Event::PostRejected { period, .. }
            | Event::ConsistencyVerified { period }
            | Event::PeriodCommitted { period, .. }
            | Event::PeriodAborted { period, .. }
            | Event::RunFinished { period } => *period,
        }
    }

    /// Event type name, stable for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ChartLoaded { .. } => "ChartLoaded",
            Event::TransactionPosted { .. } => "TransactionPosted",
            Event::PostRejected { .. } => "PostRejected",
            Event::ConsistencyVerified { .. } => "ConsistencyVerified",
            Event::PeriodCommitted { .. } => "PeriodCommitted",
            Event::PeriodAborted { .. } => "PeriodAborted",
            Event::RunFinished { .. } => "RunFinished",
        }
    }

    /// Transaction the event refers to, if any
    pub fn tx_id(&self) -> Option<TransactionId> {
        match self {
            Event::TransactionPosted { tx_id, .. } => Some(*tx_id),
            _ => None,
        }
    }

    /// Flow builder the event refers to, if any
    pub fn flow(&self) -> Option<&str> {
        match self {
            Event::TransactionPosted { flow, .. } | Event::PostRejected { flow, .. } => {
                Some(flow.as_str())
            }
            _ => None,
        }
    }
}

/// Append-only event log
///
/// This is a simple wrapper around `Vec<Event>` with query helpers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Drop every event logged after the first `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific period
    pub fn events_at_period(&self, period: u64) -> Vec<&Event> {
        self.events.iter().filter(|e| e.period() == period).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific transaction
    pub fn events_for_tx(&self, tx_id: TransactionId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.tx_id() == Some(tx_id))
            .collect()
    }

    /// Get events for a specific flow builder
    pub fn events_for_flow(&self, flow: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.flow() == Some(flow))
            .collect()
    }
}
