//! Domain models for the money system

pub mod account;
pub mod chart;
pub mod event;
pub mod ledger;
pub mod transaction;

// Re-exports
pub use account::{account_id, Account, AccountClass, Sector};
pub use chart::{default_chart, AccountSpec};
pub use event::{Event, EventLog};
pub use ledger::{BalanceSheet, Ledger, LedgerError, LedgerMark};
pub use transaction::{
    EntryDraft, JournalEntry, PostedTransaction, TransactionDraft, TransactionId, TransactionRef,
};
