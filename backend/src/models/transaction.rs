//! Transaction model
//!
//! A transaction moves value between accounts as a group of journal entries.
//! Flow builders produce [`TransactionDraft`]s; the ledger validates a draft
//! and turns it into an immutable [`PostedTransaction`].
//!
//! Entry amounts are changes of the account balance in the account's
//! natural direction. The double-entry check weights each amount by the
//! account class sign (asset +1, liability/equity -1); see `Ledger::post`.
//!
//! CRITICAL: All money values are i64 minor units

use crate::core::money::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier assigned by the ledger at post time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx_{:08}", self.0)
    }
}

/// An entry of a draft, not yet applied to any account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub account: String,
    pub amount: Amount,
    pub memo: Option<String>,
}

/// A transaction under construction
///
/// Drafts have no effect on the ledger until posted.
///
/// # Example
/// ```
/// use money_system_core_rs::TransactionDraft;
///
/// let draft = TransactionDraft::new("wages", 1)
///     .with_entry("Bank:Deposits", 100)
///     .with_entry("Private:Deposits", 100);
///
/// assert_eq!(draft.entries().len(), 2);
/// assert_eq!(draft.period(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    label: String,
    period: u64,
    entries: Vec<EntryDraft>,

    /// Headline amount of the economic flow (e.g. the tax paid)
    ///
    /// Recorded in the per-period flow table; not part of the balance check.
    flow_amount: Amount,
}

impl TransactionDraft {
    pub fn new(label: impl Into<String>, period: u64) -> Self {
        Self {
            label: label.into(),
            period,
            entries: Vec::new(),
            flow_amount: 0,
        }
    }

    /// Append an entry
    pub fn with_entry(mut self, account: impl Into<String>, amount: Amount) -> Self {
        self.entries.push(EntryDraft {
            account: account.into(),
            amount,
            memo: None,
        });
        self
    }

    /// Append an entry carrying a memo
    pub fn with_memo_entry(
        mut self,
        account: impl Into<String>,
        amount: Amount,
        memo: impl Into<String>,
    ) -> Self {
        self.entries.push(EntryDraft {
            account: account.into(),
            amount,
            memo: Some(memo.into()),
        });
        self
    }

    /// Set the headline flow amount
    pub fn with_flow_amount(mut self, amount: Amount) -> Self {
        self.flow_amount = amount;
        self
    }

    /// Re-date the draft (the model stamps drafts with the period being stepped)
    pub fn at_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn entries(&self) -> &[EntryDraft] {
        &self.entries
    }

    pub fn flow_amount(&self) -> Amount {
        self.flow_amount
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A posted, immutable journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub transaction_id: TransactionId,
    pub account: String,
    pub amount: Amount,
    pub period: u64,
    pub memo: Option<String>,
}

/// A transaction accepted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedTransaction {
    id: TransactionId,
    label: String,
    period: u64,
    entries: Vec<JournalEntry>,
    flow_amount: Amount,
}

impl PostedTransaction {
    pub(crate) fn from_draft(id: TransactionId, draft: TransactionDraft) -> Self {
        let period = draft.period;
        let entries = draft
            .entries
            .into_iter()
            .map(|entry| JournalEntry {
                transaction_id: id,
                account: entry.account,
                amount: entry.amount,
                period,
                memo: entry.memo,
            })
            .collect();

        Self {
            id,
            label: draft.label,
            period,
            entries,
            flow_amount: draft.flow_amount,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn flow_amount(&self) -> Amount {
        self.flow_amount
    }
}

/// Handle returned by a successful post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRef {
    pub id: TransactionId,
    pub period: u64,
    /// Position of the transaction in the journal
    pub journal_index: usize,
}
