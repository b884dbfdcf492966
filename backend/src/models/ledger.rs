//! Ledger
//!
//! Owns the chart of accounts and the append-only journal of posted
//! transactions. Every mutation of an account balance goes through
//! [`Ledger::post`], which is all-or-nothing.
//!
//! # Critical Invariants
//!
//! 1. **Double entry**: every posted transaction's class-signed entry amounts
//!    sum to zero
//! 2. **Reconstruction**: every account balance equals the sum of the journal
//!    entries posted to it
//! 3. **Sector identity**: for every sector, assets - liabilities - equity = 0
//!    at period boundaries
//! 4. **Monotonic posting**: periods never decrease along the journal
//! 5. **Frozen chart**: no account can be opened once the journal is non-empty

use crate::core::money::{is_balanced, Amount, WideAmount};
use crate::models::account::{Account, AccountClass, Sector};
use crate::models::transaction::{
    JournalEntry, PostedTransaction, TransactionDraft, TransactionId, TransactionRef,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by ledger operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Account {id} already exists")]
    DuplicateAccount { id: String },

    #[error("Unknown account: {id}")]
    UnknownAccount { id: String },

    #[error("Transaction '{label}' is unbalanced: residual {residual} minor units")]
    UnbalancedTransaction { label: String, residual: i128 },

    #[error("Consistency failure in sector {sector}: drift {drift} minor units ({detail})")]
    Consistency {
        sector: Sector,
        drift: i128,
        detail: String,
    },

    #[error("Chart of accounts is frozen; cannot open {id} after the first post")]
    ChartFrozen { id: String },

    #[error(
        "Transaction '{label}' dated period {period} precedes last posted period {last_period}"
    )]
    RetroactivePosting {
        label: String,
        period: u64,
        last_period: u64,
    },

    #[error("Transaction '{label}' has no entries")]
    EmptyTransaction { label: String },

    #[error("Transaction '{label}' would overflow the balance of {account}")]
    AmountOverflow { label: String, account: String },
}

impl LedgerError {
    /// Stable error kind reported in run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::DuplicateAccount { .. } => "DuplicateAccountError",
            LedgerError::UnknownAccount { .. } => "UnknownAccountError",
            LedgerError::UnbalancedTransaction { .. } => "UnbalancedTransactionError",
            LedgerError::Consistency { .. } => "ConsistencyError",
            LedgerError::ChartFrozen { .. } => "ChartFrozenError",
            LedgerError::RetroactivePosting { .. } => "RetroactivePostingError",
            LedgerError::EmptyTransaction { .. } => "EmptyTransactionError",
            LedgerError::AmountOverflow { .. } => "AmountOverflowError",
        }
    }
}

/// Aggregated balance sheet of one sector
///
/// Totals are [`WideAmount`]s: a sector may hold several accounts near the
/// `Amount` limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub sector: Sector,
    pub assets: WideAmount,
    pub liabilities: WideAmount,
    pub equity: WideAmount,
    /// Assets minus liabilities
    pub net_worth: WideAmount,
}

impl BalanceSheet {
    fn aggregate<'a>(
        sector: Sector,
        balances: impl Iterator<Item = (&'a Account, Amount)>,
    ) -> Self {
        let mut sheet = BalanceSheet {
            sector,
            assets: 0,
            liabilities: 0,
            equity: 0,
            net_worth: 0,
        };
        for (account, balance) in balances.filter(|(a, _)| a.sector() == sector) {
            let balance = WideAmount::from(balance);
            match account.class() {
                AccountClass::Asset => sheet.assets += balance,
                AccountClass::Liability => sheet.liabilities += balance,
                AccountClass::Equity => sheet.equity += balance,
            }
        }
        sheet.net_worth = sheet.assets - sheet.liabilities;
        sheet
    }

    /// Net worth not accounted for by recorded equity
    pub fn drift(&self) -> WideAmount {
        self.net_worth - self.equity
    }

    /// Whether net worth equals recorded equity
    pub fn is_consistent(&self) -> bool {
        is_balanced(self.drift())
    }
}

/// Position in the journal that the ledger can be rolled back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerMark {
    journal_len: usize,
    next_tx_id: u64,
}

/// Chart of accounts plus journal
///
/// # Example
///
/// ```rust
/// use money_system_core_rs::{AccountClass, Ledger, Sector, TransactionDraft};
///
/// let mut ledger = Ledger::new();
/// ledger.open_account("Bank:Deposits", Sector::Bank, AccountClass::Liability).unwrap();
/// ledger.open_account("Private:Deposits", Sector::Private, AccountClass::Asset).unwrap();
///
/// let draft = TransactionDraft::new("wages", 1)
///     .with_entry("Bank:Deposits", 100)
///     .with_entry("Private:Deposits", 100);
/// ledger.post(draft).unwrap();
///
/// assert_eq!(ledger.balance("Private:Deposits").unwrap(), 100);
/// assert_eq!(ledger.journal_len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    /// All accounts, ordered by identifier
    accounts: BTreeMap<String, Account>,

    /// Posted transactions in posting order
    journal: Vec<PostedTransaction>,

    /// Identifier handed to the next posted transaction
    next_tx_id: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            journal: Vec::new(),
            next_tx_id: 1,
        }
    }

    // ========================================================================
    // Chart of accounts
    // ========================================================================

    /// Open an account with a zero balance
    ///
    /// # Errors
    ///
    /// * `DuplicateAccount` - the identifier is already in the chart
    /// * `ChartFrozen` - a transaction has already been posted
    pub fn open_account(
        &mut self,
        id: impl Into<String>,
        sector: Sector,
        class: AccountClass,
    ) -> Result<&Account, LedgerError> {
        let id = id.into();
        if self.is_frozen() {
            return Err(LedgerError::ChartFrozen { id });
        }
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::DuplicateAccount { id });
        }

        let account = Account::new(id.clone(), sector, class);
        Ok(self.accounts.entry(id).or_insert(account))
    }

    /// Whether the chart of accounts can no longer change
    pub fn is_frozen(&self) -> bool {
        !self.journal.is_empty()
    }

    pub fn account(&self, id: &str) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id)
            .ok_or_else(|| LedgerError::UnknownAccount { id: id.to_string() })
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn num_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// First equity account of a sector, in identifier order
    pub fn equity_account(&self, sector: Sector) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.sector() == sector && a.class() == AccountClass::Equity)
    }

    // ========================================================================
    // Posting
    // ========================================================================

    /// Validate a draft and apply it to the accounts
    ///
    /// Validation finishes before any balance changes, so a rejected draft
    /// leaves balances and journal untouched.
    ///
    /// # Errors
    ///
    /// * `EmptyTransaction` - the draft has no entries
    /// * `UnknownAccount` - an entry references an account outside the chart
    /// * `UnbalancedTransaction` - class-signed amounts do not sum to zero
    /// * `RetroactivePosting` - the draft is dated before the last posted period
    /// * `AmountOverflow` - an entry would push a balance outside the `Amount`
    ///   range
    pub fn post(&mut self, draft: TransactionDraft) -> Result<TransactionRef, LedgerError> {
        if draft.is_empty() {
            return Err(LedgerError::EmptyTransaction {
                label: draft.label().to_string(),
            });
        }

        let residual = self.residual(&draft)?;
        if !is_balanced(residual) {
            return Err(LedgerError::UnbalancedTransaction {
                label: draft.label().to_string(),
                residual,
            });
        }

        if let Some(last_period) = self.last_posted_period() {
            if draft.period() < last_period {
                return Err(LedgerError::RetroactivePosting {
                    label: draft.label().to_string(),
                    period: draft.period(),
                    last_period,
                });
            }
        }

        let staged = self.stage(&draft)?;
        for (account_id, balance) in staged {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.set_balance(balance);
            }
        }

        let id = TransactionId(self.next_tx_id);
        self.next_tx_id += 1;

        let posted = PostedTransaction::from_draft(id, draft);
        let tx_ref = TransactionRef {
            id,
            period: posted.period(),
            journal_index: self.journal.len(),
        };
        tracing::debug!(
            tx_id = %id,
            label = posted.label(),
            period = posted.period(),
            entries = posted.entries().len(),
            "posted transaction"
        );
        self.journal.push(posted);

        Ok(tx_ref)
    }

    /// Class-signed sum of a draft's entries
    fn residual(&self, draft: &TransactionDraft) -> Result<i128, LedgerError> {
        let mut residual: i128 = 0;
        for entry in draft.entries() {
            let account = self.account(&entry.account)?;
            residual += account.class().sign() as i128 * entry.amount as i128;
        }
        Ok(residual)
    }

    /// Balances the draft would leave behind, checked entry by entry
    fn stage(&self, draft: &TransactionDraft) -> Result<BTreeMap<String, Amount>, LedgerError> {
        let mut staged: BTreeMap<String, Amount> = BTreeMap::new();
        for entry in draft.entries() {
            let account = self.account(&entry.account)?;
            let next = match staged.get(&entry.account) {
                Some(balance) => balance.checked_add(entry.amount),
                None => account.checked_balance_after(entry.amount),
            }
            .ok_or_else(|| LedgerError::AmountOverflow {
                label: draft.label().to_string(),
                account: entry.account.clone(),
            })?;
            staged.insert(entry.account.clone(), next);
        }
        Ok(staged)
    }

    /// Capture the current journal position
    pub fn mark(&self) -> LedgerMark {
        LedgerMark {
            journal_len: self.journal.len(),
            next_tx_id: self.next_tx_id,
        }
    }

    /// Undo every transaction posted after `mark`
    ///
    /// Entries are reversed newest first, so every intermediate balance is
    /// one `post` already checked and balances return to their values at the
    /// mark.
    pub fn rollback(&mut self, mark: LedgerMark) {
        while self.journal.len() > mark.journal_len {
            let Some(tx) = self.journal.pop() else {
                break;
            };
            for entry in tx.entries().iter().rev() {
                if let Some(account) = self.accounts.get_mut(&entry.account) {
                    if let Some(prior) = account.balance().checked_sub(entry.amount) {
                        account.set_balance(prior);
                    }
                }
            }
            tracing::debug!(tx_id = %tx.id(), label = tx.label(), "rolled back transaction");
        }
        self.next_tx_id = mark.next_tx_id;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn balance(&self, id: &str) -> Result<Amount, LedgerError> {
        self.account(id).map(Account::balance)
    }

    /// Balance of an account, or zero if it is not in the chart
    pub fn balance_or_zero(&self, id: &str) -> Amount {
        self.accounts.get(id).map_or(0, Account::balance)
    }

    /// All balances, ordered by account identifier
    pub fn balances(&self) -> BTreeMap<String, Amount> {
        self.accounts
            .iter()
            .map(|(id, account)| (id.clone(), account.balance()))
            .collect()
    }

    pub fn sector_balance_sheet(&self, sector: Sector) -> BalanceSheet {
        BalanceSheet::aggregate(sector, self.accounts.values().map(|a| (a, a.balance())))
    }

    /// Balance sheets of every sector
    pub fn sector_balance_sheets(&self) -> BTreeMap<Sector, BalanceSheet> {
        Sector::ALL
            .iter()
            .map(|&sector| (sector, self.sector_balance_sheet(sector)))
            .collect()
    }

    pub fn journal(&self) -> &[PostedTransaction] {
        &self.journal
    }

    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&PostedTransaction> {
        self.journal
            .binary_search_by_key(&id, PostedTransaction::id)
            .ok()
            .map(|index| &self.journal[index])
    }

    pub fn last_posted_period(&self) -> Option<u64> {
        self.journal.last().map(PostedTransaction::period)
    }

    /// Journal entries that reference an account, in posting order
    pub fn entries_for<'a>(
        &'a self,
        account_id: &'a str,
    ) -> impl Iterator<Item = &'a JournalEntry> + 'a {
        self.journal
            .iter()
            .flat_map(|tx| tx.entries())
            .filter(move |entry| entry.account == account_id)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Recompute every balance from the journal alone
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if a running sum leaves the `Amount` range, which
    /// only a corrupted journal can produce.
    pub fn replay_balances(&self) -> Result<BTreeMap<String, Amount>, LedgerError> {
        let mut balances: BTreeMap<String, Amount> =
            self.accounts.keys().map(|id| (id.clone(), 0)).collect();
        for tx in &self.journal {
            for entry in tx.entries() {
                let balance = balances.entry(entry.account.clone()).or_insert(0);
                *balance = balance.checked_add(entry.amount).ok_or_else(|| {
                    LedgerError::AmountOverflow {
                        label: tx.label().to_string(),
                        account: entry.account.clone(),
                    }
                })?;
            }
        }
        Ok(balances)
    }

    /// Full re-derivation audit of the SFC identity
    ///
    /// Replays the journal from scratch, checks every cached balance against
    /// the replay, then checks each sector identity on the replayed balances.
    ///
    /// # Errors
    ///
    /// `Consistency` naming the first sector (and account, in `detail`) whose
    /// figures disagree, with the drift in minor units. `AmountOverflow` if the
    /// journal cannot be replayed.
    pub fn validate_global_consistency(&self) -> Result<(), LedgerError> {
        let replayed = self.replay_balances()?;

        for account in self.accounts.values() {
            let expected = replayed.get(account.id()).copied().unwrap_or(0);
            if account.balance() != expected {
                return Err(LedgerError::Consistency {
                    sector: account.sector(),
                    drift: account.balance() as i128 - expected as i128,
                    detail: format!(
                        "account {} holds {} but its journal sums to {}",
                        account.id(),
                        account.balance(),
                        expected
                    ),
                });
            }
        }

        for sector in Sector::ALL {
            let sheet = BalanceSheet::aggregate(
                sector,
                self.accounts
                    .values()
                    .map(|a| (a, replayed.get(a.id()).copied().unwrap_or(0))),
            );
            if !sheet.is_consistent() {
                return Err(LedgerError::Consistency {
                    sector,
                    drift: sheet.drift(),
                    detail: format!(
                        "assets {} - liabilities {} != equity {}",
                        sheet.assets, sheet.liabilities, sheet.equity
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wage_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .open_account("Bank:Deposits", Sector::Bank, AccountClass::Liability)
            .unwrap();
        ledger
            .open_account("Bank:Equity", Sector::Bank, AccountClass::Equity)
            .unwrap();
        ledger
            .open_account("Private:Deposits", Sector::Private, AccountClass::Asset)
            .unwrap();
        ledger
            .open_account("Private:NetWorth", Sector::Private, AccountClass::Equity)
            .unwrap();
        ledger
    }

    fn wages(period: u64, amount: Amount) -> TransactionDraft {
        TransactionDraft::new("wages", period)
            .with_entry("Bank:Deposits", amount)
            .with_entry("Private:Deposits", amount)
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let mut ledger = wage_ledger();
        let err = ledger
            .open_account("Bank:Deposits", Sector::Bank, AccountClass::Liability)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateAccount {
                id: "Bank:Deposits".to_string()
            }
        );
    }

    #[test]
    fn test_chart_frozen_after_first_post() {
        let mut ledger = wage_ledger();
        ledger.post(wages(1, 100)).unwrap();

        let err = ledger
            .open_account("Bank:Reserves", Sector::Bank, AccountClass::Asset)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ChartFrozen { .. }));
    }

    #[test]
    fn test_unbalanced_post_carries_residual() {
        let mut ledger = wage_ledger();
        let draft = TransactionDraft::new("bad", 1)
            .with_entry("Bank:Deposits", 100)
            .with_entry("Private:Deposits", 90);

        let err = ledger.post(draft).unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnbalancedTransaction {
                label: "bad".to_string(),
                residual: -10
            }
        );
        assert_eq!(ledger.journal_len(), 0);
        assert_eq!(ledger.balance("Private:Deposits").unwrap(), 0);
    }

    #[test]
    fn test_retroactive_post_rejected() {
        let mut ledger = wage_ledger();
        ledger.post(wages(2, 100)).unwrap();

        let err = ledger.post(wages(1, 100)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::RetroactivePosting {
                period: 1,
                last_period: 2,
                ..
            }
        ));
        assert_eq!(ledger.balance("Bank:Deposits").unwrap(), 100);
    }

    #[test]
    fn test_empty_post_rejected() {
        let mut ledger = wage_ledger();
        let err = ledger.post(TransactionDraft::new("nothing", 1)).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyTransaction { .. }));
    }

    #[test]
    fn test_rollback_restores_balances_and_ids() {
        let mut ledger = wage_ledger();
        ledger.post(wages(1, 100)).unwrap();
        let mark = ledger.mark();

        ledger.post(wages(2, 50)).unwrap();
        ledger.post(wages(2, 25)).unwrap();
        ledger.rollback(mark);

        assert_eq!(ledger.journal_len(), 1);
        assert_eq!(ledger.balance("Private:Deposits").unwrap(), 100);
        let tx_ref = ledger.post(wages(2, 10)).unwrap();
        assert_eq!(tx_ref.id, TransactionId(2));
    }

    #[test]
    fn test_rollback_unwinds_entries_near_the_limit() {
        let mut ledger = wage_ledger();
        ledger.post(wages(1, Amount::MAX - 10)).unwrap();
        let mark = ledger.mark();

        // Undoing the first leg before the second would pass Amount::MAX
        let swing = TransactionDraft::new("swing", 1)
            .with_entry("Private:Deposits", -20)
            .with_entry("Private:Deposits", 30)
            .with_entry("Bank:Deposits", 10);
        ledger.post(swing).unwrap();
        ledger.rollback(mark);

        assert_eq!(ledger.balance("Private:Deposits").unwrap(), Amount::MAX - 10);
        assert_eq!(ledger.replay_balances().unwrap(), ledger.balances());
    }

    #[test]
    fn test_transaction_lookup_by_id() {
        let mut ledger = wage_ledger();
        let first = ledger.post(wages(1, 100)).unwrap();
        let second = ledger.post(wages(1, 5)).unwrap();

        assert_eq!(ledger.transaction(first.id).unwrap().entries()[0].amount, 100);
        assert_eq!(second.journal_index, 1);
        assert!(ledger.transaction(TransactionId(99)).is_none());
    }

    #[test]
    fn test_consistency_detects_cached_balance_drift() {
        let mut ledger = wage_ledger();
        ledger.post(wages(1, 100)).unwrap();
        let account = ledger.accounts.get_mut("Private:Deposits").unwrap();
        account.set_balance(account.balance() + 5);

        let err = ledger.validate_global_consistency().unwrap_err();
        match err {
            LedgerError::Consistency { sector, drift, .. } => {
                assert_eq!(sector, Sector::Private);
                assert_eq!(drift, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_consistency_detects_missing_equity() {
        let mut ledger = wage_ledger();
        ledger.post(wages(1, 100)).unwrap();

        // Balanced across sectors, but nobody booked the net worth change
        let err = ledger.validate_global_consistency().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Consistency {
                sector: Sector::Private,
                drift: 100,
                ..
            }
        ));
    }
}
