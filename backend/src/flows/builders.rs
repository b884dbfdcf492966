//! Transaction shapes of the standard economy
//!
//! Each function drafts one balanced transaction for a given amount and
//! returns `None` for a zero amount. Nothing here reads or mutates a ledger
//! except [`equity_revaluation`], which only reads one.
//!
//! Entry amounts move balances in the account's natural direction; see
//! `models::transaction` for the sign convention.

use crate::core::money::{Amount, WideAmount};
use crate::models::account::{account_id, Sector};
use crate::models::ledger::Ledger;
use crate::models::transaction::TransactionDraft;

/// Account identifiers of the default chart
pub mod ids {
    pub const PRIVATE_DEPOSITS: &str = "Private:Deposits";
    pub const PRIVATE_LOANS: &str = "Private:Loans";
    pub const PRIVATE_GOV_BONDS: &str = "Private:GovBonds";
    pub const PRIVATE_BANK_DEBT: &str = "Private:BankDebt";
    pub const PRIVATE_CURRENCY: &str = "Private:Currency";
    pub const PRIVATE_LOANS_ASSET: &str = "Private:PrivateLoansAsset";
    pub const PRIVATE_LOANS_LIABILITY: &str = "Private:PrivateLoansLiability";
    pub const BANK_LOANS: &str = "Bank:Loans";
    pub const BANK_RESERVES: &str = "Bank:Reserves";
    pub const BANK_DEPOSITS: &str = "Bank:Deposits";
    pub const BANK_DEBT: &str = "Bank:BankDebt";
    pub const GOV_TGA: &str = "Government:TGA";
    pub const GOV_BONDS: &str = "Government:GovBonds";
    pub const CB_RESERVES: &str = "CentralBank:Reserves";
    pub const CB_TGA: &str = "CentralBank:TGA";
    pub const CB_GOV_BONDS: &str = "CentralBank:GovBonds";
}

use ids::*;

/// `Amount::MIN` has no negation, so it is clamped one minor unit up
fn nonzero(amount: Amount) -> Option<Amount> {
    (amount != 0).then_some(amount.max(-Amount::MAX))
}

/// Money moving from the government to the private sector through the
/// payment chain (negative `amount` moves it the other way)
///
/// Private deposits and bank deposit liabilities move together, bank
/// reserves and central bank reserve liabilities move together, and the
/// Treasury account at the central bank moves the opposite way.
fn government_payment(label: &str, period: u64, amount: Amount) -> TransactionDraft {
    TransactionDraft::new(label, period)
        .with_entry(PRIVATE_DEPOSITS, amount)
        .with_entry(BANK_DEPOSITS, amount)
        .with_entry(BANK_RESERVES, amount)
        .with_entry(CB_RESERVES, amount)
        .with_entry(CB_TGA, -amount)
        .with_entry(GOV_TGA, -amount)
        .with_flow_amount(amount)
}

pub fn government_spending(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| government_payment("government_spending", period, a))
}

pub fn taxes(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount)
        .map(|a| government_payment("taxes", period, -a).with_flow_amount(a))
}

pub fn interest_on_bonds(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| government_payment("interest_on_bonds", period, a))
}

/// Bonds sold to the private sector to restore the Treasury account
///
/// A negative amount is a buy-back.
pub fn bond_issue(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        government_payment("bond_issue", period, -a)
            .with_entry(GOV_BONDS, a)
            .with_entry(PRIVATE_GOV_BONDS, a)
            .with_flow_amount(a)
    })
}

/// Bonds sold directly to the central bank against Treasury account credit
pub fn bond_sale_to_cb(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("bond_sale_to_cb", period)
            .with_entry(GOV_BONDS, a)
            .with_entry(CB_GOV_BONDS, a)
            .with_entry(CB_TGA, a)
            .with_entry(GOV_TGA, a)
            .with_flow_amount(a)
    })
}

/// Bank lending: the new loan is matched by a new deposit
pub fn loan_creation(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("loan_creation", period)
            .with_entry(BANK_LOANS, a)
            .with_entry(PRIVATE_LOANS, a)
            .with_entry(BANK_DEPOSITS, a)
            .with_entry(PRIVATE_DEPOSITS, a)
            .with_flow_amount(a)
    })
}

/// Loan repayment destroys the deposit used to repay it
pub fn loan_repayment(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("loan_repayment", period)
            .with_entry(PRIVATE_DEPOSITS, -a)
            .with_entry(BANK_DEPOSITS, -a)
            .with_entry(BANK_LOANS, -a)
            .with_entry(PRIVATE_LOANS, -a)
            .with_flow_amount(a)
    })
}

/// Lending between private agents (a claim and a debt inside one sector)
pub fn private_loan_creation(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("private_loan_creation", period)
            .with_entry(PRIVATE_LOANS_ASSET, a)
            .with_entry(PRIVATE_LOANS_LIABILITY, a)
            .with_flow_amount(a)
    })
}

pub fn private_loan_repayment(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("private_loan_repayment", period)
            .with_entry(PRIVATE_LOANS_ASSET, -a)
            .with_entry(PRIVATE_LOANS_LIABILITY, -a)
            .with_flow_amount(a)
    })
}

/// Borrowers pay loan interest out of their deposits
pub fn interest_on_loans(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("interest_on_loans", period)
            .with_entry(PRIVATE_DEPOSITS, -a)
            .with_entry(BANK_DEPOSITS, -a)
            .with_flow_amount(a)
    })
}

/// Banks credit deposit interest to depositors
pub fn interest_on_deposits(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("interest_on_deposits", period)
            .with_entry(PRIVATE_DEPOSITS, a)
            .with_entry(BANK_DEPOSITS, a)
            .with_flow_amount(a)
    })
}

/// The central bank pays interest on reserves by creating reserves
pub fn interest_on_reserves(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("interest_on_reserves", period)
            .with_entry(BANK_RESERVES, a)
            .with_entry(CB_RESERVES, a)
            .with_flow_amount(a)
    })
}

/// Banks sell debt to depositors (negative amount = redemption)
pub fn bank_debt_issue(period: u64, amount: Amount) -> Option<TransactionDraft> {
    nonzero(amount).map(|a| {
        TransactionDraft::new("bank_debt_issue", period)
            .with_entry(PRIVATE_DEPOSITS, -a)
            .with_entry(BANK_DEPOSITS, -a)
            .with_entry(PRIVATE_BANK_DEBT, a)
            .with_entry(BANK_DEBT, a)
            .with_flow_amount(a)
    })
}

/// Book every sector's unrecorded net worth change into its equity
///
/// For each sector whose net worth differs from its equity, the difference
/// is posted to the sector's first equity account (or to `"<Sector>:Equity"`
/// when the chart has none, which the ledger then rejects). Because every
/// posted transaction is balanced, the adjustments cancel across sectors and
/// the revaluation is itself balanced.
///
/// The flow amount is the gross net worth transferred between sectors,
/// capped at `Amount::MAX`. A drift wider than one `Amount` is split over
/// several entries to the same account.
pub fn equity_revaluation(period: u64, ledger: &Ledger) -> Option<TransactionDraft> {
    let mut draft = TransactionDraft::new("equity_revaluation", period);
    let mut gross: WideAmount = 0;
    let limit = WideAmount::from(Amount::MAX);

    for sector in Sector::ALL {
        let drift = ledger.sector_balance_sheet(sector).drift();
        if drift == 0 {
            continue;
        }
        let equity_id = ledger
            .equity_account(sector)
            .map(|account| account.id().to_string())
            .unwrap_or_else(|| account_id(sector, "Equity"));

        let mut remaining = drift;
        while remaining != 0 {
            let chunk = remaining.clamp(-limit, limit);
            // In range after the clamp
            draft = draft.with_memo_entry(
                equity_id.clone(),
                chunk as Amount,
                "net worth revaluation",
            );
            remaining -= chunk;
        }
        gross += drift.max(0);
    }

    let flow_amount = Amount::try_from(gross).unwrap_or(Amount::MAX);
    (!draft.is_empty()).then(|| draft.with_flow_amount(flow_amount))
}
