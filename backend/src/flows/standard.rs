//! Standard behaviour of the four-sector money system
//!
//! Every period, in the default order:
//!
//! 1. Bank lending grows (or repays) private loans
//! 2. Private agents lend to each other
//! 3. Interest on loans, deposits, reserves and bonds, all accrued on
//!    start-of-period balances
//! 4. Government spending
//! 5. Taxes on the period's income (spending + deposit and bond interest,
//!    net of loan interest)
//! 6. Bond issuance restoring the Treasury account to its target
//! 7. Equity revaluation closing every sector's balance sheet
//!
//! `central_bank_bond_purchase` and `bank_debt_issuance` are in the table but
//! not in the default order; list them in `flow_order` to use them.

use super::builders::{self, ids};
use super::{BehaviorRuleSet, FlowBuilder, FlowContext};
use crate::core::money::{apply_rate, from_units};
use crate::models::transaction::TransactionDraft;

/// Default order of the standard rule set
pub const DEFAULT_FLOW_ORDER: [&str; 10] = [
    "loan_change",
    "private_loan_change",
    "interest_on_loans",
    "interest_on_deposits",
    "interest_on_reserves",
    "interest_on_bonds",
    "government_spending",
    "taxes",
    "bond_issuance",
    "equity_revaluation",
];

/// Rule set reproducing the monthly money system model
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRuleSet;

impl BehaviorRuleSet for StandardRuleSet {
    fn name(&self) -> &str {
        "standard"
    }

    fn builders(&self) -> Vec<FlowBuilder> {
        vec![
            FlowBuilder::new("loan_change", loan_change),
            FlowBuilder::new("private_loan_change", private_loan_change),
            FlowBuilder::new("interest_on_loans", interest_on_loans),
            FlowBuilder::new("interest_on_deposits", interest_on_deposits),
            FlowBuilder::new("interest_on_reserves", interest_on_reserves),
            FlowBuilder::new("interest_on_bonds", interest_on_bonds),
            FlowBuilder::new("government_spending", government_spending),
            FlowBuilder::new("taxes", taxes),
            FlowBuilder::new("bond_issuance", bond_issuance),
            FlowBuilder::new("central_bank_bond_purchase", central_bank_bond_purchase),
            FlowBuilder::new("bank_debt_issuance", bank_debt_issuance),
            FlowBuilder::new("equity_revaluation", equity_revaluation),
        ]
    }

    fn default_order(&self) -> Vec<&'static str> {
        DEFAULT_FLOW_ORDER.to_vec()
    }
}

/// Loans grow by `loan_growth`; repayments cannot exceed opening deposits.
/// The recorded flow is signed (negative = repayment).
pub fn loan_change(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let change = apply_rate(ctx.opening_balance(ids::PRIVATE_LOANS), ctx.config.loan_growth);
    if change >= 0 {
        builders::loan_creation(ctx.period, change)
    } else {
        let repayment = change
            .saturating_neg()
            .min(ctx.opening_balance(ids::PRIVATE_DEPOSITS))
            .max(0);
        builders::loan_repayment(ctx.period, repayment).map(|d| d.with_flow_amount(-repayment))
    }
}

/// Intra-private lending grows by `private_loan_growth`; repayments cannot
/// exceed the outstanding stock
pub fn private_loan_change(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let outstanding = ctx.opening_balance(ids::PRIVATE_LOANS_ASSET);
    let change = apply_rate(outstanding, ctx.config.private_loan_growth);
    if change >= 0 {
        builders::private_loan_creation(ctx.period, change)
    } else {
        let repayment = change.saturating_neg().min(outstanding).max(0);
        builders::private_loan_repayment(ctx.period, repayment)
            .map(|d| d.with_flow_amount(-repayment))
    }
}

pub fn interest_on_loans(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let amount = apply_rate(ctx.opening_balance(ids::PRIVATE_LOANS), ctx.config.loan_rate);
    builders::interest_on_loans(ctx.period, amount)
}

pub fn interest_on_deposits(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let amount = apply_rate(ctx.opening_balance(ids::PRIVATE_DEPOSITS), ctx.config.deposit_rate);
    builders::interest_on_deposits(ctx.period, amount)
}

pub fn interest_on_reserves(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let amount = apply_rate(ctx.opening_balance(ids::BANK_RESERVES), ctx.config.reserve_rate);
    builders::interest_on_reserves(ctx.period, amount)
}

/// Only privately held bonds earn interest; central bank holdings do not
pub fn interest_on_bonds(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let amount = apply_rate(ctx.opening_balance(ids::PRIVATE_GOV_BONDS), ctx.config.bond_rate);
    builders::interest_on_bonds(ctx.period, amount)
}

pub fn government_spending(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    builders::government_spending(ctx.period, ctx.config.gov_spending_for(ctx.period))
}

/// Reads flows recorded earlier in the period, so it must run after them
pub fn taxes(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let base = ctx
        .flow("government_spending")
        .saturating_add(ctx.flow("interest_on_deposits"))
        .saturating_add(ctx.flow("interest_on_bonds"))
        .saturating_sub(ctx.flow("interest_on_loans"));
    let amount = apply_rate(base, ctx.config.tax_rate).max(0);
    builders::taxes(ctx.period, amount)
}

/// Reads the live Treasury balance, after this period's fiscal flows
pub fn bond_issuance(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    let gap = from_units(ctx.config.tga_target).saturating_sub(ctx.current_balance(ids::GOV_TGA));
    builders::bond_issue(ctx.period, gap)
}

pub fn central_bank_bond_purchase(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    builders::bond_sale_to_cb(ctx.period, from_units(ctx.config.cb_bond_purchase))
}

pub fn bank_debt_issuance(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    builders::bank_debt_issue(ctx.period, from_units(ctx.config.bank_debt_issuance))
}

pub fn equity_revaluation(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
    builders::equity_revaluation(ctx.period, ctx.ledger)
}
