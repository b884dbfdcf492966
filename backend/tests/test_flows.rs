//! Flow Builder Tests
//!
//! Builders are checked in isolation: drafts are inspected directly, or
//! posted to a ledger over the default chart to prove they balance.

use money_system_core_rs::core::money::{from_units, Amount};
use money_system_core_rs::flows::builders::{self, ids};
use money_system_core_rs::flows::standard;
use money_system_core_rs::{
    default_chart, AccountClass, BehaviorRuleSet, ConfigError, FlowContext, FlowRecord, Ledger,
    ModelConfig, Sector, StandardRuleSet, TransactionDraft,
};
use std::collections::BTreeMap;

// ============================================================================
// Test Helpers
// ============================================================================

fn chart_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    for spec in default_chart() {
        ledger.open_account(spec.id, spec.sector, spec.class).unwrap();
    }
    ledger
}

fn opening(balances: &[(&str, f64)]) -> BTreeMap<String, i64> {
    balances
        .iter()
        .map(|(id, units)| (id.to_string(), from_units(*units)))
        .collect()
}

fn entry_amount(draft: &TransactionDraft, account: &str) -> i64 {
    draft
        .entries()
        .iter()
        .filter(|e| e.account == account)
        .map(|e| e.amount)
        .sum()
}

// ============================================================================
// Transaction Shapes
// ============================================================================

#[test]
fn test_every_shape_posts_balanced() {
    let a = from_units(25.0);
    let drafts = vec![
        builders::government_spending(1, a),
        builders::taxes(1, a),
        builders::interest_on_bonds(1, a),
        builders::bond_issue(1, a),
        builders::bond_issue(1, -a),
        builders::bond_sale_to_cb(1, a),
        builders::loan_creation(1, a),
        builders::loan_repayment(1, a),
        builders::private_loan_creation(1, a),
        builders::private_loan_repayment(1, a),
        builders::interest_on_loans(1, a),
        builders::interest_on_deposits(1, a),
        builders::interest_on_reserves(1, a),
        builders::bank_debt_issue(1, a),
    ];

    let mut ledger = chart_ledger();
    for draft in drafts {
        let draft = draft.expect("non-zero amount drafts a transaction");
        let label = draft.label().to_string();
        assert!(ledger.post(draft).is_ok(), "{label} should balance");
    }
}

#[test]
fn test_zero_amount_drafts_nothing() {
    assert!(builders::government_spending(1, 0).is_none());
    assert!(builders::taxes(1, 0).is_none());
    assert!(builders::bond_issue(1, 0).is_none());
    assert!(builders::loan_creation(1, 0).is_none());
    assert!(builders::interest_on_reserves(1, 0).is_none());
}

#[test]
fn test_government_spending_payment_chain() {
    let a = from_units(100.0);
    let draft = builders::government_spending(3, a).unwrap();

    assert_eq!(draft.period(), 3);
    assert_eq!(draft.flow_amount(), a);
    assert_eq!(entry_amount(&draft, ids::PRIVATE_DEPOSITS), a);
    assert_eq!(entry_amount(&draft, ids::BANK_DEPOSITS), a);
    assert_eq!(entry_amount(&draft, ids::BANK_RESERVES), a);
    assert_eq!(entry_amount(&draft, ids::CB_RESERVES), a);
    assert_eq!(entry_amount(&draft, ids::CB_TGA), -a);
    assert_eq!(entry_amount(&draft, ids::GOV_TGA), -a);
}

#[test]
fn test_taxes_reverse_the_chain_with_positive_flow() {
    let a = from_units(20.0);
    let draft = builders::taxes(1, a).unwrap();

    assert_eq!(draft.flow_amount(), a);
    assert_eq!(entry_amount(&draft, ids::PRIVATE_DEPOSITS), -a);
    assert_eq!(entry_amount(&draft, ids::GOV_TGA), a);
}

#[test]
fn test_bond_issue_is_an_asset_swap_for_private_sector() {
    let mut ledger = chart_ledger();
    ledger.post(builders::bond_issue(1, from_units(50.0)).unwrap()).unwrap();

    // Deposits swapped for bonds: private net worth unchanged
    assert_eq!(ledger.sector_balance_sheet(Sector::Private).net_worth, 0);
    assert_eq!(ledger.balance(ids::PRIVATE_GOV_BONDS).unwrap(), from_units(50.0));
    assert_eq!(ledger.balance(ids::PRIVATE_DEPOSITS).unwrap(), from_units(-50.0));
    assert_eq!(ledger.balance(ids::GOV_TGA).unwrap(), from_units(50.0));
}

// ============================================================================
// Standard Builders
// ============================================================================

#[test]
fn test_interest_uses_opening_balance() {
    let mut ledger = chart_ledger();
    // Live balance differs from the opening one
    ledger
        .post(builders::interest_on_deposits(1, from_units(500.0)).unwrap())
        .unwrap();

    let opening = opening(&[(ids::PRIVATE_DEPOSITS, 1200.0)]);
    let flows = FlowRecord::new();
    let config = ModelConfig {
        deposit_rate: 0.01,
        ..ModelConfig::default()
    };
    let ctx = FlowContext {
        period: 1,
        ledger: &ledger,
        opening: &opening,
        flows: &flows,
        config: &config,
    };

    let draft = standard::interest_on_deposits(&ctx).unwrap();
    assert_eq!(draft.flow_amount(), from_units(12.0));
}

#[test]
fn test_taxes_follow_recorded_income() {
    let ledger = chart_ledger();
    let opening = BTreeMap::new();
    let mut flows = FlowRecord::new();
    flows.record("government_spending", from_units(100.0));
    flows.record("interest_on_deposits", from_units(2.0));
    flows.record("interest_on_bonds", from_units(3.0));
    flows.record("interest_on_loans", from_units(5.0));
    let config = ModelConfig::default();
    let ctx = FlowContext {
        period: 1,
        ledger: &ledger,
        opening: &opening,
        flows: &flows,
        config: &config,
    };

    let draft = standard::taxes(&ctx).unwrap();
    assert_eq!(draft.flow_amount(), from_units(20.0));
}

#[test]
fn test_taxes_never_negative() {
    let ledger = chart_ledger();
    let opening = BTreeMap::new();
    let mut flows = FlowRecord::new();
    flows.record("interest_on_loans", from_units(40.0));
    let config = ModelConfig {
        gov_spending: 0.0,
        ..ModelConfig::default()
    };
    let ctx = FlowContext {
        period: 1,
        ledger: &ledger,
        opening: &opening,
        flows: &flows,
        config: &config,
    };

    assert!(standard::taxes(&ctx).is_none());
}

#[test]
fn test_loan_repayment_capped_by_deposits() {
    let ledger = chart_ledger();
    let opening = opening(&[(ids::PRIVATE_LOANS, 800.0), (ids::PRIVATE_DEPOSITS, 100.0)]);
    let flows = FlowRecord::new();
    let config = ModelConfig {
        loan_growth: -0.5,
        ..ModelConfig::default()
    };
    let ctx = FlowContext {
        period: 1,
        ledger: &ledger,
        opening: &opening,
        flows: &flows,
        config: &config,
    };

    let draft = standard::loan_change(&ctx).unwrap();
    assert_eq!(draft.label(), "loan_repayment");
    assert_eq!(draft.flow_amount(), from_units(-100.0));
    assert_eq!(entry_amount(&draft, ids::BANK_LOANS), from_units(-100.0));
}

#[test]
fn test_bond_issuance_restores_tga_target() {
    let mut ledger = chart_ledger();
    ledger
        .post(builders::government_spending(1, from_units(100.0)).unwrap())
        .unwrap();

    let opening = BTreeMap::new();
    let flows = FlowRecord::new();
    let config = ModelConfig {
        tga_target: 10.0,
        ..ModelConfig::default()
    };
    let ctx = FlowContext {
        period: 1,
        ledger: &ledger,
        opening: &opening,
        flows: &flows,
        config: &config,
    };

    let draft = standard::bond_issuance(&ctx).unwrap();
    assert_eq!(draft.flow_amount(), from_units(110.0));

    ledger.post(draft).unwrap();
    assert_eq!(ledger.balance(ids::GOV_TGA).unwrap(), from_units(10.0));
}

// ============================================================================
// Equity Revaluation
// ============================================================================

#[test]
fn test_revaluation_closes_every_sector() {
    let mut ledger = chart_ledger();
    ledger
        .post(builders::government_spending(1, from_units(100.0)).unwrap())
        .unwrap();

    let draft = builders::equity_revaluation(1, &ledger).unwrap();
    assert_eq!(draft.flow_amount(), from_units(100.0));
    assert_eq!(entry_amount(&draft, "Private:NetWorth"), from_units(100.0));
    assert_eq!(entry_amount(&draft, "Government:GovEquity"), from_units(-100.0));

    ledger.post(draft).unwrap();
    assert!(ledger.validate_global_consistency().is_ok());
}

#[test]
fn test_revaluation_splits_drift_wider_than_one_amount() {
    let mut ledger = chart_ledger();
    ledger
        .post(builders::government_spending(1, Amount::MAX).unwrap())
        .unwrap();
    ledger
        .post(
            TransactionDraft::new("bond_gift", 1)
                .with_entry(ids::PRIVATE_GOV_BONDS, Amount::MAX)
                .with_entry(ids::GOV_BONDS, Amount::MAX),
        )
        .unwrap();

    let draft = builders::equity_revaluation(1, &ledger).unwrap();
    let amounts = |account: &str| -> Vec<i64> {
        draft
            .entries()
            .iter()
            .filter(|e| e.account == account)
            .map(|e| e.amount)
            .collect()
    };
    assert_eq!(amounts("Private:NetWorth"), vec![Amount::MAX, Amount::MAX]);
    assert_eq!(amounts("Government:GovEquity"), vec![-Amount::MAX, -Amount::MAX]);
    assert_eq!(draft.flow_amount(), Amount::MAX);

    // Balanced, but no equity account can hold twice the limit
    let balances = ledger.balances();
    let err = ledger.post(draft).unwrap_err();
    assert_eq!(err.kind(), "AmountOverflowError");
    assert_eq!(ledger.balances(), balances);
}

#[test]
fn test_revaluation_of_consistent_ledger_is_none() {
    let ledger = chart_ledger();
    assert!(builders::equity_revaluation(1, &ledger).is_none());
}

#[test]
fn test_revaluation_without_equity_account_is_rejected() {
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
        .post(
            TransactionDraft::new("wages", 1)
                .with_entry("Bank:Deposits", 100)
                .with_entry("Private:Deposits", 100),
        )
        .unwrap();

    let draft = builders::equity_revaluation(1, &ledger).unwrap();
    let err = ledger.post(draft).unwrap_err();
    assert_eq!(err.kind(), "UnknownAccountError");
}

// ============================================================================
// Rule Set
// ============================================================================

#[test]
fn test_standard_order_resolves() {
    let order = StandardRuleSet.resolve_order(None).unwrap();
    let names: Vec<_> = order.iter().map(|b| b.name).collect();
    assert_eq!(names, standard::DEFAULT_FLOW_ORDER.to_vec());
}

#[test]
fn test_configured_order_can_add_table_only_flows() {
    let configured = vec![
        "central_bank_bond_purchase".to_string(),
        "equity_revaluation".to_string(),
    ];
    let order = StandardRuleSet.resolve_order(Some(&configured)).unwrap();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0].name, "central_bank_bond_purchase");
}

#[test]
fn test_unknown_and_duplicate_flow_names_rejected() {
    let unknown = vec!["helicopter_money".to_string()];
    assert_eq!(
        StandardRuleSet.resolve_order(Some(&unknown)).unwrap_err(),
        ConfigError::UnknownFlow {
            name: "helicopter_money".to_string()
        }
    );

    let duplicate = vec!["taxes".to_string(), "taxes".to_string()];
    assert_eq!(
        StandardRuleSet.resolve_order(Some(&duplicate)).unwrap_err(),
        ConfigError::DuplicateFlow {
            name: "taxes".to_string()
        }
    );
}
