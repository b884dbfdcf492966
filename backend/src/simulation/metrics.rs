//! Headline monetary aggregates derived from a period's balances
//!
//! Accounts missing from the chart count as zero, so custom charts still get
//! a (partial) metrics row.

use crate::core::money::{Amount, WideAmount};
use crate::flows::builders::ids;
use crate::models::account::Sector;
use crate::models::ledger::BalanceSheet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregates reported for every committed period
///
/// Sums of balances are [`WideAmount`]s so that they cannot overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    /// Private deposits plus currency
    pub money_m1: WideAmount,

    /// Bank loans owed by the private sector
    pub private_debt: WideAmount,

    /// Government bonds held by the private sector
    pub private_bonds: WideAmount,

    /// Bank reserves at the central bank
    pub bank_reserves: WideAmount,

    /// Private sector net financial assets
    pub private_nfa: WideAmount,

    /// Bank sector net financial assets
    pub banks_nfa: WideAmount,

    /// Private plus bank net financial assets
    pub non_gov_nfa: WideAmount,

    /// Government plus central bank net financial position
    pub public_nfp: WideAmount,

    /// `non_gov_nfa + public_nfp`; zero when every claim has a holder
    pub sector_balance_check: WideAmount,
}

impl PeriodMetrics {
    pub fn compute(
        balances: &BTreeMap<String, Amount>,
        sheets: &BTreeMap<Sector, BalanceSheet>,
    ) -> Self {
        let balance = |id: &str| WideAmount::from(balances.get(id).copied().unwrap_or(0));
        let net_worth = |sector: Sector| sheets.get(&sector).map_or(0, |s| s.net_worth);

        let private_nfa = net_worth(Sector::Private);
        let banks_nfa = net_worth(Sector::Bank);
        let non_gov_nfa = private_nfa + banks_nfa;
        let public_nfp = net_worth(Sector::Government) + net_worth(Sector::CentralBank);

        Self {
            money_m1: balance(ids::PRIVATE_DEPOSITS) + balance(ids::PRIVATE_CURRENCY),
            private_debt: balance(ids::PRIVATE_LOANS),
            private_bonds: balance(ids::PRIVATE_GOV_BONDS),
            bank_reserves: balance(ids::BANK_RESERVES),
            private_nfa,
            banks_nfa,
            non_gov_nfa,
            public_nfp,
            sector_balance_check: non_gov_nfa + public_nfp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(sector: Sector, assets: WideAmount, liabilities: WideAmount) -> BalanceSheet {
        BalanceSheet {
            sector,
            assets,
            liabilities,
            equity: assets - liabilities,
            net_worth: assets - liabilities,
        }
    }

    #[test]
    fn test_metrics_from_partial_chart() {
        let balances: BTreeMap<String, Amount> = [
            ("Private:Deposits".to_string(), 120),
            ("Bank:Reserves".to_string(), 40),
        ]
        .into_iter()
        .collect();
        let sheets: BTreeMap<Sector, BalanceSheet> = [
            (Sector::Private, sheet(Sector::Private, 120, 0)),
            (Sector::Bank, sheet(Sector::Bank, 40, 120)),
            (Sector::CentralBank, sheet(Sector::CentralBank, 0, 40)),
        ]
        .into_iter()
        .collect();

        let metrics = PeriodMetrics::compute(&balances, &sheets);

        assert_eq!(metrics.money_m1, 120);
        assert_eq!(metrics.private_debt, 0);
        assert_eq!(metrics.non_gov_nfa, 40);
        assert_eq!(metrics.public_nfp, -40);
        assert_eq!(metrics.sector_balance_check, 0);
    }

    #[test]
    fn test_m1_wider_than_one_amount() {
        let balances: BTreeMap<String, Amount> = [
            ("Private:Deposits".to_string(), Amount::MAX),
            ("Private:Currency".to_string(), Amount::MAX),
        ]
        .into_iter()
        .collect();

        let metrics = PeriodMetrics::compute(&balances, &BTreeMap::new());
        assert_eq!(metrics.money_m1, 2 * WideAmount::from(Amount::MAX));
    }
}
