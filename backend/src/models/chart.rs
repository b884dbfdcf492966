//! Chart of accounts
//!
//! The chart is the fixed list of accounts a run may post to. It is loaded
//! once, before any transaction posts, and never changes during the run.

use crate::models::account::{account_id, AccountClass, Sector};
use serde::{Deserialize, Serialize};

/// One account definition in a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub id: String,
    pub sector: Sector,
    pub class: AccountClass,
}

impl AccountSpec {
    /// Define an account using the `"Sector:Name"` naming convention
    pub fn new(sector: Sector, name: &str, class: AccountClass) -> Self {
        Self {
            id: account_id(sector, name),
            sector,
            class,
        }
    }
}

/// Four-sector chart used by the standard rule set
///
/// Every financial claim appears twice: as an asset of the holder and as a
/// liability of the issuer. `PrivateLoans*` model lending inside the private
/// sector, `BankDebt` models bank bonds held by the private sector.
///
/// # Example
/// ```
/// use money_system_core_rs::models::chart::default_chart;
///
/// let chart = default_chart();
/// assert!(chart.iter().any(|spec| spec.id == "Government:TGA"));
/// ```
pub fn default_chart() -> Vec<AccountSpec> {
    use AccountClass::{Asset, Equity, Liability};
    use Sector::{Bank, CentralBank, Government, Private};

    vec![
        AccountSpec::new(Private, "Deposits", Asset),
        AccountSpec::new(Private, "Currency", Asset),
        AccountSpec::new(Private, "GovBonds", Asset),
        AccountSpec::new(Private, "BankDebt", Asset),
        AccountSpec::new(Private, "PrivateLoansAsset", Asset),
        AccountSpec::new(Private, "Loans", Liability),
        AccountSpec::new(Private, "PrivateLoansLiability", Liability),
        AccountSpec::new(Private, "NetWorth", Equity),
        AccountSpec::new(Bank, "Loans", Asset),
        AccountSpec::new(Bank, "Reserves", Asset),
        AccountSpec::new(Bank, "Deposits", Liability),
        AccountSpec::new(Bank, "BankDebt", Liability),
        AccountSpec::new(Bank, "BankEquity", Equity),
        AccountSpec::new(Government, "TGA", Asset),
        AccountSpec::new(Government, "GovBonds", Liability),
        AccountSpec::new(Government, "GovEquity", Equity),
        AccountSpec::new(CentralBank, "GovBonds", Asset),
        AccountSpec::new(CentralBank, "Reserves", Liability),
        AccountSpec::new(CentralBank, "Currency", Liability),
        AccountSpec::new(CentralBank, "TGA", Liability),
        AccountSpec::new(CentralBank, "CBEquity", Equity),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_chart_ids_are_unique() {
        let chart = default_chart();
        let ids: HashSet<&str> = chart.iter().map(|spec| spec.id.as_str()).collect();
        assert_eq!(ids.len(), chart.len());
    }

    #[test]
    fn test_every_sector_has_an_equity_account() {
        let chart = default_chart();
        for sector in Sector::ALL {
            assert!(chart
                .iter()
                .any(|spec| spec.sector == sector && spec.class == AccountClass::Equity));
        }
    }

    #[test]
    fn test_account_spec_deserializes_from_json() {
        let spec: AccountSpec = serde_json::from_str(
            r#"{"id": "Bank:Reserves", "sector": "Bank", "class": "Asset"}"#,
        )
        .unwrap();
        assert_eq!(spec, AccountSpec::new(Sector::Bank, "Reserves", AccountClass::Asset));
    }
}
