//! Account model
//!
//! An account is a named balance held by one sector, typed as an asset, a
//! liability or an equity account. Balances are stored in the account's
//! natural direction: a positive balance on a liability account means the
//! sector owes that much.
//!
//! CRITICAL: All money values are i64 minor units (see `core::money`)

use crate::core::money::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Economic sector owning a group of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    /// Households and firms
    Private,
    /// Commercial banks
    Bank,
    /// Government / treasury
    Government,
    /// Central bank
    CentralBank,
}

impl Sector {
    /// All sectors in reporting order
    pub const ALL: [Sector; 4] = [
        Sector::Private,
        Sector::Bank,
        Sector::Government,
        Sector::CentralBank,
    ];

    /// Name used as the prefix of account identifiers (`"Bank:Deposits"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Private => "Private",
            Sector::Bank => "Bank",
            Sector::Government => "Government",
            Sector::CentralBank => "CentralBank",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balance-sheet class of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
}

impl AccountClass {
    /// Sign applied to an entry amount for the double-entry check
    ///
    /// Assets are debit-normal (+1); liabilities and equity are
    /// credit-normal (-1). A transaction balances when the sum of
    /// `sign() * amount` over its entries is zero.
    pub fn sign(&self) -> i64 {
        match self {
            AccountClass::Asset => 1,
            AccountClass::Liability | AccountClass::Equity => -1,
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountClass::Asset => "asset",
            AccountClass::Liability => "liability",
            AccountClass::Equity => "equity",
        };
        f.write_str(name)
    }
}

/// Build the conventional `"Sector:Name"` account identifier
///
/// # Example
/// ```
/// use money_system_core_rs::{account_id, Sector};
///
/// assert_eq!(account_id(Sector::CentralBank, "Reserves"), "CentralBank:Reserves");
/// ```
pub fn account_id(sector: Sector, name: &str) -> String {
    format!("{}:{}", sector.as_str(), name)
}

/// A balance-holding account in the chart
///
/// Balances only change through `Ledger::post` (or the exact reversal of a
/// post during period rollback); there is no public mutator.
///
/// # Example
/// ```
/// use money_system_core_rs::{Account, AccountClass, Sector};
///
/// let account = Account::new("Bank:Reserves".to_string(), Sector::Bank, AccountClass::Asset);
/// assert_eq!(account.balance(), 0);
/// assert_eq!(account.class().sign(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (e.g. "Bank:Reserves")
    id: String,

    /// Owning sector
    sector: Sector,

    /// Asset, liability or equity
    class: AccountClass,

    /// Running balance in the account's natural direction (minor units)
    balance: Amount,
}

impl Account {
    /// Create an account with a zero balance
    pub fn new(id: String, sector: Sector, class: AccountClass) -> Self {
        Self {
            id,
            sector,
            class,
            balance: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn class(&self) -> AccountClass {
        self.class
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Balance weighted by the class sign (positive for assets)
    pub fn signed_balance(&self) -> i128 {
        self.class.sign() as i128 * self.balance as i128
    }

    /// Balance after adding `delta`, or `None` on overflow
    pub(crate) fn checked_balance_after(&self, delta: Amount) -> Option<Amount> {
        self.balance.checked_add(delta)
    }

    pub(crate) fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
    }
}
