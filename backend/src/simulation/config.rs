//! Model configuration
//!
//! Behavioural parameters of a run, with the defaults of the monthly money
//! system model. Rates are per period; money values are in currency units
//! here and converted to minor units when a flow is drafted.
//!
//! A configuration can be built three ways:
//! - `ModelConfig::default()` and field assignment
//! - `ModelConfig::from_json` (unknown keys are rejected)
//! - `ModelConfig::from_params` over a flat `name -> number` mapping

use crate::core::money::{checked_from_units, from_units, Amount};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while building or validating a configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown flow builder: {name}")]
    UnknownFlow { name: String },

    #[error("Flow builder {name} appears more than once in flow_order")]
    DuplicateFlow { name: String },

    #[error("Initial balance given for unknown account {id}")]
    UnknownAccount { id: String },

    #[error("Could not parse configuration: {0}")]
    Parse(String),
}

/// Scalar parameters settable through `set_param`
pub const NUMERIC_PARAMETERS: &[&str] = &[
    "max_periods",
    "gov_spending",
    "tax_rate",
    "loan_growth",
    "private_loan_growth",
    "deposit_rate",
    "loan_rate",
    "reserve_rate",
    "bond_rate",
    "tga_target",
    "cb_bond_purchase",
    "bank_debt_issuance",
];

/// Structured options, only settable through JSON or field assignment
pub const STRUCTURED_OPTIONS: &[&str] = &["gov_spending_schedule", "flow_order", "initial"];

/// Behavioural configuration of one run
///
/// # Example
/// ```
/// use money_system_core_rs::ModelConfig;
///
/// let config = ModelConfig::from_params([("tax_rate", 0.25), ("max_periods", 24.0)]).unwrap();
/// assert_eq!(config.tax_rate, 0.25);
/// assert_eq!(config.max_periods, 24);
/// assert_eq!(config.gov_spending, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Number of periods a full run steps through (monthly by default)
    pub max_periods: u64,

    /// Government spending per period (units)
    pub gov_spending: f64,

    /// Per-period spending overrides; entry `i` applies to period `i + 1`.
    /// Periods beyond the schedule fall back to `gov_spending`.
    pub gov_spending_schedule: Option<Vec<f64>>,

    /// Share of the period's income base collected as tax
    pub tax_rate: f64,

    /// Bank loan growth per period (negative = net repayment)
    pub loan_growth: f64,

    /// Intra-private-sector loan growth per period
    pub private_loan_growth: f64,

    /// Interest on deposits per period
    pub deposit_rate: f64,

    /// Interest on bank loans per period
    pub loan_rate: f64,

    /// Interest on reserves per period
    pub reserve_rate: f64,

    /// Interest on privately held government bonds per period
    pub bond_rate: f64,

    /// Treasury General Account target restored by bond issuance (units)
    pub tga_target: f64,

    /// Bonds sold directly to the central bank per period (units)
    pub cb_bond_purchase: f64,

    /// Bank debt sold to the private sector per period (units)
    pub bank_debt_issuance: f64,

    /// Order in which flow builders run each period.
    /// `None` uses the rule set's documented default order.
    pub flow_order: Option<Vec<String>>,

    /// Opening balances by account id (units). Equity accounts are ignored:
    /// each sector's equity is set to its opening net worth.
    pub initial: BTreeMap<String, f64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_periods: 120,
            gov_spending: 100.0,
            gov_spending_schedule: None,
            tax_rate: 0.2,
            loan_growth: 0.01,
            private_loan_growth: 0.0,
            deposit_rate: 0.01 / 12.0,
            loan_rate: 0.04 / 12.0,
            reserve_rate: 0.02 / 12.0,
            bond_rate: 0.03 / 12.0,
            tga_target: 0.0,
            cb_bond_purchase: 0.0,
            bank_debt_issuance: 0.0,
            flow_order: None,
            initial: default_initial_balances(),
        }
    }
}

/// Opening balances of the standard four-sector economy
pub fn default_initial_balances() -> BTreeMap<String, f64> {
    [
        ("Private:Deposits", 1200.0),
        ("Private:Loans", 800.0),
        ("Private:GovBonds", 500.0),
        ("Bank:Loans", 800.0),
        ("Bank:Reserves", 400.0),
        ("Bank:Deposits", 1200.0),
        ("Government:GovBonds", 900.0),
        ("CentralBank:Reserves", 400.0),
        ("CentralBank:GovBonds", 400.0),
    ]
    .into_iter()
    .map(|(id, value)| (id.to_string(), value))
    .collect()
}

impl ModelConfig {
    /// Parse a JSON object, starting from the defaults
    ///
    /// # Errors
    ///
    /// * `UnknownParameter` - a top-level key is not a recognized option
    /// * `Parse` - malformed JSON or a value of the wrong type
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let Value::Object(map) = &value else {
            return Err(ConfigError::Parse(
                "configuration must be a JSON object".to_string(),
            ));
        };
        for key in map.keys() {
            if !is_known_option(key) {
                return Err(ConfigError::UnknownParameter { name: key.clone() });
            }
        }

        serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build a configuration from named scalar parameters over the defaults
    pub fn from_params<I, K>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut config = Self::default();
        for (name, value) in params {
            config.set_param(name.as_ref(), value)?;
        }
        Ok(config)
    }

    /// Set one scalar parameter by name
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        let slot = match name {
            "max_periods" => {
                if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
                    return Err(invalid(name, "must be a non-negative whole number"));
                }
                self.max_periods = value as u64;
                return Ok(());
            }
            "gov_spending" => &mut self.gov_spending,
            "tax_rate" => &mut self.tax_rate,
            "loan_growth" => &mut self.loan_growth,
            "private_loan_growth" => &mut self.private_loan_growth,
            "deposit_rate" => &mut self.deposit_rate,
            "loan_rate" => &mut self.loan_rate,
            "reserve_rate" => &mut self.reserve_rate,
            "bond_rate" => &mut self.bond_rate,
            "tga_target" => &mut self.tga_target,
            "cb_bond_purchase" => &mut self.cb_bond_purchase,
            "bank_debt_issuance" => &mut self.bank_debt_issuance,
            other if STRUCTURED_OPTIONS.contains(&other) => {
                return Err(invalid(other, "not a scalar parameter"));
            }
            other => {
                return Err(ConfigError::UnknownParameter {
                    name: other.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }

    /// Read one scalar parameter by name
    pub fn get_param(&self, name: &str) -> Option<f64> {
        let value = match name {
            "max_periods" => self.max_periods as f64,
            "gov_spending" => self.gov_spending,
            "tax_rate" => self.tax_rate,
            "loan_growth" => self.loan_growth,
            "private_loan_growth" => self.private_loan_growth,
            "deposit_rate" => self.deposit_rate,
            "loan_rate" => self.loan_rate,
            "reserve_rate" => self.reserve_rate,
            "bond_rate" => self.bond_rate,
            "tga_target" => self.tga_target,
            "cb_bond_purchase" => self.cb_bond_purchase,
            "bank_debt_issuance" => self.bank_debt_issuance,
            _ => return None,
        };
        Some(value)
    }

    /// Check value ranges
    ///
    /// Account ids in `initial` and flow names in `flow_order` are checked
    /// against the chart and rule set when the model is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_periods == 0 {
            return Err(invalid("max_periods", "must be > 0"));
        }

        for name in NUMERIC_PARAMETERS {
            if let Some(value) = self.get_param(name) {
                if !value.is_finite() {
                    return Err(invalid(name, "must be finite"));
                }
            }
        }

        for name in MONEY_PARAMETERS {
            if self.get_param(name).and_then(checked_from_units).is_none() {
                return Err(invalid(name, OUT_OF_RANGE));
            }
        }

        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(invalid("tax_rate", "must be within [0, 1]"));
        }

        for name in [
            "loan_growth",
            "private_loan_growth",
            "deposit_rate",
            "loan_rate",
            "reserve_rate",
            "bond_rate",
        ] {
            if self.get_param(name).is_some_and(|rate| rate <= -1.0) {
                return Err(invalid(name, "must be > -1"));
            }
        }

        if let Some(schedule) = &self.gov_spending_schedule {
            if schedule.iter().any(|v| !v.is_finite()) {
                return Err(invalid("gov_spending_schedule", "entries must be finite"));
            }
            if schedule.iter().any(|&v| checked_from_units(v).is_none()) {
                return Err(invalid("gov_spending_schedule", OUT_OF_RANGE));
            }
        }

        if let Some((id, _)) = self.initial.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid("initial", &format!("balance of {id} must be finite")));
        }
        if let Some((id, _)) = self
            .initial
            .iter()
            .find(|(_, v)| checked_from_units(**v).is_none())
        {
            return Err(invalid("initial", &format!("balance of {id} {OUT_OF_RANGE}")));
        }

        Ok(())
    }

    /// Government spending for a period, in minor units
    pub fn gov_spending_for(&self, period: u64) -> Amount {
        let scheduled = period
            .checked_sub(1)
            .and_then(|index| self.gov_spending_schedule.as_ref()?.get(index as usize))
            .copied();
        from_units(scheduled.unwrap_or(self.gov_spending))
    }
}

/// Parameters given in currency units and converted to `Amount`
const MONEY_PARAMETERS: [&str; 4] = [
    "gov_spending",
    "tga_target",
    "cb_bond_purchase",
    "bank_debt_issuance",
];

const OUT_OF_RANGE: &str = "exceeds the representable money range";

fn is_known_option(name: &str) -> bool {
    NUMERIC_PARAMETERS.contains(&name) || STRUCTURED_OPTIONS.contains(&name)
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_initial_balances_pair_up() {
        let initial = default_initial_balances();
        assert_eq!(initial["Private:Deposits"], initial["Bank:Deposits"]);
        assert_eq!(initial["Bank:Reserves"], initial["CentralBank:Reserves"]);
        assert_eq!(
            initial["Government:GovBonds"],
            initial["Private:GovBonds"] + initial["CentralBank:GovBonds"]
        );
    }

    #[test]
    fn test_gov_spending_schedule_falls_back() {
        let config = ModelConfig {
            gov_spending_schedule: Some(vec![50.0, 75.0]),
            ..ModelConfig::default()
        };
        assert_eq!(config.gov_spending_for(1), from_units(50.0));
        assert_eq!(config.gov_spending_for(2), from_units(75.0));
        assert_eq!(config.gov_spending_for(3), from_units(100.0));
        assert_eq!(config.gov_spending_for(0), from_units(100.0));
    }

    #[test]
    fn test_structured_option_is_not_scalar() {
        let mut config = ModelConfig::default();
        let err = config.set_param("flow_order", 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { .. }));
    }
}
