//! Flow builders and behaviour rule sets
//!
//! # Overview
//!
//! Each period the model runs a fixed, ordered list of flow builders. A
//! builder is a pure function from a [`FlowContext`] to an optional
//! [`TransactionDraft`]: it reads balances and parameters, drafts the
//! transaction for one economic flow, and never touches the ledger itself.
//! `None` means there is no flow this period.
//!
//! # Rule Set Interface
//!
//! Behaviour is supplied as a [`BehaviorRuleSet`]: a named table of
//! builders plus the default order they run in. Alternative behaviour is a
//! different rule set passed to the model at construction.
//!
//! ```rust
//! use money_system_core_rs::flows::{BehaviorRuleSet, FlowBuilder, FlowContext};
//! use money_system_core_rs::TransactionDraft;
//!
//! fn wages(ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
//!     Some(
//!         TransactionDraft::new("wages", ctx.period)
//!             .with_entry("Bank:Deposits", 100)
//!             .with_entry("Private:Deposits", 100),
//!     )
//! }
//!
//! struct WagesOnly;
//!
//! impl BehaviorRuleSet for WagesOnly {
//!     fn name(&self) -> &str {
//!         "wages-only"
//!     }
//!
//!     fn builders(&self) -> Vec<FlowBuilder> {
//!         vec![FlowBuilder::new("wages", wages)]
//!     }
//! }
//!
//! assert_eq!(WagesOnly.default_order(), vec!["wages"]);
//! ```

pub mod builders;
pub mod standard;

pub use standard::StandardRuleSet;

use crate::core::money::Amount;
use crate::models::ledger::Ledger;
use crate::models::transaction::TransactionDraft;
use crate::simulation::config::{ConfigError, ModelConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Read-only view handed to a flow builder
pub struct FlowContext<'a> {
    /// Period being stepped
    pub period: u64,

    /// Ledger as left by the builders that already ran this period
    pub ledger: &'a Ledger,

    /// Balances at the start of the period
    pub opening: &'a BTreeMap<String, Amount>,

    /// Flow amounts recorded by earlier builders this period
    pub flows: &'a FlowRecord,

    pub config: &'a ModelConfig,
}

impl FlowContext<'_> {
    /// Start-of-period balance; zero for accounts outside the chart
    pub fn opening_balance(&self, account_id: &str) -> Amount {
        self.opening.get(account_id).copied().unwrap_or(0)
    }

    /// Live balance; zero for accounts outside the chart
    pub fn current_balance(&self, account_id: &str) -> Amount {
        self.ledger.balance_or_zero(account_id)
    }

    /// Amount recorded earlier this period by the named builder (zero if none)
    pub fn flow(&self, name: &str) -> Amount {
        self.flows.get(name)
    }
}

/// Per-period table of flow amounts keyed by builder name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRecord(BTreeMap<String, Amount>);

impl FlowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, amount: Amount) {
        let total = self.0.entry(name.to_string()).or_insert(0);
        *total = total.saturating_add(amount);
    }

    pub fn get(&self, name: &str) -> Amount {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.0.iter().map(|(name, amount)| (name.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Signature of a flow builder
pub type BuildFn = fn(&FlowContext<'_>) -> Option<TransactionDraft>;

/// A named flow builder
#[derive(Debug, Clone, Copy)]
pub struct FlowBuilder {
    pub name: &'static str,
    pub build_fn: BuildFn,
}

impl FlowBuilder {
    pub const fn new(name: &'static str, build_fn: BuildFn) -> Self {
        Self { name, build_fn }
    }

    /// Draft this builder's transaction for the period
    pub fn build(&self, ctx: &FlowContext<'_>) -> Option<TransactionDraft> {
        (self.build_fn)(ctx)
    }
}

/// A named, ordered collection of flow builders
pub trait BehaviorRuleSet: Send {
    /// Rule set name (reported in snapshots' run summary)
    fn name(&self) -> &str;

    /// Every builder this rule set offers
    fn builders(&self) -> Vec<FlowBuilder>;

    /// Order used when the configuration does not give one
    ///
    /// Defaults to the order of [`BehaviorRuleSet::builders`].
    fn default_order(&self) -> Vec<&'static str> {
        self.builders().iter().map(|b| b.name).collect()
    }

    /// Resolve a configured order (or the default) against the builder table
    ///
    /// # Errors
    ///
    /// * `UnknownFlow` - a name is not in the table
    /// * `DuplicateFlow` - a name appears twice
    fn resolve_order(
        &self,
        configured: Option<&[String]>,
    ) -> Result<Vec<FlowBuilder>, ConfigError> {
        let table = self.builders();
        let names: Vec<String> = match configured {
            Some(order) => order.to_vec(),
            None => self.default_order().into_iter().map(String::from).collect(),
        };

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateFlow { name });
            }
            let builder = table
                .iter()
                .find(|b| b.name == name)
                .copied()
                .ok_or(ConfigError::UnknownFlow { name })?;
            resolved.push(builder);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &FlowContext<'_>) -> Option<TransactionDraft> {
        None
    }

    struct TwoFlows;

    impl BehaviorRuleSet for TwoFlows {
        fn name(&self) -> &str {
            "two-flows"
        }

        fn builders(&self) -> Vec<FlowBuilder> {
            vec![FlowBuilder::new("a", noop), FlowBuilder::new("b", noop)]
        }
    }

    #[test]
    fn test_resolve_default_order() {
        let order = TwoFlows.resolve_order(None).unwrap();
        let names: Vec<_> = order.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_configured_order() {
        let configured = vec!["b".to_string(), "a".to_string()];
        let order = TwoFlows.resolve_order(Some(&configured)).unwrap();
        assert_eq!(order[0].name, "b");
    }

    #[test]
    fn test_resolve_rejects_unknown_and_duplicate_names() {
        let unknown = vec!["c".to_string()];
        assert_eq!(
            TwoFlows.resolve_order(Some(&unknown)).unwrap_err(),
            ConfigError::UnknownFlow {
                name: "c".to_string()
            }
        );

        let duplicate = vec!["a".to_string(), "a".to_string()];
        assert!(matches!(
            TwoFlows.resolve_order(Some(&duplicate)).unwrap_err(),
            ConfigError::DuplicateFlow { .. }
        ));
    }

    #[test]
    fn test_flow_record_accumulates() {
        let mut record = FlowRecord::new();
        record.record("taxes", 5);
        record.record("taxes", 7);
        assert_eq!(record.get("taxes"), 12);
        assert_eq!(record.get("missing"), 0);
        assert_eq!(record.len(), 1);
    }
}
