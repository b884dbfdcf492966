//! Period clock for the simulation
//!
//! The model advances in discrete accounting periods (monthly by default).
//! Period 0 holds the opening balances; stepping produces periods 1, 2, ...
//! up to the configured horizon.

use serde::{Deserialize, Serialize};

/// Tracks the last completed period and the run horizon
///
/// # Example
/// ```
/// use money_system_core_rs::PeriodClock;
///
/// let mut clock = PeriodClock::new(12).unwrap();
/// assert_eq!(clock.current_period(), 0);
/// assert_eq!(clock.next_period(), 1);
///
/// clock.advance();
/// assert_eq!(clock.current_period(), 1);
/// assert_eq!(clock.remaining(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClock {
    /// Last fully committed period (0 = opening balances only)
    current_period: u64,
    /// Number of periods the run may step through
    max_periods: u64,
}

impl PeriodClock {
    /// Create a clock for a run of `max_periods` periods
    ///
    /// Returns `None` if `max_periods` is zero.
    pub fn new(max_periods: u64) -> Option<Self> {
        (max_periods > 0).then_some(Self {
            current_period: 0,
            max_periods,
        })
    }

    /// Mark the next period as committed
    pub fn advance(&mut self) {
        self.current_period += 1;
    }

    /// Last committed period
    pub fn current_period(&self) -> u64 {
        self.current_period
    }

    /// Period the next step will produce
    pub fn next_period(&self) -> u64 {
        self.current_period + 1
    }

    /// Run horizon
    pub fn max_periods(&self) -> u64 {
        self.max_periods
    }

    /// Periods left before the horizon is reached
    pub fn remaining(&self) -> u64 {
        self.max_periods.saturating_sub(self.current_period)
    }

    /// Whether the horizon has been reached
    ///
    /// # Example
    /// ```
    /// use money_system_core_rs::PeriodClock;
    ///
    /// let mut clock = PeriodClock::new(2).unwrap();
    /// clock.advance();
    /// assert!(!clock.is_finished());
    /// clock.advance();
    /// assert!(clock.is_finished());
    /// ```
    pub fn is_finished(&self) -> bool {
        self.current_period >= self.max_periods
    }
}
