//! Fixed-point money
//!
//! Every balance, entry and flow in the ledger is an `i64` count of minor
//! units. One currency unit is [`MINOR_UNITS_PER_UNIT`] minor units, enough to
//! carry three-decimal compound interest paths (1000 → 1010 → 1020.10 →
//! 1030.301) without rounding.
//!
//! CRITICAL: money is never accumulated in f64. Behavioural rates stay f64,
//! and the product of a rate and a balance is rounded to minor units before
//! any entry is drafted.

/// Monetary amount in minor units
pub type Amount = i64;

/// Sum of many amounts (sector totals, aggregates)
///
/// Wide enough that adding up every balance of a chart cannot overflow.
pub type WideAmount = i128;

/// Minor units per currency unit
pub const MINOR_UNITS_PER_UNIT: i64 = 1_000_000;

/// Largest residual a transaction may carry and still count as balanced
///
/// Fixed-point arithmetic makes the double-entry check exact, so the
/// tolerance is zero minor units.
pub const BALANCE_TOLERANCE: Amount = 0;

/// Convert a currency-unit value (as found in configuration) to minor units
///
/// # Example
/// ```
/// use money_system_core_rs::core::money::{from_units, MINOR_UNITS_PER_UNIT};
///
/// assert_eq!(from_units(1.5), 3 * MINOR_UNITS_PER_UNIT / 2);
/// ```
///
/// Values outside the `Amount` range saturate; use [`checked_from_units`]
/// where that must be rejected instead.
pub fn from_units(units: f64) -> Amount {
    (units * MINOR_UNITS_PER_UNIT as f64).round() as Amount
}

/// Convert a currency-unit value to minor units, or `None` if it is not
/// finite or does not fit in an `Amount`
///
/// # Example
/// ```
/// use money_system_core_rs::core::money::checked_from_units;
///
/// assert_eq!(checked_from_units(2.5), Some(2_500_000));
/// assert_eq!(checked_from_units(1e13), None);
/// ```
pub fn checked_from_units(units: f64) -> Option<Amount> {
    let minor = (units * MINOR_UNITS_PER_UNIT as f64).round();
    // 2^63 is the first f64 above i64::MAX
    let limit = i64::MAX as f64;
    (minor.is_finite() && minor < limit && minor >= -limit).then_some(minor as Amount)
}

/// Convert minor units back to currency units (for display and export only)
pub fn to_units(amount: Amount) -> f64 {
    amount as f64 / MINOR_UNITS_PER_UNIT as f64
}

/// Apply a per-period rate to a base balance
///
/// The result is rounded half away from zero to whole minor units, so the
/// entries drafted from it balance exactly.
///
/// # Example
/// ```
/// use money_system_core_rs::core::money::{apply_rate, from_units};
///
/// let interest = apply_rate(from_units(1020.10), 0.01);
/// assert_eq!(interest, from_units(10.201));
/// ```
pub fn apply_rate(base: Amount, rate: f64) -> Amount {
    (base as f64 * rate).round() as Amount
}

/// Whether a residual is small enough for a transaction to count as balanced
pub fn is_balanced(residual: i128) -> bool {
    residual.unsigned_abs() <= BALANCE_TOLERANCE as u128
}
