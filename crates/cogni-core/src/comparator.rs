// crates/cogni-core/src/comparator.rs
// ============================================================================
// Module: Success-Criteria Comparators
// Description: Numeric comparator evaluation.
// Purpose: Evaluate `gte`/`gt`/`lte`/`lt`/`eq` comparators from success
//          criteria against metric values.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Narrowed to the five numeric comparators `spec.md` §4.7 names. Metrics
//! and thresholds are both `f64`, so callers that care about exact decimal
//! boundaries (e.g. `0.1 + 0.2 == 0.3`) should round to the precision they
//! actually need before calling `evaluate`; this module does not mask
//! ordinary binary-float rounding.

use serde::Deserialize;
use serde::Serialize;

/// The five comparators `success_criteria` entries may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Value must be greater than or equal to the threshold.
    GreaterThanOrEqual,
    /// Value must be greater than the threshold.
    GreaterThan,
    /// Value must be less than or equal to the threshold.
    LessThanOrEqual,
    /// Value must be less than the threshold.
    LessThan,
    /// Value must equal the threshold.
    Equal,
}

/// Evaluates `value <comparator> threshold`.
///
/// Returns `false` when either operand is not finite (e.g. NaN), which fails
/// the comparator rather than panicking.
#[must_use]
pub fn evaluate(comparator: Comparator, value: f64, threshold: f64) -> bool {
    if !value.is_finite() || !threshold.is_finite() {
        return false;
    }
    match comparator {
        Comparator::GreaterThanOrEqual => value >= threshold,
        Comparator::GreaterThan => value > threshold,
        Comparator::LessThanOrEqual => value <= threshold,
        Comparator::LessThan => value < threshold,
        Comparator::Equal => value == threshold,
    }
}
