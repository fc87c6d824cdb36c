// crates/cogni-gates/src/ai_rule/success_criteria.rs
// ============================================================================
// Module: Success-Criteria Evaluator
// Description: Pure function scoring a workflow's metrics against a rule's
//              declared success criteria.
// Purpose: Keep the pass/fail/neutral decision free of I/O so it is trivially
//          testable, per `spec.md` §4.7's "pure-function contract".
// Dependencies: cogni_core::{comparator, rule_model}
// ============================================================================

use std::collections::BTreeMap;

use cogni_core::Status;
use cogni_core::SuccessCriteria;
use cogni_core::comparator::evaluate;

/// The non-neutral result of evaluating success criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// `Pass` when every `require` criterion held and, when present, at
    /// least one `any_of` criterion held; `Fail` otherwise.
    pub status: Status,
    /// Tokens for criteria that held.
    pub passed: Vec<String>,
    /// Tokens for criteria that did not hold.
    pub failed: Vec<String>,
}

/// Outcome of [`eval`].
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// Criteria were evaluated to a `Pass`/`Fail`/`Neutral` result.
    Evaluated(EvalResult),
    /// The rule declared no `require` or `any_of` criteria.
    EmptyCriteria,
}

/// Evaluates `criteria` against `metrics`, per `spec.md` §4.7.
///
/// A missing required metric either short-circuits to `Neutral`
/// (`neutral_on_missing_metrics: true`) or counts as a failed criterion.
#[must_use]
pub fn eval(metrics: &BTreeMap<String, f64>, criteria: &SuccessCriteria) -> EvalOutcome {
    if criteria.is_empty() {
        return EvalOutcome::EmptyCriteria;
    }

    let mut passed = Vec::new();
    let mut failed = Vec::new();

    for criterion in &criteria.require {
        let Some(value) = metrics.get(&criterion.metric).copied() else {
            if criteria.neutral_on_missing_metrics {
                return EvalOutcome::Evaluated(EvalResult {
                    status: Status::Neutral,
                    passed,
                    failed,
                });
            }
            failed.push(format!("missing:{}", criterion.metric));
            continue;
        };
        match criterion.comparator.comparator() {
            Some((comparator, threshold)) if evaluate(comparator, value, threshold) => {
                passed.push(criterion.metric.clone());
            }
            _ => failed.push(criterion.metric.clone()),
        }
    }

    if !criteria.any_of.is_empty() {
        let any_held = criteria.any_of.iter().any(|criterion| {
            metrics.get(&criterion.metric).is_some_and(|&value| {
                matches!(
                    criterion.comparator.comparator(),
                    Some((comparator, threshold)) if evaluate(comparator, value, threshold)
                )
            })
        });
        if any_held {
            passed.push("any_of".to_string());
        } else {
            failed.push("any_of".to_string());
        }
    }

    let status = if failed.is_empty() { Status::Pass } else { Status::Fail };
    EvalOutcome::Evaluated(EvalResult {
        status,
        passed,
        failed,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use cogni_core::ComparatorSpec;
    use cogni_core::Criterion;

    use super::*;

    fn require(metric: &str, gte: f64) -> Criterion {
        Criterion {
            metric: metric.to_string(),
            comparator: ComparatorSpec {
                gte: Some(gte),
                ..Default::default()
            },
        }
    }

    #[test]
    fn empty_criteria_reports_empty() {
        let outcome = eval(&BTreeMap::new(), &SuccessCriteria::default());
        assert_eq!(outcome, EvalOutcome::EmptyCriteria);
    }

    #[test]
    fn passes_when_all_required_metrics_clear_threshold() {
        let mut metrics = BTreeMap::new();
        metrics.insert("alignment".to_string(), 0.9);
        let criteria = SuccessCriteria {
            require: vec![require("alignment", 0.7)],
            ..Default::default()
        };
        let EvalOutcome::Evaluated(result) = eval(&metrics, &criteria) else {
            panic!("expected Evaluated");
        };
        assert_eq!(result.status, Status::Pass);
    }

    #[test]
    fn fails_when_required_metric_below_threshold() {
        let mut metrics = BTreeMap::new();
        metrics.insert("alignment".to_string(), 0.5);
        let criteria = SuccessCriteria {
            require: vec![require("alignment", 0.7)],
            ..Default::default()
        };
        let EvalOutcome::Evaluated(result) = eval(&metrics, &criteria) else {
            panic!("expected Evaluated");
        };
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.failed, vec!["alignment".to_string()]);
    }

    #[test]
    fn missing_metric_without_neutral_flag_counts_as_failure() {
        let criteria = SuccessCriteria {
            require: vec![require("alignment", 0.7)],
            ..Default::default()
        };
        let EvalOutcome::Evaluated(result) = eval(&BTreeMap::new(), &criteria) else {
            panic!("expected Evaluated");
        };
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.failed, vec!["missing:alignment".to_string()]);
    }

    #[test]
    fn missing_metric_with_neutral_flag_short_circuits() {
        let criteria = SuccessCriteria {
            require: vec![require("alignment", 0.7)],
            neutral_on_missing_metrics: true,
            ..Default::default()
        };
        let EvalOutcome::Evaluated(result) = eval(&BTreeMap::new(), &criteria) else {
            panic!("expected Evaluated");
        };
        assert_eq!(result.status, Status::Neutral);
    }

    #[test]
    fn any_of_passes_when_one_criterion_holds() {
        let mut metrics = BTreeMap::new();
        metrics.insert("risk".to_string(), 0.1);
        let criteria = SuccessCriteria {
            any_of: vec![require("risk", 0.05), require("bogus", 1.0)],
            ..Default::default()
        };
        let EvalOutcome::Evaluated(result) = eval(&metrics, &criteria) else {
            panic!("expected Evaluated");
        };
        assert_eq!(result.status, Status::Pass);
    }

    proptest::proptest! {
        /// Criteria soundness (`spec.md` §8): with every required metric present
        /// and no `any_of`, `eval` passes iff every required value clears its
        /// `gte` threshold.
        #[test]
        fn criteria_soundness_require_only(
            thresholds in proptest::collection::vec(-100.0f64..100.0, 1..6),
            deltas in proptest::collection::vec(-5.0f64..5.0, 1..6),
        ) {
            let n = thresholds.len().min(deltas.len());
            let mut metrics = BTreeMap::new();
            let mut criteria = SuccessCriteria::default();
            let mut all_hold = true;
            for i in 0..n {
                let metric = format!("m{i}");
                let value = thresholds[i] + deltas[i];
                all_hold &= value >= thresholds[i];
                metrics.insert(metric.clone(), value);
                criteria.require.push(require(&metric, thresholds[i]));
            }

            let EvalOutcome::Evaluated(result) = eval(&metrics, &criteria) else {
                panic!("expected Evaluated with non-empty criteria");
            };
            proptest::prop_assert_eq!(result.status == Status::Pass, all_hold);
        }
    }
}
