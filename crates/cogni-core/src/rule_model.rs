// crates/cogni-core/src/rule_model.rs
// ============================================================================
// Module: Rule Model
// Description: Parsed, validated shape of an `ai-rule` rule definition.
// Purpose: Carry evaluation statements, success criteria, and evidence
//          budgets from `.cogni/rules/<name>.yaml` into the ai-rule gate.
// Dependencies: crate::comparator, serde
// ============================================================================

//! ## Overview
//! A [`Rule`] is the parsed, schema-validated content of a single rule file.
//! Like [`crate::spec_model::Specification`], parse/validation failures are
//! represented upstream by the loader, not by this type.

use serde::Deserialize;
use serde::Serialize;

use crate::comparator::Comparator;

/// One `{metric_id: statement}` entry in `rule.evaluations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Metric identifier the statement scores.
    pub metric_id: String,
    /// Natural-language statement fed to the LLM for this metric.
    pub statement: String,
}

/// A single `require`/`any_of` comparator entry.
///
/// # Invariants
/// - Exactly one of `gte`/`gt`/`lte`/`lt`/`eq` is set; this is enforced by
///   [`Self::comparator`] returning `None` otherwise, which validators must
///   reject at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComparatorSpec {
    /// Metric value must be greater than or equal to this threshold.
    #[serde(default)]
    pub gte: Option<f64>,
    /// Metric value must be greater than this threshold.
    #[serde(default)]
    pub gt: Option<f64>,
    /// Metric value must be less than or equal to this threshold.
    #[serde(default)]
    pub lte: Option<f64>,
    /// Metric value must be less than this threshold.
    #[serde(default)]
    pub lt: Option<f64>,
    /// Metric value must equal this threshold.
    #[serde(default)]
    pub eq: Option<f64>,
}

impl ComparatorSpec {
    /// Returns the single configured comparator and its threshold, or `None`
    /// when zero or more than one key is set.
    #[must_use]
    pub fn comparator(&self) -> Option<(Comparator, f64)> {
        let set: Vec<(Comparator, f64)> = [
            self.gte.map(|v| (Comparator::GreaterThanOrEqual, v)),
            self.gt.map(|v| (Comparator::GreaterThan, v)),
            self.lte.map(|v| (Comparator::LessThanOrEqual, v)),
            self.lt.map(|v| (Comparator::LessThan, v)),
            self.eq.map(|v| (Comparator::Equal, v)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if set.len() == 1 {
            set.into_iter().next()
        } else {
            None
        }
    }
}

/// One `require`/`any_of` comparator bound to a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Metric identifier this criterion reads.
    pub metric: String,
    /// Comparator configuration for this criterion.
    #[serde(flatten)]
    pub comparator: ComparatorSpec,
}

/// Success criteria declared by a rule.
///
/// # Invariants
/// - At least one of `require`/`any_of` is non-empty; empty criteria fail
///   validation (`empty_success_criteria`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SuccessCriteria {
    /// Comparators that must all hold.
    #[serde(default)]
    pub require: Vec<Criterion>,
    /// Comparators of which at least one must hold.
    #[serde(default)]
    pub any_of: Vec<Criterion>,
    /// When true, a missing required metric yields `neutral` instead of `fail`.
    #[serde(default)]
    pub neutral_on_missing_metrics: bool,
}

impl SuccessCriteria {
    /// True when neither `require` nor `any_of` has any entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.require.is_empty() && self.any_of.is_empty()
    }
}

/// Evidence capabilities a rule may request from the evidence builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCapability {
    /// Request the deterministic diff summary.
    DiffSummary,
    /// Request per-file truncated patches.
    FilePatches,
}

/// Per-rule overrides for evidence budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvidenceBudgets {
    /// Override for the maximum number of files summarized.
    #[serde(default)]
    pub max_files: Option<u32>,
    /// Override for the maximum patch bytes kept per file.
    #[serde(default)]
    pub max_patch_bytes_per_file: Option<u32>,
    /// Override for the maximum number of patches included.
    #[serde(default)]
    pub max_patches: Option<u32>,
}

/// The parsed, validated content of a single `.cogni/rules/<name>.yaml` file.
///
/// # Invariants
/// - `id` is unique within a delivery; duplicates abort the rule-set load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Canonical rule identifier (falls back to the file stem when absent).
    pub id: String,
    /// Schema version string.
    pub schema_version: String,
    /// Workflow identifier this rule dispatches to.
    pub workflow_id: String,
    /// Ordered evaluation statements, one per metric.
    pub evaluations: Vec<Evaluation>,
    /// Success criteria evaluated against the workflow's metrics.
    pub success_criteria: SuccessCriteria,
    /// Evidence capabilities requested by this rule.
    #[serde(default)]
    pub x_capabilities: Vec<EvidenceCapability>,
    /// Evidence budget overrides requested by this rule.
    #[serde(default)]
    pub x_budgets: EvidenceBudgets,
}
