// crates/cogni-core/src/provider_result.rs
// ============================================================================
// Module: Provider Result
// Description: Schema-validated output of an AI workflow invocation.
// Purpose: Carry per-metric scores, observations, a summary, and provenance
//          from the workflow back into the ai-rule gate.
// Dependencies: std::collections::BTreeMap, serde
// ============================================================================

//! ## Overview
//! The response schema is built per-rule at runtime (`spec.md` §4.9), but
//! once validated, every `ProviderResult` has this fixed shape regardless of
//! which metrics it carries.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// A single metric's score and supporting observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Score in `[0, 1]`.
    pub value: f64,
    /// One to five short observations backing the score.
    #[serde(default)]
    pub observations: Vec<String>,
}

/// Deployment tier the workflow ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local/CI development runs.
    Dev,
    /// Pre-production runs.
    Preview,
    /// Production runs.
    Prod,
}

/// Provenance attached to a provider result for auditability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Workflow identifier that produced this result.
    pub workflow_id: String,
    /// Model identifier used by the workflow.
    pub model: String,
    /// Deployment environment tag.
    pub environment: Environment,
    /// Wall-clock duration of the provider call, in milliseconds.
    pub duration_ms: u64,
    /// Optional correlation identifier for cross-system tracing.
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Normalized, schema-validated result of an AI workflow invocation.
///
/// # Invariants
/// - `metrics` keys correspond exactly to the rule's `evaluations` metric ids.
/// - Every `MetricResult::value` lies within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Per-metric scores and observations, keyed by metric id.
    pub metrics: BTreeMap<String, MetricResult>,
    /// Short natural-language summary of the evaluation.
    pub summary: String,
    /// Provenance metadata.
    pub provenance: Provenance,
}

impl ProviderResult {
    /// Returns `true` when every metric score lies within `[0, 1]`.
    #[must_use]
    pub fn scores_in_range(&self) -> bool {
        self.metrics.values().all(|metric| (0.0..=1.0).contains(&metric.value))
    }

    /// Flattens every metric's observations, in metric declaration order.
    #[must_use]
    pub fn all_observations(&self) -> Vec<String> {
        self.metrics.values().flat_map(|metric| metric.observations.iter().cloned()).collect()
    }
}
