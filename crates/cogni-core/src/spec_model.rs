// crates/cogni-core/src/spec_model.rs
// ============================================================================
// Module: Specification Model
// Description: Parsed, validated shape of `.cogni/repo-spec.yaml`.
// Purpose: Provide the gate list and intent fields the orchestrator and
//          deterministic gates consume.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Specification`] is the parsed, schema-validated result of loading
//! `.cogni/repo-spec.yaml`. It never carries parse/validation failures
//! itself — those are represented by `cogni-spec`'s `SpecLoadResult`; this
//! type is always a value that already passed validation.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Declared intent of the repository, consumed as prompt input by AI workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Intent {
    /// Short human name for the repository's review policy.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form goal statements.
    #[serde(default)]
    pub goals: Vec<String>,
    /// Free-form non-goal statements.
    #[serde(default)]
    pub non_goals: Vec<String>,
}

/// A single gate entry as declared in the specification's `gates` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpec {
    /// Gate type string, resolved against the gate registry.
    #[serde(rename = "type")]
    pub gate_type: String,
    /// Author-provided identifier override, disambiguating duplicate types.
    #[serde(default)]
    pub id: Option<String>,
    /// Gate-specific configuration, passed through verbatim.
    #[serde(default)]
    pub with: Value,
}

/// The parsed, validated `.cogni/repo-spec.yaml` document.
///
/// # Invariants
/// - `gates` preserves declaration order; this order drives both execution
///   and `RunSummary.gates` ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Schema version string, checked for compatibility by the loader.
    pub schema_version: String,
    /// Declared intent, used as prompt input by AI workflows.
    #[serde(default)]
    pub intent: Intent,
    /// Ordered gate declarations.
    pub gates: Vec<GateSpec>,
    /// Status contexts consumed by the `governance-policy` gate.
    #[serde(default)]
    pub required_status_contexts: Vec<String>,
    /// Content hash of the raw bytes this specification was parsed from,
    /// exposed to callers as `_hash`.
    #[serde(rename = "_hash")]
    pub hash: String,
}
