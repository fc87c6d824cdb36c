// crates/cogni-gates/src/lib.rs
// ============================================================================
// Crate: cogni-gates
// Description: Every built-in gate type: deterministic local checks, the
//              ai-rule pipeline, and external-artifact ingestion gates.
// ============================================================================

#![forbid(unsafe_code)]

pub mod ai_rule;
pub mod artifact;
pub mod local;

use std::sync::Arc;

use cogni_core::Environment;
use cogni_registry::GateRegistry;

use crate::ai_rule::gate::AiRuleGate;
use crate::ai_rule::workflow::LlmAdapter;
use crate::ai_rule::workflow::WorkflowRegistry;
use crate::artifact::jsonpath::JsonPathGate;
use crate::artifact::sarif::SarifGate;
use crate::local::agents_md_sync::AgentsMdSyncGate;
use crate::local::forbidden_scopes::ForbiddenScopesGate;
use crate::local::goal_declaration::GoalDeclarationGate;
use crate::local::governance_policy::GovernancePolicyGate;
use crate::local::review_limits::ReviewLimitsGate;

/// Builds a [`GateRegistry`] populated with every gate type this crate ships,
/// under the type strings `spec.md` §4.3 and §6 name.
#[must_use]
pub fn with_builtin_gates(adapter: Arc<dyn LlmAdapter>, environment: Environment) -> GateRegistry {
    let mut registry = GateRegistry::new();
    registry.register("review-limits", Arc::new(ReviewLimitsGate));
    registry.register("agents-md-sync", Arc::new(AgentsMdSyncGate));
    registry.register("governance-policy", Arc::new(GovernancePolicyGate));
    registry.register("goal-declaration", Arc::new(GoalDeclarationGate));
    registry.register("forbidden-scopes", Arc::new(ForbiddenScopesGate));
    registry.register(
        "ai-rule",
        Arc::new(AiRuleGate {
            workflows: WorkflowRegistry::with_builtin(),
            adapter,
            environment,
        }),
    );
    registry.register("artifact.sarif", Arc::new(SarifGate));
    registry.register("artifact.jsonpath", Arc::new(JsonPathGate));
    registry
}
