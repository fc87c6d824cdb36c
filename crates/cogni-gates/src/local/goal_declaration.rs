// crates/cogni-gates/src/local/goal_declaration.rs
// ============================================================================
// Module: Goal Declaration Gate
// Description: Requires the specification to declare at least one goal.
// Purpose: Stop a repository from running AI-rule gates against prompt input
//          that was never actually written, per `spec.md` §4.5.
// Dependencies: cogni_core::context
// ============================================================================

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;

/// Fails when `intent.goals` is empty.
pub struct GoalDeclarationGate;

#[async_trait]
impl Gate for GoalDeclarationGate {
    async fn run(&self, cc: &CanonicalContext, _config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let Some(runtime) = cc.runtime.as_ref() else {
            return GateOutcome::neutral(NeutralReason::CapabilityUnavailable);
        };
        if runtime.spec.intent.goals.is_empty() {
            GateOutcome::fail(vec![Violation::error(
                "missing_goals",
                "specification declares no goals under intent.goals",
            )])
        } else {
            GateOutcome::pass()
        }
    }
}
