// crates/cogni-gates/src/ai_rule/gate.rs
// ============================================================================
// Module: AI-Rule Gate
// Description: Ties rule loading, workflow dispatch, and success-criteria
//              scoring into the single `ai-rule` gate type.
// Purpose: Implement the six-step pipeline in `spec.md` §4.6.
// Dependencies: cogni_core, cogni_spec::rule_loader, crate::ai_rule::{workflow, success_criteria}
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::Environment;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Status;
use cogni_registry::Gate;
use cogni_spec::RuleLoadFailure;
use cogni_spec::RuleLoadResult;
use serde::Deserialize;

use crate::ai_rule::success_criteria;
use crate::ai_rule::success_criteria::EvalOutcome;
use crate::ai_rule::workflow::LlmAdapter;
use crate::ai_rule::workflow::WorkflowError;
use crate::ai_rule::workflow::WorkflowRegistry;

fn default_rules_dir() -> String {
    cogni_spec::DEFAULT_RULES_DIR.to_string()
}

fn default_timeout_ms() -> u64 {
    110_000
}

const fn default_neutral_on_error() -> bool {
    true
}

/// `with:` configuration for the `ai-rule` gate type.
#[derive(Debug, Clone, Deserialize)]
struct Config {
    #[serde(default)]
    rule_file: Option<String>,
    #[serde(default = "default_rules_dir")]
    rules_dir: String,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default = "default_neutral_on_error")]
    neutral_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_file: None,
            rules_dir: default_rules_dir(),
            timeout_ms: default_timeout_ms(),
            neutral_on_error: default_neutral_on_error(),
        }
    }
}

/// Loads a rule, dispatches it to its declared workflow, and scores the
/// workflow's result against the rule's success criteria.
pub struct AiRuleGate {
    /// Registered workflow implementations, keyed by `workflow_id`.
    pub workflows: WorkflowRegistry,
    /// LLM adapter used by every workflow this gate dispatches to.
    pub adapter: Arc<dyn LlmAdapter>,
    /// Deployment environment tag attached to provider provenance.
    pub environment: Environment,
}

#[async_trait]
impl Gate for AiRuleGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, logger: &Logger) -> GateOutcome {
        let config: Config = serde_json::from_value(config.clone()).unwrap_or_default();

        let Some(rule_file) = config.rule_file.as_deref() else {
            return GateOutcome::neutral(NeutralReason::NoRuleFile);
        };
        let Some(file_reader) = cc.file_reader.as_ref() else {
            return GateOutcome::neutral(NeutralReason::CapabilityUnavailable);
        };

        let rule = match cogni_spec::rule_loader::load(
            file_reader.as_ref(),
            &config.rules_dir,
            rule_file,
            Some(cc.reviewable.head.git_ref.as_str()),
        )
        .await
        {
            RuleLoadResult::Ok(rule) => rule,
            RuleLoadResult::Failed(RuleLoadFailure::Missing) => {
                return GateOutcome::neutral(NeutralReason::RuleMissing);
            }
            RuleLoadResult::Failed(_) => return GateOutcome::neutral(NeutralReason::RuleInvalid),
        };

        let Some(workflow) = self.workflows.resolve(&rule.workflow_id) else {
            logger.log(
                cogni_core::LogLevel::Warn,
                "ai_rule.unknown_workflow",
                [("workflow_id", serde_json::Value::String(rule.workflow_id.clone()))],
            );
            return GateOutcome::neutral(NeutralReason::InternalError);
        };

        let result =
            workflow.evaluate(cc, &rule, self.adapter.as_ref(), self.environment, config.timeout_ms).await;

        let result = match result {
            Ok(result) => result,
            Err(WorkflowError::InvalidResponse(_)) => {
                return GateOutcome::neutral(NeutralReason::InvalidProviderResult);
            }
            Err(error @ (WorkflowError::Timeout | WorkflowError::ProviderFailed(_))) => {
                if config.neutral_on_error {
                    let reason =
                        if matches!(error, WorkflowError::Timeout) { NeutralReason::Timeout } else { NeutralReason::ApiError };
                    return GateOutcome::neutral(reason);
                }
                let mut outcome = GateOutcome::fail(Vec::new());
                outcome.stats.insert("error".to_string(), serde_json::Value::String(error.to_string()));
                return outcome;
            }
        };

        let metrics = result.metrics.iter().map(|(metric_id, metric)| (metric_id.clone(), metric.value)).collect();
        match success_criteria::eval(&metrics, &rule.success_criteria) {
            EvalOutcome::EmptyCriteria => GateOutcome::neutral(NeutralReason::EmptySuccessCriteria),
            EvalOutcome::Evaluated(eval) if eval.status == Status::Neutral => {
                GateOutcome::neutral(NeutralReason::MissingMetrics)
            }
            EvalOutcome::Evaluated(eval) => {
                let mut outcome = if eval.status == Status::Pass {
                    GateOutcome::pass()
                } else {
                    GateOutcome::fail(vec![cogni_core::Violation::error(
                        "success_criteria_not_met",
                        format!("criteria failed: {}", eval.failed.join(", ")),
                    )])
                };
                outcome.observations = result.all_observations();
                outcome.provenance = Some(result.provenance.clone());
                outcome.rule = Some(rule);
                outcome
            }
        }
    }
}
