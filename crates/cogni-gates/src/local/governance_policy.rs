// crates/cogni-gates/src/local/governance_policy.rs
// ============================================================================
// Module: Governance Policy Gate
// Description: Verifies that every required status context has a matching,
//              correctly-named workflow file in the repository.
// Purpose: Catch branch-protection drift where a required check's workflow
//          was renamed or removed without updating the protection rule.
// Dependencies: cogni_core::context
// ============================================================================

//! ## Overview
//! `spec.md` §4.5 requires this gate to validate `required_status_contexts`
//! but leaves open how a context name maps to a file, since
//! [`cogni_core::CanonicalContext`] has no directory-listing capability. This
//! gate resolves that open question via an explicit `with.workflow_files`
//! map (falling back to `.github/workflows/<context>.yml`); see `DESIGN.md`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::FileReadError;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;
use serde::Deserialize;

/// `with:` configuration for the `governance-policy` gate type.
#[derive(Debug, Clone, Deserialize, Default)]
struct Config {
    #[serde(default)]
    workflow_files: BTreeMap<String, String>,
}

/// Verifies each declared required status context resolves to a workflow
/// file that exists and declares a matching name.
pub struct GovernancePolicyGate;

#[async_trait]
impl Gate for GovernancePolicyGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let Some(file_reader) = cc.file_reader.as_ref() else {
            return GateOutcome::neutral(NeutralReason::CapabilityUnavailable);
        };
        let config: Config = serde_json::from_value(config.clone()).unwrap_or_default();

        let Some(runtime) = cc.runtime.as_ref() else {
            return GateOutcome::neutral(NeutralReason::CapabilityUnavailable);
        };

        let mut violations = Vec::new();
        for context in &runtime.spec.required_status_contexts {
            if context == cogni_core::CHECK_NAME {
                continue;
            }
            let path = config
                .workflow_files
                .get(context)
                .cloned()
                .unwrap_or_else(|| format!(".github/workflows/{context}.yml"));

            match file_reader.get_file(&path, None).await {
                Ok(bytes) => {
                    if let Some(violation) = check_workflow_name(&bytes, context, &path) {
                        violations.push(violation);
                    }
                }
                Err(FileReadError::NotFound(_)) => {
                    violations.push(missing_workflow_violation(context, &path));
                }
                Err(FileReadError::Other(message)) => {
                    violations.push(fetch_error_violation(context, &path, &message));
                }
            }
        }

        if violations.is_empty() {
            GateOutcome::pass()
        } else {
            GateOutcome::fail(violations)
        }
    }
}

fn missing_workflow_violation(context: &str, path: &str) -> Violation {
    let mut violation =
        Violation::error("missing_workflow", format!("required context \"{context}\" has no workflow at \"{path}\""));
    violation.path = Some(path.to_string());
    violation
}

fn fetch_error_violation(context: &str, path: &str, message: &str) -> Violation {
    let mut violation = Violation::error(
        "workflow_fetch_failed",
        format!("could not fetch workflow for \"{context}\": {}", cogni_core::redact_text(message)),
    );
    violation.path = Some(path.to_string());
    violation
}

fn check_workflow_name(bytes: &[u8], context: &str, path: &str) -> Option<Violation> {
    let text = String::from_utf8_lossy(bytes);
    let declared_name = text.lines().find_map(|line| line.strip_prefix("name:")).map(str::trim);
    match declared_name {
        Some(name) if name.trim_matches(['"', '\'']) == context => None,
        _ => {
            let mut violation = Violation::error(
                "workflow_name_mismatch",
                format!("workflow at \"{path}\" does not declare name \"{context}\""),
            );
            violation.path = Some(path.to_string());
            Some(violation)
        }
    }
}
