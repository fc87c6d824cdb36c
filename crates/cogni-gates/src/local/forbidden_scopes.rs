// crates/cogni-gates/src/local/forbidden_scopes.rs
// ============================================================================
// Module: Forbidden Scopes Gate
// Description: Requires the specification to declare at least one non-goal.
// Purpose: Make a repository's explicit exclusions a first-class, checked
//          part of its policy, per `spec.md` §4.5.
// Dependencies: cogni_core::context
// ============================================================================

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;

/// Fails when `intent.non_goals` is empty.
pub struct ForbiddenScopesGate;

#[async_trait]
impl Gate for ForbiddenScopesGate {
    async fn run(&self, cc: &CanonicalContext, _config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let Some(runtime) = cc.runtime.as_ref() else {
            return GateOutcome::neutral(NeutralReason::CapabilityUnavailable);
        };
        if runtime.spec.intent.non_goals.is_empty() {
            GateOutcome::fail(vec![Violation::error(
                "missing_non_goals",
                "specification declares no forbidden scopes under intent.non_goals",
            )])
        } else {
            GateOutcome::pass()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    use cogni_core::Deadline;
    use cogni_core::HostId;
    use cogni_core::IdempotencyKey;
    use cogni_core::Intent;
    use cogni_core::LogLevel;
    use cogni_core::NullSink;
    use cogni_core::RepoId;
    use cogni_core::RepoIdentity;
    use cogni_core::RevisionId;
    use cogni_core::RevisionPointer;
    use cogni_core::Reviewable;
    use cogni_core::RuntimeFields;
    use cogni_core::SizeHints;
    use cogni_core::Specification;
    use cogni_core::Status;
    use cogni_core::SystemClock;

    use super::*;

    fn cc_with_non_goals(non_goals: Vec<String>) -> CanonicalContext {
        let clock = SystemClock;
        let spec = Specification {
            schema_version: "1".to_string(),
            intent: Intent {
                name: None,
                goals: Vec::new(),
                non_goals,
            },
            gates: Vec::new(),
            required_status_contexts: Vec::new(),
            hash: "deadbeef".to_string(),
        };
        CanonicalContext {
            host_id: HostId::new("github"),
            repo: RepoIdentity {
                repo_id: RepoId::new("1"),
                owner: "acme".to_string(),
                name: "widgets".to_string(),
                full_name: "acme/widgets".to_string(),
            },
            installation_id: None,
            reviewable: Reviewable {
                number: 1,
                title: "t".to_string(),
                body: None,
                state: "open".to_string(),
                head: RevisionPointer {
                    sha: RevisionId::new("h"),
                    git_ref: "refs/heads/f".to_string(),
                },
                base: RevisionPointer {
                    sha: RevisionId::new("b"),
                    git_ref: "main".to_string(),
                },
                size_hints: SizeHints::default(),
            },
            file_reader: None,
            changed_files_lister: None,
            comparer: None,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: Some(Arc::new(RuntimeFields {
                spec,
                deadline: Deadline::from_budget(&clock, std::time::Duration::from_secs(60)),
                abort: Arc::new(AtomicBool::new(false)),
                annotation_budget: 50,
                idempotency_key: IdempotencyKey::new("acme/widgets:1:h:nospec"),
                review_limits_config: Mutex::new(None),
                log: cogni_core::Logger::root(Arc::new(NullSink), LogLevel::Info),
            })),
        }
    }

    fn logger() -> cogni_core::Logger {
        cogni_core::Logger::root(Arc::new(NullSink), LogLevel::Info)
    }

    #[tokio::test]
    async fn passes_when_non_goals_declared() {
        let cc = cc_with_non_goals(vec!["no database migrations".to_string()]);
        let outcome = ForbiddenScopesGate.run(&cc, &serde_json::Value::Null, &logger()).await;
        assert_eq!(outcome.status, Status::Pass);
    }

    #[tokio::test]
    async fn fails_when_non_goals_empty() {
        let cc = cc_with_non_goals(Vec::new());
        let outcome = ForbiddenScopesGate.run(&cc, &serde_json::Value::Null, &logger()).await;
        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.violations[0].code, "missing_non_goals");
    }
}
