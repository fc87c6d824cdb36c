// crates/cogni-gates/src/local/review_limits.rs
// ============================================================================
// Module: Review Limits Gate
// Description: Fails a pull request that exceeds configured change-size caps.
// Purpose: Keep reviews (human and AI) scoped to something a reviewer can
//          reasonably read, per `spec.md` §4.5.
// Dependencies: cogni_core::context
// ============================================================================

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::ReviewLimitsConfig;
use cogni_core::Violation;
use cogni_registry::Gate;
use serde::Deserialize;

/// `with:` configuration for the `review-limits` gate type.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
struct Config {
    #[serde(default)]
    max_changed_files: Option<u32>,
    #[serde(default)]
    max_total_diff_kb: Option<u32>,
}

/// Resolved size of the pull request, from host hints or a listing fallback.
struct Size {
    changed_files: u32,
    additions: u32,
    deletions: u32,
}

/// Fails a review whose file count or diff size exceeds the repository's
/// configured ceilings.
pub struct ReviewLimitsGate;

#[async_trait]
impl Gate for ReviewLimitsGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let config: Config = match serde_json::from_value(config.clone()) {
            Ok(config) => config,
            Err(_) => Config::default(),
        };

        let size = match resolve_size(cc).await {
            Ok(size) => size,
            Err(outcome) => return outcome,
        };

        let total_diff_kb = u32::try_from((size.additions + size.deletions).div_ceil(3)).unwrap_or(u32::MAX);
        let mut violations = Vec::new();
        if let Some(max) = config.max_changed_files
            && size.changed_files > max
        {
            violations.push(limit_violation("max_changed_files", size.changed_files, max));
        }
        if let Some(max) = config.max_total_diff_kb
            && total_diff_kb > max
        {
            violations.push(limit_violation("max_total_diff_kb", total_diff_kb, max));
        }

        record_for_evidence_builder(cc, config.max_changed_files);

        if violations.is_empty() {
            GateOutcome::pass()
        } else {
            GateOutcome::fail(violations)
        }
    }
}

fn limit_violation(code: &str, actual: u32, limit: u32) -> Violation {
    let mut violation = Violation::error(code, format!("{code} exceeded: {actual} > {limit}"));
    violation.meta = Some(serde_json::json!({ "actual": actual, "limit": limit }));
    violation
}

/// Resolves `(changed_files, additions, deletions)` from the host's size
/// hints when all three are present, else lists changed files and sums them.
async fn resolve_size(cc: &CanonicalContext) -> Result<Size, GateOutcome> {
    let hints = cc.reviewable.size_hints;
    if let (Some(changed_files), Some(additions), Some(deletions)) =
        (hints.changed_files, hints.additions, hints.deletions)
    {
        return Ok(Size {
            changed_files,
            additions,
            deletions,
        });
    }

    match cogni_core::list_changed_files(cc).await {
        Ok(files) => {
            let changed_files = u32::try_from(files.len()).unwrap_or(u32::MAX);
            let additions = files.iter().map(|file| file.additions).sum();
            let deletions = files.iter().map(|file| file.deletions).sum();
            Ok(Size {
                changed_files,
                additions,
                deletions,
            })
        }
        Err(_) => Err(GateOutcome::neutral(cogni_core::NeutralReason::ApiError)),
    }
}

/// Publishes the configured file-count ceiling for the evidence builder to
/// read later, per `spec.md` §4.5 "side effect (read by AI gates)".
fn record_for_evidence_builder(cc: &CanonicalContext, max_changed_files: Option<u32>) {
    if let Some(runtime) = cc.runtime.as_ref() {
        let mut slot = runtime.review_limits_config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(ReviewLimitsConfig { max_changed_files });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use cogni_core::HostId;
    use cogni_core::LogLevel;
    use cogni_core::Logger;
    use cogni_core::NullSink;
    use cogni_core::RepoId;
    use cogni_core::RepoIdentity;
    use cogni_core::RevisionId;
    use cogni_core::RevisionPointer;
    use cogni_core::Reviewable;
    use cogni_core::SizeHints;
    use cogni_core::Status;
    use std::sync::Arc;

    use super::*;

    fn cc_with_hints(hints: SizeHints) -> CanonicalContext {
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
                size_hints: hints,
            },
            file_reader: None,
            changed_files_lister: None,
            comparer: None,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: None,
        }
    }

    fn logger() -> Logger {
        Logger::root(Arc::new(NullSink), LogLevel::Info)
    }

    #[tokio::test]
    async fn passes_when_within_limits() {
        let cc = cc_with_hints(SizeHints {
            changed_files: Some(3),
            additions: Some(10),
            deletions: Some(5),
        });
        let config = serde_json::json!({ "max_changed_files": 10, "max_total_diff_kb": 100 });
        let outcome = ReviewLimitsGate.run(&cc, &config, &logger()).await;
        assert_eq!(outcome.status, Status::Pass);
    }

    #[tokio::test]
    async fn fails_when_file_count_exceeded() {
        let cc = cc_with_hints(SizeHints {
            changed_files: Some(50),
            additions: Some(10),
            deletions: Some(5),
        });
        let config = serde_json::json!({ "max_changed_files": 10 });
        let outcome = ReviewLimitsGate.run(&cc, &config, &logger()).await;
        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.violations[0].code, "max_changed_files");
    }

    #[tokio::test]
    async fn fails_when_diff_size_exceeded() {
        let cc = cc_with_hints(SizeHints {
            changed_files: Some(1),
            additions: Some(30_000),
            deletions: Some(0),
        });
        let config = serde_json::json!({ "max_total_diff_kb": 1 });
        let outcome = ReviewLimitsGate.run(&cc, &config, &logger()).await;
        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.violations[0].code, "max_total_diff_kb");
    }

    #[tokio::test]
    async fn neutral_when_no_size_source_available() {
        let cc = cc_with_hints(SizeHints::default());
        let config = serde_json::json!({ "max_changed_files": 10 });
        let outcome = ReviewLimitsGate.run(&cc, &config, &logger()).await;
        assert_eq!(outcome.status, Status::Neutral);
        assert_eq!(outcome.neutral_reason, Some(cogni_core::NeutralReason::ApiError));
    }
}
