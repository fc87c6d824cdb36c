// crates/cogni-publisher/src/comment.rs
// ============================================================================
// Module: PR Summary Comment
// Description: Renders and posts the single per-run summary comment.
// Purpose: Implement `spec.md` §4.11's comment contract, including the
//          staleness guard against a moved head SHA.
// Dependencies: cogni_core::{context, run_summary}
// ============================================================================

use cogni_core::CanonicalContext;
use cogni_core::CommentRef;
use cogni_core::RunSummary;
use cogni_core::Status;

/// Maximum number of blocker (failed) gates detailed in the comment.
const MAX_BLOCKER_GATES: usize = 3;

/// Maximum number of violations listed per blocker gate.
const MAX_VIOLATIONS_PER_GATE: usize = 5;

/// Outcome of attempting to post the summary comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// The comment was posted or replaced.
    Posted(CommentRef),
    /// Skipped because the host's head SHA no longer matches the evaluated one.
    SkippedStale,
    /// Skipped because the host exposes no comment-posting capability.
    SkippedNoCapability,
    /// The host call itself failed; the message is the error's rendering.
    Failed(String),
}

/// Renders the PR summary comment body for `summary`, per `spec.md` §4.11.
///
/// `ts_ms` is supplied by the caller rather than read from the system clock,
/// so the idempotency footer is deterministic and testable.
#[must_use]
pub fn render_summary_comment(summary: &RunSummary, head_sha: &str, ts_ms: u64) -> String {
    let icon = match summary.overall_status {
        Status::Pass => "✅",
        Status::Fail => "❌",
        Status::Neutral => "⚠️",
    };
    let passed = summary.gates.iter().filter(|g| g.outcome.status == Status::Pass).count();
    let failed = summary.gates.iter().filter(|g| g.outcome.status == Status::Fail).count();
    let neutral = summary.gates.iter().filter(|g| g.outcome.status == Status::Neutral).count();

    let mut body = format!("## Cogni Review — {icon}\n\n{passed} passed · {failed} failed · {neutral} neutral\n");

    let blockers: Vec<_> = summary.gates.iter().filter(|g| g.outcome.status == Status::Fail).take(MAX_BLOCKER_GATES).collect();
    if !blockers.is_empty() {
        body.push_str("\n### Blocking gates\n");
        for gate in blockers {
            body.push_str(&format!("\n**{}** (`{}`)\n", gate.gate_id, gate.gate_type));
            for violation in gate.outcome.violations.iter().take(MAX_VIOLATIONS_PER_GATE) {
                let location = violation.path.as_deref().map_or(String::new(), |path| format!(" ({path})"));
                body.push_str(&format!("- {}{location}: {}\n", violation.code, violation.message));
            }
            if gate.outcome.violations.len() > MAX_VIOLATIONS_PER_GATE {
                body.push_str(&format!("- … {} more\n", gate.outcome.violations.len() - MAX_VIOLATIONS_PER_GATE));
            }
        }
    }

    let short_sha = &head_sha[..head_sha.len().min(7)];
    body.push_str(&format!("\n<!-- cogni:summary v0 sha={short_sha} ts={ts_ms} -->\n"));
    body
}

/// Posts the summary comment for `summary` onto the reviewable in `cc`,
/// guarding against a head SHA that has moved since evaluation.
///
/// Host call failures are reported as [`CommentOutcome::Failed`] rather than
/// propagated, so a comment-posting failure never aborts the publish step.
pub async fn post_summary_comment(cc: &CanonicalContext, summary: &RunSummary, ts_ms: u64) -> CommentOutcome {
    let Some(poster) = cc.comment_poster.as_ref() else {
        return CommentOutcome::SkippedNoCapability;
    };

    let current_sha = match poster.current_head_sha(cc.reviewable.number).await {
        Ok(sha) => sha,
        Err(err) => return CommentOutcome::Failed(err.to_string()),
    };
    if current_sha != cc.reviewable.head.sha.as_str() {
        return CommentOutcome::SkippedStale;
    }

    let body = render_summary_comment(summary, &current_sha, ts_ms);
    match poster.post_comment(cc.reviewable.number, &body).await {
        Ok(comment_ref) => CommentOutcome::Posted(comment_ref),
        Err(err) => CommentOutcome::Failed(err.to_string()),
    }
}
