// crates/cogni-publisher/src/lib.rs
// ============================================================================
// Crate: cogni-publisher
// Description: Delivers a completed `RunSummary` back to the host as a check
//              run plus an optional PR summary comment.
// Purpose: The single point where gate results leave the process. Resolves
//          a capability, then delivers through it, against the two concrete
//          capabilities a `CanonicalContext` may carry (`CheckPublisher`,
//          `CommentPoster`) rather than a URI-addressed sink registry — a
//          builder is unneeded ceremony for two known targets.
// Dependencies: cogni_core::{context, run_summary}
// ============================================================================

pub mod comment;
pub mod payload;

use cogni_core::CanonicalContext;
use cogni_core::CheckRef;
use cogni_core::PublishError;
use cogni_core::RunSummary;

pub use comment::CommentOutcome;

/// Outcome of a single check-payload delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckChunkOutcome {
    /// The chunk was published.
    Published(CheckRef),
    /// The host call failed; the message is the `PublishError`'s rendering.
    Failed(String),
}

/// Result of publishing a completed run: one outcome per check chunk, plus
/// the summary comment outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub checks: Vec<CheckChunkOutcome>,
    pub comment: CommentOutcome,
}

/// Publishes `summary` for the reviewable tracked by `cc`.
///
/// Issues one `check_publisher.publish_check` call per annotation chunk,
/// keyed by the run's idempotency key (skipping entirely, with an empty
/// `checks` vec, when no `CheckPublisher` capability or no attached runtime
/// is present), then attempts the PR summary comment via
/// [`comment::post_summary_comment`]. `ts_ms` is threaded through to the
/// comment's idempotency footer.
pub async fn publish(cc: &CanonicalContext, summary: &RunSummary, ts_ms: u64) -> PublishReport {
    let checks = match (cc.check_publisher.as_ref(), cc.runtime.as_ref()) {
        (Some(publisher), Some(runtime)) => {
            let head_sha = cc.reviewable.head.sha.as_str();
            let payloads = payload::build_check_payloads(summary, head_sha);
            let mut outcomes = Vec::with_capacity(payloads.len());
            for chunk in &payloads {
                let outcome = match publisher.publish_check(chunk, &runtime.idempotency_key).await {
                    Ok(check_ref) => CheckChunkOutcome::Published(check_ref),
                    Err(err) => CheckChunkOutcome::Failed(render_publish_error(&err)),
                };
                outcomes.push(outcome);
            }
            outcomes
        }
        _ => Vec::new(),
    };

    let comment = comment::post_summary_comment(cc, summary, ts_ms).await;

    PublishReport { checks, comment }
}

fn render_publish_error(err: &PublishError) -> String {
    format!("{err}")
}
