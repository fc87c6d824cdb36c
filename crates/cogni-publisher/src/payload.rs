// crates/cogni-publisher/src/payload.rs
// ============================================================================
// Module: Check Payload Builder
// Description: Renders a `RunSummary` into one or more chunked check
//              payloads, per `spec.md` §4.11.
// Purpose: Keep annotation chunking and conclusion mapping in one place so
//          `lib.rs` only has to deliver what this module builds.
// Dependencies: cogni_core::{context, run_summary, outcome}
// ============================================================================

use cogni_core::Annotation;
use cogni_core::CHECK_NAME;
use cogni_core::CheckConclusion;
use cogni_core::CheckPayload;
use cogni_core::NamedOutcome;
use cogni_core::RunSummary;
use cogni_core::Status;

/// Maximum annotations a single check update may carry, per `spec.md` §4.11.
pub const MAX_ANNOTATIONS_PER_CHUNK: usize = 50;

/// Maps a tri-state status onto the locked check conclusion, per `spec.md`
/// §6: `pass→success, fail→failure, neutral→neutral`. No other mapping is
/// valid.
#[must_use]
pub fn map_conclusion(status: Status) -> CheckConclusion {
    match status {
        Status::Pass => CheckConclusion::Success,
        Status::Fail => CheckConclusion::Failure,
        Status::Neutral => CheckConclusion::Neutral,
    }
}

/// Flattens every gate's violations into annotations, in gate order then
/// violation order, per `spec.md` §4.11's stable chunk ordering.
#[must_use]
pub fn violations_to_annotations(gates: &[NamedOutcome]) -> Vec<Annotation> {
    gates
        .iter()
        .flat_map(|named| {
            named.outcome.violations.iter().map(|violation| Annotation {
                path: violation.path.clone(),
                line: violation.line,
                level: violation.level,
                title: format!("{}: {}", named.gate_id, violation.code),
                message: violation.message.clone(),
            })
        })
        .collect()
}

/// Splits `annotations` into chunks of at most [`MAX_ANNOTATIONS_PER_CHUNK`],
/// preserving order.
#[must_use]
pub fn chunk_annotations(annotations: Vec<Annotation>) -> Vec<Vec<Annotation>> {
    if annotations.is_empty() {
        return vec![Vec::new()];
    }
    annotations.chunks(MAX_ANNOTATIONS_PER_CHUNK).map(<[Annotation]>::to_vec).collect()
}

/// Renders the check output title for `summary`.
#[must_use]
fn render_title(summary: &RunSummary) -> String {
    match summary.overall_status {
        Status::Pass => "All gates passed".to_string(),
        Status::Fail => {
            let failed = summary.gates.iter().filter(|g| g.outcome.status == Status::Fail).count();
            format!("{failed} gate(s) failed")
        }
        Status::Neutral => format!("Inconclusive: {:?}", summary.conclusion_reason),
    }
}

/// Renders the short check output summary line for `summary`.
#[must_use]
fn render_summary_line(summary: &RunSummary) -> String {
    let passed = summary.gates.iter().filter(|g| g.outcome.status == Status::Pass).count();
    let failed = summary.gates.iter().filter(|g| g.outcome.status == Status::Fail).count();
    let neutral = summary.gates.iter().filter(|g| g.outcome.status == Status::Neutral).count();
    format!("{passed} passed, {failed} failed, {neutral} neutral")
}

/// Renders the long-form check output body: one section per gate.
#[must_use]
fn render_text(summary: &RunSummary) -> String {
    let mut text = String::new();
    for named in &summary.gates {
        let icon = match named.outcome.status {
            Status::Pass => "✅",
            Status::Fail => "❌",
            Status::Neutral => "⚠️",
        };
        text.push_str(&format!("### {icon} {} ({})\n", named.gate_id, named.gate_type));
        if let Some(reason) = named.outcome.neutral_reason {
            text.push_str(&format!("reason: `{reason:?}`\n"));
        }
        for violation in &named.outcome.violations {
            let location = match (&violation.path, violation.line) {
                (Some(path), Some(line)) => format!(" ({path}:{line})"),
                (Some(path), None) => format!(" ({path})"),
                _ => String::new(),
            };
            text.push_str(&format!("- [{:?}] {}{location}: {}\n", violation.level, violation.code, violation.message));
        }
        text.push('\n');
    }
    text
}

/// Builds the chunked check payloads for `summary` at `head_sha`. Every
/// chunk shares the same conclusion and text; only `annotations` differs,
/// per `spec.md` §4.11's "annotations are chunked ≤50 per update".
#[must_use]
pub fn build_check_payloads(summary: &RunSummary, head_sha: &str) -> Vec<CheckPayload> {
    let conclusion = map_conclusion(summary.overall_status);
    let title = render_title(summary);
    let short_summary = render_summary_line(summary);
    let text = render_text(summary);
    let annotations = violations_to_annotations(&summary.gates);

    chunk_annotations(annotations)
        .into_iter()
        .map(|chunk| CheckPayload {
            name: CHECK_NAME.to_string(),
            head_sha: head_sha.to_string(),
            conclusion,
            title: title.clone(),
            summary: short_summary.clone(),
            text: text.clone(),
            annotations: chunk,
        })
        .collect()
}
