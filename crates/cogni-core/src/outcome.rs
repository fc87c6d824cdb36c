// crates/cogni-core/src/outcome.rs
// ============================================================================
// Module: Gate Outcome
// Description: The normalized result every gate returns.
// Purpose: Give the orchestrator one shape to aggregate regardless of which
//          gate produced it.
// Dependencies: crate::{identifiers, provider_result, rule_model}, serde_json
// ============================================================================

//! ## Overview
//! Every gate implementation returns a [`GateOutcome`]; the orchestrator
//! never inspects gate-specific internals beyond this shape (`spec.md` §4.4
//! step 5, "normalize the returned outcome defensively").

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::provider_result::Provenance;
use crate::rule_model::Rule;

/// Tri-state gate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The gate's condition was satisfied.
    Pass,
    /// The gate's condition was not satisfied.
    Fail,
    /// The gate could not produce a conclusive result.
    Neutral,
}

/// Stable reasons a gate (or the orchestrator) may report for a `neutral`
/// outcome, per the taxonomy in `spec.md` §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralReason {
    /// No specification was found for the repository.
    MissingSpec,
    /// The specification failed schema validation.
    InvalidSpec,
    /// An `ai-rule` gate's rule declared no success criteria.
    MissingSuccessCriteria,
    /// An `ai-rule` gate's `require` and `any_of` lists were both empty.
    EmptySuccessCriteria,
    /// The declared gate type has no registered implementation.
    UnimplementedGate,
    /// A gate returned a result that failed defensive normalization.
    MalformedOutput,
    /// The gate did not complete before its own or the global deadline.
    Timeout,
    /// An `ai-rule` gate's config omitted `rule_file`.
    NoRuleFile,
    /// The declared rule file does not exist.
    RuleMissing,
    /// The rule file failed schema validation.
    RuleInvalid,
    /// The workflow's result failed schema validation.
    InvalidProviderResult,
    /// A required metric was absent and the rule allows neutral degradation.
    MissingMetrics,
    /// A gate needed a host capability that was not provided.
    CapabilityUnavailable,
    /// The host API call underlying the gate failed.
    ApiError,
    /// No artifact matched the configured locator.
    MissingArtifact,
    /// The artifact content could not be parsed.
    ParseError,
    /// The artifact content parsed but did not match the expected format.
    InvalidFormat,
    /// The artifact exceeded the configured size limit.
    ArtifactTooLarge,
    /// An unexpected internal error occurred.
    InternalError,
}

/// Severity of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Blocking problem.
    Error,
    /// Non-blocking problem worth surfacing.
    Warning,
    /// Informational note.
    Info,
}

/// A single violation reported by a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable, gate-specific violation code.
    pub code: String,
    /// Human-readable message. Redacted by [`GateOutcome::normalize`] before
    /// the outcome leaves the orchestrator; not yet redacted on a
    /// freshly-constructed `Violation` inside a gate.
    pub message: String,
    /// File path the violation applies to, if any.
    #[serde(default)]
    pub path: Option<String>,
    /// Line number the violation applies to, if any.
    #[serde(default)]
    pub line: Option<u32>,
    /// Column number the violation applies to, if any.
    #[serde(default)]
    pub column: Option<u32>,
    /// Severity of this violation.
    pub level: Level,
    /// Arbitrary structured metadata. Redacted by
    /// [`GateOutcome::normalize`] the same way `message` is.
    #[serde(default)]
    pub meta: Option<Value>,
}

impl Violation {
    /// Builds an error-level violation with no location.
    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            line: None,
            column: None,
            level: Level::Error,
            meta: None,
        }
    }
}

/// The normalized result every gate returns.
///
/// # Invariants
/// - `duration_ms` is non-negative (enforced by construction, `u64`).
/// - `neutral_reason` is `Some` only when `status == Status::Neutral`, by
///   convention; the orchestrator does not enforce this at the type level so
///   that defensive normalization can still clamp malformed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOutcome {
    /// Tri-state result.
    pub status: Status,
    /// Stable reason code when `status == Status::Neutral`.
    #[serde(default)]
    pub neutral_reason: Option<NeutralReason>,
    /// Violations reported by the gate.
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Arbitrary counters and durations; must never carry secrets.
    #[serde(default)]
    pub stats: serde_json::Map<String, Value>,
    /// Wall-clock duration of the gate's execution, in milliseconds.
    pub duration_ms: u64,
    /// Aggregated observations, for `ai-rule` gates.
    #[serde(default)]
    pub observations: Vec<String>,
    /// The loaded rule, for `ai-rule` gates that reached rule evaluation.
    #[serde(default)]
    pub rule: Option<Rule>,
    /// Provenance of the underlying provider result, for `ai-rule` gates.
    #[serde(default)]
    pub provenance: Option<Provenance>,
}

impl GateOutcome {
    /// Builds a bare neutral outcome with the given reason and zero duration.
    #[must_use]
    pub fn neutral(reason: NeutralReason) -> Self {
        Self {
            status: Status::Neutral,
            neutral_reason: Some(reason),
            violations: Vec::new(),
            stats: serde_json::Map::new(),
            duration_ms: 0,
            observations: Vec::new(),
            rule: None,
            provenance: None,
        }
    }

    /// Builds a bare pass outcome with zero duration.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            status: Status::Pass,
            neutral_reason: None,
            violations: Vec::new(),
            stats: serde_json::Map::new(),
            duration_ms: 0,
            observations: Vec::new(),
            rule: None,
            provenance: None,
        }
    }

    /// Builds a fail outcome carrying `violations`, with zero duration.
    #[must_use]
    pub fn fail(violations: Vec<Violation>) -> Self {
        Self {
            status: Status::Fail,
            neutral_reason: None,
            violations,
            stats: serde_json::Map::new(),
            duration_ms: 0,
            observations: Vec::new(),
            rule: None,
            provenance: None,
        }
    }

    /// Defensively normalizes a gate-returned outcome per `spec.md` §4.4
    /// step 5: clamps status/neutral_reason coherence, drops malformed
    /// violations, and redacts violation `message`/`meta` so no gate can
    /// leak a secret it read from an external report.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.status == Status::Neutral && self.neutral_reason.is_none() {
            self.neutral_reason = Some(NeutralReason::MalformedOutput);
        }
        if self.status != Status::Neutral {
            self.neutral_reason = None;
        }
        self.violations.retain(|violation| !violation.code.trim().is_empty());
        for violation in &mut self.violations {
            violation.message = crate::log::redact_text(&violation.message);
            violation.meta = violation.meta.take().map(crate::log::redact_json);
        }
        self
    }
}
