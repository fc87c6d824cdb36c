// crates/cogni-core/src/run_summary.rs
// ============================================================================
// Module: Run Summary
// Description: The orchestrator's final, aggregated result for a delivery.
// Purpose: Give the publisher one bounded, ordered shape to render.
// Dependencies: crate::{identifiers, outcome}, serde
// ============================================================================

//! ## Overview
//! [`RunSummary`] is the single value [`crate::context`]'s orchestrator
//! produces. `gates` always matches `spec.gates` order (`spec.md` §8,
//! "order preservation"), regardless of completion order when gates run
//! concurrently.

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::GateId;
use crate::outcome::GateOutcome;
use crate::outcome::Status;

/// A named gate outcome, in spec declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedOutcome {
    /// Stable gate identifier, derived per `spec.md` §4.4 step 2.
    pub gate_id: GateId,
    /// The gate's declared type string.
    pub gate_type: String,
    /// The gate's outcome.
    pub outcome: GateOutcome,
}

/// Why the orchestrator reached the overall status it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionReason {
    /// The spec declared zero gates.
    NoGatesExecuted,
    /// At least one gate failed.
    GatesFailed,
    /// The run was aborted by the global deadline before finishing.
    GlobalTimeout,
    /// At least one gate was neutral specifically due to a per-gate timeout.
    GateTimeouts,
    /// At least one gate was neutral for a reason other than timeout.
    GatesNeutral,
    /// Every gate passed.
    AllGatesPassed,
}

/// Counts and flags describing how the run executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutionSummary {
    /// Number of gates declared in the spec.
    pub declared: u32,
    /// Number of gates actually launched.
    pub launched: u32,
    /// Number of gates that completed with a result before the deadline.
    pub completed: u32,
    /// True when the global deadline fired before every gate completed.
    pub partial_execution: bool,
    /// True when the global deadline fired at all (even if harmlessly).
    pub aborted: bool,
    /// Total wall-clock duration of the run, in milliseconds.
    pub total_duration_ms: u64,
}

/// The orchestrator's final, aggregated result for one delivery.
///
/// # Invariants
/// - `gates[i]` corresponds to `spec.gates[i]` after duplicate disambiguation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Overall tri-state verdict.
    pub overall_status: Status,
    /// Every gate outcome, in spec order.
    pub gates: Vec<NamedOutcome>,
    /// Execution counters and flags.
    pub execution_summary: ExecutionSummary,
    /// Why `overall_status` is what it is.
    pub conclusion_reason: ConclusionReason,
}
