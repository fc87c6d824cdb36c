// crates/cogni-registry/src/gate.rs
// ============================================================================
// Module: Gate Trait
// Description: The single interface every gate implementation satisfies.
// Purpose: Let the orchestrator invoke deterministic, ai-rule, and artifact
//          gates identically, regardless of internal complexity.
// Dependencies: cogni_core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! A gate is pure from the orchestrator's perspective: `(cc, config, logger)
//! in, GateOutcome out`. Everything a gate needs beyond its own config comes
//! through `cc`'s capabilities.

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Logger;

/// A single gate implementation, resolved by type string through
/// [`crate::GateRegistry`].
#[async_trait]
pub trait Gate: Send + Sync {
    /// Runs the gate against `cc` with its spec-declared `config`.
    ///
    /// Implementations must not panic on malformed `config`; invalid
    /// configuration is a `neutral` or `fail` outcome, never a crash.
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, logger: &Logger) -> GateOutcome;
}
