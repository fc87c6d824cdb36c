// crates/cogni-core/src/evidence.rs
// ============================================================================
// Module: Evidence
// Description: Bounded, deterministic textual evidence fed to AI workflows.
// Purpose: Carry the evidence builder's output through to the workflow.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Evidence`] is produced by the evidence builder (`cogni-gates`) and
//! consumed by the AI workflow. Keeping the type here (rather than in
//! `cogni-gates`) lets both crates depend on a single definition without a
//! cyclic dependency.

use serde::Deserialize;
use serde::Serialize;

/// Deterministic, size-bounded evidence built from the diff under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Deterministic plain-text diff summary.
    pub diff_summary: String,
    /// Optional concatenated, truncated per-file patches.
    pub file_patches: Option<String>,
}
