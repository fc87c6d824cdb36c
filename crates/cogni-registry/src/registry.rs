// crates/cogni-registry/src/registry.rs
// ============================================================================
// Module: Gate Registry
// Description: Maps a spec-declared gate type string to a gate implementation.
// Purpose: Let the orchestrator treat unknown gate types as a data error,
//          never a code error.
// Dependencies: crate::gate, std::collections::BTreeMap
// ============================================================================

//! ## Overview
//! The registry is closed once built: entries are added during startup
//! wiring (see `cogni_gates::with_builtin_gates`) and never mutated again by
//! the orchestrator's hot path. `resolve` never panics on an unknown type; it
//! returns `None` so the caller can synthesize `neutral{unimplemented_gate}`
//! per `spec.md` §4.3.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::gate::Gate;

/// Maps gate type strings to gate implementations.
#[derive(Default)]
pub struct GateRegistry {
    gates: BTreeMap<String, Arc<dyn Gate>>,
}

impl GateRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `gate` under `gate_type`. A later registration for the same
    /// type replaces the earlier one.
    pub fn register(&mut self, gate_type: impl Into<String>, gate: Arc<dyn Gate>) {
        self.gates.insert(gate_type.into(), gate);
    }

    /// Resolves `gate_type` to its implementation, or `None` when unregistered.
    #[must_use]
    pub fn resolve(&self, gate_type: &str) -> Option<Arc<dyn Gate>> {
        self.gates.get(gate_type).cloned()
    }

    /// Returns every registered gate type, in sorted order.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        self.gates.keys().map(String::as_str).collect()
    }
}
