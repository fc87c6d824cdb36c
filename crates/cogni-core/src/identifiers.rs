// crates/cogni-core/src/identifiers.rs
// ============================================================================
// Module: Canonical Identifiers
// Description: Newtype identifiers shared across the review core.
// Purpose: Prevent accidental mixing of opaque string identifiers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every identifier that crosses a component boundary (host id, repo id,
//! gate id, rule id, metric id) is wrapped in its own newtype so that a
//! `GateId` can never be passed where a `RuleId` is expected, even though
//! both are backed by `String`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Builds a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Opaque tag naming the source-control host that produced a delivery.
    HostId
);
string_identifier!(
    /// Stable identifier for a repository, scoped to its host.
    RepoId
);
string_identifier!(
    /// Commit SHA, ref name, or other git revision string.
    RevisionId
);
string_identifier!(
    /// Identifier for a single declared gate instance.
    GateId
);
string_identifier!(
    /// Gate type string as declared in the specification (`"review-limits"`, …).
    GateType
);
string_identifier!(
    /// Identifier for an `ai-rule` rule definition.
    RuleId
);
string_identifier!(
    /// Identifier for a single metric produced by a workflow.
    MetricId
);
string_identifier!(
    /// Identifier naming a workflow implementation (`"ai-generic-v1"`, …).
    WorkflowId
);
string_identifier!(
    /// Per-delivery idempotency key, `"<full_name>:<pr>:<head_sha>:<spec_hash>"`.
    IdempotencyKey
);
