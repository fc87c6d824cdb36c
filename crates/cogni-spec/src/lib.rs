// crates/cogni-spec/src/lib.rs
// ============================================================================
// Crate: cogni-spec
// Description: Loads, validates, and caches `.cogni/repo-spec.yaml` and
//              `.cogni/rules/<name>.yaml`.
// ============================================================================

#![forbid(unsafe_code)]

pub mod cache;
pub mod rule_loader;
pub mod schema;
pub mod spec_loader;

pub use cache::CacheKey;
pub use cache::SpecCache;
pub use rule_loader::DEFAULT_RULES_DIR;
pub use rule_loader::RuleLoadFailure;
pub use rule_loader::RuleLoadResult;
pub use schema::repo_spec_schema;
pub use schema::rule_schema;
pub use spec_loader::SPEC_PATH;
pub use spec_loader::SpecLoadFailure;
pub use spec_loader::SpecLoadResult;
