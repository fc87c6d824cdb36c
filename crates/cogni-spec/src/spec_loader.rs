// crates/cogni-spec/src/spec_loader.rs
// ============================================================================
// Module: Spec Loader
// Description: Fetches, parses, validates, and caches the repository spec.
// Purpose: Give the orchestrator one call that turns a context into either a
//          validated Specification or a structured reason it could not.
// Dependencies: cogni_core, jsonschema, serde_yaml, crate::{cache, schema}
// ============================================================================

//! ## Overview
//! `.cogni/repo-spec.yaml` is fetched through [`cogni_core::FileReader`], so
//! the loader never knows whether it is talking to GitHub, GitLab, or a local
//! checkout. Per `spec.md` §4.2, whether the spec is missing is the
//! orchestrator's decision to act on, not the loader's — this module only
//! reports the outcome.

use std::sync::Arc;

use cogni_core::CanonicalContext;
use cogni_core::FileReadError;
use cogni_core::Specification;
use cogni_core::sha256_hex;
use cogni_core::time::MonotonicClock;

use crate::cache::CacheKey;
use crate::cache::SpecCache;
use crate::schema::repo_spec_schema;

/// Path of the repository specification, relative to the repository root.
pub const SPEC_PATH: &str = ".cogni/repo-spec.yaml";

/// Why a spec load did not produce a usable [`Specification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecLoadFailure {
    /// `.cogni/repo-spec.yaml` does not exist at the requested ref.
    Missing,
    /// The file exists but is not valid YAML.
    InvalidYaml(String),
    /// The file parsed but failed schema validation.
    SchemaViolation(Vec<String>),
    /// The host call to fetch the file failed for a reason other than "not found".
    FetchError(String),
}

/// Outcome of [`load`].
#[derive(Debug, Clone)]
pub enum SpecLoadResult {
    /// A validated specification, ready for the orchestrator.
    Ok {
        /// The validated specification.
        spec: Specification,
    },
    /// The spec could not be loaded; see [`SpecLoadFailure`] for why.
    Failed(SpecLoadFailure),
}

/// Loads, validates, and caches `.cogni/repo-spec.yaml` for `cc` at `git_ref`.
///
/// Returns a structured [`SpecLoadResult`] rather than a `Result`: every
/// branch (missing, invalid, cached hit) is an expected outcome the caller
/// must handle explicitly.
pub async fn load<C: MonotonicClock>(
    cc: &CanonicalContext,
    git_ref: &str,
    cache: &SpecCache<C>,
) -> SpecLoadResult {
    let Some(file_reader) = cc.file_reader.as_ref() else {
        return SpecLoadResult::Failed(SpecLoadFailure::FetchError(
            "host does not expose a file reader capability".to_string(),
        ));
    };

    let raw = match file_reader.get_file(SPEC_PATH, Some(git_ref)).await {
        Ok(bytes) => bytes,
        Err(FileReadError::NotFound(_)) => return SpecLoadResult::Failed(SpecLoadFailure::Missing),
        Err(FileReadError::Other(message)) => {
            return SpecLoadResult::Failed(SpecLoadFailure::FetchError(message));
        }
    };

    let content_hash = sha256_hex(&raw);
    let cache_key = CacheKey::new(cc.repo.repo_id.as_str(), git_ref, content_hash.clone());

    if let Some(cached) = cache.get(&cache_key) {
        return SpecLoadResult::Ok {
            spec: cached,
        };
    }

    match parse_and_validate(&raw, &content_hash) {
        Ok(spec) => {
            cache.insert(cache_key, spec.clone());
            SpecLoadResult::Ok {
                spec,
            }
        }
        Err(failure) => SpecLoadResult::Failed(failure),
    }
}

/// Parses raw YAML bytes, validates against the repo-spec schema, and
/// deserializes into a [`Specification`] with `_hash` set to `content_hash`.
fn parse_and_validate(raw: &[u8], content_hash: &str) -> Result<Specification, SpecLoadFailure> {
    let mut document: serde_json::Value =
        serde_yaml::from_slice(raw).map_err(|error| SpecLoadFailure::InvalidYaml(error.to_string()))?;

    if let Some(object) = document.as_object_mut() {
        object.insert("_hash".to_string(), serde_json::Value::String(content_hash.to_string()));
    }

    let schema = repo_spec_schema();
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .build(&schema)
        .map_err(|error| SpecLoadFailure::SchemaViolation(vec![error.to_string()]))?;
    let violations: Vec<String> = validator.iter_errors(&document).map(|error| error.to_string()).collect();
    if !violations.is_empty() {
        return Err(SpecLoadFailure::SchemaViolation(violations));
    }

    serde_json::from_value(document)
        .map_err(|error| SpecLoadFailure::SchemaViolation(vec![error.to_string()]))
}

/// Builds a [`SpecCache`] driven by the given clock, convenience for hosts
/// wiring up the loader at process startup.
#[must_use]
pub fn new_cache<C: MonotonicClock>(clock: C) -> Arc<SpecCache<C>> {
    Arc::new(SpecCache::new(clock))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use async_trait::async_trait;
    use cogni_core::FileReader;
    use cogni_core::RepoIdentity;
    use cogni_core::RevisionPointer;
    use cogni_core::Reviewable;
    use cogni_core::SizeHints;
    use cogni_core::time::SystemClock;

    use super::*;

    struct FixtureReader {
        body: Option<Vec<u8>>,
    }

    #[async_trait]
    impl FileReader for FixtureReader {
        async fn get_file(&self, _path: &str, _git_ref: Option<&str>) -> Result<Vec<u8>, FileReadError> {
            self.body.clone().ok_or_else(|| FileReadError::NotFound(SPEC_PATH.to_string()))
        }
    }

    fn context_with(reader: FixtureReader) -> CanonicalContext {
        CanonicalContext {
            host_id: cogni_core::HostId::new("github"),
            repo: RepoIdentity {
                repo_id: cogni_core::RepoId::new("123"),
                owner: "acme".to_string(),
                name: "widgets".to_string(),
                full_name: "acme/widgets".to_string(),
            },
            installation_id: None,
            reviewable: Reviewable {
                number: 1,
                title: "title".to_string(),
                body: None,
                state: "open".to_string(),
                head: RevisionPointer {
                    sha: cogni_core::RevisionId::new("headsha"),
                    git_ref: "refs/heads/feature".to_string(),
                },
                base: RevisionPointer {
                    sha: cogni_core::RevisionId::new("basesha"),
                    git_ref: "main".to_string(),
                },
                size_hints: SizeHints::default(),
            },
            file_reader: Some(Arc::new(reader)),
            changed_files_lister: None,
            comparer: None,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: None,
        }
    }

    #[tokio::test]
    async fn missing_spec_reports_missing() {
        let cc = context_with(FixtureReader {
            body: None,
        });
        let cache = SpecCache::new(SystemClock);
        let result = load(&cc, "main", &cache).await;
        assert!(matches!(result, SpecLoadResult::Failed(SpecLoadFailure::Missing)));
    }

    #[tokio::test]
    async fn valid_spec_loads_and_caches() {
        let yaml = br#"
schema_version: "1"
intent:
  goals: ["ship safely"]
gates:
  - type: review-limits
    with:
      max_changed_files: 30
"#;
        let cc = context_with(FixtureReader {
            body: Some(yaml.to_vec()),
        });
        let cache = SpecCache::new(SystemClock);
        let result = load(&cc, "main", &cache).await;
        let SpecLoadResult::Ok {
            spec,
        } = result
        else {
            panic!("expected Ok");
        };
        assert_eq!(spec.gates.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn invalid_yaml_reports_invalid_yaml() {
        let cc = context_with(FixtureReader {
            body: Some(b"not: [valid".to_vec()),
        });
        let cache = SpecCache::new(SystemClock);
        let result = load(&cc, "main", &cache).await;
        assert!(matches!(result, SpecLoadResult::Failed(SpecLoadFailure::InvalidYaml(_))));
    }

    #[tokio::test]
    async fn unknown_field_reports_schema_violation() {
        let yaml = b"schema_version: \"1\"\ngates: []\nbogus: true\n";
        let cc = context_with(FixtureReader {
            body: Some(yaml.to_vec()),
        });
        let cache = SpecCache::new(SystemClock);
        let result = load(&cc, "main", &cache).await;
        assert!(matches!(result, SpecLoadResult::Failed(SpecLoadFailure::SchemaViolation(_))));
    }
}
