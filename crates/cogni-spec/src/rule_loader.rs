// crates/cogni-spec/src/rule_loader.rs
// ============================================================================
// Module: Rule Loader
// Description: Loads and validates a single ai-rule gate's rule file.
// Purpose: Isolate `.cogni/rules/<name>.yaml` parsing from the gate itself.
// Dependencies: cogni_core, jsonschema, serde_yaml, crate::schema
// ============================================================================

//! ## Overview
//! Unlike the spec loader, rule files are not cached: they are small, loaded
//! once per `ai-rule` gate instance per delivery, and the orchestrator's
//! per-delivery idempotency key already bounds how often a delivery repeats.

use cogni_core::FileReadError;
use cogni_core::FileReader;
use cogni_core::Rule;

use crate::schema::rule_schema;

/// Default directory rule files are resolved relative to.
pub const DEFAULT_RULES_DIR: &str = ".cogni/rules";

/// Why a rule load did not produce a usable [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLoadFailure {
    /// The rule file does not exist at the requested ref.
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
pub enum RuleLoadResult {
    /// A validated rule, ready for the ai-rule gate pipeline.
    Ok(Rule),
    /// The rule could not be loaded; see [`RuleLoadFailure`] for why.
    Failed(RuleLoadFailure),
}

/// Loads and validates `<rules_dir>/<rule_file>` through `file_reader`.
///
/// `rule_file` is resolved relative to `rules_dir` (default
/// [`DEFAULT_RULES_DIR`]); the rule's `id` falls back to the file stem when
/// absent from the document.
pub async fn load(
    file_reader: &dyn FileReader,
    rules_dir: &str,
    rule_file: &str,
    git_ref: Option<&str>,
) -> RuleLoadResult {
    let path = format!("{rules_dir}/{rule_file}");
    let raw = match file_reader.get_file(&path, git_ref).await {
        Ok(bytes) => bytes,
        Err(FileReadError::NotFound(_)) => return RuleLoadResult::Failed(RuleLoadFailure::Missing),
        Err(FileReadError::Other(message)) => {
            return RuleLoadResult::Failed(RuleLoadFailure::FetchError(message));
        }
    };

    match parse_and_validate(&raw, rule_file) {
        Ok(rule) => RuleLoadResult::Ok(rule),
        Err(failure) => RuleLoadResult::Failed(failure),
    }
}

/// Parses raw YAML bytes, validates against the rule schema, and
/// deserializes into a [`Rule`], defaulting `id` to the file stem.
fn parse_and_validate(raw: &[u8], rule_file: &str) -> Result<Rule, RuleLoadFailure> {
    let mut document: serde_json::Value =
        serde_yaml::from_slice(raw).map_err(|error| RuleLoadFailure::InvalidYaml(error.to_string()))?;

    if let Some(object) = document.as_object_mut()
        && !object.contains_key("id")
    {
        let stem = rule_file.strip_suffix(".yaml").or_else(|| rule_file.strip_suffix(".yml")).unwrap_or(rule_file);
        object.insert("id".to_string(), serde_json::Value::String(stem.to_string()));
    }

    let schema = rule_schema();
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .build(&schema)
        .map_err(|error| RuleLoadFailure::SchemaViolation(vec![error.to_string()]))?;
    let violations: Vec<String> = validator.iter_errors(&document).map(|error| error.to_string()).collect();
    if !violations.is_empty() {
        return Err(RuleLoadFailure::SchemaViolation(violations));
    }

    let rule: Rule =
        serde_json::from_value(document).map_err(|error| RuleLoadFailure::SchemaViolation(vec![error.to_string()]))?;

    if rule.success_criteria.is_empty() {
        return Err(RuleLoadFailure::SchemaViolation(vec![
            "success_criteria must declare at least one of require/any_of".to_string(),
        ]));
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use async_trait::async_trait;

    use super::*;

    struct FixtureReader {
        body: Option<Vec<u8>>,
    }

    #[async_trait]
    impl FileReader for FixtureReader {
        async fn get_file(&self, _path: &str, _git_ref: Option<&str>) -> Result<Vec<u8>, FileReadError> {
            self.body.clone().ok_or_else(|| FileReadError::NotFound("missing".to_string()))
        }
    }

    #[tokio::test]
    async fn missing_rule_file_reports_missing() {
        let reader = FixtureReader {
            body: None,
        };
        let result = load(&reader, DEFAULT_RULES_DIR, "does-not-exist.yaml", None).await;
        assert!(matches!(result, RuleLoadResult::Failed(RuleLoadFailure::Missing)));
    }

    #[tokio::test]
    async fn valid_rule_loads_with_stem_id() {
        let yaml = br#"
schema_version: "1"
workflow_id: ai-generic-v1
evaluations:
  - metric_id: alignment
    statement: "PR matches goal G"
success_criteria:
  require:
    - metric: alignment
      gte: 0.7
"#;
        let reader = FixtureReader {
            body: Some(yaml.to_vec()),
        };
        let result = load(&reader, DEFAULT_RULES_DIR, "alignment-check.yaml", None).await;
        let RuleLoadResult::Ok(rule) = result else {
            panic!("expected Ok");
        };
        assert_eq!(rule.id, "alignment-check");
        assert_eq!(rule.evaluations.len(), 1);
    }

    #[tokio::test]
    async fn empty_success_criteria_is_rejected() {
        let yaml = br#"
schema_version: "1"
workflow_id: ai-generic-v1
evaluations:
  - metric_id: alignment
    statement: "PR matches goal G"
success_criteria: {}
"#;
        let reader = FixtureReader {
            body: Some(yaml.to_vec()),
        };
        let result = load(&reader, DEFAULT_RULES_DIR, "empty.yaml", None).await;
        assert!(matches!(result, RuleLoadResult::Failed(RuleLoadFailure::SchemaViolation(_))));
    }
}
