// crates/cogni-gates/src/artifact/jsonpath.rs
// ============================================================================
// Module: JSONPath Artifact Gate
// Description: Ingests an arbitrary JSON report into violations via
//              configured JSONPath field mappings.
// Purpose: Implement `spec.md` §4.10's JSONPath ingestion contract, for
//          reports that do not follow the SARIF schema.
// Dependencies: crate::artifact::common, jsonpath_lib
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Level;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;
use serde::Deserialize;
use serde_json::Value;

use crate::artifact::common::ArtifactError;
use crate::artifact::common::DEFAULT_MAX_FINDINGS;
use crate::artifact::common::FailPolicy;
use crate::artifact::common::cap_findings;
use crate::artifact::common::fetch_artifact_bytes;
use crate::artifact::common::findings_truncated_violation;
use crate::artifact::common::normalize_path;

fn default_max_findings() -> usize {
    DEFAULT_MAX_FINDINGS
}

/// JSONPath expressions, each relative to a single root item, mapping that
/// item's fields onto a [`Violation`]'s shape.
#[derive(Debug, Clone, Deserialize, Default)]
struct FieldMapping {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    line: Option<String>,
    #[serde(default)]
    column: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    severity: Option<String>,
}

/// `with:` configuration for the `artifact.jsonpath` gate type.
#[derive(Debug, Clone, Deserialize)]
struct Config {
    #[serde(default)]
    workflow_run_id: Option<u64>,
    #[serde(default)]
    artifact_path: Option<String>,
    root_jsonpath: String,
    #[serde(default)]
    fields: FieldMapping,
    #[serde(default)]
    severity_map: BTreeMap<String, String>,
    #[serde(default)]
    fail_on: FailPolicy,
    #[serde(default = "default_max_findings")]
    max_findings: usize,
}

/// Ingests a JSON report by selecting root items with `root_jsonpath` and
/// mapping each item's fields through relative JSONPath expressions.
pub struct JsonPathGate;

#[async_trait]
impl Gate for JsonPathGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let Ok(config) = serde_json::from_value::<Config>(config.clone()) else {
            return GateOutcome::neutral(NeutralReason::InternalError);
        };

        let bytes = match fetch_artifact_bytes(cc, config.workflow_run_id, config.artifact_path.as_deref()).await {
            Ok(bytes) => bytes,
            Err(ArtifactError::Missing) => return GateOutcome::neutral(NeutralReason::MissingArtifact),
            Err(ArtifactError::TooLarge) => return GateOutcome::neutral(NeutralReason::ArtifactTooLarge),
            Err(ArtifactError::ParseError(_)) => return GateOutcome::neutral(NeutralReason::ParseError),
        };

        let document: Value = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(_) => return GateOutcome::neutral(NeutralReason::InvalidFormat),
        };

        let items = match jsonpath_lib::select(&document, &config.root_jsonpath) {
            Ok(items) => items,
            Err(_) => return GateOutcome::neutral(NeutralReason::InvalidFormat),
        };

        let violations = items.into_iter().map(|item| render_violation(item, &config, &cc.repo.full_name)).collect();
        let (violations, truncated_count) = cap_findings(violations, config.max_findings);

        let mut outcome = if config.fail_on.should_fail(&violations) {
            GateOutcome::fail(violations)
        } else {
            let mut outcome = GateOutcome::pass();
            outcome.violations = violations;
            outcome
        };

        if let Some(truncated_count) = truncated_count {
            outcome.stats.insert("truncated".to_string(), serde_json::Value::Bool(true));
            outcome.stats.insert("truncated_count".to_string(), serde_json::json!(truncated_count));
            outcome.violations.push(findings_truncated_violation(truncated_count));
        }
        outcome
    }
}

fn render_violation(item: &Value, config: &Config, repo_full_name: &str) -> Violation {
    let path = select_string(item, config.fields.file.as_deref()).map(|path| normalize_path(&path, repo_full_name));
    let line = select_string(item, config.fields.line.as_deref()).and_then(|value| value.parse().ok());
    let column = select_string(item, config.fields.column.as_deref()).and_then(|value| value.parse().ok());
    let code = select_string(item, config.fields.code.as_deref()).unwrap_or_else(|| "finding".to_string());
    let message = select_string(item, config.fields.message.as_deref()).unwrap_or_default();
    let severity_value = select_string(item, config.fields.severity.as_deref());
    let level = severity_value
        .as_deref()
        .map(|raw| resolve_severity(raw, &config.severity_map))
        .unwrap_or(Level::Info);

    Violation {
        code,
        message,
        path,
        line,
        column,
        level,
        meta: None,
    }
}

/// Resolves a raw severity string to a [`Level`] via the configured map,
/// falling back to a small keyword heuristic when unmapped.
fn resolve_severity(raw: &str, severity_map: &BTreeMap<String, String>) -> Level {
    let mapped = severity_map.get(raw).map(String::as_str).unwrap_or(raw);
    match mapped.to_ascii_lowercase().as_str() {
        "error" | "high" | "critical" => Level::Error,
        "warning" | "medium" => Level::Warning,
        _ => Level::Info,
    }
}

/// Selects a single string-ish value at `jsonpath` relative to `item`,
/// coercing non-string JSON scalars to their display form.
fn select_string(item: &Value, jsonpath: Option<&str>) -> Option<String> {
    let jsonpath = jsonpath?;
    let matches = jsonpath_lib::select(item, jsonpath).ok()?;
    let value = matches.into_iter().next()?;
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
