// crates/cogni-gates/src/artifact/sarif.rs
// ============================================================================
// Module: SARIF Artifact Gate
// Description: Ingests a SARIF 2.1.0 report into violations.
// Purpose: Implement `spec.md` §4.10's SARIF ingestion contract.
// Dependencies: crate::artifact::common, serde_json
// ============================================================================

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::Level;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;
use serde::Deserialize;

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

/// `with:` configuration for the `artifact.sarif` gate type.
#[derive(Debug, Clone, Deserialize, Default)]
struct Config {
    #[serde(default)]
    workflow_run_id: Option<u64>,
    #[serde(default)]
    artifact_path: Option<String>,
    #[serde(default)]
    fail_on: FailPolicy,
    #[serde(default = "default_max_findings")]
    max_findings: usize,
}

#[derive(Debug, Deserialize)]
struct SarifLog {
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
struct SarifRun {
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Debug, Deserialize)]
struct SarifResult {
    #[serde(default, rename = "ruleId")]
    rule_id: Option<String>,
    #[serde(default)]
    level: Option<SarifLevel>,
    message: SarifMessage,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SarifLevel {
    Text(String),
    Numeric(i64),
}

#[derive(Debug, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SarifLocation {
    #[serde(default, rename = "physicalLocation")]
    physical_location: Option<SarifPhysicalLocation>,
}

#[derive(Debug, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    #[serde(default)]
    region: Option<SarifRegion>,
}

#[derive(Debug, Deserialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct SarifRegion {
    #[serde(default, rename = "startLine")]
    start_line: Option<u32>,
    #[serde(default, rename = "startColumn")]
    start_column: Option<u32>,
}

fn sarif_level_to_violation_level(level: Option<&SarifLevel>) -> Level {
    match level {
        Some(SarifLevel::Text(text)) => match text.as_str() {
            "error" => Level::Error,
            "warning" => Level::Warning,
            _ => Level::Info,
        },
        Some(SarifLevel::Numeric(value)) => match value {
            2 => Level::Error,
            1 => Level::Warning,
            _ => Level::Info,
        },
        None => Level::Info,
    }
}

/// Ingests a SARIF 2.1.0 artifact, producing one violation per
/// `(result, location)` pair.
pub struct SarifGate;

#[async_trait]
impl Gate for SarifGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let config: Config = serde_json::from_value(config.clone()).unwrap_or_default();

        let bytes = match fetch_artifact_bytes(cc, config.workflow_run_id, config.artifact_path.as_deref()).await {
            Ok(bytes) => bytes,
            Err(ArtifactError::Missing) => return GateOutcome::neutral(NeutralReason::MissingArtifact),
            Err(ArtifactError::TooLarge) => return GateOutcome::neutral(NeutralReason::ArtifactTooLarge),
            Err(ArtifactError::ParseError(_)) => return GateOutcome::neutral(NeutralReason::ParseError),
        };

        let log: SarifLog = match serde_json::from_slice(&bytes) {
            Ok(log) => log,
            Err(_) => return GateOutcome::neutral(NeutralReason::InvalidFormat),
        };

        let violations = render_violations(&log, &cc.repo.full_name);
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

fn render_violations(log: &SarifLog, repo_full_name: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    for run in &log.runs {
        for result in &run.results {
            let code = result.rule_id.clone().unwrap_or_else(|| "sarif".to_string());
            let level = sarif_level_to_violation_level(result.level.as_ref());
            if result.locations.is_empty() {
                violations.push(Violation {
                    code,
                    message: result.message.text.clone(),
                    path: None,
                    line: None,
                    column: None,
                    level,
                    meta: None,
                });
                continue;
            }
            for location in &result.locations {
                let Some(physical) = location.physical_location.as_ref() else {
                    continue;
                };
                violations.push(Violation {
                    code: code.clone(),
                    message: result.message.text.clone(),
                    path: Some(normalize_path(&physical.artifact_location.uri, repo_full_name)),
                    line: physical.region.as_ref().and_then(|region| region.start_line),
                    column: physical.region.as_ref().and_then(|region| region.start_column),
                    level,
                    meta: None,
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    fn sample_log() -> serde_json::Value {
        serde_json::json!({
            "runs": [{
                "results": [
                    {
                        "ruleId": "no-unwrap",
                        "level": "error",
                        "message": { "text": "avoid unwrap" },
                        "locations": [{
                            "physicalLocation": {
                                "artifactLocation": { "uri": "src/lib.rs" },
                                "region": { "startLine": 10, "startColumn": 5 }
                            }
                        }]
                    },
                    {
                        "ruleId": "style",
                        "level": 1,
                        "message": { "text": "prefer explicit types" },
                        "locations": []
                    }
                ]
            }]
        })
    }

    #[test]
    fn renders_one_violation_per_location() {
        let log: SarifLog = serde_json::from_value(sample_log()).expect("parses");
        let violations = render_violations(&log, "acme/widgets");
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].code, "no-unwrap");
        assert_eq!(violations[0].level, Level::Error);
        assert_eq!(violations[0].path.as_deref(), Some("src/lib.rs"));
        assert_eq!(violations[1].level, Level::Warning);
        assert_eq!(violations[1].path, None);
    }

    #[test]
    fn unknown_numeric_level_maps_to_info() {
        assert_eq!(sarif_level_to_violation_level(Some(&SarifLevel::Numeric(5))), Level::Info);
    }
}
