// crates/cogni-gates/src/artifact/common.rs
// ============================================================================
// Module: Artifact Gate Shared Machinery
// Description: Fail-policy evaluation, finding caps, path normalization, and
//              ZIP artifact fetching shared by every artifact gate.
// Purpose: Keep `sarif.rs` and `jsonpath.rs` focused on their own parsing.
// Dependencies: cogni_core::context, zip
// ============================================================================

use cogni_core::ArtifactFetchError;
use cogni_core::ArtifactLocator;
use cogni_core::CanonicalContext;
use cogni_core::Level;
use cogni_core::Violation;
use serde::Deserialize;
use serde_json::json;
use std::io::Read;

/// Largest artifact this gate will download, per `spec.md` §4.10.
pub const MAX_ARTIFACT_BYTES: u64 = 25 * 1024 * 1024;

/// Largest number of findings kept per run before truncation.
pub const DEFAULT_MAX_FINDINGS: usize = 1000;

/// When a gate's findings should fail the overall outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Fail only when an `error`-level finding is present.
    #[default]
    Errors,
    /// Fail when any `warning` or `error`-level finding is present.
    WarningsOrErrors,
    /// Fail when any finding at all is present.
    Any,
    /// Never fail based on findings; always report them as informational.
    None,
}

impl FailPolicy {
    /// True when `violations` trips this policy's failure threshold.
    #[must_use]
    pub fn should_fail(self, violations: &[Violation]) -> bool {
        match self {
            Self::None => false,
            Self::Any => !violations.is_empty(),
            Self::WarningsOrErrors => violations.iter().any(|v| matches!(v.level, Level::Error | Level::Warning)),
            Self::Errors => violations.iter().any(|v| v.level == Level::Error),
        }
    }
}

/// Error resolving or parsing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// No artifact matched the configured locator.
    Missing,
    /// The artifact exceeded the configured size limit.
    TooLarge,
    /// The artifact could not be parsed as the expected format.
    ParseError(String),
}

impl From<ArtifactFetchError> for ArtifactError {
    fn from(error: ArtifactFetchError) -> Self {
        match error {
            ArtifactFetchError::NotFound => Self::Missing,
            ArtifactFetchError::TooLarge { .. } => Self::TooLarge,
            ArtifactFetchError::Other(message) => Self::ParseError(message),
        }
    }
}

/// Normalizes a path reported by an external tool: strips common CI runner
/// prefixes and converts backslashes to forward slashes.
#[must_use]
pub fn normalize_path(path: &str, repo_full_name: &str) -> String {
    let candidates = [
        format!("/home/runner/work/{repo_full_name}/{repo_full_name}/"),
        "/github/workspace/".to_string(),
    ];
    let mut normalized = path.to_string();
    for prefix in &candidates {
        if let Some(stripped) = normalized.strip_prefix(prefix.as_str()) {
            normalized = stripped.to_string();
            break;
        }
    }
    normalized.replace('\\', "/")
}

/// Sorts `violations` deterministically and truncates to `max_findings`,
/// returning the truncated count when any findings were dropped.
#[must_use]
pub fn cap_findings(mut violations: Vec<Violation>, max_findings: usize) -> (Vec<Violation>, Option<usize>) {
    violations.sort_by(|a, b| {
        (a.path.as_deref().unwrap_or(""), a.line.unwrap_or(0), a.column.unwrap_or(0), a.code.as_str()).cmp(&(
            b.path.as_deref().unwrap_or(""),
            b.line.unwrap_or(0),
            b.column.unwrap_or(0),
            b.code.as_str(),
        ))
    });
    if violations.len() > max_findings {
        let truncated = violations.len() - max_findings;
        violations.truncate(max_findings);
        (violations, Some(truncated))
    } else {
        (violations, None)
    }
}

/// Builds the synthetic summary violation appended when `cap_findings`
/// drops entries, per `spec.md` §4.10 and the `|violations|_total ≤
/// max_findings + 1` bound in §8.
#[must_use]
pub fn findings_truncated_violation(truncated_count: usize) -> Violation {
    Violation {
        code: "findings_truncated".to_string(),
        message: format!("{truncated_count} finding(s) exceeded the cap and were dropped"),
        path: None,
        line: None,
        column: None,
        level: Level::Info,
        meta: Some(json!({ "truncated_count": truncated_count })),
    }
}

/// Fetches and extracts the bytes of a single report file from a CI
/// artifact ZIP, resolved primarily by workflow run id and, failing that, by
/// head commit SHA.
///
/// # Errors
///
/// Returns [`ArtifactError`] when resolution, download, or ZIP extraction
/// fails.
pub async fn fetch_artifact_bytes(
    cc: &CanonicalContext,
    workflow_run_id: Option<u64>,
    artifact_path: Option<&str>,
) -> Result<Vec<u8>, ArtifactError> {
    let Some(resolver) = cc.artifact_resolver.as_ref() else {
        return Err(ArtifactError::Missing);
    };

    let locator = workflow_run_id
        .map(ArtifactLocator::WorkflowRun)
        .unwrap_or_else(|| ArtifactLocator::HeadSha(cc.reviewable.head.sha.to_string()));

    let zip_bytes = resolver.resolve(&locator, MAX_ARTIFACT_BYTES).await?;
    extract_report(&zip_bytes, artifact_path)
}

fn extract_report(zip_bytes: &[u8], artifact_path: Option<&str>) -> Result<Vec<u8>, ArtifactError> {
    let reader = std::io::Cursor::new(zip_bytes);
    let mut archive = zip::ZipArchive::new(reader).map_err(|error| ArtifactError::ParseError(error.to_string()))?;

    let index = if let Some(path) = artifact_path {
        archive.index_for_name(path).ok_or(ArtifactError::Missing)?
    } else {
        (0..archive.len())
            .find(|&index| {
                archive
                    .by_index(index)
                    .ok()
                    .is_some_and(|entry| entry.name().ends_with(".json") || entry.name().ends_with(".sarif"))
            })
            .ok_or(ArtifactError::Missing)?
    };

    let mut entry = archive.by_index(index).map_err(|error| ArtifactError::ParseError(error.to_string()))?;
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).map_err(|error| ArtifactError::ParseError(error.to_string()))?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    fn violation(path: &str, line: u32, level: Level) -> Violation {
        Violation {
            code: "c".to_string(),
            message: "m".to_string(),
            path: Some(path.to_string()),
            line: Some(line),
            column: None,
            level,
            meta: None,
        }
    }

    #[test]
    fn fail_policy_errors_only_trips_on_error_level() {
        let violations = vec![violation("a", 1, Level::Warning)];
        assert!(!FailPolicy::Errors.should_fail(&violations));
        assert!(FailPolicy::WarningsOrErrors.should_fail(&violations));
    }

    #[test]
    fn fail_policy_any_trips_on_info() {
        let violations = vec![violation("a", 1, Level::Info)];
        assert!(FailPolicy::Any.should_fail(&violations));
        assert!(!FailPolicy::Errors.should_fail(&violations));
    }

    #[test]
    fn fail_policy_none_never_trips() {
        let violations = vec![violation("a", 1, Level::Error)];
        assert!(!FailPolicy::None.should_fail(&violations));
    }

    #[test]
    fn normalize_path_strips_runner_prefix() {
        let path = "/home/runner/work/acme/widgets/acme/widgets/src/lib.rs";
        assert_eq!(normalize_path(path, "acme/widgets"), "src/lib.rs");
    }

    #[test]
    fn normalize_path_converts_backslashes() {
        assert_eq!(normalize_path(r"src\lib.rs", "acme/widgets"), "src/lib.rs");
    }

    #[test]
    fn cap_findings_sorts_and_truncates() {
        let violations = vec![violation("b.rs", 1, Level::Error), violation("a.rs", 1, Level::Error)];
        let (capped, truncated) = cap_findings(violations, 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].path.as_deref(), Some("a.rs"));
        assert_eq!(truncated, Some(1));
    }

    #[test]
    fn findings_truncated_violation_is_informational_and_carries_count() {
        let violation = findings_truncated_violation(42);
        assert_eq!(violation.code, "findings_truncated");
        assert_eq!(violation.level, Level::Info);
        assert_eq!(violation.meta, Some(serde_json::json!({ "truncated_count": 42 })));
    }

    #[test]
    fn capping_then_appending_the_summary_violation_respects_the_plus_one_bound() {
        let violations: Vec<Violation> =
            (0..1200).map(|index| violation(&format!("f{index}.rs"), 1, Level::Error)).collect();
        let (mut capped, truncated) = cap_findings(violations, DEFAULT_MAX_FINDINGS);
        let truncated_count = truncated.expect("1200 findings exceed the default cap");
        capped.push(findings_truncated_violation(truncated_count));
        assert_eq!(capped.len(), DEFAULT_MAX_FINDINGS + 1);
    }
}
