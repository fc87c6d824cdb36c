// crates/cogni-gates/src/local/agents_md_sync.rs
// ============================================================================
// Module: Agents-Doc Sync Gate
// Description: Requires a sibling documentation file alongside code changes.
// Purpose: Keep directory-scoped agent/contributor docs from drifting behind
//          the code they describe, per `spec.md` §4.5.
// Dependencies: cogni_core::context
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::FileStatus;
use cogni_core::GateOutcome;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::Violation;
use cogni_registry::Gate;
use serde::Deserialize;

fn default_code_patterns() -> Vec<String> {
    vec!["**/*.*".to_string()]
}

fn default_doc_pattern() -> String {
    "AGENTS.md".to_string()
}

/// `with:` configuration for the `agents-md-sync` gate type.
#[derive(Debug, Clone, Deserialize)]
struct Config {
    #[serde(default = "default_code_patterns")]
    code_patterns: Vec<String>,
    #[serde(default = "default_doc_pattern")]
    doc_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            code_patterns: default_code_patterns(),
            doc_pattern: default_doc_pattern(),
        }
    }
}

/// Requires `<dir>/<doc_pattern>` to be among the changed files whenever a
/// matching code file changes under `<dir>`.
pub struct AgentsMdSyncGate;

#[async_trait]
impl Gate for AgentsMdSyncGate {
    async fn run(&self, cc: &CanonicalContext, config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
        let config: Config = serde_json::from_value(config.clone()).unwrap_or_default();

        let files = match cogni_core::list_changed_files(cc).await {
            Ok(files) => files,
            Err(_) => return GateOutcome::neutral(NeutralReason::ApiError),
        };

        let changed_paths: BTreeSet<&str> = files.iter().map(|file| file.path.as_str()).collect();

        let mut checked_dirs = BTreeSet::new();
        let mut violations = Vec::new();
        for file in &files {
            if file.status == FileStatus::Removed || is_doc_like(&file.path) {
                continue;
            }
            if !matches_any(&config.code_patterns, &file.path) {
                continue;
            }
            let dir = directory_of(&file.path);
            if !checked_dirs.insert(dir.to_string()) {
                continue;
            }
            let expected = if dir.is_empty() {
                config.doc_pattern.clone()
            } else {
                format!("{dir}/{}", config.doc_pattern)
            };
            if !changed_paths.contains(expected.as_str()) {
                violations.push(missing_doc_violation(dir, &expected));
            }
        }

        if violations.is_empty() {
            GateOutcome::pass()
        } else {
            GateOutcome::fail(violations)
        }
    }
}

fn missing_doc_violation(dir: &str, expected: &str) -> Violation {
    let mut violation = Violation::error(
        "missing_doc_sync",
        format!("code changed under \"{dir}\" without updating \"{expected}\""),
    );
    violation.path = Some(expected.to_string());
    violation
}

/// True for filenames that are themselves documentation, exempt from
/// triggering the sync requirement.
fn is_doc_like(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.eq_ignore_ascii_case("README.md")
        || name.eq_ignore_ascii_case("CHANGELOG.md")
        || name.to_ascii_lowercase().ends_with(".md")
}

/// Returns the directory component of `path`, or `""` for a root-level file.
fn directory_of(path: &str) -> &str {
    path.rfind('/').map_or("", |index| &path[..index])
}

/// True when `path` matches any of `patterns`, using a small glob subset:
/// `**` matches any number of path segments, `*` matches within one segment.
fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().any(|pattern| glob_match(pattern, path))
}

fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    segments_match(&pattern_segments, &path_segments)
}

fn segments_match(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            if pattern.len() == 1 {
                return true;
            }
            (0..=path.len()).any(|skip| segments_match(&pattern[1..], &path[skip..]))
        }
        Some(segment) => {
            path.first().is_some_and(|candidate| segment_match(segment, candidate))
                && segments_match(&pattern[1..], &path[1..])
        }
    }
}

/// Matches a single path segment against a pattern segment containing `*`
/// wildcards (no `/`).
fn segment_match(pattern: &str, value: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }
    let mut rest = value;
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            let Some(stripped) = rest.strip_prefix(part) else {
                return false;
            };
            rest = stripped;
        } else if index == parts.len() - 1 {
            return rest.ends_with(part);
        } else if let Some(position) = rest.find(part) {
            rest = &rest[position + part.len()..];
        } else {
            return false;
        }
    }
    true
}
