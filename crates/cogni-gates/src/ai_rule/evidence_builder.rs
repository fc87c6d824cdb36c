// crates/cogni-gates/src/ai_rule/evidence_builder.rs
// ============================================================================
// Module: Evidence Builder
// Description: Renders a deterministic, budget-bounded text summary of a
//              pull request's diff for use as LLM evidence.
// Purpose: Implement `spec.md` §4.8's budgets and rendering rules.
// Dependencies: cogni_core::{context, evidence, rule_model}
// ============================================================================

use cogni_core::CanonicalContext;
use cogni_core::Evidence;
use cogni_core::EvidenceCapability;
use cogni_core::FileChange;
use cogni_core::Rule;

const DEFAULT_MAX_FILES: u32 = 25;
const DEFAULT_MAX_PATCH_BYTES_PER_FILE: u32 = 16_000;
const DEFAULT_MAX_PATCHES: u32 = 3;

/// Resolved evidence budgets for a single `ai-rule` invocation.
struct Budgets {
    max_files: u32,
    max_patch_bytes_per_file: u32,
    max_patches: u32,
}

fn resolve_budgets(cc: &CanonicalContext, rule: &Rule) -> Budgets {
    let configured_max_files = cc
        .runtime
        .as_ref()
        .and_then(|runtime| {
            runtime.review_limits_config.lock().unwrap_or_else(std::sync::PoisonError::into_inner).and_then(|limits| limits.max_changed_files)
        })
        .unwrap_or(DEFAULT_MAX_FILES);

    Budgets {
        max_files: rule.x_budgets.max_files.unwrap_or(configured_max_files),
        max_patch_bytes_per_file: rule.x_budgets.max_patch_bytes_per_file.unwrap_or(DEFAULT_MAX_PATCH_BYTES_PER_FILE),
        max_patches: rule.x_budgets.max_patches.unwrap_or(DEFAULT_MAX_PATCHES),
    }
}

/// Builds the [`Evidence`] handed to the workflow as prompt input.
///
/// Falls back to a one-line PR summary when the changed-files listing fails
/// or the rule never requested [`EvidenceCapability::DiffSummary`].
pub async fn build(cc: &CanonicalContext, rule: &Rule) -> Evidence {
    let budgets = resolve_budgets(cc, rule);

    let files = match cogni_core::list_changed_files(cc).await {
        Ok(files) if rule.x_capabilities.contains(&EvidenceCapability::DiffSummary) => files,
        _ => {
            return Evidence {
                diff_summary: basic_summary(cc),
                file_patches: None,
            };
        }
    };

    let diff_summary = render_header_and_bullets(&files, budgets.max_files);
    let file_patches = rule
        .x_capabilities
        .contains(&EvidenceCapability::FilePatches)
        .then(|| render_patches(&files, budgets.max_patches, budgets.max_patch_bytes_per_file));

    Evidence {
        diff_summary,
        file_patches,
    }
}

fn basic_summary(cc: &CanonicalContext) -> String {
    let hints = cc.reviewable.size_hints;
    let file_count = hints.changed_files.unwrap_or(0);
    let additions = hints.additions.unwrap_or(0);
    let deletions = hints.deletions.unwrap_or(0);
    format!(
        "PR \"{}\" modifies {file_count} file(s) (+{additions} -{deletions} lines)",
        cc.reviewable.title
    )
}

fn render_header_and_bullets(files: &[FileChange], max_files: u32) -> String {
    let total_additions: u32 = files.iter().map(|file| file.additions).sum();
    let total_deletions: u32 = files.iter().map(|file| file.deletions).sum();
    let mut text = format!("{} file(s) changed, +{total_additions}/\u{2212}{total_deletions} total\n", files.len());

    let max_files = usize::try_from(max_files).unwrap_or(usize::MAX);
    for file in files.iter().take(max_files) {
        text.push_str(&format!(
            "\u{2022} {} ({:?}) +{}/\u{2212}{}\n",
            file.path, file.status, file.additions, file.deletions
        ));
    }
    text
}

fn render_patches(files: &[FileChange], max_patches: u32, max_patch_bytes: u32) -> String {
    let max_patches = usize::try_from(max_patches).unwrap_or(usize::MAX);
    let max_patch_bytes = usize::try_from(max_patch_bytes).unwrap_or(usize::MAX);
    let mut text = String::from("\nTop patches (truncated):\n");
    for (file, patch) in
        files.iter().filter_map(|file| file.patch.as_ref().map(|patch| (file, patch))).take(max_patches)
    {
        text.push_str(&format!("=== {} ===\n", file.path));
        text.push_str(&truncate_patch(patch, max_patch_bytes));
        text.push_str("\n\n");
    }
    text
}

fn truncate_patch(patch: &str, max_bytes: usize) -> String {
    if patch.len() <= max_bytes {
        return patch.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !patch.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n\u{2026} [truncated]", &patch[..end])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use cogni_core::ChangedFilesError;
    use cogni_core::ChangedFilesLister;
    use cogni_core::Deadline;
    use cogni_core::EvidenceBudgets;
    use cogni_core::Evaluation;
    use cogni_core::FileStatus;
    use cogni_core::HostId;
    use cogni_core::IdempotencyKey;
    use cogni_core::Intent;
    use cogni_core::LogLevel;
    use cogni_core::Logger;
    use cogni_core::NullSink;
    use cogni_core::RepoId;
    use cogni_core::RepoIdentity;
    use cogni_core::RevisionId;
    use cogni_core::RevisionPointer;
    use cogni_core::Reviewable;
    use cogni_core::RuntimeFields;
    use cogni_core::SizeHints;
    use cogni_core::Specification;
    use cogni_core::SuccessCriteria;
    use cogni_core::SystemClock;

    use super::*;

    struct FixtureLister(Vec<FileChange>);

    #[async_trait]
    impl ChangedFilesLister for FixtureLister {
        async fn list_changed_files(&self) -> Result<Vec<FileChange>, ChangedFilesError> {
            Ok(self.0.clone())
        }
    }

    fn sample_rule(capabilities: Vec<EvidenceCapability>) -> Rule {
        Rule {
            id: "alignment-check".to_string(),
            schema_version: "1".to_string(),
            workflow_id: "ai-generic-v1".to_string(),
            evaluations: vec![Evaluation {
                metric_id: "alignment".to_string(),
                statement: "matches goal".to_string(),
            }],
            success_criteria: SuccessCriteria::default(),
            x_capabilities: capabilities,
            x_budgets: EvidenceBudgets::default(),
        }
    }

    fn cc_with_files(files: Vec<FileChange>) -> CanonicalContext {
        let clock = SystemClock;
        CanonicalContext {
            host_id: HostId::new("github"),
            repo: RepoIdentity {
                repo_id: RepoId::new("1"),
                owner: "acme".to_string(),
                name: "widgets".to_string(),
                full_name: "acme/widgets".to_string(),
            },
            installation_id: None,
            reviewable: Reviewable {
                number: 1,
                title: "add widget".to_string(),
                body: None,
                state: "open".to_string(),
                head: RevisionPointer {
                    sha: RevisionId::new("h"),
                    git_ref: "refs/heads/f".to_string(),
                },
                base: RevisionPointer {
                    sha: RevisionId::new("b"),
                    git_ref: "main".to_string(),
                },
                size_hints: SizeHints {
                    changed_files: Some(u32::try_from(files.len()).unwrap_or(0)),
                    additions: Some(files.iter().map(|f| f.additions).sum()),
                    deletions: Some(files.iter().map(|f| f.deletions).sum()),
                },
            },
            file_reader: None,
            changed_files_lister: Some(Arc::new(FixtureLister(files))),
            comparer: None,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: Some(Arc::new(RuntimeFields {
                spec: Specification {
                    schema_version: "1".to_string(),
                    intent: Intent::default(),
                    gates: Vec::new(),
                    required_status_contexts: Vec::new(),
                    hash: "deadbeef".to_string(),
                },
                deadline: Deadline::from_budget(&clock, std::time::Duration::from_secs(60)),
                abort: Arc::new(AtomicBool::new(false)),
                annotation_budget: 50,
                idempotency_key: IdempotencyKey::new("acme/widgets:1:h:nospec"),
                review_limits_config: Mutex::new(None),
                log: Logger::root(Arc::new(NullSink), LogLevel::Info),
            })),
        }
    }

    fn sample_file(path: &str, additions: u32, deletions: u32, patch: Option<&str>) -> FileChange {
        FileChange {
            path: path.to_string(),
            previous_path: None,
            status: FileStatus::Modified,
            additions,
            deletions,
            patch: patch.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn falls_back_to_basic_summary_without_diff_summary_capability() {
        let cc = cc_with_files(vec![sample_file("a.rs", 1, 0, None)]);
        let rule = sample_rule(Vec::new());
        let evidence = build(&cc, &rule).await;
        assert!(evidence.diff_summary.starts_with("PR \"add widget\" modifies"));
        assert!(evidence.file_patches.is_none());
    }

    #[tokio::test]
    async fn renders_header_and_bullets_with_diff_summary() {
        let cc = cc_with_files(vec![sample_file("a.rs", 1, 0, None), sample_file("b.rs", 10, 2, None)]);
        let rule = sample_rule(vec![EvidenceCapability::DiffSummary]);
        let evidence = build(&cc, &rule).await;
        assert!(evidence.diff_summary.contains("2 file(s) changed"));
        assert!(evidence.diff_summary.contains("b.rs"));
        assert!(evidence.diff_summary.contains("a.rs"));
    }

    #[tokio::test]
    async fn renders_patches_when_requested() {
        let cc = cc_with_files(vec![sample_file("a.rs", 1, 0, Some("+line one\n"))]);
        let rule = sample_rule(vec![EvidenceCapability::DiffSummary, EvidenceCapability::FilePatches]);
        let evidence = build(&cc, &rule).await;
        let patches = evidence.file_patches.expect("requested patches");
        assert!(patches.contains("Top patches (truncated):"));
        assert!(patches.contains("=== a.rs ==="));
    }

    #[test]
    fn truncate_patch_respects_char_boundaries() {
        let patch = "a".repeat(10) + "é";
        let truncated = truncate_patch(&patch, 10);
        assert!(truncated.starts_with(&"a".repeat(10)));
        assert!(truncated.ends_with("[truncated]"));
    }
}
