// crates/cogni-core/src/context.rs
// ============================================================================
// Module: Canonical Context
// Description: Host-agnostic view of a pull request under review.
// Purpose: Let identical gate logic run over GitHub, GitLab, and local git.
// Dependencies: crate::{identifiers, time, log}, async-trait, serde
// ============================================================================

//! ## Overview
//! [`CanonicalContext`] is a tagged capability record, not a trait object:
//! each host operation (`get_file`, `list_changed_files`, `compare`,
//! `publish_check`, `post_comment`, artifact resolution) is its own trait
//! with its own error enum, and `CanonicalContext` holds an `Option<Arc<dyn
//! Trait>>` per capability. A host adapter is a factory that returns a
//! populated record; gates probe for a capability's presence before use and
//! degrade to `neutral{capability_unavailable}` when it is absent, rather
//! than calling into a method that might not exist.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::GateId;
use crate::identifiers::HostId;
use crate::identifiers::IdempotencyKey;
use crate::identifiers::RepoId;
use crate::identifiers::RevisionId;
use crate::log::Logger;
use crate::outcome::Level;
use crate::run_summary::RunSummary;
use crate::spec_model::Specification;
use crate::time::Deadline;

// ============================================================================
// SECTION: Identity and Reviewable
// ============================================================================

/// Owner/name identity of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoIdentity {
    /// Host-scoped repository identifier.
    pub repo_id: RepoId,
    /// Repository owner (user or organization) login.
    pub owner: String,
    /// Repository short name.
    pub name: String,
    /// `owner/name` for display and idempotency-key construction.
    pub full_name: String,
}

/// A commit and the ref it was reached through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPointer {
    /// Commit SHA.
    pub sha: RevisionId,
    /// Ref name (branch or tag) the commit was reached through.
    pub git_ref: String,
}

/// Size hints reported directly by the host, ahead of listing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SizeHints {
    /// Number of files changed, if the host reports it up front.
    pub changed_files: Option<u32>,
    /// Total added lines, if the host reports it up front.
    pub additions: Option<u32>,
    /// Total deleted lines, if the host reports it up front.
    pub deletions: Option<u32>,
}

/// Identity and review-relevant fields of the pull/merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewable {
    /// Pull/merge request number.
    pub number: u64,
    /// Pull/merge request title.
    pub title: String,
    /// Pull/merge request body, if any.
    pub body: Option<String>,
    /// Current lifecycle state as reported by the host (opaque string).
    pub state: String,
    /// Head (proposed) revision.
    pub head: RevisionPointer,
    /// Base (target) revision.
    pub base: RevisionPointer,
    /// Host-reported size hints.
    pub size_hints: SizeHints,
}

// ============================================================================
// SECTION: File Changes
// ============================================================================

/// Lifecycle status of a single file within a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// File did not exist at base.
    Added,
    /// File exists at both base and head with changed content.
    Modified,
    /// File existed at base and does not exist at head.
    Removed,
    /// File was moved, optionally with content changes.
    Renamed,
    /// File was duplicated from another path.
    Copied,
}

/// A single file's change within the diff between base and head.
///
/// # Invariants
/// - `previous_path` is `Some` only for [`FileStatus::Renamed`] and
///   [`FileStatus::Copied`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path after the change.
    pub path: String,
    /// Path before the change, for renames and copies.
    pub previous_path: Option<String>,
    /// Lifecycle status of this change.
    pub status: FileStatus,
    /// Lines added.
    pub additions: u32,
    /// Lines removed.
    pub deletions: u32,
    /// Unified diff hunks, when available and within host limits.
    pub patch: Option<String>,
}

impl FileChange {
    /// Total of additions and deletions, used for stable ordering.
    #[must_use]
    pub const fn total_changes(&self) -> u32 {
        self.additions + self.deletions
    }
}

/// Sorts file changes by `total_changes desc, path asc`, per `spec.md` §4.1.
pub fn sort_file_changes(changes: &mut [FileChange]) {
    changes.sort_by(|a, b| {
        b.total_changes().cmp(&a.total_changes()).then_with(|| a.path.cmp(&b.path))
    });
}

// ============================================================================
// SECTION: Capability Traits
// ============================================================================

/// Error returned by [`FileReader::get_file`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileReadError {
    /// The file does not exist at the requested ref.
    #[error("file not found: {0}")]
    NotFound(String),
    /// The host reported any other failure fetching the file.
    #[error("file read failed: {0}")]
    Other(String),
}

/// Reads file content from the host at a given (optional) ref.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Fetches the bytes of `path` at `git_ref` (head, when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`FileReadError::NotFound`] distinctly from other failures so
    /// callers can treat "file does not exist" as expected, not exceptional.
    async fn get_file(&self, path: &str, git_ref: Option<&str>) -> Result<Vec<u8>, FileReadError>;
}

/// Error returned by changed-file listing and comparison.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("changed files lookup failed: {0}")]
pub struct ChangedFilesError(pub String);

/// Lists the files changed in the reviewable as a whole.
#[async_trait]
pub trait ChangedFilesLister: Send + Sync {
    /// Returns every changed file, in host-reported order.
    ///
    /// # Errors
    ///
    /// Returns [`ChangedFilesError`] when the host call fails.
    async fn list_changed_files(&self) -> Result<Vec<FileChange>, ChangedFilesError>;
}

/// Compares two arbitrary revisions, used when the host lacks a dedicated
/// "list changed files for this PR" endpoint.
#[async_trait]
pub trait Comparer: Send + Sync {
    /// Returns the file changes between `base` and `head`.
    ///
    /// # Errors
    ///
    /// Returns [`ChangedFilesError`] when the host call fails.
    async fn compare(&self, base: &str, head: &str) -> Result<Vec<FileChange>, ChangedFilesError>;
}

/// A single annotation attached to a published check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// File path the annotation applies to.
    pub path: Option<String>,
    /// Line number the annotation applies to.
    pub line: Option<u32>,
    /// Severity of the annotation.
    pub level: Level,
    /// Human-readable annotation title.
    pub title: String,
    /// Annotation body text.
    pub message: String,
}

/// Stable check name published back to every host; coupled to branch
/// protection rules and therefore never changed in production.
pub const CHECK_NAME: &str = "Cogni Review";

/// Overall check conclusion, per the locked mapping in `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// All gates passed.
    Success,
    /// At least one gate failed.
    Failure,
    /// No gate failed but at least one was inconclusive.
    Neutral,
}

/// Aggregated check payload published back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPayload {
    /// Stable check name; coupled to host branch-protection rules.
    pub name: String,
    /// Head SHA the check applies to.
    pub head_sha: String,
    /// Check conclusion.
    pub conclusion: CheckConclusion,
    /// Check output title.
    pub title: String,
    /// Check output summary (short).
    pub summary: String,
    /// Check output body text (long form).
    pub text: String,
    /// Annotations, already chunked to at most 50 entries by the publisher.
    pub annotations: Vec<Annotation>,
}

/// Opaque reference to a published check, for idempotency bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRef {
    /// Host-assigned identifier for the published check.
    pub id: String,
}

/// Error returned by [`CheckPublisher::publish_check`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("check publish failed: {0}")]
pub struct PublishError(pub String);

/// Publishes an aggregated check result to the host.
#[async_trait]
pub trait CheckPublisher: Send + Sync {
    /// Publishes `payload`, idempotent by `(repo, head_sha, check_name)` when
    /// the host supports it, or by `idempotency_key` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the host call fails.
    async fn publish_check(
        &self,
        payload: &CheckPayload,
        idempotency_key: &IdempotencyKey,
    ) -> Result<CheckRef, PublishError>;
}

/// Opaque reference to a posted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRef {
    /// Host-assigned identifier for the posted comment.
    pub id: String,
}

/// Error returned by [`CommentPoster`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommentError {
    /// The host reported that the PR's head moved since evaluation started.
    #[error("head sha mismatch: expected {expected}, found {found}")]
    HeadShaMismatch {
        /// Head SHA the run was evaluated against.
        expected: String,
        /// Head SHA currently reported by the host.
        found: String,
    },
    /// The host call failed for any other reason.
    #[error("comment post failed: {0}")]
    Other(String),
}

/// Posts (or updates) the PR summary comment.
#[async_trait]
pub trait CommentPoster: Send + Sync {
    /// Returns the PR's current head SHA, used for the staleness guard.
    ///
    /// # Errors
    ///
    /// Returns [`CommentError::Other`] when the host call fails.
    async fn current_head_sha(&self, number: u64) -> Result<String, CommentError>;

    /// Posts or replaces the summary comment body on `number`.
    ///
    /// # Errors
    ///
    /// Returns [`CommentError`] when the host call fails.
    async fn post_comment(&self, number: u64, body: &str) -> Result<CommentRef, CommentError>;
}

/// Where an external artifact (SARIF/JSON report) should be resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocator {
    /// Resolve by CI workflow run identifier (primary path).
    WorkflowRun(u64),
    /// Resolve by head commit SHA (fallback path).
    HeadSha(String),
    /// Already-resolved bytes, used by tests and hosts with a pre-fetched ZIP.
    Bytes(Vec<u8>),
}

/// Error returned by [`ArtifactResolver::resolve`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtifactFetchError {
    /// No artifact matched the locator.
    #[error("artifact not found")]
    NotFound,
    /// The artifact exceeded the configured size limit.
    #[error("artifact too large: {actual_bytes} > {max_bytes}")]
    TooLarge {
        /// Maximum allowed size in bytes.
        max_bytes: u64,
        /// Actual size in bytes.
        actual_bytes: u64,
    },
    /// The host call failed for any other reason.
    #[error("artifact fetch failed: {0}")]
    Other(String),
}

/// Unifies the two artifact-resolution paths `spec.md` §9 left open: a
/// workflow-run id and a pre-resolved ZIP both funnel through one method.
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Resolves `locator` into raw (ZIP) bytes, enforcing `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactFetchError`] when resolution fails or the artifact
    /// exceeds `max_bytes`.
    async fn resolve(
        &self,
        locator: &ArtifactLocator,
        max_bytes: u64,
    ) -> Result<Vec<u8>, ArtifactFetchError>;
}

// ============================================================================
// SECTION: Canonical Context
// ============================================================================

/// Host-agnostic view of a pull request under review, plus the runtime
/// fields the orchestrator attaches before gates run.
///
/// # Invariants
/// - `identity` and `reviewable` are immutable for the lifetime of a delivery.
/// - Capability fields are populated once by the host adapter and never
///   reassigned afterward.
/// - Owned exclusively by the single orchestrator invocation that created it.
#[derive(Clone)]
pub struct CanonicalContext {
    /// Opaque tag naming the originating host.
    pub host_id: HostId,
    /// Repository identity.
    pub repo: RepoIdentity,
    /// Host-specific installation/app identifier, when applicable.
    pub installation_id: Option<String>,
    /// Pull/merge request identity and fields.
    pub reviewable: Reviewable,

    /// Capability: read file content at a ref.
    pub file_reader: Option<Arc<dyn FileReader>>,
    /// Capability: list changed files directly.
    pub changed_files_lister: Option<Arc<dyn ChangedFilesLister>>,
    /// Capability: compare two arbitrary revisions.
    pub comparer: Option<Arc<dyn Comparer>>,
    /// Capability: publish an aggregated check.
    pub check_publisher: Option<Arc<dyn CheckPublisher>>,
    /// Capability: post or update the PR summary comment.
    pub comment_poster: Option<Arc<dyn CommentPoster>>,
    /// Capability: resolve CI-produced artifacts.
    pub artifact_resolver: Option<Arc<dyn ArtifactResolver>>,

    /// Runtime fields, attached by the orchestrator before gates run.
    pub runtime: Option<Arc<RuntimeFields>>,
}

/// Runtime fields attached to [`CanonicalContext`] by the orchestrator.
pub struct RuntimeFields {
    /// Loaded, validated specification for this delivery.
    pub spec: Specification,
    /// Global deadline for this delivery.
    pub deadline: Deadline,
    /// Shared abort flag, set once the deadline passes.
    pub abort: Arc<std::sync::atomic::AtomicBool>,
    /// Maximum annotations per published chunk.
    pub annotation_budget: u32,
    /// Idempotency key for this delivery.
    pub idempotency_key: IdempotencyKey,
    /// Resolved `review-limits` config, read by evidence-budgeting gates.
    pub review_limits_config: std::sync::Mutex<Option<ReviewLimitsConfig>>,
    /// Per-delivery child logger.
    pub log: Logger,
}

/// Limits resolved by the `review-limits` gate and reused by the evidence
/// builder (`spec.md` §4.5, "side effect (read by AI gates)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewLimitsConfig {
    /// Maximum changed files allowed by the repository's policy.
    pub max_changed_files: Option<u32>,
}

impl CanonicalContext {
    /// Returns true when the orchestrator's abort signal has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.runtime
            .as_ref()
            .is_some_and(|runtime| runtime.abort.load(std::sync::atomic::Ordering::SeqCst))
    }

    /// Returns the gate identifier to use in this outcome: the spec-provided
    /// override always wins per `spec.md` §4.4 step 2.
    #[must_use]
    pub fn resolve_gate_id(spec_id: Option<&str>, gate_type: &str, index: usize) -> GateId {
        spec_id.map_or_else(|| GateId::new(format!("{gate_type}#{index}")), GateId::new)
    }
}

/// The return value of a full orchestrator run, re-exported here so host
/// binaries depending only on `cogni-core` can name it.
pub type OrchestratorResult = RunSummary;

/// Lists changed files via `changed_files_lister`, falling back to
/// `comparer` against base/head when the host lacks a dedicated listing
/// capability, per `spec.md` §4.1. Results are always returned sorted by
/// `total_changes desc, path asc`.
///
/// # Errors
///
/// Returns [`ChangedFilesError`] when neither capability is present, or
/// when the underlying host call fails.
pub async fn list_changed_files(cc: &CanonicalContext) -> Result<Vec<FileChange>, ChangedFilesError> {
    let mut changes = if let Some(lister) = cc.changed_files_lister.as_ref() {
        lister.list_changed_files().await?
    } else if let Some(comparer) = cc.comparer.as_ref() {
        comparer.compare(cc.reviewable.base.sha.as_str(), cc.reviewable.head.sha.as_str()).await?
    } else {
        return Err(ChangedFilesError("no changed-files capability available".to_string()));
    };
    sort_file_changes(&mut changes);
    Ok(changes)
}

#[cfg(test)]
mod runtime_tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use async_trait::async_trait;

    use super::*;

    struct FixtureComparer;

    #[async_trait]
    impl Comparer for FixtureComparer {
        async fn compare(&self, _base: &str, _head: &str) -> Result<Vec<FileChange>, ChangedFilesError> {
            Ok(vec![
                FileChange {
                    path: "a.rs".to_string(),
                    previous_path: None,
                    status: FileStatus::Modified,
                    additions: 1,
                    deletions: 0,
                    patch: None,
                },
                FileChange {
                    path: "b.rs".to_string(),
                    previous_path: None,
                    status: FileStatus::Modified,
                    additions: 10,
                    deletions: 2,
                    patch: None,
                },
            ])
        }
    }

    fn sample_cc(comparer: Option<Arc<dyn Comparer>>) -> CanonicalContext {
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
                title: "t".to_string(),
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
                size_hints: SizeHints::default(),
            },
            file_reader: None,
            changed_files_lister: None,
            comparer,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: None,
        }
    }

    #[tokio::test]
    async fn falls_back_to_comparer_and_sorts_by_total_changes() {
        let cc = sample_cc(Some(Arc::new(FixtureComparer)));
        let files = list_changed_files(&cc).await.expect("lists files");
        assert_eq!(files[0].path, "b.rs");
        assert_eq!(files[1].path, "a.rs");
    }

    #[tokio::test]
    async fn errors_when_no_capability_present() {
        let cc = sample_cc(None);
        assert!(list_changed_files(&cc).await.is_err());
    }
}
