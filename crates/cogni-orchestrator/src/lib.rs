// crates/cogni-orchestrator/src/lib.rs
// ============================================================================
// Crate: cogni-orchestrator
// Description: Turns a validated specification into a deterministic,
//              deadline-bounded `RunSummary`.
// Purpose: The single canonical execution path every host adapter calls into
//          to evaluate one delivery.
// Dependencies: cogni_core, cogni_registry, tokio::time
// ============================================================================

#![forbid(unsafe_code)]

//! ## Overview
//! [`run_all`] attaches runtime fields to a [`CanonicalContext`], launches
//! every spec-declared gate concurrently, and reassembles outcomes in spec
//! order regardless of completion order, per `spec.md` §4.4 and §5. A single
//! background task owns the global abort signal; every gate call is wrapped
//! in `tokio::time::timeout` against its own remaining budget so a hung gate
//! cannot stall the others.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use cogni_core::CanonicalContext;
use cogni_core::GateOutcome;
use cogni_core::IdempotencyKey;
use cogni_core::Logger;
use cogni_core::NeutralReason;
use cogni_core::ReviewLimitsConfig;
use cogni_core::RuntimeFields;
use cogni_core::Specification;
use cogni_core::Status;
use cogni_core::run_summary::ConclusionReason;
use cogni_core::run_summary::ExecutionSummary;
use cogni_core::run_summary::NamedOutcome;
use cogni_core::run_summary::RunSummary;
use cogni_core::time::Deadline;
use cogni_core::time::MonotonicClock;
use cogni_core::time::SystemClock;
use cogni_registry::GateRegistry;

/// Default global deadline for a delivery, per `spec.md` §4.4.
pub const DEFAULT_DEADLINE_MS: u64 = 120_000;

/// Default per-gate annotation budget, per `spec.md` §4.4 step 1.
pub const DEFAULT_ANNOTATION_BUDGET: u32 = 50;

/// Options controlling one `run_all` invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Global delivery deadline, in milliseconds.
    pub deadline_ms: u64,
    /// Maximum annotations the publisher may attach per chunk.
    pub annotation_budget: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE_MS,
            annotation_budget: DEFAULT_ANNOTATION_BUDGET,
        }
    }
}

/// Builds the idempotency key `spec.md` §4.4 step 1 specifies:
/// `"<full_name>:<pr>:<head_sha>:<spec._hash or 'nospec'>"`.
#[must_use]
pub fn idempotency_key(cc: &CanonicalContext, spec: &Specification) -> IdempotencyKey {
    let hash = if spec.hash.is_empty() { "nospec" } else { spec.hash.as_str() };
    IdempotencyKey::new(format!(
        "{}:{}:{}:{}",
        cc.repo.full_name,
        cc.reviewable.number,
        cc.reviewable.head.sha.as_str(),
        hash
    ))
}

/// Runs every gate declared by `spec` against `cc` and returns the
/// aggregated [`RunSummary`], using the system clock.
///
/// Attaches runtime fields to the returned context's clone before gates run;
/// the `cc` passed to each gate carries `runtime: Some(..)`.
pub async fn run_all(
    cc: CanonicalContext,
    spec: Specification,
    registry: &GateRegistry,
    options: RunOptions,
    log: Logger,
) -> RunSummary {
    run_all_with_clock(cc, spec, registry, options, log, &SystemClock).await
}

/// Same as [`run_all`], parameterized over a [`MonotonicClock`] so deadline
/// behavior is deterministic under test.
pub async fn run_all_with_clock(
    mut cc: CanonicalContext,
    spec: Specification,
    registry: &GateRegistry,
    options: RunOptions,
    log: Logger,
    clock: &dyn MonotonicClock,
) -> RunSummary {
    let key = idempotency_key(&cc, &spec);
    let deadline = Deadline::from_budget(clock, Duration::from_millis(options.deadline_ms));
    let abort = Arc::new(AtomicBool::new(false));

    cc.runtime = Some(Arc::new(RuntimeFields {
        spec: spec.clone(),
        deadline,
        abort: Arc::clone(&abort),
        annotation_budget: options.annotation_budget,
        idempotency_key: key,
        review_limits_config: std::sync::Mutex::new(None::<ReviewLimitsConfig>),
        log: log.clone(),
    }));

    let declared = spec.gates.len();
    if declared == 0 {
        return RunSummary {
            overall_status: Status::Neutral,
            gates: Vec::new(),
            execution_summary: ExecutionSummary {
                declared: 0,
                launched: 0,
                completed: 0,
                partial_execution: false,
                aborted: false,
                total_duration_ms: 0,
            },
            conclusion_reason: ConclusionReason::NoGatesExecuted,
        };
    }

    let watchdog_abort = Arc::clone(&abort);
    let watchdog_remaining = deadline.remaining(clock);
    let watchdog = tokio::spawn(async move {
        tokio::time::sleep(watchdog_remaining).await;
        watchdog_abort.store(true, Ordering::SeqCst);
    });

    let started = clock.now();
    let mut handles = Vec::with_capacity(declared);
    let mut launched = 0u32;

    for (index, gate_spec) in spec.gates.iter().enumerate() {
        let gate_id = CanonicalContext::resolve_gate_id(gate_spec.id.as_deref(), &gate_spec.gate_type, index);

        if abort.load(Ordering::SeqCst) {
            handles.push(None);
            continue;
        }

        let Some(gate) = registry.resolve(&gate_spec.gate_type) else {
            handles.push(Some(GateSlot::Resolved(GateOutcome::neutral(NeutralReason::UnimplementedGate))));
            continue;
        };

        launched += 1;
        let cc = cc.clone();
        let config = gate_spec.with.clone();
        let gate_logger = log.child([("gate_id", serde_json::Value::String(gate_id.to_string()))]);
        let remaining = deadline.remaining(clock);

        let handle = tokio::spawn(async move { tokio::time::timeout(remaining, gate.run(&cc, &config, &gate_logger)).await });
        handles.push(Some(GateSlot::Pending(handle)));
    }

    let mut completed = 0u32;
    let mut named_outcomes = Vec::with_capacity(declared);

    for (index, gate_spec) in spec.gates.iter().enumerate() {
        let gate_id = CanonicalContext::resolve_gate_id(gate_spec.id.as_deref(), &gate_spec.gate_type, index);
        let outcome = match handles[index].take() {
            None => GateOutcome::neutral(NeutralReason::Timeout),
            Some(GateSlot::Resolved(outcome)) => {
                completed += 1;
                outcome
            }
            Some(GateSlot::Pending(handle)) => match handle.await {
                Ok(Ok(outcome)) => {
                    completed += 1;
                    outcome
                }
                Ok(Err(_elapsed)) => GateOutcome::neutral(NeutralReason::Timeout),
                Err(_join_error) => {
                    let mut outcome = GateOutcome::neutral(NeutralReason::InternalError);
                    outcome.stats.insert("error".to_string(), serde_json::Value::String("gate task panicked".to_string()));
                    outcome
                }
            },
        }
        .normalize();

        named_outcomes.push(NamedOutcome {
            gate_id,
            gate_type: gate_spec.gate_type.clone(),
            outcome,
        });
    }

    watchdog.abort();

    let aborted = abort.load(Ordering::SeqCst);
    let total_duration_ms = u64::try_from(clock.now().saturating_duration_since(started).as_millis()).unwrap_or(u64::MAX);
    let partial_execution = completed < launched;

    let execution_summary = ExecutionSummary {
        declared: u32::try_from(declared).unwrap_or(u32::MAX),
        launched,
        completed,
        partial_execution,
        aborted,
        total_duration_ms,
    };

    let (overall_status, conclusion_reason) = aggregate(&named_outcomes, &execution_summary);

    RunSummary {
        overall_status,
        gates: named_outcomes,
        execution_summary,
        conclusion_reason,
    }
}

/// A gate's slot in the ordered outcome list, either resolved synchronously
/// (unimplemented type) or launched as a task awaiting completion.
enum GateSlot {
    Resolved(GateOutcome),
    Pending(tokio::task::JoinHandle<Result<GateOutcome, tokio::time::error::Elapsed>>),
}

/// Applies the aggregation precedence table from `spec.md` §4.4.
fn aggregate(gates: &[NamedOutcome], execution: &ExecutionSummary) -> (Status, ConclusionReason) {
    if gates.is_empty() {
        return (Status::Neutral, ConclusionReason::NoGatesExecuted);
    }
    if gates.iter().any(|named| named.outcome.status == Status::Fail) {
        return (Status::Fail, ConclusionReason::GatesFailed);
    }
    if execution.partial_execution && execution.aborted {
        return (Status::Neutral, ConclusionReason::GlobalTimeout);
    }
    let any_neutral = gates.iter().any(|named| named.outcome.status == Status::Neutral);
    let any_timeout =
        gates.iter().any(|named| named.outcome.neutral_reason == Some(NeutralReason::Timeout));
    if any_neutral && any_timeout {
        return (Status::Neutral, ConclusionReason::GateTimeouts);
    }
    if any_neutral {
        return (Status::Neutral, ConclusionReason::GatesNeutral);
    }
    (Status::Pass, ConclusionReason::AllGatesPassed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::atomic::AtomicU64;

    use async_trait::async_trait;
    use cogni_core::GateSpec;
    use cogni_core::HostId;
    use cogni_core::Intent;
    use cogni_core::LogLevel;
    use cogni_core::NullSink;
    use cogni_core::RepoId;
    use cogni_core::RepoIdentity;
    use cogni_core::RevisionId;
    use cogni_core::RevisionPointer;
    use cogni_core::Reviewable;
    use cogni_core::SizeHints;
    use std::time::Instant;

    use super::*;

    struct FakeClock {
        offset_millis: AtomicU64,
        base: Instant,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                offset_millis: AtomicU64::new(0),
                base: Instant::now(),
            }
        }
    }

    impl MonotonicClock for FakeClock {
        fn now(&self) -> Instant {
            self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
        }
    }

    struct AlwaysPass;

    #[async_trait]
    impl cogni_registry::Gate for AlwaysPass {
        async fn run(&self, _cc: &CanonicalContext, _config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
            GateOutcome::pass()
        }
    }

    struct AlwaysFail;

    #[async_trait]
    impl cogni_registry::Gate for AlwaysFail {
        async fn run(&self, _cc: &CanonicalContext, _config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
            GateOutcome::fail(vec![cogni_core::Violation::error("bad", "nope")])
        }
    }

    struct NeverReturns;

    #[async_trait]
    impl cogni_registry::Gate for NeverReturns {
        async fn run(&self, _cc: &CanonicalContext, _config: &serde_json::Value, _logger: &Logger) -> GateOutcome {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn sample_cc() -> CanonicalContext {
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
                number: 42,
                title: "t".to_string(),
                body: None,
                state: "open".to_string(),
                head: RevisionPointer {
                    sha: RevisionId::new("headsha"),
                    git_ref: "refs/heads/f".to_string(),
                },
                base: RevisionPointer {
                    sha: RevisionId::new("basesha"),
                    git_ref: "main".to_string(),
                },
                size_hints: SizeHints::default(),
            },
            file_reader: None,
            changed_files_lister: None,
            comparer: None,
            check_publisher: None,
            comment_poster: None,
            artifact_resolver: None,
            runtime: None,
        }
    }

    fn sample_spec(gate_types: &[&str]) -> Specification {
        Specification {
            schema_version: "1".to_string(),
            intent: Intent::default(),
            gates: gate_types
                .iter()
                .map(|gate_type| GateSpec {
                    gate_type: (*gate_type).to_string(),
                    id: None,
                    with: serde_json::Value::Null,
                })
                .collect(),
            required_status_contexts: Vec::new(),
            hash: "deadbeef".to_string(),
        }
    }

    fn logger() -> Logger {
        Logger::root(Arc::new(NullSink), LogLevel::Debug)
    }

    #[tokio::test]
    async fn zero_gates_is_neutral_no_gates_executed() {
        let summary = run_all(sample_cc(), sample_spec(&[]), &GateRegistry::new(), RunOptions::default(), logger()).await;
        assert_eq!(summary.overall_status, Status::Neutral);
        assert_eq!(summary.conclusion_reason, ConclusionReason::NoGatesExecuted);
    }

    #[tokio::test]
    async fn all_pass_is_pass() {
        let mut registry = GateRegistry::new();
        registry.register("ok", Arc::new(AlwaysPass));
        let summary = run_all(sample_cc(), sample_spec(&["ok", "ok"]), &registry, RunOptions::default(), logger()).await;
        assert_eq!(summary.overall_status, Status::Pass);
        assert_eq!(summary.conclusion_reason, ConclusionReason::AllGatesPassed);
        assert_eq!(summary.gates.len(), 2);
    }

    #[tokio::test]
    async fn any_fail_wins_over_neutral() {
        let mut registry = GateRegistry::new();
        registry.register("ok", Arc::new(AlwaysPass));
        registry.register("bad", Arc::new(AlwaysFail));
        let summary = run_all(sample_cc(), sample_spec(&["unknown-type", "bad"]), &registry, RunOptions::default(), logger()).await;
        assert_eq!(summary.overall_status, Status::Fail);
        assert_eq!(summary.conclusion_reason, ConclusionReason::GatesFailed);
    }

    #[tokio::test]
    async fn unknown_gate_type_is_neutral_unimplemented() {
        let registry = GateRegistry::new();
        let summary = run_all(sample_cc(), sample_spec(&["no-such-gate"]), &registry, RunOptions::default(), logger()).await;
        assert_eq!(summary.overall_status, Status::Neutral);
        assert_eq!(summary.conclusion_reason, ConclusionReason::GatesNeutral);
        assert_eq!(summary.gates[0].outcome.neutral_reason, Some(NeutralReason::UnimplementedGate));
    }

    #[tokio::test(start_paused = true)]
    async fn global_timeout_reports_gate_timeouts_or_global_timeout() {
        let mut registry = GateRegistry::new();
        registry.register("stuck", Arc::new(NeverReturns));
        let options = RunOptions {
            deadline_ms: 10,
            annotation_budget: DEFAULT_ANNOTATION_BUDGET,
        };
        let clock = FakeClock::new();
        let summary =
            run_all_with_clock(sample_cc(), sample_spec(&["stuck"]), &registry, options, logger(), &clock).await;
        assert_eq!(summary.overall_status, Status::Neutral);
        assert!(matches!(
            summary.conclusion_reason,
            ConclusionReason::GateTimeouts | ConclusionReason::GlobalTimeout
        ));
    }

    #[tokio::test]
    async fn preserves_spec_order_regardless_of_completion_order() {
        let mut registry = GateRegistry::new();
        registry.register("a", Arc::new(AlwaysPass));
        registry.register("b", Arc::new(AlwaysFail));
        registry.register("c", Arc::new(AlwaysPass));
        let summary = run_all(sample_cc(), sample_spec(&["a", "b", "c"]), &registry, RunOptions::default(), logger()).await;
        let types: Vec<&str> = summary.gates.iter().map(|g| g.gate_type.as_str()).collect();
        assert_eq!(types, vec!["a", "b", "c"]);
    }

    #[test]
    fn idempotency_key_matches_spec_format() {
        let cc = sample_cc();
        let spec = sample_spec(&[]);
        let key = idempotency_key(&cc, &spec);
        assert_eq!(key.as_str(), "acme/widgets:42:headsha:deadbeef");
    }

    fn outcome_for_tag(tag: u8) -> GateOutcome {
        match tag % 3 {
            0 => GateOutcome::pass(),
            1 => GateOutcome::fail(vec![cogni_core::Violation::error("bad", "nope")]),
            _ => GateOutcome::neutral(NeutralReason::UnimplementedGate),
        }
    }

    fn named_outcomes_for(tags: &[u8]) -> Vec<NamedOutcome> {
        tags.iter()
            .enumerate()
            .map(|(index, &tag)| NamedOutcome {
                gate_id: cogni_core::GateId::new(format!("g{index}")),
                gate_type: "fixture".to_string(),
                outcome: outcome_for_tag(tag),
            })
            .collect()
    }

    proptest::proptest! {
        /// Determinism of aggregation (`spec.md` §8): identical gate outcomes
        /// always aggregate to the identical `(overall_status, conclusion_reason)`
        /// pair, independent of any run-specific state.
        #[test]
        fn aggregation_is_deterministic_for_identical_outcomes(tags in proptest::collection::vec(0u8..3, 0..8)) {
            let gates = named_outcomes_for(&tags);
            let execution = ExecutionSummary {
                declared: u32::try_from(gates.len()).unwrap_or(u32::MAX),
                launched: u32::try_from(gates.len()).unwrap_or(u32::MAX),
                completed: u32::try_from(gates.len()).unwrap_or(u32::MAX),
                partial_execution: false,
                aborted: false,
                total_duration_ms: 0,
            };
            let first = aggregate(&gates, &execution);
            let second = aggregate(&gates, &execution);
            proptest::prop_assert_eq!(first, second);

            if gates.is_empty() {
                proptest::prop_assert_eq!(first, (Status::Neutral, ConclusionReason::NoGatesExecuted));
            } else if tags.iter().any(|&tag| tag % 3 == 1) {
                proptest::prop_assert_eq!(first, (Status::Fail, ConclusionReason::GatesFailed));
            } else if tags.iter().any(|&tag| tag % 3 == 2) {
                proptest::prop_assert_eq!(first, (Status::Neutral, ConclusionReason::GatesNeutral));
            } else {
                proptest::prop_assert_eq!(first, (Status::Pass, ConclusionReason::AllGatesPassed));
            }
        }
    }
}
