// crates/cogni-gates/src/ai_rule/workflow.rs
// ============================================================================
// Module: AI Workflow
// Description: Builds a prompt and response schema from a rule, invokes an
//              `LlmAdapter` under a timeout, and validates the response.
// Purpose: Implement the six-step contract in `spec.md` §4.9.
// Dependencies: cogni_core::{provider_result, rule_model}, async-trait, tokio
// ============================================================================

//! ## Overview
//! [`LlmAdapter`] is the seam this crate never crosses into a live provider
//! client; production wiring supplies a concrete adapter from outside this
//! crate, and tests use [`FixtureLlmAdapter`]. `AiGenericWorkflow` is the
//! single built-in workflow, registered under `"ai-generic-v1"`.

use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use cogni_core::CanonicalContext;
use cogni_core::Environment;
use cogni_core::MetricResult;
use cogni_core::Provenance;
use cogni_core::ProviderResult;
use cogni_core::Rule;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::ai_rule::evidence_builder;

/// A single request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Rendered prompt text.
    pub prompt: String,
    /// JSON schema the response must validate against.
    pub response_schema: Value,
    /// Provider-side timeout, in milliseconds.
    pub timeout_ms: u64,
}

/// A single LLM provider response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw JSON response, expected to match the request's `response_schema`.
    pub raw: Value,
    /// Model identifier that produced the response.
    pub model: String,
}

/// Error returned by [`LlmAdapter::complete`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmAdapterError {
    /// The provider call did not complete before its own timeout.
    #[error("llm provider timed out")]
    Timeout,
    /// The provider call failed for any other reason.
    #[error("llm provider failed: {0}")]
    Other(String),
}

/// Seam to an LLM provider; never implemented by a live client in this crate.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Completes `request` against the underlying provider.
    ///
    /// # Errors
    ///
    /// Returns [`LlmAdapterError`] when the provider call fails.
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmAdapterError>;
}

/// Test/fixture adapter returning a preset response, never a live provider.
#[derive(Debug, Clone)]
pub struct FixtureLlmAdapter {
    response: LlmResponse,
}

impl Default for FixtureLlmAdapter {
    fn default() -> Self {
        Self {
            response: LlmResponse {
                raw: json!({ "metrics": {}, "summary": "fixture" }),
                model: "fixture-model".to_string(),
            },
        }
    }
}

impl FixtureLlmAdapter {
    /// Builds a fixture adapter that always returns `response`.
    #[must_use]
    pub fn with_response(response: LlmResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl LlmAdapter for FixtureLlmAdapter {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, LlmAdapterError> {
        Ok(self.response.clone())
    }
}

/// Error returned by [`Workflow::evaluate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The workflow did not complete before its configured timeout.
    #[error("workflow timed out")]
    Timeout,
    /// The underlying provider call failed.
    #[error("provider failed: {0}")]
    ProviderFailed(String),
    /// The provider's response failed schema or range validation.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// A single AI workflow implementation, resolved by `rule.workflow_id`.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Evaluates `rule` against `cc` using `adapter`, returning a validated
    /// [`ProviderResult`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the provider call fails, times out, or
    /// its response fails validation.
    async fn evaluate(
        &self,
        cc: &CanonicalContext,
        rule: &Rule,
        adapter: &dyn LlmAdapter,
        environment: Environment,
        timeout_ms: u64,
    ) -> Result<ProviderResult, WorkflowError>;
}

/// Raw shape an adapter's JSON response is parsed into before becoming a
/// [`ProviderResult`].
#[derive(Debug, Deserialize)]
struct RawProviderOutput {
    metrics: BTreeMap<String, MetricResult>,
    summary: String,
}

/// The single built-in workflow: one LLM call scoring every metric a rule
/// declares in `evaluations`.
pub struct AiGenericWorkflow;

#[async_trait]
impl Workflow for AiGenericWorkflow {
    async fn evaluate(
        &self,
        cc: &CanonicalContext,
        rule: &Rule,
        adapter: &dyn LlmAdapter,
        environment: Environment,
        timeout_ms: u64,
    ) -> Result<ProviderResult, WorkflowError> {
        let evidence = evidence_builder::build(cc, rule).await;
        let request = LlmRequest {
            prompt: build_prompt(cc, rule, &evidence),
            response_schema: response_schema(rule),
            timeout_ms,
        };

        let started = Instant::now();
        let response = tokio::time::timeout(Duration::from_millis(timeout_ms), adapter.complete(request))
            .await
            .map_err(|_elapsed| WorkflowError::Timeout)?
            .map_err(|error| match error {
                LlmAdapterError::Timeout => WorkflowError::Timeout,
                LlmAdapterError::Other(message) => WorkflowError::ProviderFailed(message),
            })?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let raw: RawProviderOutput =
            serde_json::from_value(response.raw).map_err(|error| WorkflowError::InvalidResponse(error.to_string()))?;

        let result = ProviderResult {
            metrics: raw.metrics,
            summary: raw.summary,
            provenance: Provenance {
                workflow_id: rule.workflow_id.clone(),
                model: response.model,
                environment,
                duration_ms,
                run_id: None,
            },
        };

        if !result.scores_in_range() {
            return Err(WorkflowError::InvalidResponse("metric value outside [0, 1]".to_string()));
        }

        Ok(result)
    }
}

/// Builds the per-rule response schema: one object property per declared
/// metric, each with a bounded `value` and `observations`.
fn response_schema(rule: &Rule) -> Value {
    let mut properties = serde_json::Map::new();
    for evaluation in &rule.evaluations {
        properties.insert(
            evaluation.metric_id.clone(),
            json!({
                "type": "object",
                "required": ["value", "observations"],
                "properties": {
                    "value": { "type": "number", "minimum": 0, "maximum": 1 },
                    "observations": {
                        "type": "array",
                        "minItems": 1,
                        "maxItems": 5,
                        "items": { "type": "string" }
                    }
                },
                "additionalProperties": false
            }),
        );
    }
    json!({
        "type": "object",
        "required": ["metrics", "summary"],
        "properties": {
            "metrics": {
                "type": "object",
                "required": properties.keys().collect::<Vec<_>>(),
                "properties": properties,
                "additionalProperties": false
            },
            "summary": { "type": "string" }
        },
        "additionalProperties": false
    })
}

/// Renders the prompt text: PR metadata, evidence, scoring instructions, and
/// one numbered statement per metric.
fn build_prompt(cc: &CanonicalContext, rule: &Rule, evidence: &cogni_core::Evidence) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("Pull request: {}\n", cc.reviewable.title));
    if let Some(body) = cc.reviewable.body.as_deref() {
        prompt.push_str(&format!("Description: {body}\n"));
    }
    prompt.push_str("\nEvidence:\n");
    prompt.push_str(&evidence.diff_summary);
    if let Some(patches) = evidence.file_patches.as_deref() {
        prompt.push('\n');
        prompt.push_str(patches);
    }
    prompt.push_str(
        "\nScore each statement below from 0.0 to 1.0 based strictly on the evidence above. \
         Provide one to five short observations per metric.\n\n",
    );
    for (index, evaluation) in rule.evaluations.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. <{}>{}</{}>\n",
            index + 1,
            evaluation.metric_id,
            evaluation.statement,
            evaluation.metric_id
        ));
    }
    prompt
}

/// Maps a gate-type string to its implementation.
#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, std::sync::Arc<dyn Workflow>>,
}

impl WorkflowRegistry {
    /// Builds a registry with every built-in workflow registered.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::default();
        registry.workflows.insert("ai-generic-v1".to_string(), std::sync::Arc::new(AiGenericWorkflow));
        registry
    }

    /// Resolves `workflow_id` to its implementation, or `None` if unregistered.
    #[must_use]
    pub fn resolve(&self, workflow_id: &str) -> Option<std::sync::Arc<dyn Workflow>> {
        self.workflows.get(workflow_id).cloned()
    }
}
