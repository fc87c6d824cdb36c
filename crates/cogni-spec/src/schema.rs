// crates/cogni-spec/src/schema.rs
// ============================================================================
// Module: Spec/Rule Schemas
// Description: JSON schema builders for `.cogni/repo-spec.yaml` and rule files.
// Purpose: Give the loaders a single source of truth for structural validation.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Schemas are built as plain [`serde_json::Value`] trees, matched against a
//! YAML document after it has been converted to JSON. Keep these in sync with
//! `cogni_core::spec_model` and `cogni_core::rule_model`; a field added to one
//! without the other causes `additionalProperties: false` rejections.

use serde_json::Value;
use serde_json::json;

/// Returns the JSON schema for `.cogni/repo-spec.yaml`.
#[must_use]
pub fn repo_spec_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "cogni-review://schemas/repo-spec.schema.json",
        "title": "Cogni Review repository specification",
        "type": "object",
        "required": ["schema_version", "gates"],
        "properties": {
            "schema_version": { "type": "string", "minLength": 1 },
            "intent": intent_schema(),
            "gates": {
                "type": "array",
                "items": gate_spec_schema(),
                "default": []
            },
            "required_status_contexts": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 },
                "default": []
            }
        },
        "additionalProperties": false
    })
}

/// Schema for the `intent` block.
fn intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": ["string", "null"] },
            "goals": {
                "type": "array",
                "items": { "type": "string" },
                "default": []
            },
            "non_goals": {
                "type": "array",
                "items": { "type": "string" },
                "default": []
            }
        },
        "additionalProperties": false
    })
}

/// Schema for a single `gates[]` entry.
fn gate_spec_schema() -> Value {
    json!({
        "type": "object",
        "required": ["type"],
        "properties": {
            "type": { "type": "string", "minLength": 1 },
            "id": { "type": ["string", "null"] },
            "with": {}
        },
        "additionalProperties": false
    })
}

/// Returns the JSON schema for a `.cogni/rules/<name>.yaml` rule file.
#[must_use]
pub fn rule_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "cogni-review://schemas/rule.schema.json",
        "title": "Cogni Review ai-rule definition",
        "type": "object",
        "required": ["schema_version", "workflow_id", "evaluations", "success_criteria"],
        "properties": {
            "id": { "type": ["string", "null"] },
            "schema_version": { "type": "string", "minLength": 1 },
            "workflow_id": { "type": "string", "minLength": 1 },
            "evaluations": {
                "type": "array",
                "minItems": 1,
                "items": evaluation_schema()
            },
            "success_criteria": success_criteria_schema(),
            "x_capabilities": {
                "type": "array",
                "items": { "type": "string", "enum": ["diff_summary", "file_patches"] },
                "default": []
            },
            "x_budgets": budgets_schema()
        },
        "additionalProperties": false
    })
}

/// Schema for a single `evaluations[]` entry.
fn evaluation_schema() -> Value {
    json!({
        "type": "object",
        "required": ["metric_id", "statement"],
        "properties": {
            "metric_id": { "type": "string", "minLength": 1 },
            "statement": { "type": "string", "minLength": 1 }
        },
        "additionalProperties": false
    })
}

/// Schema for `success_criteria`.
fn success_criteria_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "require": {
                "type": "array",
                "items": criterion_schema(),
                "default": []
            },
            "any_of": {
                "type": "array",
                "items": criterion_schema(),
                "default": []
            },
            "neutral_on_missing_metrics": { "type": "boolean", "default": false }
        },
        "additionalProperties": false
    })
}

/// Schema for a single comparator criterion, requiring exactly one key.
fn criterion_schema() -> Value {
    json!({
        "type": "object",
        "required": ["metric"],
        "properties": {
            "metric": { "type": "string", "minLength": 1 },
            "gte": { "type": "number" },
            "gt": { "type": "number" },
            "lte": { "type": "number" },
            "lt": { "type": "number" },
            "eq": { "type": "number" }
        },
        "additionalProperties": false
    })
}

/// Schema for `x_budgets`.
fn budgets_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "max_files": { "type": "integer", "minimum": 1 },
            "max_patch_bytes_per_file": { "type": "integer", "minimum": 1 },
            "max_patches": { "type": "integer", "minimum": 0 }
        },
        "additionalProperties": false
    })
}
