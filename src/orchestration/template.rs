//! # Template Reference Extraction and Resolution
//!
//! Task input values are plain strings that may embed references to workflow
//! input (`{{input.region}}`) or to another task's output
//! (`{{tasks.fetch.output.body}}`). Extraction and resolution are separate
//! steps: the graph builder extracts references to infer dependency edges,
//! and the orchestrator resolves them against the execution context once the
//! referenced outputs exist.
//!
//! Parsing is best-effort and non-recursive: only top-level `{{ ... }}`
//! tokens are considered, a value may contain several, and tokens that match
//! neither namespace pass through untouched. An opening `{{` with no closing
//! `}}` is a syntax error; sibling values are still scanned so a caller sees
//! every problem in one pass.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::constants::system::{INPUT_NAMESPACE, OUTPUT_SEGMENT, TASKS_NAMESPACE};
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};
use crate::orchestration::types::ExecutionContext;

/// Matches one well-formed top-level reference token
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("valid token pattern"));

/// A parsed reference embedded in an input value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `{{tasks.<id>.output...}}` -- a dependency on another task's output
    TaskOutput { task_id: String, path: Vec<String> },
    /// `{{input.<field>...}}` -- a workflow input value, no dependency edge
    Input { path: Vec<String> },
}

/// References extracted from a single input value, plus any syntax errors
/// encountered while scanning it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRefs {
    /// Referenced task ids, in first-occurrence order, deduplicated
    pub task_refs: Vec<String>,
    /// Referenced input field paths, in first-occurrence order
    pub input_refs: Vec<String>,
    /// Reasons for malformed syntax; extraction of well-formed tokens in the
    /// same value still succeeds
    pub errors: Vec<String>,
}

/// Extract the references embedded in one input value.
pub fn extract_references(value: &str) -> ExtractedRefs {
    let mut refs = ExtractedRefs::default();

    for token in TOKEN_RE.captures_iter(value) {
        match parse_reference(token.get(1).expect("token group").as_str()) {
            Ok(Some(Reference::TaskOutput { task_id, .. })) => {
                if !refs.task_refs.contains(&task_id) {
                    refs.task_refs.push(task_id);
                }
            }
            Ok(Some(Reference::Input { path })) => {
                let field = path.join(".");
                if !refs.input_refs.contains(&field) {
                    refs.input_refs.push(field);
                }
            }
            Ok(None) => {} // foreign token, passes through
            Err(reason) => refs.errors.push(reason),
        }
    }

    // Any `{{` left outside a well-formed token has no matching `}}`
    let stripped = TOKEN_RE.replace_all(value, "");
    if stripped.contains("{{") {
        refs.errors
            .push("unterminated reference: '{{' without matching '}}'".to_string());
    }

    refs
}

/// Parse the inside of one `{{ ... }}` token. Returns `Ok(None)` for tokens
/// outside both namespaces.
fn parse_reference(inner: &str) -> Result<Option<Reference>, String> {
    let trimmed = inner.trim();
    let segments: Vec<&str> = trimmed.split('.').collect();

    match segments.first().copied() {
        Some(TASKS_NAMESPACE) => {
            if segments.len() < 3
                || segments[1].is_empty()
                || segments[2] != OUTPUT_SEGMENT
            {
                return Err(format!(
                    "task reference must take the form {{{{tasks.<id>.output...}}}}, got '{trimmed}'"
                ));
            }
            Ok(Some(Reference::TaskOutput {
                task_id: segments[1].to_string(),
                path: segments[3..].iter().map(|s| s.to_string()).collect(),
            }))
        }
        Some(INPUT_NAMESPACE) => {
            if segments.len() < 2 || segments[1].is_empty() {
                return Err(format!(
                    "input reference must take the form {{{{input.<field>}}}}, got '{trimmed}'"
                ));
            }
            Ok(Some(Reference::Input {
                path: segments[1..].iter().map(|s| s.to_string()).collect(),
            }))
        }
        _ => Ok(None),
    }
}

/// Resolve one input value against the execution context.
///
/// A value that is exactly one reference resolves to the referenced JSON
/// value, preserving its type. Embedded references are stringified into the
/// surrounding text. A reference to a task whose output is not in context is
/// an internal-consistency error: the graph guarantees dependencies complete
/// strictly earlier, so this is unreachable for a validated graph.
pub fn resolve_value(
    task_id: &str,
    raw: &str,
    ctx: &ExecutionContext,
) -> OrchestrationResult<Value> {
    // Whole-value reference: preserve the referenced value's type
    if let Some(caps) = TOKEN_RE.captures(raw.trim()) {
        if caps.get(0).expect("match").as_str() == raw.trim() {
            if let Ok(Some(reference)) = parse_reference(&caps[1]) {
                return resolve_reference(task_id, &reference, ctx);
            }
        }
    }

    // Embedded references: substitute each token as text
    let mut result = String::with_capacity(raw.len());
    let mut last_end = 0;
    for caps in TOKEN_RE.captures_iter(raw) {
        let whole = caps.get(0).expect("match");
        result.push_str(&raw[last_end..whole.start()]);
        match parse_reference(&caps[1]) {
            Ok(Some(reference)) => {
                let value = resolve_reference(task_id, &reference, ctx)?;
                result.push_str(&render_fragment(&value));
            }
            // Foreign or malformed tokens pass through verbatim; malformed
            // syntax is rejected at build time, not here
            _ => result.push_str(whole.as_str()),
        }
        last_end = whole.end();
    }
    result.push_str(&raw[last_end..]);

    Ok(Value::String(result))
}

/// Resolve a whole task input map into a JSON object
pub fn resolve_input(
    task_id: &str,
    input: &std::collections::BTreeMap<String, String>,
    ctx: &ExecutionContext,
) -> OrchestrationResult<Value> {
    let mut resolved = serde_json::Map::with_capacity(input.len());
    for (field, raw) in input {
        resolved.insert(field.clone(), resolve_value(task_id, raw, ctx)?);
    }
    Ok(Value::Object(resolved))
}

fn resolve_reference(
    task_id: &str,
    reference: &Reference,
    ctx: &ExecutionContext,
) -> OrchestrationResult<Value> {
    match reference {
        Reference::TaskOutput {
            task_id: dependency,
            path,
        } => {
            let output = ctx.output_of(dependency).ok_or_else(|| {
                OrchestrationError::missing_dependency_output(task_id, dependency)
            })?;
            Ok(traverse(&output.value, path, task_id, dependency))
        }
        Reference::Input { path } => Ok(traverse(ctx.input(), path, task_id, INPUT_NAMESPACE)),
    }
}

/// Walk a dotted path into a JSON value. A missing path resolves to null:
/// the referenced output exists but does not carry the addressed field.
fn traverse(value: &Value, path: &[String], task_id: &str, source: &str) -> Value {
    let mut current = value;
    for segment in path {
        let next = match current {
            Value::Object(map) => map.get(segment.as_str()),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => {
                warn!(
                    task_id = task_id,
                    source = source,
                    segment = %segment,
                    "Reference path segment not found; resolving to null"
                );
                return Value::Null;
            }
        }
    }
    current.clone()
}

/// Render a resolved value into surrounding text
fn render_fragment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TaskStatus;
    use crate::orchestration::types::TaskOutput;
    use serde_json::json;

    fn ctx_with_fetch() -> ExecutionContext {
        let mut ctx = ExecutionContext::new(json!({"region": "us-east-1", "retries": 3}));
        ctx.insert_output(
            "fetch",
            TaskOutput {
                status: TaskStatus::Succeeded,
                value: json!({"body": {"items": [1, 2, 3]}, "status": 200}),
            },
        );
        ctx
    }

    #[test]
    fn test_extract_task_reference() {
        let refs = extract_references("{{tasks.fetch.output.body}}");
        assert_eq!(refs.task_refs, vec!["fetch"]);
        assert!(refs.input_refs.is_empty());
        assert!(refs.errors.is_empty());
    }

    #[test]
    fn test_extract_input_reference_yields_no_edge() {
        let refs = extract_references("{{input.region}}");
        assert!(refs.task_refs.is_empty());
        assert_eq!(refs.input_refs, vec!["region"]);
    }

    #[test]
    fn test_extract_multiple_references_in_one_value() {
        let refs =
            extract_references("{{tasks.a.output}}-{{input.env}}-{{tasks.b.output.x}}");
        assert_eq!(refs.task_refs, vec!["a", "b"]);
        assert_eq!(refs.input_refs, vec!["env"]);
    }

    #[test]
    fn test_extract_dedupes_preserving_order() {
        let refs = extract_references("{{tasks.b.output}} {{tasks.a.output}} {{tasks.b.output}}");
        assert_eq!(refs.task_refs, vec!["b", "a"]);
    }

    #[test]
    fn test_unterminated_reference_is_error() {
        let refs = extract_references("prefix {{tasks.fetch.output");
        assert!(refs.task_refs.is_empty());
        assert_eq!(refs.errors.len(), 1);
        assert!(refs.errors[0].contains("unterminated"));
    }

    #[test]
    fn test_partial_extraction_alongside_error() {
        let refs = extract_references("{{tasks.a.output}} and {{tasks.broken");
        assert_eq!(refs.task_refs, vec!["a"]);
        assert_eq!(refs.errors.len(), 1);
    }

    #[test]
    fn test_bad_task_reference_form_is_error() {
        let refs = extract_references("{{tasks.fetch}}");
        assert!(refs.task_refs.is_empty());
        assert_eq!(refs.errors.len(), 1);
        assert!(refs.errors[0].contains("tasks.<id>.output"));
    }

    #[test]
    fn test_foreign_token_ignored() {
        let refs = extract_references("{{ secrets.apikey }}");
        assert!(refs.task_refs.is_empty());
        assert!(refs.input_refs.is_empty());
        assert!(refs.errors.is_empty());
    }

    #[test]
    fn test_plain_value_extracts_nothing() {
        let refs = extract_references("https://example.com");
        assert_eq!(refs, ExtractedRefs::default());
    }

    #[test]
    fn test_resolve_whole_value_preserves_type() {
        let ctx = ctx_with_fetch();
        let resolved = resolve_value("t", "{{tasks.fetch.output.status}}", &ctx).unwrap();
        assert_eq!(resolved, json!(200));

        let resolved = resolve_value("t", "{{tasks.fetch.output.body.items}}", &ctx).unwrap();
        assert_eq!(resolved, json!([1, 2, 3]));
    }

    #[test]
    fn test_resolve_embedded_reference_stringifies() {
        let ctx = ctx_with_fetch();
        let resolved =
            resolve_value("t", "status={{tasks.fetch.output.status}}", &ctx).unwrap();
        assert_eq!(resolved, json!("status=200"));
    }

    #[test]
    fn test_resolve_input_reference() {
        let ctx = ctx_with_fetch();
        let resolved = resolve_value("t", "{{input.region}}", &ctx).unwrap();
        assert_eq!(resolved, json!("us-east-1"));
    }

    #[test]
    fn test_resolve_array_index_path() {
        let ctx = ctx_with_fetch();
        let resolved =
            resolve_value("t", "{{tasks.fetch.output.body.items.1}}", &ctx).unwrap();
        assert_eq!(resolved, json!(2));
    }

    #[test]
    fn test_resolve_missing_path_is_null() {
        let ctx = ctx_with_fetch();
        let resolved = resolve_value("t", "{{tasks.fetch.output.nope}}", &ctx).unwrap();
        assert_eq!(resolved, Value::Null);
    }

    #[test]
    fn test_resolve_missing_dependency_is_internal_error() {
        let ctx = ExecutionContext::new(json!({}));
        let err = resolve_value("t", "{{tasks.ghost.output}}", &ctx).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::MissingDependencyOutput { .. }
        ));
    }

    #[test]
    fn test_resolve_input_map() {
        let ctx = ctx_with_fetch();
        let mut input = std::collections::BTreeMap::new();
        input.insert("url".to_string(), "https://example.com".to_string());
        input.insert("count".to_string(), "{{input.retries}}".to_string());

        let resolved = resolve_input("t", &input, &ctx).unwrap();
        assert_eq!(resolved["url"], "https://example.com");
        assert_eq!(resolved["count"], 3);
    }
}
