//! Audit event construction, parameter redaction, and the sink interface
//! (§6 "Audit event schema", §5 "Async audit").
//!
//! Construction happens synchronously on the request task — the context is
//! gone by the time the detached emission task runs, so every field the
//! event needs is read out and owned here before the audit layer hands it
//! off.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;

/// Key substrings that mark a parameter as a secret (§6: "contains
/// `password`, `token`, `secret`, `api_key`"), matched case-insensitively
/// against the top-level parameter key, following the teacher's
/// `RequestHandlerExtra` redaction list in `server/cancellation.rs`.
const SENSITIVE_KEY_PATTERNS: &[&str] = &["password", "token", "secret", "api_key"];

/// The literal value substituted for a redacted parameter.
pub const REDACTED: &str = "[REDACTED]";

/// Replace any top-level object key matching [`SENSITIVE_KEY_PATTERNS`]
/// with [`REDACTED`]. Only object keys are inspected; array and scalar
/// parameter values pass through unchanged, matching §6's "any key
/// matching a known-secret pattern" (the schema only ever describes
/// top-level tool arguments, which arrive as a JSON object).
pub fn redact_parameters(parameters: &Value) -> Value {
    match parameters {
        Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(k, v)| {
                    let lower = k.to_lowercase();
                    if SENSITIVE_KEY_PATTERNS.iter().any(|p| lower.contains(p)) {
                        (k.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (k.clone(), v.clone())
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        other => other.clone(),
    }
}

/// A structured audit record, one per tool call, serialized with
/// snake_case keys exactly as named in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolkit_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolkit_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    pub parameters: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
    pub duration_ms: i64,
    pub response_chars: usize,
    pub request_chars: usize,
    pub content_blocks: i64,
    pub transport: String,
    pub source: String,
    pub enrichment_applied: bool,
    pub authorized: bool,
}

impl AuditEvent {
    /// Build an event from a finalized context plus the request/response
    /// bodies the audit layer captured. `parameters` is redacted here, not
    /// by the caller — this is the one place §6's sanitization rule is
    /// applied.
    pub fn build(
        ctx: &RequestContext,
        parameters: &Value,
        request_chars: usize,
        response_chars: usize,
        content_blocks: i64,
    ) -> Self {
        AuditEvent {
            timestamp: Utc::now(),
            request_id: ctx.request_id.to_string(),
            session_id: ctx.session_id.clone(),
            user_id: ctx.user_id.clone(),
            user_email: ctx.user_email.clone(),
            persona: ctx.persona_name.clone(),
            tool_name: ctx.tool_name.clone(),
            toolkit_kind: ctx.toolkit_kind.clone(),
            toolkit_name: ctx.toolkit_name.clone(),
            connection: ctx.connection.clone(),
            parameters: redact_parameters(parameters),
            success: ctx.success,
            error_message: ctx.error_message.clone(),
            error_category: ctx.error_category.map(|c| c.as_str().to_string()),
            duration_ms: ctx
                .duration
                .map(|d| d.as_millis() as i64)
                .unwrap_or_default(),
            response_chars,
            request_chars,
            content_blocks,
            transport: ctx.transport.as_str().to_string(),
            source: ctx.source.to_string(),
            enrichment_applied: ctx.enrichment_applied,
            authorized: ctx.authorized,
        }
    }
}

/// Destination for completed audit events (spec.md §1: the audit event
/// store itself is out of scope — this is the sole integration surface).
/// Implementations should not block long; the audit layer calls this from
/// a detached task, but a slow sink still delays that task's own
/// completion and, transitively, any graceful-shutdown drain.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Deliver one event. Errors are logged and swallowed by the caller
    /// (§7 "Recovery policy": "Audit-sink failures are logged and
    /// swallowed") — this trait still returns a `Result` so an
    /// implementation can distinguish retryable from fatal failures in its
    /// own logging.
    async fn emit(&self, event: AuditEvent) -> crate::error::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_known_secret_keys_case_insensitively() {
        let params = json!({
            "sql": "SELECT 1",
            "password": "secret",
            "API_KEY": "abc123",
            "user_token": "xyz",
        });
        let redacted = redact_parameters(&params);
        assert_eq!(redacted["sql"], json!("SELECT 1"));
        assert_eq!(redacted["password"], json!(REDACTED));
        assert_eq!(redacted["API_KEY"], json!(REDACTED));
        assert_eq!(redacted["user_token"], json!(REDACTED));
    }

    #[test]
    fn leaves_non_object_parameters_untouched() {
        let params = json!("raw-string-params");
        assert_eq!(redact_parameters(&params), params);
    }

    #[test]
    fn parameter_redaction_scenario() {
        // Scenario 3 (§8): trino_query(sql="SELECT 1", password="secret").
        let params = json!({"sql": "SELECT 1", "password": "secret"});
        let redacted = redact_parameters(&params);
        assert_eq!(redacted["password"], json!("[REDACTED]"));
        assert_eq!(redacted["sql"], json!("SELECT 1"));
    }
}
