//! Audit (§2's "Audit" row, §5 "Async audit"): constructs the audit event
//! synchronously on the request task, then hands it to the sink on a
//! detached task so the response to the client is never blocked on
//! delivery.
//!
//! Per §4.1's ordering invariant, this layer sits strictly inner to
//! context-init (so the context it reads always exists) and strictly
//! outer to enrichment (so it observes `enrichment_applied`), but — per
//! §7's "tool-level errors with categories" — it also wraps
//! authentication, authorization, and the session gate in the preset
//! assembly (`crate::pipeline::presets`), since their short-circuit
//! returns would otherwise never reach a layer positioned inner to them.

use std::sync::Arc;

use tracing::warn;

use crate::audit::{AuditEvent, AuditSink};
use crate::context::RequestContext;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::protocol::ProtocolResult;

pub struct AuditLayer {
    sink: Arc<dyn AuditSink>,
}

impl AuditLayer {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }
}

#[async_trait::async_trait]
impl Layer for AuditLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        let parameters = req.params.arguments.clone();
        let request_chars = parameters.to_string().chars().count();

        let outcome = next.call(req, ctx).await;

        // Audit infers `success = (err == nil && !result.isError)` (§7) and
        // extracts the error message from the content block's text when
        // the tool itself reported a non-categorized failure.
        let (response_chars, content_blocks, success, error_message) = match &outcome {
            Ok(ProtocolResult::ToolCall(result)) => {
                let text: String = result
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        crate::protocol::ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                let error_message = if result.is_error {
                    Some(text.clone())
                } else {
                    ctx.error_message.clone()
                };
                (
                    text.chars().count(),
                    result.content.len() as i64,
                    !result.is_error,
                    error_message,
                )
            }
            Ok(_) => (0, 0, true, None),
            Err(err) => (0, 0, false, Some(err.to_string())),
        };

        ctx.success = success;
        if ctx.error_message.is_none() {
            ctx.error_message = error_message;
        }
        ctx.finalize_duration();

        let event = AuditEvent::build(ctx, &parameters, request_chars, response_chars, content_blocks);
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(err) = sink.emit(event).await {
                warn!(error = %err, "audit sink failed to emit event");
            }
        });

        outcome
    }
}
