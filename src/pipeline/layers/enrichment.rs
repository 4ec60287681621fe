//! Enrichment (§2's "Enrichment" row, §4.5): after a successful tool-call
//! result, appends semantic/query/storage context, honoring per-session
//! dedup, then best-effort notifies the client session (§4.5 "Client
//! log") when enrichment actually fired.

use std::sync::Arc;
use std::time::Instant;

use crate::context::RequestContext;
use crate::enrichment::{build_client_log_notification, EnrichmentEngine};
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::protocol::ClientNotifier;

pub struct EnrichmentLayer {
    engine: Arc<EnrichmentEngine>,
    notifier: Option<Arc<dyn ClientNotifier>>,
}

impl EnrichmentLayer {
    pub fn new(engine: Arc<EnrichmentEngine>) -> Self {
        Self {
            engine,
            notifier: None,
        }
    }

    /// Attach a client-log notifier. Without one, enrichment still runs —
    /// the client-log step is simply skipped, the same as a transport
    /// that reports no session handle.
    pub fn with_notifier(mut self, notifier: Arc<dyn ClientNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

#[async_trait::async_trait]
impl Layer for EnrichmentLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        let arguments = req.params.arguments.clone();
        let started = Instant::now();
        let mut outcome = next.call(req, ctx).await?;
        if let Some(result) = outcome.as_tool_call_mut() {
            if !result.is_error {
                self.engine.enrich(ctx, &arguments, result).await;
                if ctx.enrichment_applied {
                    if let Some(notifier) = &self.notifier {
                        let tool_name = ctx.tool_name.clone().unwrap_or_default();
                        let notification = build_client_log_notification(&tool_name, started);
                        let _ = notifier.notify(&ctx.session_id, notification).await;
                    }
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Transport;
    use crate::enrichment::{DedupMode, EnrichmentProviders};
    use crate::protocol::{CallToolParams, CallToolResult, ProtocolResult};
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl ClientNotifier for RecordingNotifier {
        async fn notify(&self, session_id: &str, _notification: crate::protocol::LogNotification) -> bool {
            self.sent.lock().push(session_id.to_string());
            true
        }
    }

    struct PassthroughDispatch;

    #[async_trait::async_trait]
    impl Layer for PassthroughDispatch {
        async fn handle(&self, _req: &mut RequestEnvelope, _ctx: &mut RequestContext, _next: Next<'_>) -> LayerOutcome {
            Ok(ProtocolResult::ToolCall(CallToolResult::text("ok")))
        }
    }

    #[tokio::test]
    async fn no_enrichment_means_no_client_log() {
        let engine = Arc::new(EnrichmentEngine::new(EnrichmentProviders::default(), None, DedupMode::None));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let layer = EnrichmentLayer::new(engine).with_notifier(Arc::new(RecordingNotifier { sent: sent.clone() }));

        let layers: Vec<Arc<dyn Layer>> = vec![Arc::new(layer), Arc::new(PassthroughDispatch)];
        let pipeline = crate::pipeline::Pipeline::new(
            layers,
            Arc::new(|_: &mut RequestEnvelope, _: &mut RequestContext| {
                Box::pin(async { Ok(ProtocolResult::ToolCall(CallToolResult::text("unused"))) })
                    as std::pin::Pin<Box<dyn std::future::Future<Output = LayerOutcome> + Send>>
            }),
        );

        let mut ctx = RequestContext::new(Transport::Stdio, CancellationToken::new());
        let mut envelope = RequestEnvelope::new(CallToolParams {
            name: "datahub_search".to_string(),
            arguments: json!({}),
        });
        pipeline.run(&mut envelope, &mut ctx).await.unwrap();
        assert!(sent.lock().is_empty());
    }
}
