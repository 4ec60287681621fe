//! Preset assembly: wires the independently-testable layers and session
//! registries from `crate::config::PipelineConfig` into the ordered
//! [`Pipeline`] §4.1's invariants require, plus the list-result shaping
//! (visibility filter, icon injector) that sits outside the `Layer` chain
//! entirely (see `crate::pipeline::layers::tool_gate`'s doc comment).
//!
//! Mirrors the teacher's `ServerBuilder` (`server/mod.rs`): a small struct
//! that collects collaborators via `with_*` setters and produces a fully
//! wired object on `build()`.

use std::sync::Arc;

use crate::audit::AuditSink;
use crate::auth::Authenticator;
use crate::authz::PolicyEngine;
use crate::config::PipelineConfig;
use crate::enrichment::{EnrichmentEngine, EnrichmentProviders};
use crate::icons::IconConfig;
use crate::protocol::{ClientNotifier, ListPromptsResult, ListResourceTemplatesResult, ListToolsResult};
use crate::session::init_gate::spawn_eviction_ticker;
use crate::session::{DedupCache, InitGate, WorkflowTracker};
use crate::toolkit::ToolkitRegistry;
use crate::visibility::VisibilityFilter;

use super::layers::{
    AuditLayer, AuthenticationLayer, AuthorizationLayer, ContextInitLayer, EnrichmentLayer, SessionGateLayer,
    TokenBridgeLayer, ToolkitLookupLayer, WorkflowTrackerLayer,
};
use super::{Layer, Pipeline};

/// Collects every collaborator the pipeline needs and assembles the
/// ordered chain. Registries (`InitGate`, `WorkflowTracker`, `DedupCache`)
/// are built from `config` here rather than taken as arguments, since
/// nothing outside this module needs to hold them directly — the layers
/// that wrap them are the only consumers.
pub struct PipelinePreset {
    config: PipelineConfig,
    authenticator: Arc<dyn Authenticator>,
    policy: Arc<dyn PolicyEngine>,
    toolkit_registry: Arc<dyn ToolkitRegistry>,
    audit_sink: Arc<dyn AuditSink>,
    enrichment_providers: EnrichmentProviders,
    client_notifier: Option<Arc<dyn ClientNotifier>>,
}

impl PipelinePreset {
    /// Start a builder with the given config and the three collaborators
    /// every pipeline needs (§1's out-of-scope interfaces).
    pub fn new(
        config: PipelineConfig,
        authenticator: Arc<dyn Authenticator>,
        policy: Arc<dyn PolicyEngine>,
        toolkit_registry: Arc<dyn ToolkitRegistry>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            authenticator,
            policy,
            toolkit_registry,
            audit_sink,
            enrichment_providers: EnrichmentProviders::default(),
            client_notifier: None,
        }
    }

    /// Attach the enrichment engine's external catalog providers (§4.5).
    /// Any left unset yield no enrichment for the toolkit kinds that would
    /// have needed them.
    pub fn with_enrichment_providers(mut self, providers: EnrichmentProviders) -> Self {
        self.enrichment_providers = providers;
        self
    }

    /// Attach a client-log notifier (§4.5 "Client log"). Without one,
    /// enrichment still runs; the notification step is just skipped.
    pub fn with_client_notifier(mut self, notifier: Arc<dyn ClientNotifier>) -> Self {
        self.client_notifier = Some(notifier);
        self
    }

    /// Assemble the ordered chain and spawn the three registries'
    /// background eviction tickers. The returned [`AssembledPipeline`]
    /// bundles the pipeline with the presentation-layer helpers
    /// (visibility filter, icon injector) that apply outside it.
    pub fn build(self) -> AssembledPipeline {
        let init_gate = Arc::new(InitGate::new(
            self.config.session_gate.init_tool.clone(),
            self.config.session_gate.exempt.clone(),
            self.config.session_gate.ttl,
        ));
        let eviction_token = spawn_eviction_ticker(init_gate.clone(), self.config.session_gate.eviction_interval);

        let workflow_tracker = Arc::new(WorkflowTracker::new(
            self.config.workflow.discovery_tools.clone(),
            self.config.workflow.query_tools.clone(),
            self.config.workflow.ttl,
        ));

        let dedup_cache = if self.config.dedup.enabled {
            Some(Arc::new(DedupCache::new(self.config.dedup.entry_ttl, self.config.dedup.session_ttl)))
        } else {
            None
        };

        let enrichment_engine = Arc::new(EnrichmentEngine::new(
            self.enrichment_providers,
            dedup_cache,
            self.config.dedup.mode,
        ));
        let mut enrichment_layer = EnrichmentLayer::new(enrichment_engine);
        if let Some(notifier) = self.client_notifier {
            enrichment_layer = enrichment_layer.with_notifier(notifier);
        }

        // Add-order fixes runtime order (outermost first); see
        // `super::mod`'s doc comment on why this chain dispatches by
        // add-order instead of the teacher's priority-sort.
        //
        // The audit layer sits outer to authentication/authorization/the
        // session gate, not inner to them: §7's "tool-level errors with
        // categories" requires every one of those failures to still reach
        // the sink with `success=false` and a category, and a layer only
        // observes what an *inner* layer returns through its own
        // `next.call` — so audit has to wrap them, while still wrapping
        // enrichment so it can read back `enrichment_applied`.
        let layers: Vec<Arc<dyn Layer>> = vec![
            Arc::new(ContextInitLayer),
            Arc::new(ToolkitLookupLayer::new(self.toolkit_registry)),
            Arc::new(TokenBridgeLayer),
            Arc::new(AuditLayer::new(self.audit_sink)),
            Arc::new(AuthenticationLayer::new(self.authenticator)),
            Arc::new(AuthorizationLayer::new(self.policy)),
            Arc::new(SessionGateLayer::new(init_gate)),
            Arc::new(WorkflowTrackerLayer::new(workflow_tracker)),
            Arc::new(enrichment_layer),
        ];

        AssembledPipeline {
            layers,
            visibility: self.config.visibility,
            icons: self.config.icons,
            eviction_token,
        }
    }
}

/// The ordered layer chain plus the two presentation-layer steps applied
/// directly to list results outside the chain (§4.6, visibility filter
/// and icon injector).
pub struct AssembledPipeline {
    layers: Vec<Arc<dyn Layer>>,
    visibility: VisibilityFilter,
    icons: IconConfig,
    /// Cancelling this stops the session-gate's background eviction
    /// ticker. Held here so dropping (or explicitly shutting down) an
    /// `AssembledPipeline` can stop it; the task itself holds its own
    /// clone, so this crate never cancels it on your behalf.
    eviction_token: tokio_util::sync::CancellationToken,
}

impl AssembledPipeline {
    /// The ordered layer chain, ready to hand to a [`Pipeline`] alongside
    /// the terminal tool-dispatch function a transport adapter supplies.
    pub fn layers(&self) -> Vec<Arc<dyn Layer>> {
        self.layers.clone()
    }

    /// Build a runnable [`Pipeline`] from this chain and the caller's
    /// terminal dispatch function (the actual tool handler invocation,
    /// out of scope here per spec.md §1).
    pub fn into_pipeline(
        self,
        dispatch: Arc<
            dyn Fn(&mut super::RequestEnvelope, &mut crate::context::RequestContext) -> super::LayerOutcomeFuture
                + Send
                + Sync,
        >,
    ) -> Pipeline {
        Pipeline::new(self.layers, dispatch)
    }

    /// Apply the visibility filter then the icon injector to a
    /// `tools/list` result (§4.6's ordering: visibility narrows the set
    /// before icons are attached to what remains).
    pub fn shape_tools_list(&self, result: &mut ListToolsResult) {
        self.visibility.apply(result);
        self.icons.apply_tools(result);
    }

    /// Apply the icon injector to a `resources/templates/list` result;
    /// this method has no visibility concept (§4.6 only names tools).
    pub fn shape_resource_templates_list(&self, result: &mut ListResourceTemplatesResult) {
        self.icons.apply_resource_templates(result);
    }

    /// Apply the icon injector to a `prompts/list` result.
    pub fn shape_prompts_list(&self, result: &mut ListPromptsResult) {
        self.icons.apply_prompts(result);
    }

    /// Stop the session gate's background eviction ticker. Safe to call
    /// more than once.
    pub fn shutdown(&self) {
        self.eviction_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContext, Transport};
    use crate::protocol::{CallToolParams, CallToolResult, ProtocolResult};
    use crate::testing::{MockAuthenticator, MockPolicyEngine, MockToolkitRegistry, RecordingAuditSink};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn builder() -> PipelinePreset {
        PipelinePreset::new(
            PipelineConfig::development(),
            Arc::new(MockAuthenticator::new("u1")),
            Arc::new(MockPolicyEngine::allow("analyst")),
            Arc::new(MockToolkitRegistry::new().with_tool(
                PipelineConfig::development().session_gate.init_tool.clone(),
                "none",
                "none",
                "none",
            )),
            Arc::new(RecordingAuditSink::new()),
        )
    }

    #[tokio::test]
    async fn assembled_pipeline_runs_the_full_chain() {
        let assembled = builder().build();
        let dispatch: Arc<
            dyn Fn(&mut super::super::RequestEnvelope, &mut RequestContext) -> super::super::LayerOutcomeFuture
                + Send
                + Sync,
        > = Arc::new(|_, _| Box::pin(async { Ok(ProtocolResult::ToolCall(CallToolResult::text("ok"))) }));
        let pipeline = assembled.into_pipeline(dispatch);

        let init_tool = PipelineConfig::development().session_gate.init_tool;
        let mut ctx = RequestContext::new(Transport::Stdio, CancellationToken::new());
        let mut envelope = super::super::RequestEnvelope::new(CallToolParams {
            name: init_tool,
            arguments: json!({}),
        });
        let result = pipeline.run(&mut envelope, &mut ctx).await.unwrap();
        assert!(!result.as_tool_call().unwrap().is_error);
    }

    #[test]
    fn shape_tools_list_applies_visibility_then_icons() {
        let assembled = builder().build();
        let mut result = ListToolsResult {
            tools: vec![crate::protocol::ToolInfo {
                name: "trino_query".to_string(),
                description: None,
                icons: Vec::new(),
            }],
        };
        assembled.shape_tools_list(&mut result);
        assert_eq!(result.tools.len(), 1);
    }
}
