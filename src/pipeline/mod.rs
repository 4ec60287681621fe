//! The middleware pipeline and request-scoped context object (§4.1): the
//! substrate the session-state engine, enrichment engine, and SQL
//! extractors compose over.
//!
//! A layer is a transformation of the form `next → handler`; composition
//! is right-to-left so the first-added layer runs first, following the
//! teacher's `ToolMiddlewareChain` (`server/tool_middleware.rs`) generalized
//! from its multi-hook `on_request`/`on_response`/`on_error` shape down to
//! a single `handle(req, ctx, next)` entry point with one continuation —
//! the ordering invariants in §4.1 are about position, not priority, so
//! the chain dispatches layers in explicit add-order rather than
//! priority-sorting them (see DESIGN.md's Open Question decisions).

pub mod layers;
pub mod presets;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::Result;
use crate::protocol::{CallToolParams, ProtocolResult};

/// A `tools/call` request envelope as it flows through the pipeline.
/// Other recognized methods (list-tools, etc.) are represented directly as
/// their typed result and only pass through the method-dispatch layers
/// that opted in (§4.1's invariant).
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub params: CallToolParams,
    /// Per-request headers on HTTP-style transports (§6 "Authentication
    /// ingress"); empty for stdio, which has no header concept.
    pub headers: http::HeaderMap,
}

impl RequestEnvelope {
    /// Build an envelope with no headers (the stdio case).
    pub fn new(params: CallToolParams) -> Self {
        Self {
            params,
            headers: http::HeaderMap::new(),
        }
    }

    /// Build an envelope carrying the given headers (the http case).
    pub fn with_headers(params: CallToolParams, headers: http::HeaderMap) -> Self {
        Self { params, headers }
    }
}

/// What a layer produces: either the eventual protocol result, or nothing
/// when a non-`tools/call` method was delegated straight through by a
/// method-dispatch layer that doesn't apply to it.
pub type LayerOutcome = Result<ProtocolResult>;

/// The remaining chain, invoked by a layer via `next.call(...)`.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Layer>],
    terminal: &'a (dyn Fn(&mut RequestEnvelope, &mut RequestContext) -> BoxFuture<'a, LayerOutcome> + Sync),
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The boxed future shape a terminal dispatch function returns. Exposed so
/// transport adapters (and `crate::pipeline::presets`) can name the type
/// of the closure [`Pipeline::new`] and [`presets::AssembledPipeline::into_pipeline`]
/// expect without reaching into this module's private `BoxFuture` alias.
pub type LayerOutcomeFuture = BoxFuture<'static, LayerOutcome>;

impl<'a> Next<'a> {
    /// Invoke the next layer in the chain, or the terminal dispatch
    /// function once every layer has run.
    pub async fn call(self, req: &mut RequestEnvelope, ctx: &mut RequestContext) -> LayerOutcome {
        match self.remaining.split_first() {
            Some((layer, rest)) => {
                let next = Next {
                    remaining: rest,
                    terminal: self.terminal,
                };
                layer.handle(req, ctx, next).await
            }
            None => (self.terminal)(req, ctx).await,
        }
    }
}

/// A single pipeline layer. Implementations read and mutate the context
/// object and may short-circuit by returning a result without invoking
/// `next`.
#[async_trait::async_trait]
pub trait Layer: Send + Sync {
    /// Apply this layer's behavior, calling `next.call(req, ctx)` to
    /// continue the chain, or returning directly to short-circuit.
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome;
}

/// A composed chain of layers terminating in a dispatch function (the
/// "Tool dispatch" row of §2's layer table — forwarding to the underlying
/// tool handler).
pub struct Pipeline {
    layers: Vec<Arc<dyn Layer>>,
    dispatch: Arc<dyn Fn(&mut RequestEnvelope, &mut RequestContext) -> BoxFuture<'static, LayerOutcome> + Send + Sync>,
}

impl Pipeline {
    /// Build a pipeline from an ordered layer list and the terminal
    /// dispatch function (the tool handler invocation).
    pub fn new(
        layers: Vec<Arc<dyn Layer>>,
        dispatch: Arc<dyn Fn(&mut RequestEnvelope, &mut RequestContext) -> BoxFuture<'static, LayerOutcome> + Send + Sync>,
    ) -> Self {
        Self { layers, dispatch }
    }

    /// Run the full chain for one request.
    pub async fn run(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext) -> LayerOutcome {
        let terminal = self.dispatch.as_ref();
        let next = Next {
            remaining: &self.layers,
            terminal,
        };
        next.call(req, ctx).await
    }
}
