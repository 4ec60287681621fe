//! Toolkit lookup (§2's "Toolkit lookup" row): resolves tool → (toolkit
//! kind, toolkit name, default connection).

use std::sync::Arc;

use crate::context::RequestContext;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::toolkit::ToolkitRegistry;

pub struct ToolkitLookupLayer {
    registry: Arc<dyn ToolkitRegistry>,
}

impl ToolkitLookupLayer {
    pub fn new(registry: Arc<dyn ToolkitRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl Layer for ToolkitLookupLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        ctx.tool_name = Some(req.params.name.clone());

        // Toolkit-lookup failures leave toolkit fields empty on the
        // context and continue (§7 "Recovery policy").
        if let Ok(Some(binding)) = self.registry.toolkit_for_tool(&req.params.name).await {
            let binding = binding.with_argument_override(&req.params.arguments);
            ctx.toolkit_kind = Some(binding.kind);
            ctx.toolkit_name = Some(binding.name);
            ctx.connection = Some(binding.connection);
        }

        next.call(req, ctx).await
    }
}
