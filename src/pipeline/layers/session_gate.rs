//! Session gate (§2's "Session gate" row, §4.2): refuses any non-exempt
//! tool in a session that has not yet called the designated init tool.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::ErrorCategory;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::protocol::{CallToolResult, ProtocolResult};
use crate::session::{GateDecision, InitGate};

pub struct SessionGateLayer {
    gate: Arc<InitGate>,
}

impl SessionGateLayer {
    pub fn new(gate: Arc<InitGate>) -> Self {
        Self { gate }
    }
}

#[async_trait::async_trait]
impl Layer for SessionGateLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        match self.gate.check_access(&ctx.session_id, &req.params.name) {
            GateDecision::Allow => next.call(req, ctx).await,
            GateDecision::Deny => {
                let message = format!(
                    "tool '{}' requires '{}' to be called first in this session",
                    req.params.name,
                    self.gate.init_tool()
                );
                ctx.success = false;
                ctx.error_message = Some(message.clone());
                ctx.error_category = Some(ErrorCategory::SetupRequired);
                Ok(ProtocolResult::ToolCall(CallToolResult::error(message)))
            }
        }
    }
}
