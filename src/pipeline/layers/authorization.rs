//! Authorization (§2's "Authorization" row): calls the policy engine and
//! records the persona and authorized flag.

use std::sync::Arc;

use crate::authz::PolicyEngine;
use crate::context::RequestContext;
use crate::error::ErrorCategory;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::protocol::{CallToolResult, ProtocolResult};

pub struct AuthorizationLayer {
    policy: Arc<dyn PolicyEngine>,
}

impl AuthorizationLayer {
    pub fn new(policy: Arc<dyn PolicyEngine>) -> Self {
        Self { policy }
    }
}

#[async_trait::async_trait]
impl Layer for AuthorizationLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        let user_id = ctx.user_id.clone().unwrap_or_default();
        let decision = match self.policy.is_authorized(&user_id, &ctx.roles, &req.params.name).await {
            Ok(decision) => decision,
            Err(err) => return Err(err),
        };

        ctx.persona_name = decision.persona_name;
        ctx.authorized = decision.authorized;

        if decision.authorized {
            return next.call(req, ctx).await;
        }

        let message = decision
            .reason
            .unwrap_or_else(|| format!("not authorized to call {}", req.params.name));
        ctx.authz_error = Some(message.clone());
        ctx.success = false;
        ctx.error_message = Some(message.clone());
        ctx.error_category = Some(ErrorCategory::AuthorizationDenied);
        Ok(ProtocolResult::ToolCall(CallToolResult::error(message)))
    }
}
