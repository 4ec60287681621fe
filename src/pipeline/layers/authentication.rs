//! Authentication (§2's "Authentication" row): calls the authenticator and
//! copies the resolved principal onto the context.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::context::RequestContext;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::protocol::{CallToolResult, ProtocolResult};

pub struct AuthenticationLayer {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthenticationLayer {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

#[async_trait::async_trait]
impl Layer for AuthenticationLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        match self.authenticator.authenticate(ctx.auth_token()).await {
            Ok(principal) => {
                ctx.user_id = Some(principal.user_id);
                ctx.user_email = principal.user_email;
                ctx.roles = principal.roles;
                ctx.claims = principal.claims;
                next.call(req, ctx).await
            }
            Err(err) => {
                let message = err.to_string();
                ctx.success = false;
                ctx.error_message = Some(message.clone());
                ctx.error_category = err
                    .category()
                    .or(Some(crate::error::ErrorCategory::AuthenticationFailed));
                Ok(ProtocolResult::ToolCall(CallToolResult::error(message)))
            }
        }
    }
}
