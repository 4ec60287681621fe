//! In-process mock collaborators for tests and local development.
//!
//! Every external collaborator this crate defines only as a trait (§1:
//! the identity provider, the policy engine, the toolkit registry, the
//! audit sink) needs a stand-in to exercise the pipeline without a real
//! backend. Mirrors the teacher's `MockValidator`
//! (`server/auth/mock.rs`) — a configurable mock that always succeeds
//! unless told otherwise, with the same "never use in production"
//! warning.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::audit::{AuditEvent, AuditSink};
use crate::auth::{Authenticator, Principal};
use crate::authz::{AuthzDecision, PolicyEngine};
use crate::error::{Error, Result};
use crate::toolkit::{ToolkitBinding, ToolkitRegistry};

/// Mock authenticator returning a fixed [`Principal`] regardless of the
/// token presented, unless configured to fail. **Never use in
/// production** — it performs no actual credential validation.
#[derive(Debug, Clone)]
pub struct MockAuthenticator {
    principal: Principal,
    fail_with: Option<String>,
}

impl MockAuthenticator {
    /// A mock that always authenticates as `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            principal: Principal {
                user_id: user_id.into(),
                ..Principal::default()
            },
            fail_with: None,
        }
    }

    /// Attach an email to the returned principal.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.principal.user_email = Some(email.into());
        self
    }

    /// Attach roles to the returned principal.
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.principal.roles = roles;
        self
    }

    /// Attach a claim to the returned principal.
    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.principal.claims.insert(key.into(), value);
        self
    }

    /// Make every call fail with an authentication error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            principal: Principal::default(),
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, _token: Option<&str>) -> Result<Principal> {
        if let Some(message) = &self.fail_with {
            return Err(Error::authentication_failed(message.clone()));
        }
        Ok(self.principal.clone())
    }
}

/// Mock policy engine that grants or denies every call according to a
/// fixed decision. **Never use in production.**
#[derive(Debug, Clone)]
pub struct MockPolicyEngine {
    decision: AuthzDecision,
}

impl MockPolicyEngine {
    /// A mock that authorizes every call under `persona`.
    pub fn allow(persona: impl Into<String>) -> Self {
        Self {
            decision: AuthzDecision {
                authorized: true,
                persona_name: Some(persona.into()),
                reason: None,
            },
        }
    }

    /// A mock that denies every call with `reason`.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: AuthzDecision {
                authorized: false,
                persona_name: None,
                reason: Some(reason.into()),
            },
        }
    }
}

#[async_trait]
impl PolicyEngine for MockPolicyEngine {
    async fn is_authorized(
        &self,
        _user_id: &str,
        _roles: &[String],
        _tool_name: &str,
    ) -> Result<AuthzDecision> {
        Ok(self.decision.clone())
    }
}

/// Mock toolkit registry keyed by exact tool name. Tools with no
/// registered binding resolve to `None`, matching a real registry's
/// behavior for an unknown tool (§7: "Toolkit-lookup failures leave
/// toolkit fields empty on the context and continue").
#[derive(Debug, Clone, Default)]
pub struct MockToolkitRegistry {
    bindings: HashMap<String, ToolkitBinding>,
}

impl MockToolkitRegistry {
    /// An empty registry; every lookup resolves to `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding for `tool_name`.
    pub fn with_tool(
        mut self,
        tool_name: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        connection: impl Into<String>,
    ) -> Self {
        self.bindings.insert(
            tool_name.into(),
            ToolkitBinding {
                kind: kind.into(),
                name: name.into(),
                connection: connection.into(),
            },
        );
        self
    }
}

#[async_trait]
impl ToolkitRegistry for MockToolkitRegistry {
    async fn toolkit_for_tool(&self, tool_name: &str) -> Result<Option<ToolkitBinding>> {
        Ok(self.bindings.get(tool_name).cloned())
    }
}

/// Audit sink that records every event in memory for assertions. **Never
/// use in production** — it never actually delivers anything.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// A sink with no recorded events yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every event recorded so far, in emission order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink lock poisoned").clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<()> {
        self.events.lock().expect("audit sink lock poisoned").push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_authenticator_returns_configured_principal() {
        let auth = MockAuthenticator::new("u1").with_email("u1@x.com");
        let principal = auth.authenticate(None).await.unwrap();
        assert_eq!(principal.user_id, "u1");
        assert_eq!(principal.user_email, Some("u1@x.com".to_string()));
    }

    #[tokio::test]
    async fn mock_authenticator_can_be_made_to_fail() {
        let auth = MockAuthenticator::failing("bad credentials");
        let err = auth.authenticate(None).await.unwrap_err();
        assert_eq!(err.category(), Some(crate::error::ErrorCategory::AuthenticationFailed));
    }

    #[tokio::test]
    async fn mock_policy_engine_grants_or_denies() {
        let allow = MockPolicyEngine::allow("analyst");
        let decision = allow.is_authorized("u1", &[], "trino_query").await.unwrap();
        assert!(decision.authorized);
        assert_eq!(decision.persona_name, Some("analyst".to_string()));

        let deny = MockPolicyEngine::deny("no access");
        let decision = deny.is_authorized("u1", &[], "trino_query").await.unwrap();
        assert!(!decision.authorized);
    }

    #[tokio::test]
    async fn mock_toolkit_registry_resolves_registered_tools_only() {
        let registry = MockToolkitRegistry::new().with_tool("trino_query", "trino", "production", "prod-trino");
        let binding = registry.toolkit_for_tool("trino_query").await.unwrap().unwrap();
        assert_eq!(binding.kind, "trino");
        assert!(registry.toolkit_for_tool("unknown_tool").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recording_audit_sink_accumulates_events() {
        let sink = RecordingAuditSink::new();
        let ctx = crate::context::RequestContext::new(
            crate::context::Transport::Stdio,
            tokio_util::sync::CancellationToken::new(),
        );
        let event = AuditEvent::build(&ctx, &Value::Null, 0, 0, 0);
        sink.emit(event).await.unwrap();
        assert_eq!(sink.events().len(), 1);
    }
}
