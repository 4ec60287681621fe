//! Authorization collaborator interface (`IsAuthorized`, §1/§4).

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of an authorization check (§4's "Authorization" row): whether
/// the call is granted, and the persona the policy engine derived from the
/// caller's roles.
#[derive(Debug, Clone, Default)]
pub struct AuthzDecision {
    /// Whether the tool is authorized for this caller.
    pub authorized: bool,
    /// Persona name derived from the caller's roles.
    pub persona_name: Option<String>,
    /// Human-readable reason, populated when `authorized` is `false`.
    pub reason: Option<String>,
}

/// The policy engine behind `IsAuthorized` (spec.md §1: out of scope,
/// referenced only through this interface).
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Decide whether `user_id` (with `roles`) may invoke `tool_name`.
    async fn is_authorized(
        &self,
        user_id: &str,
        roles: &[String],
        tool_name: &str,
    ) -> Result<AuthzDecision>;
}
