//! Authentication collaborator interface.
//!
//! The identity provider behind `Authenticate` is explicitly out of scope
//! (spec.md §1) — this module defines only the trait boundary the
//! authentication layer calls through, following the teacher's
//! provider-agnostic `AuthProvider`/`TokenValidator` split in
//! `server/auth/traits.rs`: application code (and this crate) never knows
//! which identity provider is behind the trait object.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;

/// The principal resolved by a successful authentication call. Copied
/// field-by-field onto the [`crate::context::RequestContext`] by the
/// authentication layer (§4's "Authentication" row).
#[derive(Debug, Clone, Default)]
pub struct Principal {
    /// Stable user identifier.
    pub user_id: String,
    /// User email, if the identity provider exposes one.
    pub user_email: Option<String>,
    /// Ordered role list, preserved in provider order (§3: "ordered
    /// sequence of strings").
    pub roles: Vec<String>,
    /// Raw claims, kept open as `Value` since the set of claims a given
    /// identity provider returns is not fixed by this crate.
    pub claims: HashMap<String, Value>,
}

/// Authenticates a bearer/API-key token extracted by the token-bridging
/// layer (§4's "Token bridging" row) into a [`Principal`].
///
/// Implementations live outside this crate; this trait is the sole
/// integration surface; a mock implementation for tests lives in
/// [`crate::testing`] (`cfg(test)`-gated — see that module for the
/// in-process stand-in used by the pipeline integration tests).
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a token to a principal. `None` token means the caller sent
    /// no credential at all; implementations decide whether that is an
    /// error or an anonymous principal.
    async fn authenticate(&self, token: Option<&str>) -> Result<Principal>;
}
