//! The request-scoped context object (§3) and its fields' write-once
//! discipline.
//!
//! Per Design Notes' "ambient context threading" guidance, the source's
//! implicit per-request context carrier is retargeted here as an explicit
//! `&mut RequestContext` parameter threaded through every layer, rather
//! than task-local storage — easier to test, and it keeps a layer's
//! dependencies visible in its signature.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ErrorCategory;
use crate::protocol::RequestId;

/// Transport the request arrived on (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Line-delimited stdio framing; has no per-request headers.
    Stdio,
    /// HTTP-based transport; carries per-request headers.
    Http,
}

impl Transport {
    /// The wire tag used in the audit event's `transport` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Http => "http",
        }
    }
}

/// Sentinel session id used when the transport provides no session key
/// (§3's invariant: `session_id` equals this for stdio transports, and is
/// also the fallback any typed-nil-style recovery would land on — see
/// Design Notes' "typed-nil handles").
pub const SENTINEL_SESSION_ID: &str = "stdio";

/// Fixed source tag stamped on every context (§3: "source").
pub const SOURCE_TAG: &str = "mcp";

/// The request-scoped context object threaded through the pipeline.
///
/// Fields are grouped exactly as spec.md §3 groups them. Each field is
/// documented with the layer that is expected to write it; every other
/// layer must treat it as read-only. The pipeline does not enforce this at
/// the type level (that would require splitting the struct per layer,
/// which the corpus does not do for comparable per-request state) — it is
/// a convention, same as the teacher's `RequestHandlerExtra.metadata`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    // --- identification ---
    /// 128-bit random hex, prefixed `req-`. Immutable once created.
    pub request_id: RequestId,
    /// Session id, or [`SENTINEL_SESSION_ID`] when the transport has none.
    pub session_id: String,
    /// Wall-clock start time, immutable once created. Kept as
    /// [`Instant`] rather than a calendar time so elapsed-time
    /// computations never need clock-skew handling; the audit layer
    /// stamps a calendar timestamp separately at emission time.
    pub start_time: Instant,

    // --- principal, written by authentication then authorization ---
    /// Authenticated user id, written by the authentication layer.
    pub user_id: Option<String>,
    /// Authenticated user email, written by the authentication layer.
    pub user_email: Option<String>,
    /// Roles, written by the authentication layer.
    pub roles: Vec<String>,
    /// Raw claims, written by the authentication layer.
    pub claims: HashMap<String, Value>,
    /// Persona name, written by the authorization layer.
    pub persona_name: Option<String>,

    // --- tool binding, written by toolkit lookup ---
    /// Tool name being invoked.
    pub tool_name: Option<String>,
    /// Toolkit kind (e.g. `"trino"`, `"datahub"`, `"s3"`).
    pub toolkit_kind: Option<String>,
    /// Toolkit name/instance.
    pub toolkit_name: Option<String>,
    /// Connection, possibly overridden by request arguments.
    pub connection: Option<String>,

    // --- outcome, written by authorization / dispatch / enrichment ---
    /// Whether the authorization layer granted this call.
    pub authorized: bool,
    /// Authorization failure detail, if any.
    pub authz_error: Option<String>,
    /// Whether the enrichment layer attached any content blocks.
    pub enrichment_applied: bool,
    /// Whether the overall call succeeded (written at dispatch/erroring time).
    pub success: bool,
    /// Error message, if the call failed.
    pub error_message: Option<String>,
    /// Category of a tier-2 categorized failure (§7), read by the audit
    /// layer into the event's `error_category` field. `None` for
    /// successful calls and for tier-3 passthrough errors, which carry no
    /// category by definition.
    pub error_category: Option<ErrorCategory>,
    /// Elapsed duration, written just before the audit layer reads it.
    pub duration: Option<std::time::Duration>,

    // --- transport metadata, written by context init ---
    /// Transport the request arrived on.
    pub transport: Transport,
    /// Fixed source tag, always [`SOURCE_TAG`].
    pub source: &'static str,

    /// Cancellation token propagated from the caller's deadline (§5).
    pub cancellation: CancellationToken,

    /// Bearer/API-key token installed by the token-bridging layer under a
    /// private key, read by the authentication layer. Kept as a field
    /// rather than a public map entry so downstream layers can't
    /// accidentally log it via a generic metadata dump.
    pub(crate) auth_token: Option<String>,
}

impl RequestContext {
    /// Create a new context for a `tools/call` (or other recognized)
    /// request. `start_time` and `request_id` become immutable from this
    /// point on by convention.
    pub fn new(transport: Transport, cancellation: CancellationToken) -> Self {
        Self {
            request_id: generate_request_id(),
            session_id: SENTINEL_SESSION_ID.to_string(),
            start_time: Instant::now(),
            user_id: None,
            user_email: None,
            roles: Vec::new(),
            claims: HashMap::new(),
            persona_name: None,
            tool_name: None,
            toolkit_kind: None,
            toolkit_name: None,
            connection: None,
            authorized: false,
            authz_error: None,
            enrichment_applied: false,
            success: false,
            error_message: None,
            error_category: None,
            duration: None,
            transport,
            source: SOURCE_TAG,
            cancellation,
            auth_token: None,
        }
    }

    /// Install a bridged auth token (token-bridging layer only).
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }

    /// Read the bridged auth token, if one was installed by the request
    /// headers or is already present from a prior layer.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Finalize `duration` from `start_time`. Idempotent; called once by
    /// the audit layer right before event construction.
    pub fn finalize_duration(&mut self) {
        self.duration = Some(self.start_time.elapsed());
    }

    /// Whether the caller's deadline has already expired or the request
    /// was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Generate a request id: 16 cryptographically random bytes rendered as
/// lower-case hex, prefixed `req-` (§4.1). Falls back to a nanosecond
/// timestamp if the system RNG fails to fill the buffer, following the
/// teacher's `SecretValue::generate` (`cargo-pmcp/src/secrets/value.rs`)
/// use of `rand::rng()` for security-sensitive randomness.
pub fn generate_request_id() -> RequestId {
    use rand::TryRngCore;

    let mut bytes = [0u8; 16];
    match rand::rngs::OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            RequestId(format!("req-{hex}"))
        }
        Err(_) => {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            RequestId(format!("req-{nanos}"))
        }
    }
}
