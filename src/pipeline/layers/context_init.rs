//! Context init (§2's "Context init" row): session-id extraction and the
//! sentinel fallback for transports with no session handle.
//!
//! The context object itself is an explicit parameter in this crate's
//! design (per Design Notes' "ambient context threading" guidance), so it
//! is built once, before the pipeline runs, rather than materialized by a
//! layer mid-chain. [`build_context`] is that construction step; the
//! [`ContextInitLayer`] in the chain is the ordering anchor the §4.1
//! invariant names ("the auditing layer must be positioned strictly inner
//! to the context-init layer") — by the time any layer runs, the context
//! already exists, so this layer is a pass-through that exists purely to
//! occupy the outermost position layers are documented relative to.

use tokio_util::sync::CancellationToken;

use crate::context::{RequestContext, Transport, SENTINEL_SESSION_ID};
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};

/// Recover a session id from a possibly-absent, possibly-empty raw value.
/// Mirrors the "typed-nil guard" Design Note: on a language without that
/// hazard this is just an `Option` match, but the fallback behavior
/// (sentinel session id) is preserved regardless.
pub fn extract_session_id(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => SENTINEL_SESSION_ID.to_string(),
    }
}

/// Build the request-scoped context for one call.
pub fn build_context(
    transport: Transport,
    raw_session_id: Option<&str>,
    cancellation: CancellationToken,
) -> RequestContext {
    let mut ctx = RequestContext::new(transport, cancellation);
    ctx.session_id = extract_session_id(raw_session_id);
    ctx
}

/// Pass-through layer marking the pipeline's entry point.
pub struct ContextInitLayer;

#[async_trait::async_trait]
impl Layer for ContextInitLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        next.call(req, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_falls_back_to_sentinel() {
        assert_eq!(extract_session_id(None), SENTINEL_SESSION_ID);
        assert_eq!(extract_session_id(Some("")), SENTINEL_SESSION_ID);
    }

    #[test]
    fn present_session_id_is_used_verbatim() {
        assert_eq!(extract_session_id(Some("abc")), "abc");
    }

    #[test]
    fn build_context_stamps_transport_and_session() {
        let ctx = build_context(Transport::Http, Some("sess-1"), CancellationToken::new());
        assert_eq!(ctx.session_id, "sess-1");
        assert_eq!(ctx.transport, Transport::Http);
    }
}
