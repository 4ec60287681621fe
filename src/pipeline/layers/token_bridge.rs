//! Token bridging (§2's "Token bridging" row, §6 "Authentication
//! ingress"): extracts a bearer or API-key token from per-request headers
//! and installs it on the context for the authentication layer to read.

use http::HeaderMap;

use crate::context::RequestContext;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};

const AUTHORIZATION_HEADER: &str = "authorization";
const API_KEY_HEADER: &str = "x-api-key";
const BEARER_PREFIX: &str = "Bearer ";

/// Extract a bearer/API-key token from `headers`. Bearer is preferred over
/// the API-key header when both are present. Headers with non-UTF-8 values
/// are treated as absent rather than erroring the whole lookup.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::to_string);
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub struct TokenBridgeLayer;

#[async_trait::async_trait]
impl Layer for TokenBridgeLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        if ctx.auth_token().is_none() {
            if let Some(token) = extract_token(&req.headers) {
                ctx.set_auth_token(token);
            }
        }
        next.call(req, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_bearer_over_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer tok123".parse().unwrap());
        headers.insert("x-api-key", "key456".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn falls_back_to_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "key456".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("key456".to_string()));
    }

    #[test]
    fn no_recognized_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);
    }
}
