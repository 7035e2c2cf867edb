//! Security middleware chain (C6): size cap -> auth -> rate limit -> dispatch
//! -> response headers, composed the way the base repo layers
//! `middleware::from_fn` stages onto its dashboard router.

use super::{RateLimiter, RotatableSecret};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub const PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

#[derive(Clone)]
pub struct SecurityState {
    pub secret: Option<Arc<RotatableSecret>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth_enabled: bool,
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| *p == path)
}

fn bearer_from_request(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(token) = s.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    // SSE fallback: ?token=<token> query parameter.
    req.uri().query().and_then(|q| {
        q.split('&')
            .find_map(|kv| kv.strip_prefix("token=").map(|v| v.to_string()))
    })
}

fn client_id(req: &Request, authenticated: Option<&str>) -> String {
    if let Some(principal) = authenticated {
        return principal.to_string();
    }
    req.extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects bodies/query strings over the configured caps before any other
/// processing runs.
pub async fn size_cap(req: Request, next: Next) -> Response {
    if let Some(query) = req.uri().query() {
        if query.len() > crate::constants::MAX_QUERY_BYTES {
            return (StatusCode::PAYLOAD_TOO_LARGE, "query string too large").into_response();
        }
    }
    if let Some(len) = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if len > crate::constants::MAX_BODY_BYTES {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    }
    next.run(req).await
}

pub async fn auth(
    State(state): State<SecurityState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if !state.auth_enabled || is_public(&path) {
        return next.run(req).await;
    }

    let Some(secret) = &state.secret else {
        return next.run(req).await;
    };

    match bearer_from_request(&req) {
        Some(token) if secret.verify(&token) => next.run(req).await,
        _ => {
            tracing::warn!(path = %path, "rejected unauthenticated request");
            (StatusCode::UNAUTHORIZED, "missing or invalid bearer token").into_response()
        }
    }
}

pub async fn rate_limit(
    State(state): State<SecurityState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return next.run(req).await;
    }

    let token = bearer_from_request(&req);
    let id = client_id(&req, token.as_deref());
    let outcome = state.rate_limiter.is_allowed(&id);
    if outcome.allowed {
        next.run(req).await
    } else {
        let mut response = (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
        if let Ok(value) = HeaderValue::from_str(&format!("{:.2}", outcome.retry_after_secs)) {
            response.headers_mut().insert("Retry-After", value);
        }
        response
    }
}

/// Injected on every response, success or error, per the OWASP-style header
/// set the base repo already applies to its dashboard.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_recognized() {
        assert!(is_public("/health"));
        assert!(is_public("/ready"));
        assert!(!is_public("/mcp/sse"));
    }
}
