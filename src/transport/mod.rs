//! MCP session & SSE transport (C7). Two transports share the same tool
//! kernel: `stdio` for embedded clients, and an axum-based SSE/POST pair for
//! networked clients, wired through the security middleware chain (C6).

pub mod session;
pub mod sse;
pub mod stdio;

use crate::config::Config;
use crate::security::middleware::{self, SecurityState};
use crate::security::{RateLimiter, RotatableSecret};
use crate::snapshot::SnapshotStore;
use axum::routing::{get, post};
use axum::Router;
use session::SessionRegistry;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Builds the full SSE-transport axum router: routes, then the security
/// middleware chain (size cap -> auth -> rate limit -> dispatch -> response
/// headers), the same `middleware::from_fn` layering order the base repo
/// uses for its dashboard router.
pub fn build_router(store: Arc<SnapshotStore>, config: &Config) -> Router {
    let app_state = sse::AppState {
        store,
        sessions: Arc::new(SessionRegistry::new()),
        min_k: config.min_k_anonymity,
        started_at: Instant::now(),
        shutting_down: Arc::new(AtomicBool::new(false)),
    };

    let security_state = SecurityState {
        secret: config
            .auth_token
            .clone()
            .map(|t| Arc::new(RotatableSecret::new(t, crate::constants::TOKEN_ROTATION_GRACE_PERIOD_SECONDS))),
        rate_limiter: Arc::new(RateLimiter::default()),
        auth_enabled: config.auth_enabled,
    };

    Router::new()
        .route("/health", get(sse::health))
        .route("/ready", get(sse::ready))
        .route("/mcp/sse", get(sse::mcp_sse))
        .route("/mcp/messages", post(sse::mcp_messages))
        .layer(axum::middleware::from_fn_with_state(
            security_state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn_with_state(
            security_state.clone(),
            middleware::auth,
        ))
        .layer(axum::middleware::from_fn(middleware::size_cap))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
