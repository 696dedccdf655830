use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// The only unauthenticated surface is the health probe: all placement,
/// test, company and request data is department-scoped and requires a
/// resolved principal before any visibility decision can be made.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used by monitoring and load balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
}
