use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the ADMIN role.
///
/// Access Control:
/// This router is nested under `/admin` behind the authentication layer; the
/// `role == Role::Admin` check is performed inside each handler after the
/// request passes that layer.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Portal-wide dashboard counters (students, companies, placements,
        // pending referral requests).
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users?role=&department_id=
        // The user directory. ADMIN requested filters are honoured verbatim;
        // no department pinning applies here.
        .route("/users", get(handlers::get_admin_users))
}
