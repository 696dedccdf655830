use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer; this covers every role from students through HODs.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. The extractor
/// guarantees a validated principal (id, role, department), from which each
/// handler derives its visibility scope and runs its mutation guard. No
/// handler in this module trusts a client-supplied department value.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The principal's own profile and department binding.
        .route("/me", get(handlers::get_me))
        // --- Placements ---
        // GET /placements?department_id=&status=
        // Scoped listing: HOD/STAFF are pinned to their own department, the
        // department_id query parameter is only honoured for ADMIN.
        // POST /placements
        // Schedules a placement (HOD/STAFF/ADMIN, department guard applies).
        .route(
            "/placements",
            get(handlers::list_placements).post(handlers::create_placement),
        )
        // GET /placements/{id}
        // Scoped read: records outside the caller's department read as 404.
        .route("/placements/{id}", get(handlers::get_placement_details))
        // PUT /placements/{id}/status
        // Forward-only lifecycle transition; terminal records answer 409.
        .route(
            "/placements/{id}/status",
            put(handlers::update_placement_status),
        )
        // --- Tests ---
        .route(
            "/tests",
            get(handlers::list_tests).post(handlers::create_test),
        )
        .route("/tests/{id}", get(handlers::get_test_details))
        .route("/tests/{id}/status", put(handlers::update_test_status))
        // --- Companies (shared catalog) ---
        .route(
            "/companies",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route("/companies/{id}", get(handlers::get_company_details))
        // --- Referral requests ---
        // GET /requests — requests the principal raised or is addressed by.
        // POST /requests — a student raises a request to an alumni/PR/staff.
        .route(
            "/requests",
            get(handlers::list_requests).post(handlers::create_request),
        )
        // PUT /requests/{id}
        // The designated responder resolves the request; the response text and
        // timestamp land atomically with the terminal status.
        .route("/requests/{id}", put(handlers::resolve_request))
}
