/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.

/// Routes accessible to all clients (health check only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Every handler receives a validated principal and derives its own
/// department scope from it.
pub mod authenticated;

/// Routes restricted exclusively to users with the ADMIN role.
/// The role check runs inside the handlers after authentication.
pub mod admin;
