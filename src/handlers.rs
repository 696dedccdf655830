use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Company, CreateCompanyRequest, CreatePlacementRequest, CreateReferralRequest,
        CreateTestRequest, DashboardStats, Placement, PlacementStatus, ReferralRequest,
        ResolveReferralRequest, Role, Test, TestStatus, UpdatePlacementStatusRequest,
        UpdateTestStatusRequest, User, UserProfile,
    },
    scope::{authorize_mutation, department_scope},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// PlacementFilter
///
/// Accepted query parameters for GET /placements. The requested department is
/// only a *hint*: the authorization filter decides whether it is honoured.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PlacementFilter {
    pub department_id: Option<Uuid>,
    pub status: Option<PlacementStatus>,
}

/// TestFilter
///
/// Accepted query parameters for GET /tests.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct TestFilter {
    pub department_id: Option<Uuid>,
    pub status: Option<TestStatus>,
}

/// UserFilter
///
/// Accepted query parameters for the admin user directory.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub department_id: Option<Uuid>,
}

// --- Profile ---

/// get_me
///
/// [Authenticated Route] The principal's own profile, re-read from storage so
/// the response reflects the current role/department assignment.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        department_id: user.department_id,
    }))
}

// --- Placements ---

/// list_placements
///
/// [Authenticated Route] Lists placements visible to the principal.
///
/// *Scope*: the department constraint is derived by the authorization filter,
/// never taken from the query string directly — a STAFF/HOD caller is pinned
/// to their own department regardless of any requested override.
#[utoipa::path(
    get,
    path = "/placements",
    params(PlacementFilter),
    responses((status = 200, description = "Scoped placements", body = [Placement]))
)]
pub async fn list_placements(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PlacementFilter>,
) -> Result<Json<Vec<Placement>>, ApiError> {
    let dept = department_scope(&user, filter.department_id)?;
    Ok(Json(state.repo.list_placements(dept, filter.status).await?))
}

/// create_placement
///
/// [Authenticated Route] Schedules a new placement interview.
///
/// *Guard*: HOD/STAFF/ADMIN only, and the body's `department_id` must match
/// the principal's own department unless the principal is an ADMIN. The
/// department match is enforced here, server-side: the client value is
/// untrusted input.
#[utoipa::path(
    post,
    path = "/placements",
    request_body = CreatePlacementRequest,
    responses(
        (status = 200, description = "Created", body = Placement),
        (status = 403, description = "Role or department violation")
    )
)]
pub async fn create_placement(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePlacementRequest>,
) -> Result<Json<Placement>, ApiError> {
    payload.validate()?;
    authorize_mutation(&user, Role::DEPARTMENT_MANAGERS, payload.department_id)?;

    let placement = state.repo.create_placement(payload, user.id).await?;
    Ok(Json(placement))
}

/// get_placement_details
///
/// [Authenticated Route] Single placement, subject to the caller's scope.
/// A record outside the scope reads as 404, not 403, to avoid leaking its
/// existence across departments.
#[utoipa::path(
    get,
    path = "/placements/{id}",
    params(("id" = Uuid, Path, description = "Placement ID")),
    responses((status = 200, description = "Found", body = Placement))
)]
pub async fn get_placement_details(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Placement>, ApiError> {
    let dept = department_scope(&user, None)?;
    state
        .repo
        .get_placement(id, dept)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_placement_status
///
/// [Authenticated Route] Moves a placement forward in its lifecycle
/// (`SCHEDULED -> COMPLETED | CANCELLED`). Terminal records reject any further
/// transition with 409.
#[utoipa::path(
    put,
    path = "/placements/{id}/status",
    params(("id" = Uuid, Path, description = "Placement ID")),
    request_body = UpdatePlacementStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Placement),
        (status = 409, description = "Terminal or concurrent transition")
    )
)]
pub async fn update_placement_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlacementStatusRequest>,
) -> Result<Json<Placement>, ApiError> {
    let dept = department_scope(&user, None)?;
    let placement = state
        .repo
        .get_placement(id, dept)
        .await?
        .ok_or(ApiError::NotFound)?;

    authorize_mutation(&user, Role::DEPARTMENT_MANAGERS, placement.department_id)?;

    if !placement.status.can_transition_to(payload.status) {
        return Err(ApiError::Conflict("illegal placement status transition"));
    }

    // Guarded update: if the row moved on since we read it, report a conflict
    // instead of clobbering a terminal state.
    state
        .repo
        .set_placement_status(id, placement.status, payload.status)
        .await?
        .map(Json)
        .ok_or(ApiError::Conflict("placement status changed concurrently"))
}

// --- Tests ---

/// list_tests
///
/// [Authenticated Route] Lists tests under the caller's department scope.
#[utoipa::path(
    get,
    path = "/tests",
    params(TestFilter),
    responses((status = 200, description = "Scoped tests", body = [Test]))
)]
pub async fn list_tests(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<TestFilter>,
) -> Result<Json<Vec<Test>>, ApiError> {
    let dept = department_scope(&user, filter.department_id)?;
    Ok(Json(state.repo.list_tests(dept, filter.status).await?))
}

/// create_test
///
/// [Authenticated Route] Creates a test in `DRAFT` status.
///
/// *Validation*: marks/duration invariants are checked before the guard runs,
/// so a malformed payload reads as 400 even for a caller who would also be
/// forbidden.
#[utoipa::path(
    post,
    path = "/tests",
    request_body = CreateTestRequest,
    responses(
        (status = 200, description = "Created", body = Test),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Role or department violation")
    )
)]
pub async fn create_test(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<Json<Test>, ApiError> {
    payload.validate()?;
    authorize_mutation(&user, Role::DEPARTMENT_MANAGERS, payload.department_id)?;

    let test = state.repo.create_test(payload, user.id).await?;
    Ok(Json(test))
}

/// get_test_details
///
/// [Authenticated Route] Single test, subject to the caller's scope.
#[utoipa::path(
    get,
    path = "/tests/{id}",
    params(("id" = Uuid, Path, description = "Test ID")),
    responses((status = 200, description = "Found", body = Test))
)]
pub async fn get_test_details(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Test>, ApiError> {
    let dept = department_scope(&user, None)?;
    state
        .repo
        .get_test(id, dept)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_test_status
///
/// [Authenticated Route] Forward-only publication transition
/// (`DRAFT -> PUBLISHED -> ARCHIVED`).
#[utoipa::path(
    put,
    path = "/tests/{id}/status",
    params(("id" = Uuid, Path, description = "Test ID")),
    request_body = UpdateTestStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Test),
        (status = 409, description = "Terminal or concurrent transition")
    )
)]
pub async fn update_test_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTestStatusRequest>,
) -> Result<Json<Test>, ApiError> {
    let dept = department_scope(&user, None)?;
    let test = state
        .repo
        .get_test(id, dept)
        .await?
        .ok_or(ApiError::NotFound)?;

    authorize_mutation(&user, Role::DEPARTMENT_MANAGERS, test.department_id)?;

    if !test.status.can_transition_to(payload.status) {
        return Err(ApiError::Conflict("illegal test status transition"));
    }

    state
        .repo
        .set_test_status(id, test.status, payload.status)
        .await?
        .map(Json)
        .ok_or(ApiError::Conflict("test status changed concurrently"))
}

// --- Companies ---

/// list_companies
///
/// [Authenticated Route] The shared company catalog. Not department-owned, so
/// no scope applies.
#[utoipa::path(
    get,
    path = "/companies",
    responses((status = 200, description = "Companies", body = [Company]))
)]
pub async fn list_companies(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(state.repo.list_companies().await?))
}

/// get_company_details
///
/// [Authenticated Route] Single company by ID.
#[utoipa::path(
    get,
    path = "/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses((status = 200, description = "Found", body = Company))
)]
pub async fn get_company_details(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    state
        .repo
        .get_company(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_company
///
/// [Authenticated Route] Registers a recruiting company. Restricted to ADMIN
/// and placement representatives; the catalog is portal-wide so only the role
/// check applies.
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 200, description = "Created", body = Company),
        (status = 403, description = "Role violation")
    )
)]
pub async fn create_company(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    if !Role::COMPANY_EDITORS.contains(&user.role) {
        return Err(ApiError::Forbidden);
    }
    payload.validate()?;

    let company = state.repo.create_company(payload).await?;
    Ok(Json(company))
}

// --- Referral Requests ---

/// list_requests
///
/// [Authenticated Route] Requests the principal raised or is addressed by.
#[utoipa::path(
    get,
    path = "/requests",
    responses((status = 200, description = "My requests", body = [ReferralRequest]))
)]
pub async fn list_requests(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReferralRequest>>, ApiError> {
    Ok(Json(state.repo.list_requests_for(id).await?))
}

/// create_request
///
/// [Authenticated Route] A student raises a referral request addressed to an
/// alumni, placement representative or staff member. The request's department
/// is fixed to the student's own; it is never taken from the body.
#[utoipa::path(
    post,
    path = "/requests",
    request_body = CreateReferralRequest,
    responses(
        (status = 200, description = "Created", body = ReferralRequest),
        (status = 404, description = "Responder not found")
    )
)]
pub async fn create_request(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReferralRequest>,
) -> Result<Json<ReferralRequest>, ApiError> {
    if user.role != Role::Student {
        return Err(ApiError::Forbidden);
    }
    payload.validate()?;

    let department_id = user.department_id.ok_or(ApiError::Forbidden)?;

    // The addressee must exist and hold a responder role.
    let responder = state
        .repo
        .get_user(payload.responder_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !Role::RESPONDERS.contains(&responder.role) {
        return Err(ApiError::validation(
            "responder_id",
            "must reference an alumni, placement representative or staff member",
        ));
    }

    let request = state
        .repo
        .create_request(payload, user.id, department_id)
        .await?;
    Ok(Json(request))
}

/// resolve_request
///
/// [Authenticated Route] The designated responder accepts or rejects a pending
/// request. The response text and timestamp are written atomically with the
/// status change; a request already in a terminal status rejects further
/// transitions with 409.
#[utoipa::path(
    put,
    path = "/requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = ResolveReferralRequest,
    responses(
        (status = 200, description = "Resolved", body = ReferralRequest),
        (status = 403, description = "Not the designated responder"),
        (status = 409, description = "Already resolved")
    )
)]
pub async fn resolve_request(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveReferralRequest>,
) -> Result<Json<ReferralRequest>, ApiError> {
    payload.validate()?;

    let request = state
        .repo
        .get_request(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Only the addressed responder may resolve, regardless of role.
    if request.responder_id != user.id {
        return Err(ApiError::Forbidden);
    }
    if request.status.is_terminal() {
        return Err(ApiError::Conflict("request already resolved"));
    }

    state
        .repo
        .resolve_request(id, user.id, payload.status, payload.response)
        .await?
        .map(Json)
        .ok_or(ApiError::Conflict("request already resolved"))
}

// --- Admin ---

/// get_admin_stats
///
/// [Admin Route] Portal-wide counters for the dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.repo.get_stats().await?))
}

/// get_admin_users
///
/// [Admin Route] User directory with optional role/department filters. Unlike
/// the scoped listings, an ADMIN's requested filters are honoured verbatim.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserFilter),
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn get_admin_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(
        state
            .repo
            .list_users(filter.role, filter.department_id)
            .await?,
    ))
}
