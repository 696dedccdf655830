use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// --- Role & Status Enumerations ---

/// Role
///
/// The closed set of actor roles recognised by the portal. Every authenticated
/// principal carries exactly one of these, and all authorization branching is an
/// exhaustive match over this enum rather than a comparison on raw strings.
///
/// Wire/database representation uses the upper-case short names (`HOD`, `STAFF`,
/// `ADMIN`, `STUDENT`, `ALUMNI`, `PR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Hod,
    Staff,
    Admin,
    Student,
    Alumni,
    /// Placement Representative: a student coordinating drives for their department.
    #[serde(rename = "PR")]
    #[sqlx(rename = "PR")]
    PlacementRep,
}

impl Role {
    /// Roles permitted to create and schedule placements and tests.
    pub const DEPARTMENT_MANAGERS: &'static [Role] = &[Role::Hod, Role::Staff, Role::Admin];

    /// Roles permitted to register companies in the catalog.
    pub const COMPANY_EDITORS: &'static [Role] = &[Role::Admin, Role::PlacementRep];

    /// Roles a referral request may be addressed to.
    pub const RESPONDERS: &'static [Role] = &[Role::Alumni, Role::PlacementRep, Role::Staff];
}

/// PlacementStatus
///
/// Lifecycle of a scheduled placement interview. Transitions are one-directional:
/// `Scheduled` moves to exactly one of `Completed` or `Cancelled`, both terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "placement_status", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum PlacementStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl PlacementStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlacementStatus::Completed | PlacementStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal forward transition.
    pub fn can_transition_to(self, next: PlacementStatus) -> bool {
        matches!(
            (self, next),
            (
                PlacementStatus::Scheduled,
                PlacementStatus::Completed | PlacementStatus::Cancelled
            )
        )
    }
}

/// TestStatus
///
/// Publication lifecycle of a test. Forward-only: `Draft -> Published -> Archived`.
/// No code path regresses an archived test.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "test_status", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum TestStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl TestStatus {
    pub fn can_transition_to(self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (TestStatus::Draft, TestStatus::Published)
                | (TestStatus::Published, TestStatus::Archived)
        )
    }
}

/// TestType
///
/// Category of an assessment in the training pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "test_type", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum TestType {
    #[default]
    Aptitude,
    Technical,
    Coding,
    Interview,
}

/// RequestStatus
///
/// Lifecycle of a referral request: `Pending -> {Accepted, Rejected}`.
/// Both resolved states are terminal; a resolved request is never re-opened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "request_status", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Accepted | RequestStatus::Rejected)
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `public.profiles` table. `department_id`
/// is absent only for ADMIN accounts, which are not bound to a department.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    // The RBAC field driving all scope derivation.
    pub role: Role,
    pub department_id: Option<Uuid>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            email: String::new(),
            name: String::new(),
            role: Role::Student,
            department_id: None,
        }
    }
}

/// Company
///
/// A recruiting company in the shared catalog. Companies are not owned by a
/// department; visibility is portal-wide.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            website: None,
            industry: None,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Placement
///
/// A scheduled placement interview for one student with one company, owned by
/// exactly one department. The `department_id` is the field every visibility
/// scope constrains on.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Placement {
    pub id: Uuid,
    pub position: String,
    pub student_id: Uuid,
    pub company_id: Uuid,
    pub department_id: Uuid,
    /// Offered package in lakhs per annum.
    pub package_lpa: f64,
    #[ts(type = "string")]
    pub interview_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: PlacementStatus,
    pub created_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            position: String::new(),
            student_id: Uuid::nil(),
            company_id: Uuid::nil(),
            department_id: Uuid::nil(),
            package_lpa: 0.0,
            interview_at: DateTime::<Utc>::MIN_UTC,
            notes: None,
            status: PlacementStatus::Scheduled,
            created_by: Uuid::nil(),
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Test
///
/// An assessment (aptitude/technical/coding/interview) owned by one department.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Test {
    pub id: Uuid,
    pub title: String,
    pub test_type: TestType,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub passing_marks: i32,
    pub department_id: Uuid,
    pub status: TestStatus,
    #[ts(type = "string | null")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Default for Test {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            title: String::new(),
            test_type: TestType::Aptitude,
            duration_minutes: 0,
            total_marks: 0,
            passing_marks: 0,
            department_id: Uuid::nil(),
            status: TestStatus::Draft,
            scheduled_at: None,
            created_by: Uuid::nil(),
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// ReferralRequest
///
/// A student's request for a referral or mentorship, addressed to a designated
/// responder (alumni, placement representative, or staff). The addressed
/// responder is the only principal allowed to resolve it. `response` and
/// `responded_at` are written atomically with the terminal status change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ReferralRequest {
    pub id: Uuid,
    pub subject: String,
    pub message: String,
    pub created_by: Uuid,
    pub responder_id: Uuid,
    pub department_id: Uuid,
    pub status: RequestStatus,
    pub response: Option<String>,
    #[ts(type = "string | null")]
    pub responded_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Default for ReferralRequest {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            subject: String::new(),
            message: String::new(),
            created_by: Uuid::nil(),
            responder_id: Uuid::nil(),
            department_id: Uuid::nil(),
            status: RequestStatus::Pending,
            response: None,
            responded_at: None,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreatePlacementRequest
///
/// Input payload for scheduling a new placement (POST /placements).
/// The `department_id` is untrusted client input; the mutation guard verifies
/// it against the principal's own department before the write is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreatePlacementRequest {
    pub position: String,
    pub student_id: Uuid,
    pub company_id: Uuid,
    pub department_id: Uuid,
    pub package_lpa: f64,
    #[ts(type = "string")]
    pub interview_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl CreatePlacementRequest {
    /// Shape validation, applied before any write. Field-level failures map to 400.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.position.trim().is_empty() {
            return Err(ApiError::validation("position", "must not be empty"));
        }
        if !(self.package_lpa > 0.0) {
            return Err(ApiError::validation("package_lpa", "must be positive"));
        }
        Ok(())
    }
}

/// UpdatePlacementStatusRequest
///
/// Body of PUT /placements/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdatePlacementStatusRequest {
    pub status: PlacementStatus,
}

/// CreateTestRequest
///
/// Input payload for creating a new test (POST /tests). Tests always start in
/// `Draft` status; `status` is not client-settable at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateTestRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub passing_marks: i32,
    pub department_id: Uuid,
    #[ts(type = "string | null")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateTestRequest {
    /// Cross-field invariants for a test definition: minimum duration, at least
    /// one mark on offer, and a pass bar that fits inside the total.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title", "must not be empty"));
        }
        if self.duration_minutes < 5 {
            return Err(ApiError::validation(
                "duration_minutes",
                "must be at least 5",
            ));
        }
        if self.total_marks < 1 {
            return Err(ApiError::validation("total_marks", "must be at least 1"));
        }
        if self.passing_marks < 0 {
            return Err(ApiError::validation(
                "passing_marks",
                "must not be negative",
            ));
        }
        if self.passing_marks > self.total_marks {
            return Err(ApiError::validation(
                "passing_marks",
                "must not exceed total_marks",
            ));
        }
        Ok(())
    }
}

/// UpdateTestStatusRequest
///
/// Body of PUT /tests/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateTestStatusRequest {
    pub status: TestStatus,
}

/// CreateCompanyRequest
///
/// Input payload for registering a recruiting company (POST /companies).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
}

impl CreateCompanyRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        Ok(())
    }
}

/// CreateReferralRequest
///
/// Input payload for a student raising a referral request (POST /requests).
/// The department is fixed server-side to the student's own; only the
/// addressed responder is client-chosen.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReferralRequest {
    pub subject: String,
    pub message: String,
    pub responder_id: Uuid,
}

impl CreateReferralRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.subject.trim().is_empty() {
            return Err(ApiError::validation("subject", "must not be empty"));
        }
        if self.message.trim().is_empty() {
            return Err(ApiError::validation("message", "must not be empty"));
        }
        Ok(())
    }
}

/// ResolveReferralRequest
///
/// Body of PUT /requests/{id}: the designated responder's decision plus their
/// response text. Only the two terminal statuses are legal here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResolveReferralRequest {
    pub status: RequestStatus,
    pub response: String,
}

impl ResolveReferralRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.status == RequestStatus::Pending {
            return Err(ApiError::validation(
                "status",
                "must be ACCEPTED or REJECTED",
            ));
        }
        if self.response.trim().is_empty() {
            return Err(ApiError::validation("response", "must not be empty"));
        }
        Ok(())
    }
}

// --- Dashboard & Profile Schemas (Output) ---

/// DashboardStats
///
/// Output schema for the administrative statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_companies: i64,
    pub total_placements: i64,
    pub completed_placements: i64,
    /// Referral requests still awaiting a responder decision.
    pub pending_requests: i64,
}

/// UserProfile
///
/// Output schema for the authenticated principal's own profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department_id: Option<Uuid>,
}
