use crate::models::{
    Company, CreateCompanyRequest, CreatePlacementRequest, CreateReferralRequest,
    CreateTestRequest, DashboardStats, Placement, PlacementStatus, ReferralRequest, RequestStatus,
    Role, Test, TestStatus, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, Mock, etc.).
///
/// Scope discipline: every list/read method takes the *effective* department
/// constraint already computed by `scope::department_scope`. `None` means
/// unconstrained (only ever produced for ADMIN principals); the repository
/// applies the constraint verbatim and performs no authorization of its own.
///
/// Error discipline: storage failures are returned as `Err`, never folded into
/// an empty or missing result. `Ok(None)` / `Ok(vec![])` always mean the query
/// ran and genuinely matched nothing, so handlers can map `Err` to a 500 and
/// `Ok(None)` to 404/409 without conflating the two.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Auth ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn list_users(
        &self,
        role: Option<Role>,
        department_id: Option<Uuid>,
    ) -> Result<Vec<User>, sqlx::Error>;

    // --- Companies (shared catalog, unscoped) ---
    async fn list_companies(&self) -> Result<Vec<Company>, sqlx::Error>;
    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, sqlx::Error>;
    async fn create_company(&self, req: CreateCompanyRequest) -> Result<Company, sqlx::Error>;

    // --- Placements ---
    async fn list_placements(
        &self,
        department_id: Option<Uuid>,
        status: Option<PlacementStatus>,
    ) -> Result<Vec<Placement>, sqlx::Error>;
    async fn get_placement(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<Option<Placement>, sqlx::Error>;
    async fn create_placement(
        &self,
        req: CreatePlacementRequest,
        created_by: Uuid,
    ) -> Result<Placement, sqlx::Error>;
    /// Guarded transition: the update only lands if the row is still in
    /// `expected` status, making the forward-only lifecycle race-safe.
    /// `Ok(None)` means zero rows matched the guard, not a storage failure.
    async fn set_placement_status(
        &self,
        id: Uuid,
        expected: PlacementStatus,
        next: PlacementStatus,
    ) -> Result<Option<Placement>, sqlx::Error>;

    // --- Tests ---
    async fn list_tests(
        &self,
        department_id: Option<Uuid>,
        status: Option<TestStatus>,
    ) -> Result<Vec<Test>, sqlx::Error>;
    async fn get_test(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<Option<Test>, sqlx::Error>;
    async fn create_test(
        &self,
        req: CreateTestRequest,
        created_by: Uuid,
    ) -> Result<Test, sqlx::Error>;
    async fn set_test_status(
        &self,
        id: Uuid,
        expected: TestStatus,
        next: TestStatus,
    ) -> Result<Option<Test>, sqlx::Error>;

    // --- Referral requests ---
    /// Requests visible to a principal: those they raised or are addressed to.
    async fn list_requests_for(&self, user_id: Uuid) -> Result<Vec<ReferralRequest>, sqlx::Error>;
    async fn get_request(&self, id: Uuid) -> Result<Option<ReferralRequest>, sqlx::Error>;
    async fn create_request(
        &self,
        req: CreateReferralRequest,
        created_by: Uuid,
        department_id: Uuid,
    ) -> Result<ReferralRequest, sqlx::Error>;
    /// Writes the terminal status, response text and `responded_at` in one
    /// statement, guarded on `status = PENDING` and the designated responder.
    /// `Ok(None)` means the guard matched zero rows (already resolved).
    async fn resolve_request(
        &self,
        id: Uuid,
        responder_id: Uuid,
        status: RequestStatus,
        response: String,
    ) -> Result<Option<ReferralRequest>, sqlx::Error>;

    // --- Dashboard ---
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// "position" needs quoting: it is a reserved word in Postgres.
const PLACEMENT_COLUMNS: &str = "id, \"position\", student_id, company_id, department_id, \
     package_lpa, interview_at, notes, status, created_by, created_at, updated_at";

const TEST_COLUMNS: &str = "id, title, test_type, duration_minutes, total_marks, \
     passing_marks, department_id, status, scheduled_at, created_by, created_at";

const REQUEST_COLUMNS: &str = "id, subject, message, created_by, responder_id, \
     department_id, status, response, responded_at, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Errors propagate to the caller untouched; the HTTP layer owns the mapping
/// to status codes (and the logging that goes with it).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// Retrieves the profile row (role, department) needed for authentication
    /// and scope derivation.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, role, department_id FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// User directory with optional role/department filters, built dynamically
    /// with QueryBuilder for safe parameterization.
    async fn list_users(
        &self,
        role: Option<Role>,
        department_id: Option<Uuid>,
    ) -> Result<Vec<User>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, email, name, role, department_id FROM profiles WHERE true",
        );

        if let Some(r) = role {
            builder.push(" AND role = ");
            builder.push_bind(r);
        }
        if let Some(d) = department_id {
            builder.push(" AND department_id = ");
            builder.push_bind(d);
        }
        builder.push(" ORDER BY name ASC");

        builder.build_query_as::<User>().fetch_all(&self.pool).await
    }

    async fn list_companies(&self) -> Result<Vec<Company>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            "SELECT id, name, website, industry, created_at FROM companies ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            "SELECT id, name, website, industry, created_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_company(&self, req: CreateCompanyRequest) -> Result<Company, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            "INSERT INTO companies (id, name, website, industry, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING id, name, website, industry, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.website)
        .bind(req.industry)
        .fetch_one(&self.pool)
        .await
    }

    /// list_placements
    ///
    /// The effective scope computed by the authorization filter is applied
    /// verbatim: a `Some` department becomes a mandatory equality constraint,
    /// ANDed with any explicit status filter.
    async fn list_placements(
        &self,
        department_id: Option<Uuid>,
        status: Option<PlacementStatus>,
    ) -> Result<Vec<Placement>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {PLACEMENT_COLUMNS} FROM placements WHERE true"));

        if let Some(d) = department_id {
            builder.push(" AND department_id = ");
            builder.push_bind(d);
        }
        if let Some(s) = status {
            builder.push(" AND status = ");
            builder.push_bind(s);
        }
        builder.push(" ORDER BY interview_at DESC");

        builder
            .build_query_as::<Placement>()
            .fetch_all(&self.pool)
            .await
    }

    /// get_placement
    ///
    /// Scoped read: a record outside the caller's department scope is
    /// indistinguishable from a missing one.
    async fn get_placement(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<Option<Placement>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {PLACEMENT_COLUMNS} FROM placements WHERE id = "));
        builder.push_bind(id);
        if let Some(d) = department_id {
            builder.push(" AND department_id = ");
            builder.push_bind(d);
        }

        builder
            .build_query_as::<Placement>()
            .fetch_optional(&self.pool)
            .await
    }

    /// create_placement
    ///
    /// Inserts a new placement in `SCHEDULED` status. The department guard has
    /// already run in the handler; the repository trusts its inputs.
    async fn create_placement(
        &self,
        req: CreatePlacementRequest,
        created_by: Uuid,
    ) -> Result<Placement, sqlx::Error> {
        sqlx::query_as::<_, Placement>(&format!(
            "INSERT INTO placements \
             (id, \"position\", student_id, company_id, department_id, package_lpa, \
              interview_at, notes, status, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) \
             RETURNING {PLACEMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.position)
        .bind(req.student_id)
        .bind(req.company_id)
        .bind(req.department_id)
        .bind(req.package_lpa)
        .bind(req.interview_at)
        .bind(req.notes)
        .bind(PlacementStatus::Scheduled)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    /// set_placement_status
    ///
    /// Compare-and-set on the status column: zero rows affected means the
    /// record was concurrently resolved (or never existed), and the caller
    /// reports a conflict rather than silently overwriting a terminal state.
    async fn set_placement_status(
        &self,
        id: Uuid,
        expected: PlacementStatus,
        next: PlacementStatus,
    ) -> Result<Option<Placement>, sqlx::Error> {
        sqlx::query_as::<_, Placement>(&format!(
            "UPDATE placements SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = $3 \
             RETURNING {PLACEMENT_COLUMNS}"
        ))
        .bind(next)
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_tests(
        &self,
        department_id: Option<Uuid>,
        status: Option<TestStatus>,
    ) -> Result<Vec<Test>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {TEST_COLUMNS} FROM tests WHERE true"));

        if let Some(d) = department_id {
            builder.push(" AND department_id = ");
            builder.push_bind(d);
        }
        if let Some(s) = status {
            builder.push(" AND status = ");
            builder.push_bind(s);
        }
        builder.push(" ORDER BY created_at DESC");

        builder.build_query_as::<Test>().fetch_all(&self.pool).await
    }

    async fn get_test(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<Option<Test>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {TEST_COLUMNS} FROM tests WHERE id = "));
        builder.push_bind(id);
        if let Some(d) = department_id {
            builder.push(" AND department_id = ");
            builder.push_bind(d);
        }

        builder
            .build_query_as::<Test>()
            .fetch_optional(&self.pool)
            .await
    }

    /// create_test
    ///
    /// Inserts a new test in `DRAFT` status. Payload invariants (marks bounds,
    /// minimum duration) were checked by the handler before this call.
    async fn create_test(
        &self,
        req: CreateTestRequest,
        created_by: Uuid,
    ) -> Result<Test, sqlx::Error> {
        sqlx::query_as::<_, Test>(&format!(
            "INSERT INTO tests \
             (id, title, test_type, duration_minutes, total_marks, passing_marks, \
              department_id, status, scheduled_at, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
             RETURNING {TEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.test_type)
        .bind(req.duration_minutes)
        .bind(req.total_marks)
        .bind(req.passing_marks)
        .bind(req.department_id)
        .bind(TestStatus::Draft)
        .bind(req.scheduled_at)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_test_status(
        &self,
        id: Uuid,
        expected: TestStatus,
        next: TestStatus,
    ) -> Result<Option<Test>, sqlx::Error> {
        sqlx::query_as::<_, Test>(&format!(
            "UPDATE tests SET status = $1 WHERE id = $2 AND status = $3 \
             RETURNING {TEST_COLUMNS}"
        ))
        .bind(next)
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
    }

    /// list_requests_for
    ///
    /// A referral request is visible to exactly two principals: the student who
    /// raised it and the responder it is addressed to.
    async fn list_requests_for(&self, user_id: Uuid) -> Result<Vec<ReferralRequest>, sqlx::Error> {
        sqlx::query_as::<_, ReferralRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM referral_requests \
             WHERE created_by = $1 OR responder_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<ReferralRequest>, sqlx::Error> {
        sqlx::query_as::<_, ReferralRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM referral_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_request(
        &self,
        req: CreateReferralRequest,
        created_by: Uuid,
        department_id: Uuid,
    ) -> Result<ReferralRequest, sqlx::Error> {
        sqlx::query_as::<_, ReferralRequest>(&format!(
            "INSERT INTO referral_requests \
             (id, subject, message, created_by, responder_id, department_id, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.subject)
        .bind(req.message)
        .bind(created_by)
        .bind(req.responder_id)
        .bind(department_id)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await
    }

    /// resolve_request
    ///
    /// Single-statement terminal transition: status, response text and the
    /// response timestamp land together or not at all. The `status = PENDING`
    /// guard means the losing side of a concurrent double-resolve affects zero
    /// rows and surfaces as a conflict upstream.
    async fn resolve_request(
        &self,
        id: Uuid,
        responder_id: Uuid,
        status: RequestStatus,
        response: String,
    ) -> Result<Option<ReferralRequest>, sqlx::Error> {
        sqlx::query_as::<_, ReferralRequest>(&format!(
            "UPDATE referral_requests \
             SET status = $1, response = $2, responded_at = NOW() \
             WHERE id = $3 AND responder_id = $4 AND status = $5 \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(status)
        .bind(response)
        .bind(id)
        .bind(responder_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await
    }

    /// get_stats
    ///
    /// Compiles the counters for the administrative dashboard in one call.
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        Ok(DashboardStats {
            total_students: count(
                &self.pool,
                "SELECT COUNT(*) FROM profiles WHERE role = 'STUDENT'",
            )
            .await?,
            total_companies: count(&self.pool, "SELECT COUNT(*) FROM companies").await?,
            total_placements: count(&self.pool, "SELECT COUNT(*) FROM placements").await?,
            completed_placements: count(
                &self.pool,
                "SELECT COUNT(*) FROM placements WHERE status = 'COMPLETED'",
            )
            .await?,
            pending_requests: count(
                &self.pool,
                "SELECT COUNT(*) FROM referral_requests WHERE status = 'PENDING'",
            )
            .await?,
        })
    }
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}
