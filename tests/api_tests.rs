use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use placement_portal::{
    AppConfig, AppState, create_router,
    models::{
        Company, CreateCompanyRequest, CreatePlacementRequest, CreateReferralRequest,
        CreateTestRequest, DashboardStats, Placement, PlacementStatus, ReferralRequest,
        RequestStatus, Role, Test, TestStatus, User,
    },
    repository::Repository,
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- Mock Repository wired behind the full router ---

// Exercises the assembled router (auth middleware included) rather than
// individual handlers. Runs under Env::Local so the x-user-id bypass stands in
// for the session collaborator.
struct MockPortalRepo {
    users: Vec<User>,
    placements: Vec<Placement>,
}

#[async_trait]
impl Repository for MockPortalRepo {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
    async fn list_users(
        &self,
        _role: Option<Role>,
        _department_id: Option<Uuid>,
    ) -> Result<Vec<User>, sqlx::Error> {
        Ok(self.users.clone())
    }
    async fn list_companies(&self) -> Result<Vec<Company>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_company(&self, _id: Uuid) -> Result<Option<Company>, sqlx::Error> {
        Ok(None)
    }
    async fn create_company(&self, _req: CreateCompanyRequest) -> Result<Company, sqlx::Error> {
        Ok(Company::default())
    }
    async fn list_placements(
        &self,
        department_id: Option<Uuid>,
        status: Option<PlacementStatus>,
    ) -> Result<Vec<Placement>, sqlx::Error> {
        Ok(self
            .placements
            .iter()
            .filter(|p| department_id.is_none_or(|d| p.department_id == d))
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect())
    }
    async fn get_placement(
        &self,
        id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<Option<Placement>, sqlx::Error> {
        Ok(self
            .placements
            .iter()
            .find(|p| p.id == id && department_id.is_none_or(|d| p.department_id == d))
            .cloned())
    }
    async fn create_placement(
        &self,
        req: CreatePlacementRequest,
        created_by: Uuid,
    ) -> Result<Placement, sqlx::Error> {
        Ok(Placement {
            id: Uuid::new_v4(),
            position: req.position,
            student_id: req.student_id,
            company_id: req.company_id,
            department_id: req.department_id,
            package_lpa: req.package_lpa,
            interview_at: req.interview_at,
            notes: req.notes,
            status: PlacementStatus::Scheduled,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }
    async fn set_placement_status(
        &self,
        _id: Uuid,
        _expected: PlacementStatus,
        _next: PlacementStatus,
    ) -> Result<Option<Placement>, sqlx::Error> {
        Ok(None)
    }
    async fn list_tests(
        &self,
        _department_id: Option<Uuid>,
        _status: Option<TestStatus>,
    ) -> Result<Vec<Test>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_test(
        &self,
        _id: Uuid,
        _department_id: Option<Uuid>,
    ) -> Result<Option<Test>, sqlx::Error> {
        Ok(None)
    }
    async fn create_test(
        &self,
        _req: CreateTestRequest,
        _created_by: Uuid,
    ) -> Result<Test, sqlx::Error> {
        Ok(Test::default())
    }
    async fn set_test_status(
        &self,
        _id: Uuid,
        _expected: TestStatus,
        _next: TestStatus,
    ) -> Result<Option<Test>, sqlx::Error> {
        Ok(None)
    }
    async fn list_requests_for(&self, _user_id: Uuid) -> Result<Vec<ReferralRequest>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_request(&self, _id: Uuid) -> Result<Option<ReferralRequest>, sqlx::Error> {
        Ok(None)
    }
    async fn create_request(
        &self,
        _req: CreateReferralRequest,
        _created_by: Uuid,
        _department_id: Uuid,
    ) -> Result<ReferralRequest, sqlx::Error> {
        Ok(ReferralRequest::default())
    }
    async fn resolve_request(
        &self,
        _id: Uuid,
        _responder_id: Uuid,
        _status: RequestStatus,
        _response: String,
    ) -> Result<Option<ReferralRequest>, sqlx::Error> {
        Ok(None)
    }
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        Ok(DashboardStats::default())
    }
}

// --- Fixtures ---

const STAFF_ID: Uuid = Uuid::from_u128(0x51);
const ADMIN_ID: Uuid = Uuid::from_u128(0x52);

fn dept_a() -> Uuid {
    Uuid::from_u128(0xA)
}

fn dept_b() -> Uuid {
    Uuid::from_u128(0xB)
}

fn test_router() -> axum::Router {
    let users = vec![
        User {
            id: STAFF_ID,
            email: "staff@campus.edu".to_string(),
            name: "Staff Member".to_string(),
            role: Role::Staff,
            department_id: Some(dept_a()),
        },
        User {
            id: ADMIN_ID,
            email: "admin@campus.edu".to_string(),
            name: "Portal Admin".to_string(),
            role: Role::Admin,
            department_id: None,
        },
    ];
    let placements = vec![
        Placement {
            id: Uuid::from_u128(0x61),
            department_id: dept_a(),
            ..Placement::default()
        },
        Placement {
            id: Uuid::from_u128(0x62),
            department_id: dept_b(),
            ..Placement::default()
        },
    ];

    let state = AppState {
        repo: Arc::new(MockPortalRepo { users, placements }),
        config: AppConfig::default(), // Env::Local => x-user-id bypass active
    };
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Tests ---

#[tokio::test]
async fn health_check_is_public() {
    let response = test_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn placements_require_a_session() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/placements")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_placement_listing_is_department_scoped_end_to_end() {
    // The staff caller explicitly requests department B; the response must
    // still contain only department A records.
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri(format!("/placements?department_id={}", dept_b()))
                .header("x-user-id", STAFF_ID.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let placements = body_json(response).await;
    let records = placements.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0]["department_id"].as_str().unwrap(),
        dept_a().to_string()
    );
}

#[tokio::test]
async fn admin_placement_listing_spans_departments() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/placements")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let placements = body_json(response).await;
    assert_eq!(placements.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cross_department_create_is_rejected_with_error_body() {
    let payload = serde_json::json!({
        "position": "SDE I",
        "student_id": Uuid::new_v4(),
        "company_id": Uuid::new_v4(),
        "department_id": dept_b(), // staff belongs to department A
        "package_lpa": 10.0,
        "interview_at": Utc::now(),
        "notes": null
    });

    let response = test_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/placements")
                .header("x-user-id", STAFF_ID.to_string())
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"].as_str().unwrap(), "forbidden");
}

#[tokio::test]
async fn invalid_test_payload_returns_field_level_message() {
    let payload = serde_json::json!({
        "title": "Aptitude Test",
        "type": "APTITUDE",
        "duration_minutes": 30,
        "total_marks": 100,
        "passing_marks": 120,
        "department_id": dept_a()
    });

    let response = test_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tests")
                .header("x-user-id", STAFF_ID.to_string())
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"].as_str().unwrap(), "passing_marks");
}

#[tokio::test]
async fn admin_stats_rejects_staff() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/admin/stats")
                .header("x-user-id", STAFF_ID.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_stats_allows_admin() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/admin/stats")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
