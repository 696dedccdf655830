use axum::http::StatusCode;
use placement_portal::models::{
    CreatePlacementRequest, CreateTestRequest, PlacementStatus, RequestStatus, Role, TestStatus,
};

// --- Validation rules ---

#[test]
fn create_test_rejects_passing_marks_above_total() {
    // The exact payload shape the frontend submits.
    let payload: CreateTestRequest = serde_json::from_value(serde_json::json!({
        "title": "Aptitude Test",
        "type": "APTITUDE",
        "duration_minutes": 30,
        "total_marks": 100,
        "passing_marks": 120,
        "department_id": "7a170d9e-2207-4f92-b1d7-0d62c3a0fbd8"
    }))
    .unwrap();

    let err = payload.validate().unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(err.to_string().contains("passing_marks"));
}

#[test]
fn create_test_rejects_short_durations_and_empty_mark_schemes() {
    let base = CreateTestRequest {
        title: "Coding Round".to_string(),
        test_type: placement_portal::models::TestType::Coding,
        duration_minutes: 60,
        total_marks: 100,
        passing_marks: 35,
        department_id: uuid::Uuid::new_v4(),
        scheduled_at: None,
    };
    assert!(base.validate().is_ok());

    let mut short = base.clone();
    short.duration_minutes = 4;
    assert!(short.validate().is_err());

    let mut no_marks = base.clone();
    no_marks.total_marks = 0;
    no_marks.passing_marks = 0;
    assert!(no_marks.validate().is_err());

    let mut untitled = base;
    untitled.title = "   ".to_string();
    assert!(untitled.validate().is_err());
}

#[test]
fn create_placement_requires_position_and_positive_package() {
    let base = CreatePlacementRequest {
        position: "SDE I".to_string(),
        student_id: uuid::Uuid::new_v4(),
        company_id: uuid::Uuid::new_v4(),
        department_id: uuid::Uuid::new_v4(),
        package_lpa: 6.5,
        interview_at: chrono::Utc::now(),
        notes: None,
    };
    assert!(base.validate().is_ok());

    let mut no_position = base.clone();
    no_position.position = String::new();
    assert!(no_position.validate().is_err());

    let mut free_internship = base;
    free_internship.package_lpa = 0.0;
    assert!(free_internship.validate().is_err());
}

// --- Wire representation ---

#[test]
fn roles_serialize_to_their_short_upper_case_names() {
    assert_eq!(serde_json::to_string(&Role::Hod).unwrap(), r#""HOD""#);
    assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), r#""STAFF""#);
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
    assert_eq!(serde_json::to_string(&Role::Student).unwrap(), r#""STUDENT""#);
    assert_eq!(serde_json::to_string(&Role::Alumni).unwrap(), r#""ALUMNI""#);
    // The placement representative uses the abbreviated wire name.
    assert_eq!(serde_json::to_string(&Role::PlacementRep).unwrap(), r#""PR""#);

    let parsed: Role = serde_json::from_str(r#""PR""#).unwrap();
    assert_eq!(parsed, Role::PlacementRep);
}

#[test]
fn create_test_payload_uses_type_as_the_json_key() {
    let payload = CreateTestRequest {
        title: "Technical Screen".to_string(),
        test_type: placement_portal::models::TestType::Technical,
        duration_minutes: 45,
        total_marks: 50,
        passing_marks: 20,
        department_id: uuid::Uuid::new_v4(),
        scheduled_at: None,
    };

    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains(r#""type":"TECHNICAL""#));
    assert!(!json.contains("test_type"));
}

// --- Status lifecycles ---

#[test]
fn placement_status_is_one_directional() {
    assert!(PlacementStatus::Scheduled.can_transition_to(PlacementStatus::Completed));
    assert!(PlacementStatus::Scheduled.can_transition_to(PlacementStatus::Cancelled));

    for terminal in [PlacementStatus::Completed, PlacementStatus::Cancelled] {
        assert!(terminal.is_terminal());
        for next in [
            PlacementStatus::Scheduled,
            PlacementStatus::Completed,
            PlacementStatus::Cancelled,
        ] {
            assert!(!terminal.can_transition_to(next));
        }
    }
}

#[test]
fn test_status_never_regresses() {
    assert!(TestStatus::Draft.can_transition_to(TestStatus::Published));
    assert!(TestStatus::Published.can_transition_to(TestStatus::Archived));

    assert!(!TestStatus::Draft.can_transition_to(TestStatus::Archived));
    assert!(!TestStatus::Published.can_transition_to(TestStatus::Draft));
    assert!(!TestStatus::Archived.can_transition_to(TestStatus::Published));
    assert!(!TestStatus::Archived.can_transition_to(TestStatus::Draft));
}

#[test]
fn request_status_terminal_set() {
    assert!(!RequestStatus::Pending.is_terminal());
    assert!(RequestStatus::Accepted.is_terminal());
    assert!(RequestStatus::Rejected.is_terminal());
}
