use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};

use opd_queue_cell::{create_opd_queue_router, AllocationEngine};

fn create_test_app() -> Router {
    create_opd_queue_router(Arc::new(AllocationEngine::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn setup_doctor(app: &Router, capacity: u32) {
    let (status, body) = send(
        app,
        "POST",
        "/setup-doctor/D",
        Some(json!([
            {"slot_id": "S1", "start_time": "09:00", "end_time": "10:00", "max_capacity": capacity}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Schedule for D initialized");
}

#[tokio::test]
async fn test_book_token_by_name_and_rank() {
    let app = create_test_app();
    setup_doctor(&app, 5).await;

    let (status, token) = send(&app, "POST", "/book-token/D/S1?name=Alice&priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_id"], "TKN-1");
    assert_eq!(token["patient_name"], "Alice");
    assert_eq!(token["priority"], "ONLINE");
    assert_eq!(token["status"], "pending");

    let (status, token) = send(&app, "POST", "/book-token/D/S1?name=Bob&priority=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["priority"], "EMERGENCY");

    let (status, schedule) = send(&app, "GET", "/schedule/D", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule[0]["tokens"][0]["patient_name"], "Bob");
    assert_eq!(schedule[0]["tokens"][1]["patient_name"], "Alice");
}

#[tokio::test]
async fn test_book_token_unknown_targets_return_not_found() {
    let app = create_test_app();
    setup_doctor(&app, 5).await;

    let (status, body) = send(&app, "POST", "/book-token/X/S1?name=Alice&priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Doctor not found"));

    let (status, _) = send(&app, "POST", "/book-token/D/S9?name=Alice&priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_slot_returns_conflict_but_admits_emergency() {
    let app = create_test_app();
    setup_doctor(&app, 1).await;

    let (status, _) = send(&app, "POST", "/book-token/D/S1?name=A&priority=WALK_IN", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/book-token/D/S1?name=B&priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("maximum capacity"));

    let (status, _) = send(&app, "POST", "/book-token/D/S1?name=C&priority=EMERGENCY", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_book_token_rejects_bad_input() {
    let app = create_test_app();
    setup_doctor(&app, 5).await;

    let (status, body) = send(&app, "POST", "/book-token/D/S1?name=A&priority=URGENT", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown priority: URGENT"));

    let (status, body) = send(&app, "POST", "/book-token/D/S1?priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));

    let (status, body) = send(&app, "POST", "/book-token/D/S1?name=%20&priority=ONLINE", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Patient name is required");

    let (_, schedule) = send(&app, "GET", "/schedule/D", None).await;
    assert!(schedule[0]["tokens"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_setup_doctor_rejects_malformed_body() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/setup-doctor/D",
        Some(json!([{"slot_id": "S1", "max_capacity": "five"}])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/setup-doctor/D")
        .body(Body::from("[]"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/schedule/D", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_token_is_always_successful() {
    let app = create_test_app();
    setup_doctor(&app, 5).await;
    send(&app, "POST", "/book-token/D/S1?name=A&priority=ONLINE", None).await;

    let (status, body) = send(&app, "POST", "/cancel-token/D/S1/TKN-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);

    let (status, body) = send(&app, "POST", "/cancel-token/D/S1/TKN-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);

    let (status, _) = send(&app, "POST", "/cancel-token/X/S1/TKN-1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_relieve_starvation_reports_upgrade() {
    let app = create_test_app();
    setup_doctor(&app, 5).await;
    for (name, priority) in [("Alice", "ONLINE"), ("John", "WALK_IN"), ("Bob", "EMERGENCY"), ("Charlie", "PAID_PRIORITY")] {
        let uri = format!("/book-token/D/S1?name={}&priority={}", name, priority);
        let (status, _) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "POST", "/relieve-starvation/D/S1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upgraded"]["patient_name"], "John");
    assert_eq!(body["upgraded"]["previous_priority"], "WALK_IN");
    assert_eq!(body["upgraded"]["new_priority"], "PAID_PRIORITY");

    let (_, schedule) = send(&app, "GET", "/schedule/D", None).await;
    let names: Vec<&str> = schedule[0]["tokens"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["patient_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bob", "Charlie", "John", "Alice"]);

    let (status, body) = send(&app, "POST", "/relieve-starvation/X/S1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["upgraded"].is_null());
}

#[tokio::test]
async fn test_schedule_for_unknown_doctor_is_not_found() {
    let app = create_test_app();

    let (status, _) = send(&app, "GET", "/schedule/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
