use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use colleged::{db, router, seed, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

fn app() -> (axum::Router, TempDir) {
    let conn = db::open_in_memory().expect("schema");
    seed::run(&conn).expect("seed");
    let dir = TempDir::new().expect("temp dir");
    let state = Arc::new(AppState::new(
        conn,
        dir.path().to_path_buf(),
        "http://localhost:8000".to_string(),
    ));
    (router(state), dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn the_route_table_serves_the_seeded_data() {
    let (app, _dir) = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/courses?semester=5&section=A")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let courses = body_json(response).await;
    assert_eq!(courses.as_array().expect("array").len(), 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({"username": "admin", "password": "admin123"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await;
    assert_eq!(token["role"], "Admin");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({"username": "admin", "password": "wrong"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["message"], "Incorrect username or password");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/student/21AD001")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let student = body_json(response).await;
    assert_eq!(student["section"], "A");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/student/ghost")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/marks/cia?student_id=21AD001")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().expect("array").len(), 3);
}

#[tokio::test]
async fn multi_step_writes_round_trip_over_http() {
    let (app, _dir) = app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/create-user",
            json!({
                "id": "21AD011",
                "name": "New Student",
                "role": "Student",
                "password": "pw",
                "year": 3,
                "semester": 5,
                "section": "A"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Fan-out ran: the new student sees the three seeded courses.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/marks/cia?student_id=21AD011")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().expect("array").len(), 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/marks/sync",
            json!({
                "student_roll_no": "21AD011",
                "course_code": "CS3401",
                "cia1_marks": 40.0,
                "cia1_retest": 45.0,
                "cia2_marks": 38.0,
                "cia2_retest": 20.0,
                "subject_attendance": 90.0
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/marks/cia?student_id=21AD011")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let rows = body_json(response).await;
    let synced = rows
        .as_array()
        .expect("array")
        .iter()
        .find(|r| r["subject"] == "CS3401")
        .expect("synced row")
        .clone();
    assert_eq!(synced["total"], 85.0);
}

#[tokio::test]
async fn uploaded_files_are_served_from_the_static_mount() {
    let (app, dir) = app();

    std::fs::write(dir.path().join("CS3401_123.pdf"), b"pdf bytes").expect("write upload");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/static/CS3401_123.pdf")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&bytes[..], b"pdf bytes");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/static/missing.pdf")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
