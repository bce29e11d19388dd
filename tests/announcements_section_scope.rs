use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use colleged::http::handlers::{admin, announcements};
use colleged::http::Role;
use colleged::{db, AppState};

fn state() -> Arc<AppState> {
    let conn = db::open_in_memory().expect("schema");
    Arc::new(AppState::new(
        conn,
        std::env::temp_dir(),
        "http://localhost:8000".to_string(),
    ))
}

async fn post(state: &Arc<AppState>, title: &str, kind: &str, section: Option<&str>) {
    announcements::create_announcement(
        State(state.clone()),
        Json(announcements::AnnouncementCreate {
            title: title.to_string(),
            content: format!("{} content", title),
            kind: kind.to_string(),
            posted_by: "HTS 1655".to_string(),
            course_code: None,
            section: section.map(|s| s.to_string()),
        }),
    )
    .await
    .expect("announcement");
}

async fn list(state: &Arc<AppState>, query: announcements::AnnouncementQuery) -> Vec<String> {
    let rows = announcements::list_announcements(State(state.clone()), Query(query))
        .await
        .expect("list")
        .0;
    rows.as_array()
        .expect("array")
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn student_scope_matches_own_section_and_all_newest_first() {
    let state = state();
    admin::create_user(
        State(state.clone()),
        Json(admin::CreateUserRequest {
            id: "21AD001".to_string(),
            name: "Original Student".to_string(),
            role: Role::Student,
            password: "pw".to_string(),
            year: 3,
            semester: 5,
            section: "A".to_string(),
            designation: None,
            doj: None,
        }),
    )
    .await
    .expect("student");

    post(&state, "for section A", "Student", Some("A")).await;
    post(&state, "for section B", "Student", Some("B")).await;
    post(&state, "for everyone", "Global", None).await; // defaults to All

    let titles = list(
        &state,
        announcements::AnnouncementQuery {
            kind: None,
            section: None,
            student_id: Some("21AD001".to_string()),
        },
    )
    .await;
    assert_eq!(titles, vec!["for everyone", "for section A"]);
}

#[tokio::test]
async fn type_filter_narrows_the_feed() {
    let state = state();
    post(&state, "exam notice", "Student", Some("All")).await;
    post(&state, "staff meeting", "Faculty", Some("All")).await;

    let titles = list(
        &state,
        announcements::AnnouncementQuery {
            kind: Some("Faculty".to_string()),
            section: None,
            student_id: None,
        },
    )
    .await;
    assert_eq!(titles, vec!["staff meeting"]);
}

#[tokio::test]
async fn explicit_section_scope_includes_the_global_rows() {
    let state = state();
    post(&state, "b only", "Student", Some("B")).await;
    post(&state, "global", "Student", None).await;
    post(&state, "a only", "Student", Some("A")).await;

    let titles = list(
        &state,
        announcements::AnnouncementQuery {
            kind: None,
            section: Some("B".to_string()),
            student_id: None,
        },
    )
    .await;
    assert_eq!(titles, vec!["global", "b only"]);
}

#[tokio::test]
async fn created_rows_carry_the_defaults() {
    let state = state();
    let row = announcements::create_announcement(
        State(state.clone()),
        Json(announcements::AnnouncementCreate {
            title: "defaults".to_string(),
            content: "body".to_string(),
            kind: "Global".to_string(),
            posted_by: "admin".to_string(),
            course_code: None,
            section: None,
        }),
    )
    .await
    .expect("create")
    .0;
    assert_eq!(row["course_code"], "Global");
    assert_eq!(row["section"], "All");
}
