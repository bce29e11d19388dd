use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use colleged::http::handlers::{admin, marks};
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

#[tokio::test]
async fn deleting_a_course_removes_its_enrollment_rows() {
    let state = state();

    let course = admin::create_course(
        State(state.clone()),
        Json(admin::CourseCreate {
            code: "CS3401".to_string(),
            title: "Artificial Intelligence".to_string(),
            semester: 5,
            credits: 3,
            category: None,
            section: "A".to_string(),
            faculty_id: None,
        }),
    )
    .await
    .expect("course")
    .0;
    let course_id = course["id"].as_i64().expect("course id");

    for roll in ["21AD001", "21AD002"] {
        admin::create_user(
            State(state.clone()),
            Json(admin::CreateUserRequest {
                id: roll.to_string(),
                name: roll.to_string(),
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
    }

    let before: i64 = state
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM academic_data WHERE course_id = ?",
            [course_id],
            |r| r.get(0),
        )
        .expect("count");
    assert_eq!(before, 2);

    admin::delete_course(State(state.clone()), Path(course_id))
        .await
        .expect("delete");

    let after: i64 = state
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM academic_data WHERE course_id = ?",
            [course_id],
            |r| r.get(0),
        )
        .expect("count");
    assert_eq!(after, 0);

    // Subsequent marks queries for the course come back empty.
    let grid = marks::section_marks(
        State(state.clone()),
        Query(marks::SectionMarksQuery {
            course_code: "CS3401".to_string(),
            section: "A".to_string(),
        }),
    )
    .await
    .expect("grid")
    .0;
    assert_eq!(grid.as_array().expect("array").len(), 0);

    let missing = admin::delete_course(State(state.clone()), Path(course_id))
        .await
        .err()
        .expect("already gone");
    assert_eq!(missing.to_string(), "Course not found");
}
