use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use colleged::http::handlers::{admin, courses};
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

async fn create_student(state: &Arc<AppState>, id: &str, year: i64, section: &str, cgpa: f64) {
    admin::create_user(
        State(state.clone()),
        Json(admin::CreateUserRequest {
            id: id.to_string(),
            name: format!("{} name", id),
            role: Role::Student,
            password: "pw".to_string(),
            year,
            semester: 5,
            section: section.to_string(),
            designation: None,
            doj: None,
        }),
    )
    .await
    .expect("student");
    // New profiles start at cgpa 0; rankings are exercised with real values.
    state
        .conn()
        .execute(
            "UPDATE students SET cgpa = ? WHERE roll_no = ?",
            (cgpa, id),
        )
        .expect("set cgpa");
}

fn rolls(rows: &serde_json::Value) -> Vec<String> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|r| r["roll_no"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn overall_toppers_rank_by_cgpa_descending() {
    let state = state();
    create_student(&state, "21AD001", 3, "A", 8.5).await;
    create_student(&state, "21AD002", 3, "A", 9.1).await;
    create_student(&state, "21AD003", 2, "B", 7.8).await;

    let rows = admin::toppers_overall(
        State(state.clone()),
        Query(admin::OverallToppersQuery { limit: 2 }),
    )
    .await
    .expect("toppers")
    .0;
    assert_eq!(rolls(&rows), vec!["21AD002", "21AD001"]);
}

#[tokio::test]
async fn classwise_toppers_scope_to_year_and_section() {
    let state = state();
    create_student(&state, "21AD001", 3, "A", 8.5).await;
    create_student(&state, "21AD002", 3, "B", 9.1).await;
    create_student(&state, "21AD003", 2, "A", 9.9).await;

    let by_year = admin::toppers_classwise(
        State(state.clone()),
        Query(admin::ClasswiseToppersQuery {
            year: 3,
            section: None,
            limit: 10,
        }),
    )
    .await
    .expect("year scope")
    .0;
    assert_eq!(rolls(&by_year), vec!["21AD002", "21AD001"]);

    let by_section = admin::toppers_classwise(
        State(state.clone()),
        Query(admin::ClasswiseToppersQuery {
            year: 3,
            section: Some("A".to_string()),
            limit: 10,
        }),
    )
    .await
    .expect("section scope")
    .0;
    assert_eq!(rolls(&by_section), vec!["21AD001"]);
}

#[tokio::test]
async fn admin_listings_return_every_profile() {
    let state = state();
    create_student(&state, "21AD001", 3, "A", 8.5).await;
    admin::create_user(
        State(state.clone()),
        Json(admin::CreateUserRequest {
            id: "HTS 1794".to_string(),
            name: "Dr. Sankar".to_string(),
            role: Role::Faculty,
            password: "20012025".to_string(),
            year: 1,
            semester: 1,
            section: "A".to_string(),
            designation: Some("Professor".to_string()),
            doj: Some("20.01.2025".to_string()),
        }),
    )
    .await
    .expect("faculty");

    let students = admin::list_students(State(state.clone())).await.expect("students").0;
    assert_eq!(students.as_array().expect("array").len(), 1);

    let faculties = admin::list_faculties(State(state.clone())).await.expect("faculties").0;
    let faculties = faculties.as_array().expect("array");
    assert_eq!(faculties.len(), 1);
    assert_eq!(faculties[0]["staff_no"], "HTS 1794");
    assert_eq!(faculties[0]["designation"], "Professor");
}

#[tokio::test]
async fn course_catalogue_filters_and_faculty_assignment() {
    let state = state();
    admin::create_user(
        State(state.clone()),
        Json(admin::CreateUserRequest {
            id: "HTS 1794".to_string(),
            name: "Dr. Sankar".to_string(),
            role: Role::Faculty,
            password: "pw".to_string(),
            year: 1,
            semester: 1,
            section: "A".to_string(),
            designation: None,
            doj: None,
        }),
    )
    .await
    .expect("faculty");

    for (code, semester, section, faculty) in [
        ("CS3401", 5, "A", Some("HTS 1794")),
        ("CS3401", 5, "B", None),
        ("GE3151", 3, "A", None),
    ] {
        admin::create_course(
            State(state.clone()),
            Json(admin::CourseCreate {
                code: code.to_string(),
                title: format!("{} title", code),
                semester,
                credits: 3,
                category: None,
                section: section.to_string(),
                faculty_id: faculty.map(|f| f.to_string()),
            }),
        )
        .await
        .expect("course");
    }

    let all = courses::list_courses(
        State(state.clone()),
        Query(courses::CourseFilter {
            semester: None,
            section: None,
        }),
    )
    .await
    .expect("all")
    .0;
    assert_eq!(all.as_array().expect("array").len(), 3);

    let sem5_a = courses::list_courses(
        State(state.clone()),
        Query(courses::CourseFilter {
            semester: Some(5),
            section: Some("A".to_string()),
        }),
    )
    .await
    .expect("filtered")
    .0;
    let sem5_a = sem5_a.as_array().expect("array");
    assert_eq!(sem5_a.len(), 1);
    assert_eq!(sem5_a[0]["code"], "CS3401");

    let mine = courses::my_courses(
        State(state.clone()),
        Query(courses::MyCoursesQuery {
            staff_no: "HTS 1794".to_string(),
        }),
    )
    .await
    .expect("mine")
    .0;
    let mine = mine.as_array().expect("array");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["section"], "A");
}
