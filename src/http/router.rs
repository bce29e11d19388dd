use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::handlers::{admin, announcements, auth, courses, marks, materials, profiles};
use super::types::AppState;

/// Build the full route table. Uploaded files are served back from the
/// static mount under the same names the upload handlers generate.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(auth::login))
        .route("/admin/create-user", post(admin::create_user))
        .route("/admin/courses", post(admin::create_course))
        .route("/admin/courses/:course_id", delete(admin::delete_course))
        .route("/admin/enroll", post(admin::enroll))
        .route("/admin/faculties", get(admin::list_faculties))
        .route("/admin/students", get(admin::list_students))
        .route("/admin/toppers/overall", get(admin::toppers_overall))
        .route("/admin/toppers/classwise", get(admin::toppers_classwise))
        .route("/faculty/my-courses", get(courses::my_courses))
        .route(
            "/faculty/:staff_no",
            get(profiles::get_faculty).post(profiles::update_faculty),
        )
        .route(
            "/faculty/:staff_no/photo",
            post(profiles::upload_faculty_photo),
        )
        .route("/student/upload-photo", post(profiles::upload_student_photo))
        .route(
            "/student/:roll_no",
            get(profiles::get_student).post(profiles::update_student),
        )
        .route("/marks/section", get(marks::section_marks))
        .route("/marks/sync", post(marks::sync_marks))
        .route("/marks/cia", get(marks::cia_marks))
        .route("/materials", post(materials::upload_material))
        .route(
            "/materials/:identifier",
            get(materials::list_materials).delete(materials::delete_material),
        )
        .route(
            "/announcements",
            get(announcements::list_announcements).post(announcements::create_announcement),
        )
        .route("/courses", get(courses::list_courses))
        .nest_service("/static", ServeDir::new(&state.upload_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
