use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use rusqlite::{params_from_iter, Connection, OptionalExtension, ToSql};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::handlers::courses::{course_from_row, course_json, CourseRec, COURSE_COLUMNS};
use crate::http::handlers::profiles::{
    faculty_json, student_json, FACULTY_COLUMNS, STUDENT_COLUMNS,
};
use crate::http::types::{AppState, Role};

fn default_year() -> i64 {
    1
}

fn default_semester() -> i64 {
    1
}

fn default_section() -> String {
    "A".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub password: String,
    #[serde(default = "default_year")]
    pub year: i64,
    #[serde(default = "default_semester")]
    pub semester: i64,
    #[serde(default = "default_section")]
    pub section: String,
    pub designation: Option<String>,
    pub doj: Option<String>,
}

fn user_exists(conn: &Connection, id: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row("SELECT 1 FROM users WHERE id = ?", [id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
}

fn enrollment_exists(
    conn: &Connection,
    roll_no: &str,
    course_id: i64,
) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT 1 FROM academic_data WHERE student_roll_no = ? AND course_id = ?",
        (roll_no, course_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

// Numeric fields rely on the schema's 0.0 defaults.
fn insert_enrollment(
    conn: &Connection,
    roll_no: &str,
    course: &CourseRec,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO academic_data(student_roll_no, course_id, course_code, subject, section, status)
         VALUES(?, ?, ?, ?, ?, 'Pursuing')",
        (roll_no, course.id, &course.code, &course.title, &course.section),
    )?;
    Ok(())
}

fn courses_matching(
    conn: &Connection,
    semester: i64,
    section: &str,
) -> Result<Vec<CourseRec>, rusqlite::Error> {
    let sql = format!(
        "SELECT {} FROM courses WHERE semester = ? AND section = ?",
        COURSE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map((semester, section), |r| course_from_row(r))?;
    rows.collect()
}

/// `POST /admin/create-user` — insert the credential row, then the
/// role-specific profile. New students are fanned out into every course
/// matching their (semester, section). The whole sequence is one
/// transaction; a failure anywhere rolls the lot back.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(data): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    if user_exists(&conn, &data.id)? {
        return Err(ApiError::conflict("User ID already exists"));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO users(id, role, password) VALUES(?, ?, ?)",
        (&data.id, data.role.as_str(), &data.password),
    )?;

    let message = match data.role {
        Role::Student => {
            tx.execute(
                "INSERT INTO students(roll_no, name, year, semester, section, cgpa, attendance_percentage)
                 VALUES(?, ?, ?, ?, ?, 0.0, 0.0)",
                (&data.id, &data.name, data.year, data.semester, &data.section),
            )?;

            let courses = courses_matching(&tx, data.semester, &data.section)?;
            for course in &courses {
                if !enrollment_exists(&tx, &data.id, course.id)? {
                    insert_enrollment(&tx, &data.id, course)?;
                }
            }
            tracing::info!(
                roll_no = %data.id,
                enrolled = courses.len(),
                "student created with fan-out enrollment"
            );
            format!("Student created and auto-enrolled in Section {}", data.section)
        }
        Role::Faculty => {
            tx.execute(
                "INSERT INTO faculty(staff_no, name, designation, doj) VALUES(?, ?, ?, ?)",
                (
                    &data.id,
                    &data.name,
                    data.designation.as_deref().unwrap_or("Assistant Professor"),
                    data.doj.as_deref().unwrap_or("01.01.2024"),
                ),
            )?;
            "Faculty created".to_string()
        }
        // HOD and Admin accounts are credential-only through this endpoint.
        Role::Hod | Role::Admin => format!("{} created", data.role.as_str()),
    };

    tx.commit()?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
pub struct CourseCreate {
    pub code: String,
    pub title: String,
    pub semester: i64,
    pub credits: i64,
    pub category: Option<String>,
    #[serde(default = "default_section")]
    pub section: String,
    pub faculty_id: Option<String>,
}

/// `POST /admin/courses` — the course code is unique only within a section.
/// Creation fans out the mirrored way: one enrollment row per existing
/// student matching (semester, section).
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(data): Json<CourseCreate>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let duplicate: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM courses WHERE code = ? AND section = ?",
            (&data.code, &data.section),
            |r| r.get(0),
        )
        .optional()?;
    if duplicate.is_some() {
        return Err(ApiError::conflict(format!(
            "Subject {} already exists for Section {}",
            data.code, data.section
        )));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO courses(code, title, semester, credits, category, section, faculty_id)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &data.code,
            &data.title,
            data.semester,
            data.credits,
            data.category.as_deref(),
            &data.section,
            data.faculty_id.as_deref(),
        ),
    )?;
    let course = CourseRec {
        id: tx.last_insert_rowid(),
        code: data.code,
        title: data.title,
        semester: data.semester,
        credits: data.credits,
        category: data.category,
        section: data.section,
        faculty_id: data.faculty_id,
    };

    let roll_nos = {
        let mut stmt =
            tx.prepare("SELECT roll_no FROM students WHERE semester = ? AND section = ?")?;
        let rows = stmt.query_map((course.semester, &course.section), |r| {
            r.get::<_, String>(0)
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };
    for roll_no in &roll_nos {
        if !enrollment_exists(&tx, roll_no, course.id)? {
            insert_enrollment(&tx, roll_no, &course)?;
        }
    }
    tx.commit()?;

    tracing::info!(
        code = %course.code,
        section = %course.section,
        enrolled = roll_nos.len(),
        "course created with fan-out enrollment"
    );
    Ok(Json(course_json(&course)))
}

/// `DELETE /admin/courses/{id}` — removes the course and every enrollment
/// row that points at it, in one transaction.
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM courses WHERE id = ?", [course_id], |r| {
            r.get(0)
        })
        .optional()?;
    if exists.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM academic_data WHERE course_id = ?", [course_id])?;
    tx.execute("DELETE FROM materials WHERE course_id = ?", [course_id])?;
    tx.execute("DELETE FROM courses WHERE id = ?", [course_id])?;
    tx.commit()?;

    Ok(Json(json!({ "message": "Course removed" })))
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_roll_no: String,
    pub course_code: String,
    #[serde(default = "default_section")]
    pub section: String,
}

/// `POST /admin/enroll` — explicit single enrollment. The duplicate check
/// here is the only thing keeping (student, course) unique; it is a
/// check-then-insert, not a constraint (see DESIGN.md).
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Json(data): Json<EnrollRequest>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let student: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM students WHERE roll_no = ?",
            [&data.student_roll_no],
            |r| r.get(0),
        )
        .optional()?;
    if student.is_none() {
        return Err(ApiError::not_found("Student not found"));
    }

    let sql = format!(
        "SELECT {} FROM courses WHERE code = ? AND section = ?",
        COURSE_COLUMNS
    );
    let course = conn
        .query_row(&sql, (&data.course_code, &data.section), |r| {
            course_from_row(r)
        })
        .optional()?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    if enrollment_exists(&conn, &data.student_roll_no, course.id)? {
        return Err(ApiError::conflict("Student already enrolled in this course"));
    }
    insert_enrollment(&conn, &data.student_roll_no, &course)?;

    Ok(Json(json!({
        "message": format!(
            "{} enrolled in {} (Section {})",
            data.student_roll_no, course.code, course.section
        )
    })))
}

/// `GET /admin/faculties`
pub async fn list_faculties(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let sql = format!("SELECT {} FROM faculty ORDER BY staff_no", FACULTY_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| faculty_json(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}

/// `GET /admin/students`
pub async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let sql = format!("SELECT {} FROM students ORDER BY roll_no", STUDENT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| student_json(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}

fn default_topper_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct OverallToppersQuery {
    #[serde(default = "default_topper_limit")]
    pub limit: i64,
}

/// `GET /admin/toppers/overall` — top-N students by CGPA. Re-sorts the full
/// row set on every call; there is no denormalized ranking.
pub async fn toppers_overall(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverallToppersQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let sql = format!(
        "SELECT {} FROM students ORDER BY cgpa DESC, roll_no LIMIT ?",
        STUDENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([query.limit], |r| student_json(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}

#[derive(Debug, Deserialize)]
pub struct ClasswiseToppersQuery {
    pub year: i64,
    pub section: Option<String>,
    #[serde(default = "default_topper_limit")]
    pub limit: i64,
}

/// `GET /admin/toppers/classwise` — toppers scoped to a year, optionally a
/// year + section.
pub async fn toppers_classwise(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClasswiseToppersQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let mut sql = format!("SELECT {} FROM students WHERE year = ?", STUDENT_COLUMNS);
    let mut binds: Vec<&dyn ToSql> = vec![&query.year];
    if let Some(ref section) = query.section {
        sql.push_str(" AND section = ?");
        binds.push(section);
    }
    sql.push_str(" ORDER BY cgpa DESC, roll_no LIMIT ?");
    binds.push(&query.limit);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(binds), |r| student_json(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}
