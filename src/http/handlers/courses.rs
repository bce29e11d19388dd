use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, ToSql};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::types::AppState;

#[derive(Debug, Clone)]
pub(crate) struct CourseRec {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub semester: i64,
    pub credits: i64,
    pub category: Option<String>,
    pub section: String,
    pub faculty_id: Option<String>,
}

pub(crate) const COURSE_COLUMNS: &str =
    "id, code, title, semester, credits, category, section, faculty_id";

pub(crate) fn course_from_row(r: &Row) -> rusqlite::Result<CourseRec> {
    Ok(CourseRec {
        id: r.get(0)?,
        code: r.get(1)?,
        title: r.get(2)?,
        semester: r.get(3)?,
        credits: r.get(4)?,
        category: r.get(5)?,
        section: r.get(6)?,
        faculty_id: r.get(7)?,
    })
}

pub(crate) fn course_json(c: &CourseRec) -> Value {
    json!({
        "id": c.id,
        "code": c.code,
        "title": c.title,
        "semester": c.semester,
        "credits": c.credits,
        "category": c.category,
        "section": c.section,
        "faculty_id": c.faculty_id,
    })
}

pub(crate) fn course_by_id(conn: &Connection, id: i64) -> Result<Option<CourseRec>, ApiError> {
    let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS);
    Ok(conn
        .query_row(&sql, [id], |r| course_from_row(r))
        .optional()?)
}

#[derive(Debug, Deserialize)]
pub struct CourseFilter {
    pub semester: Option<i64>,
    pub section: Option<String>,
}

/// `GET /courses` — course catalogue, optionally narrowed to a semester
/// and/or section.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let mut sql = format!("SELECT {} FROM courses", COURSE_COLUMNS);
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<&dyn ToSql> = Vec::new();
    if let Some(ref semester) = filter.semester {
        clauses.push("semester = ?");
        binds.push(semester);
    }
    if let Some(ref section) = filter.section {
        clauses.push("section = ?");
        binds.push(section);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(binds), |r| {
            Ok(course_json(&course_from_row(r)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Value::Array(rows)))
}

#[derive(Debug, Deserialize)]
pub struct MyCoursesQuery {
    pub staff_no: String,
}

/// `GET /faculty/my-courses` — courses assigned to one faculty member.
pub async fn my_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MyCoursesQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let sql = format!(
        "SELECT {} FROM courses WHERE faculty_id = ? ORDER BY id",
        COURSE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([&query.staff_no], |r| Ok(course_json(&course_from_row(r)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}
