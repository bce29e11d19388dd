use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use rusqlite::{params_from_iter, OptionalExtension, Row, ToSql};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::types::AppState;

const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, type, course_code, section, posted_by";

fn announcement_json(r: &Row) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": r.get::<_, i64>(0)?,
        "title": r.get::<_, String>(1)?,
        "content": r.get::<_, String>(2)?,
        "type": r.get::<_, String>(3)?,
        "course_code": r.get::<_, String>(4)?,
        "section": r.get::<_, String>(5)?,
        "posted_by": r.get::<_, String>(6)?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementCreate {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub posted_by: String,
    pub course_code: Option<String>,
    pub section: Option<String>,
}

/// `POST /announcements` — broadcast rows are never updated after creation.
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    Json(data): Json<AnnouncementCreate>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    conn.execute(
        "INSERT INTO announcements(title, content, type, course_code, section, posted_by)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &data.title,
            &data.content,
            &data.kind,
            data.course_code.as_deref().unwrap_or("Global"),
            data.section.as_deref().unwrap_or("All"),
            &data.posted_by,
        ),
    )?;
    let id = conn.last_insert_rowid();

    let sql = format!(
        "SELECT {} FROM announcements WHERE id = ?",
        ANNOUNCEMENT_COLUMNS
    );
    Ok(Json(conn.query_row(&sql, [id], |r| announcement_json(r))?))
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub section: Option<String>,
    pub student_id: Option<String>,
}

/// `GET /announcements` — optionally scoped by type and section. When a
/// student id is given, the student's own section takes over; a section
/// scope always also matches the global "All" section. Newest first.
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnnouncementQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let mut section = query.section.clone();
    if let Some(ref student_id) = query.student_id {
        let resolved: Option<String> = conn
            .query_row(
                "SELECT section FROM students WHERE roll_no = ?",
                [student_id],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(resolved) = resolved {
            section = Some(resolved);
        }
    }

    let mut sql = format!("SELECT {} FROM announcements", ANNOUNCEMENT_COLUMNS);
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<&dyn ToSql> = Vec::new();
    if let Some(ref kind) = query.kind {
        clauses.push("type = ?");
        binds.push(kind);
    }
    if let Some(ref section) = section {
        clauses.push("(section = ? OR section = 'All')");
        binds.push(section);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(binds), |r| announcement_json(r))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}
