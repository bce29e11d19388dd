use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::types::AppState;
use crate::http::uploads::{store_upload, UploadedFile};

pub(crate) const STUDENT_COLUMNS: &str =
    "roll_no, name, year, semester, section, cgpa, attendance_percentage, profile_pic";

pub(crate) fn student_json(r: &Row) -> rusqlite::Result<Value> {
    Ok(json!({
        "roll_no": r.get::<_, String>(0)?,
        "name": r.get::<_, String>(1)?,
        "year": r.get::<_, i64>(2)?,
        "semester": r.get::<_, i64>(3)?,
        "section": r.get::<_, String>(4)?,
        "cgpa": r.get::<_, f64>(5)?,
        "attendance_percentage": r.get::<_, f64>(6)?,
        "profile_pic": r.get::<_, Option<String>>(7)?,
    }))
}

pub(crate) const FACULTY_COLUMNS: &str = "staff_no, name, designation, doj, profile_pic";

pub(crate) fn faculty_json(r: &Row) -> rusqlite::Result<Value> {
    Ok(json!({
        "staff_no": r.get::<_, String>(0)?,
        "name": r.get::<_, String>(1)?,
        "designation": r.get::<_, String>(2)?,
        "doj": r.get::<_, String>(3)?,
        "profile_pic": r.get::<_, Option<String>>(4)?,
    }))
}

fn fetch_student(conn: &Connection, roll_no: &str) -> Result<Value, ApiError> {
    let sql = format!("SELECT {} FROM students WHERE roll_no = ?", STUDENT_COLUMNS);
    conn.query_row(&sql, [roll_no], |r| student_json(r))
        .optional()?
        .ok_or_else(|| ApiError::not_found("Student not found"))
}

fn fetch_faculty(conn: &Connection, staff_no: &str) -> Result<Value, ApiError> {
    let sql = format!("SELECT {} FROM faculty WHERE staff_no = ?", FACULTY_COLUMNS);
    conn.query_row(&sql, [staff_no], |r| faculty_json(r))
        .optional()?
        .ok_or_else(|| ApiError::not_found("Faculty not found"))
}

/// `GET /student/{roll_no}`
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    Ok(Json(fetch_student(&conn, &roll_no)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub semester: Option<i64>,
    pub section: Option<String>,
}

/// `POST /student/{roll_no}` — partial profile update; unspecified fields
/// are left untouched.
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let changed = conn.execute(
        "UPDATE students SET
            name = COALESCE(?1, name),
            year = COALESCE(?2, year),
            semester = COALESCE(?3, semester),
            section = COALESCE(?4, section)
         WHERE roll_no = ?5",
        (
            update.name.as_deref(),
            update.year,
            update.semester,
            update.section.as_deref(),
            &roll_no,
        ),
    )?;
    if changed == 0 {
        return Err(ApiError::not_found("Student not found"));
    }
    Ok(Json(fetch_student(&conn, &roll_no)?))
}

/// `GET /faculty/{staff_no}`
pub async fn get_faculty(
    State(state): State<Arc<AppState>>,
    Path(staff_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    Ok(Json(fetch_faculty(&conn, &staff_no)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct FacultyUpdate {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub doj: Option<String>,
}

/// `POST /faculty/{staff_no}` — partial profile update.
pub async fn update_faculty(
    State(state): State<Arc<AppState>>,
    Path(staff_no): Path<String>,
    Json(update): Json<FacultyUpdate>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let changed = conn.execute(
        "UPDATE faculty SET
            name = COALESCE(?1, name),
            designation = COALESCE(?2, designation),
            doj = COALESCE(?3, doj)
         WHERE staff_no = ?4",
        (
            update.name.as_deref(),
            update.designation.as_deref(),
            update.doj.as_deref(),
            &staff_no,
        ),
    )?;
    if changed == 0 {
        return Err(ApiError::not_found("Faculty not found"));
    }
    Ok(Json(fetch_faculty(&conn, &staff_no)?))
}

/// Store a profile photo and point `students.profile_pic` at it.
pub fn set_student_photo(
    state: &AppState,
    roll_no: &str,
    upload: &UploadedFile,
) -> Result<Value, ApiError> {
    let link = {
        let conn = state.conn();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students WHERE roll_no = ?",
                [roll_no],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(ApiError::not_found("Student not found"));
        }
        let stored_name = store_upload(state, roll_no, upload)?;
        let link = state.static_link(&stored_name);
        conn.execute(
            "UPDATE students SET profile_pic = ? WHERE roll_no = ?",
            (&link, roll_no),
        )?;
        link
    };
    Ok(json!({ "roll_no": roll_no, "profile_pic": link }))
}

pub fn set_faculty_photo(
    state: &AppState,
    staff_no: &str,
    upload: &UploadedFile,
) -> Result<Value, ApiError> {
    let link = {
        let conn = state.conn();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM faculty WHERE staff_no = ?",
                [staff_no],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(ApiError::not_found("Faculty not found"));
        }
        let stored_name = store_upload(state, staff_no, upload)?;
        let link = state.static_link(&stored_name);
        conn.execute(
            "UPDATE faculty SET profile_pic = ? WHERE staff_no = ?",
            (&link, staff_no),
        )?;
        link
    };
    Ok(json!({ "staff_no": staff_no, "profile_pic": link }))
}

/// Pull the single expected file field (plus an optional `roll_no` text
/// field) out of a multipart body.
async fn read_photo_form(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<UploadedFile>), ApiError> {
    let mut roll_no = None;
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "roll_no" => {
                roll_no = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                );
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("photo.bin").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?
                    .to_vec();
                file = Some(UploadedFile { file_name, bytes });
            }
            _ => {}
        }
    }
    Ok((roll_no, file))
}

/// `POST /student/upload-photo` — multipart `{roll_no, file}`.
pub async fn upload_student_photo(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (roll_no, file) = read_photo_form(multipart).await?;
    let roll_no = roll_no.ok_or_else(|| ApiError::bad_request("missing roll_no"))?;
    let file = file.ok_or_else(|| ApiError::bad_request("missing file"))?;
    Ok(Json(set_student_photo(&state, &roll_no, &file)?))
}

/// `POST /faculty/{staff_no}/photo` — multipart file.
pub async fn upload_faculty_photo(
    State(state): State<Arc<AppState>>,
    Path(staff_no): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (_, file) = read_photo_form(multipart).await?;
    let file = file.ok_or_else(|| ApiError::bad_request("missing file"))?;
    Ok(Json(set_faculty_photo(&state, &staff_no, &file)?))
}
