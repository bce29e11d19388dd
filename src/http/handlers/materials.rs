use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use rusqlite::{OptionalExtension, Row};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::handlers::courses::course_by_id;
use crate::http::types::AppState;
use crate::http::uploads::{remove_local_file, store_upload, UploadedFile};

const MATERIAL_COLUMNS: &str = "id, course_id, course_code, type, title, file_link, posted_by";

fn material_json(r: &Row) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": r.get::<_, i64>(0)?,
        "course_id": r.get::<_, i64>(1)?,
        "course_code": r.get::<_, String>(2)?,
        "type": r.get::<_, String>(3)?,
        "title": r.get::<_, String>(4)?,
        "file_link": r.get::<_, String>(5)?,
        "posted_by": r.get::<_, String>(6)?,
    }))
}

/// Parsed `POST /materials` form: exactly one of `file` / `file_link`.
#[derive(Debug)]
pub struct MaterialUpload {
    pub course_id: i64,
    pub kind: String,
    pub title: String,
    pub posted_by: String,
    pub file: Option<UploadedFile>,
    pub file_link: Option<String>,
}

/// Store the attachment (when one was sent) and insert the material row.
pub fn save_material(state: &AppState, form: MaterialUpload) -> Result<Value, ApiError> {
    let conn = state.conn();
    let course = course_by_id(&conn, form.course_id)?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let link = match (&form.file, &form.file_link) {
        (Some(file), None) => {
            let stored_name = store_upload(state, &course.code, file)?;
            state.static_link(&stored_name)
        }
        (None, Some(url)) => url.clone(),
        (None, None) => {
            return Err(ApiError::bad_request("Provide a file or a file_link"));
        }
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request(
                "Provide either a file or a file_link, not both",
            ));
        }
    };

    conn.execute(
        "INSERT INTO materials(course_id, course_code, type, title, file_link, posted_by)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            form.course_id,
            &course.code,
            &form.kind,
            &form.title,
            &link,
            &form.posted_by,
        ),
    )?;
    let id = conn.last_insert_rowid();

    let sql = format!("SELECT {} FROM materials WHERE id = ?", MATERIAL_COLUMNS);
    Ok(conn.query_row(&sql, [id], |r| material_json(r))?)
}

/// `POST /materials` — multipart with the text fields plus a binary `file`
/// or an external `file_link`, never both.
pub async fn upload_material(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut course_id: Option<i64> = None;
    let mut kind: Option<String> = None;
    let mut title: Option<String> = None;
    let mut posted_by: Option<String> = None;
    let mut file: Option<UploadedFile> = None;
    let mut file_link: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "course_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                course_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::bad_request("course_id must be an integer"))?,
                );
            }
            "type" => {
                kind = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                );
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                );
            }
            "posted_by" => {
                posted_by = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                );
            }
            "file_link" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                if !text.trim().is_empty() {
                    file_link = Some(text.trim().to_string());
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?
                    .to_vec();
                // An empty file part (no selection in the form) counts as absent.
                if !bytes.is_empty() {
                    file = Some(UploadedFile { file_name, bytes });
                }
            }
            _ => {}
        }
    }

    let form = MaterialUpload {
        course_id: course_id.ok_or_else(|| ApiError::bad_request("missing course_id"))?,
        kind: kind.ok_or_else(|| ApiError::bad_request("missing type"))?,
        title: title.ok_or_else(|| ApiError::bad_request("missing title"))?,
        posted_by: posted_by.ok_or_else(|| ApiError::bad_request("missing posted_by"))?,
        file,
        file_link,
    };
    Ok(Json(save_material(&state, form)?))
}

/// `GET /materials/{identifier}` — a numeric identifier selects by course
/// id; anything else is a substring match on the course code.
pub async fn list_materials(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();

    let rows = if let Ok(course_id) = identifier.parse::<i64>() {
        let sql = format!(
            "SELECT {} FROM materials WHERE course_id = ? ORDER BY id",
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([course_id], |r| material_json(r))?;
        rows.collect::<Result<Vec<_>, _>>()?
    } else {
        let sql = format!(
            "SELECT {} FROM materials WHERE course_code LIKE ? ORDER BY id",
            MATERIAL_COLUMNS
        );
        let pattern = format!("%{}%", identifier);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([&pattern], |r| material_json(r))?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    Ok(Json(Value::Array(rows)))
}

/// Delete the row, then best-effort delete the backing file when it lives
/// under the local static mount. The row is the source of truth; a file
/// that refuses to go away is not an error.
pub fn delete_material_by_id(state: &AppState, id: i64) -> Result<Value, ApiError> {
    let conn = state.conn();
    let file_link: Option<String> = conn
        .query_row("SELECT file_link FROM materials WHERE id = ?", [id], |r| {
            r.get(0)
        })
        .optional()?;
    let Some(file_link) = file_link else {
        return Err(ApiError::not_found("Material not found"));
    };

    conn.execute("DELETE FROM materials WHERE id = ?", [id])?;
    remove_local_file(state, &file_link);

    Ok(json!({ "message": "Material removed" }))
}

/// `DELETE /materials/{id}`
pub async fn delete_material(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(delete_material_by_id(&state, id)?))
}
