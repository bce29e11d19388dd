use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::types::AppState;

fn default_section() -> String {
    "A".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SectionMarksQuery {
    pub course_code: String,
    #[serde(default = "default_section")]
    pub section: String,
}

/// `GET /marks/section` — the faculty grid: every student enrolled in a
/// course offering, with raw CIA fields and attendance.
pub async fn section_marks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SectionMarksQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let mut stmt = conn.prepare(
        "SELECT s.name, a.student_roll_no, a.cia1_marks, a.cia1_retest,
                a.cia2_marks, a.cia2_retest, a.subject_attendance
         FROM academic_data a
         JOIN students s ON s.roll_no = a.student_roll_no
         WHERE a.course_code = ? AND a.section = ?
         ORDER BY a.student_roll_no",
    )?;
    let rows = stmt
        .query_map((&query.course_code, &query.section), |r| {
            Ok(json!({
                "name": r.get::<_, String>(0)?,
                "roll_no": r.get::<_, String>(1)?,
                "cia1_marks": r.get::<_, f64>(2)?,
                "cia1_retest": r.get::<_, f64>(3)?,
                "cia2_marks": r.get::<_, f64>(4)?,
                "cia2_retest": r.get::<_, f64>(5)?,
                "subject_attendance": r.get::<_, f64>(6)?,
            }))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}

#[derive(Debug, Deserialize)]
pub struct MarkSyncRequest {
    pub student_roll_no: String,
    pub course_code: String,
    pub cia1_marks: f64,
    pub cia1_retest: f64,
    pub cia2_marks: f64,
    pub cia2_retest: f64,
    pub subject_attendance: f64,
}

/// `POST /marks/sync` — overwrite all five numeric fields on the matching
/// enrollment row. Last write wins; there is no versioning or audit trail.
pub async fn sync_marks(
    State(state): State<Arc<AppState>>,
    Json(data): Json<MarkSyncRequest>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let changed = conn.execute(
        "UPDATE academic_data SET
            cia1_marks = ?1, cia1_retest = ?2,
            cia2_marks = ?3, cia2_retest = ?4,
            subject_attendance = ?5
         WHERE id = (
            SELECT id FROM academic_data
            WHERE student_roll_no = ?6 AND course_code = ?7
            ORDER BY id LIMIT 1
         )",
        (
            data.cia1_marks,
            data.cia1_retest,
            data.cia2_marks,
            data.cia2_retest,
            data.subject_attendance,
            &data.student_roll_no,
            &data.course_code,
        ),
    )?;
    if changed == 0 {
        return Err(ApiError::not_found("Record not found"));
    }
    Ok(Json(json!({ "message": "Sync successful" })))
}

#[derive(Debug, Deserialize)]
pub struct CiaQuery {
    pub student_id: String,
}

/// A retest only counts when it beats the original attempt, independently
/// per CIA period.
fn cia_total(cia1: f64, cia1_retest: f64, cia2: f64, cia2_retest: f64) -> f64 {
    cia1.max(cia1_retest) + cia2.max(cia2_retest)
}

/// `GET /marks/cia` — the student-facing view: one row per enrollment with
/// the derived total.
pub async fn cia_marks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CiaQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let mut stmt = conn.prepare(
        "SELECT course_code, cia1_marks, cia1_retest, cia2_marks, cia2_retest,
                subject_attendance
         FROM academic_data
         WHERE student_roll_no = ?
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([&query.student_id], |r| {
            let cia1: f64 = r.get(1)?;
            let cia1_retest: f64 = r.get(2)?;
            let cia2: f64 = r.get(3)?;
            let cia2_retest: f64 = r.get(4)?;
            Ok(json!({
                "subject": r.get::<_, String>(0)?,
                "cia1": cia1,
                "cia1_retest": cia1_retest,
                "cia2": cia2,
                "cia2_retest": cia2_retest,
                "subject_attendance": r.get::<_, f64>(5)?,
                "total": cia_total(cia1, cia1_retest, cia2, cia2_retest),
            }))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rows)))
}

#[cfg(test)]
mod tests {
    use super::cia_total;

    #[test]
    fn retest_counts_only_when_it_beats_the_attempt() {
        assert_eq!(cia_total(40.0, 45.0, 38.0, 20.0), 85.0);
        assert_eq!(cia_total(40.0, 0.0, 38.0, 0.0), 78.0);
        assert_eq!(cia_total(0.0, 0.0, 0.0, 0.0), 0.0);
    }
}
