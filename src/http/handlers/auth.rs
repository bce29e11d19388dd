use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rusqlite::OptionalExtension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::types::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

const LOGIN_FAILED: &str = "Incorrect username or password";

/// Password check against the stored credential, verbatim. The returned
/// access token is the raw user id with no expiry or signature; this is the
/// credential scheme the deployed system uses and it is preserved as-is
/// (see DESIGN.md).
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn();
    let row = conn
        .query_row(
            "SELECT id, role, password FROM users WHERE id = ?",
            [&payload.username],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    // One error for both halves: never reveal whether the id or the
    // password was wrong.
    let Some((id, role, password)) = row else {
        return Err(ApiError::bad_request(LOGIN_FAILED));
    };
    if password != payload.password {
        return Err(ApiError::bad_request(LOGIN_FAILED));
    }

    Ok(Json(json!({
        "access_token": id,
        "token_type": "bearer",
        "role": role,
        "user_id": id,
    })))
}
