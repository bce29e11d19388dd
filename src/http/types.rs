use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Shared service state. The single connection behind a mutex gives every
/// request a scoped database session: acquired after the payload is parsed,
/// released when the handler returns on any path.
pub struct AppState {
    pub db: Mutex<Connection>,
    pub upload_dir: PathBuf,
    pub base_url: String,
}

impl AppState {
    pub fn new(conn: Connection, upload_dir: PathBuf, base_url: String) -> Self {
        AppState {
            db: Mutex::new(conn),
            upload_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Public link under the static mount for a stored upload.
    pub fn static_link(&self, file_name: &str) -> String {
        format!("{}/static/{}", self.base_url, file_name)
    }
}

/// Account role. Stored as text in `users.role`; students and faculty get a
/// profile row alongside the credential, HOD and Admin are credential-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Faculty,
    #[serde(rename = "HOD")]
    Hod,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::Hod => "HOD",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Student" => Some(Role::Student),
            "Faculty" => Some(Role::Faculty),
            "HOD" => Some(Role::Hod),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}
