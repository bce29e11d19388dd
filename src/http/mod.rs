pub mod error;
pub mod handlers;
pub mod router;
pub mod types;
pub mod uploads;

pub use router::router;
pub use types::{AppState, Role};
