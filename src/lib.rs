pub mod db;
pub mod http;
pub mod seed;

pub use http::{router, AppState};
