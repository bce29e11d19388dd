pub mod admin;
pub mod announcements;
pub mod auth;
pub mod courses;
pub mod marks;
pub mod materials;
pub mod profiles;
