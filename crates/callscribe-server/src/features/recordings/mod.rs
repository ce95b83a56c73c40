//! Recordings feature: call audio upload, listing and deletion

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::recordings_routes;
