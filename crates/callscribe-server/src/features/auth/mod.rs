//! Auth feature: registration, login and profile lookup

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::auth_routes;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User fields safe to return to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
}
