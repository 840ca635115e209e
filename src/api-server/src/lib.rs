// Faultline API Server
// REST layer over the directory, event store, and search engine

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;

pub use error::{ApiError, Result};
pub use server::Server;
pub use session::{AuthedUser, SessionStore};
pub use state::AppState;

/// Health check response
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
