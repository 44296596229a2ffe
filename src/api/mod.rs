//! Dashboard API module.
//!
//! REST endpoints for bot control, session status, configuration, and
//! stored data. A thin collaborator: handlers delegate straight to the
//! core components and never hold their locks across awaits.

pub mod routes;
pub mod server;

pub use routes::{create_router, AppState, StatusResponse};
pub use server::ApiServer;
