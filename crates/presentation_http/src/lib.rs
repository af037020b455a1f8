//! Speechgate HTTP presentation layer
//!
//! Exposes the speech gateway over HTTP: audio synthesis, voice and engine
//! listings, plus health endpoints.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::{ApiError, set_expose_internal_errors};
pub use extract::ApiJson;
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
