//! Chime API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Accepts free-form commands over HTTP, exposes the active timers and
//! alarms, and streams fire notifications to subscribers.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
