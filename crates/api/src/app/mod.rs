//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared state (workshop, sessions) and order form handling
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let session_state = middleware::SessionState {
        sessions: Arc::clone(services.sessions()),
    };

    // Protected routes: require an open session.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        session_state,
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/session", post(routes::session::open_session))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
