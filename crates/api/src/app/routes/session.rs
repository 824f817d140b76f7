use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

/// Sign in as a technician. There is no password: the name identifies who
/// opened and edited orders.
pub async fn open_session(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::OpenSessionRequest>,
) -> axum::response::Response {
    match services.sessions().open(&body.username) {
        Ok(session) => (StatusCode::CREATED, Json(dto::session_to_json(&session))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn close_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> StatusCode {
    services.sessions().close(&session.token());
    StatusCode::NO_CONTENT
}
