use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "username": session.username(),
    }))
}

/// Every committed domain event, oldest first.
pub async fn journal(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.workshop().journal() {
        Ok(events) => Json(serde_json::json!({
            "count": events.len(),
            "events": events.iter().map(dto::envelope_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}
