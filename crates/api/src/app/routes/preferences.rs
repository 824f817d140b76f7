use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use repairdesk_infra::Theme;

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

fn theme_response(theme: Theme) -> axum::response::Response {
    Json(serde_json::json!({ "theme": theme })).into_response()
}

pub async fn get_preferences(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    let theme = services.sessions().theme(&session.token()).unwrap_or_default();
    Json(serde_json::json!({
        "username": session.username(),
        "theme": theme,
    }))
    .into_response()
}

pub async fn set_theme(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::SetThemeRequest>,
) -> axum::response::Response {
    match services.sessions().set_theme(&session.token(), body.theme) {
        Ok(theme) => theme_response(theme),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn toggle_theme(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    match services.sessions().toggle_theme(&session.token()) {
        Ok(theme) => theme_response(theme),
        Err(e) => errors::domain_error_to_response(e),
    }
}
