use axum::{
    routing::{get, post, put},
    Router,
};

pub mod inventory;
pub mod orders;
pub mod preferences;
pub mod session;
pub mod system;

/// Router for all endpoints that need an open session.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/journal", get(system::journal))
        .route("/session", axum::routing::delete(session::close_session))
        .route("/preferences", get(preferences::get_preferences))
        .route("/preferences/theme", put(preferences::set_theme))
        .route("/preferences/theme/toggle", post(preferences::toggle_theme))
        .nest("/orders", orders::router())
        .nest("/inventory", inventory::router())
}
