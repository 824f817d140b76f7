use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use repairdesk_orders::ServiceOrderId;

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/status", put(change_status))
        .route("/:id/payment", put(change_payment))
}

/// Newest first; `?q=` filters on client name or equipment.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let orders = match query.term() {
        Some(term) => services.workshop().search_orders(term),
        None => services.workshop().orders(),
    };
    Json(orders.iter().map(dto::order_to_json).collect::<Vec<_>>()).into_response()
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::OrderRequest>,
) -> axum::response::Response {
    match services.create_order(body, session.username()) {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(response) => response,
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: ServiceOrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.workshop().order(order_id) {
        Some(order) => Json(dto::order_to_json(&order)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrderRequest>,
) -> axum::response::Response {
    let order_id: ServiceOrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.update_order(order_id, body, session.username()) {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(response) => response,
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: ServiceOrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.workshop().delete_order(order_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ChangeStatusRequest>,
) -> axum::response::Response {
    let order_id: ServiceOrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.workshop().change_order_status(order_id, body.status) {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}

pub async fn change_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ChangePaymentRequest>,
) -> axum::response::Response {
    let order_id: ServiceOrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services
        .workshop()
        .change_payment_status(order_id, body.payment_status)
    {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}
