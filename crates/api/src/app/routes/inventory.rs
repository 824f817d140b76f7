use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use repairdesk_inventory::InventoryItemId;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

/// Newest first; `?q=` filters on the item name.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let workshop = services.workshop();
    let items = match query.term() {
        Some(term) => workshop.search_inventory(term),
        None => workshop.inventory(),
    };
    let body: Vec<_> = items
        .iter()
        .map(|item| dto::item_to_json(item, workshop.reserved_quantity(item.id_typed())))
        .collect();
    Json(body).into_response()
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ItemRequest>,
) -> axum::response::Response {
    match services.workshop().save_item(None, body.into_details()) {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item, 0))).into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: InventoryItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.item_json(item_id) {
        Ok(body) => Json(body).into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ItemRequest>,
) -> axum::response::Response {
    let item_id: InventoryItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    if let Err(e) = services.workshop().save_item(Some(item_id), body.into_details()) {
        return errors::workshop_error_to_response(e);
    }
    match services.item_json(item_id) {
        Ok(body) => Json(body).into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}

/// Refused with 409 `item_in_use` while any order lists the item.
pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: InventoryItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.workshop().delete_item(item_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::workshop_error_to_response(e),
    }
}
