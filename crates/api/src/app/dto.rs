use serde::Deserialize;
use serde_json::Value as JsonValue;

use repairdesk_core::Money;
use repairdesk_events::EventEnvelope;
use repairdesk_infra::{Session, Theme};
use repairdesk_inventory::{InventoryItem, ItemDetails};
use repairdesk_orders::{OrderStatus, PaymentStatus, RequiredPart, ServiceOrder};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SetThemeRequest {
    pub theme: Theme,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// The search term, if one was given and is not blank.
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct PartLineRequest {
    pub inventory_item_id: String,
    pub quantity: i64,
}

/// Body of `POST /orders` and `PUT /orders/:id`.
///
/// On update, omitting `parts` keeps the order's current parts; an empty list
/// removes them all.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub client_name: String,
    pub equipment: String,
    pub defect: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub parts: Option<Vec<PartLineRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ChangePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// Body of `POST /inventory` and `PUT /inventory/:id`. Prices are in cents.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl ItemRequest {
    pub fn into_details(self) -> ItemDetails {
        ItemDetails {
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            unit_price: Money::from_cents(self.unit_price),
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn session_to_json(session: &Session) -> JsonValue {
    serde_json::json!({
        "token": session.token.to_string(),
        "username": session.username,
        "theme": session.theme,
        "opened_at": session.opened_at,
    })
}

pub fn item_to_json(item: &InventoryItem, reserved: i64) -> JsonValue {
    serde_json::json!({
        "id": item.id_typed().to_string(),
        "name": item.name(),
        "description": item.description(),
        "quantity": item.quantity(),
        "reserved": reserved,
        "unit_price": item.unit_price().cents(),
        "unit_price_display": item.unit_price().to_string(),
    })
}

fn part_to_json(part: &RequiredPart) -> JsonValue {
    serde_json::json!({
        "inventory_item_id": part.inventory_item_id.to_string(),
        "name": part.name,
        "quantity": part.quantity,
        "unit_price": part.unit_price.cents(),
        "line_total": part.line_total().cents(),
    })
}

pub fn order_to_json(order: &ServiceOrder) -> JsonValue {
    serde_json::json!({
        "id": order.id_typed().to_string(),
        "client_name": order.client_name(),
        "equipment": order.equipment(),
        "defect": order.defect(),
        "status": order.status(),
        "status_label": order.status().label(),
        "payment_status": order.payment_status(),
        "payment_status_label": order.payment_status().label(),
        "technician": order.technician(),
        "created_at": order.created_at(),
        "required_parts": order.required_parts().iter().map(part_to_json).collect::<Vec<_>>(),
        "parts_total": order.parts_total().cents(),
        "parts_total_display": order.parts_total().to_string(),
    })
}

pub fn envelope_to_json(envelope: &EventEnvelope<JsonValue>) -> JsonValue {
    serde_json::json!({
        "event_id": envelope.event_id().to_string(),
        "aggregate_type": envelope.aggregate_type(),
        "aggregate_id": envelope.aggregate_id().to_string(),
        "sequence_number": envelope.sequence_number(),
        "event_type": envelope.event_type(),
        "occurred_at": envelope.occurred_at(),
        "payload": envelope.payload(),
    })
}
