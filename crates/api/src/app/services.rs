use std::sync::Arc;

use repairdesk_core::DomainError;
use repairdesk_infra::{InMemorySessionStore, Sessions, Workshop, WorkshopError, WorkshopResult};
use repairdesk_inventory::InventoryItemId;
use repairdesk_orders::{OrderDraft, ServiceOrder, ServiceOrderId};

use crate::app::{dto, errors};

/// Shared state behind every route.
#[derive(Debug)]
pub struct AppServices {
    workshop: Workshop,
    sessions: Arc<Sessions>,
}

/// Wire the in-memory workshop and session store, optionally with sample data.
pub fn build_services(demo_data: bool) -> WorkshopResult<AppServices> {
    let workshop = if demo_data {
        Workshop::with_demo_data()?
    } else {
        Workshop::new()
    };
    Ok(AppServices::new(workshop))
}

impl AppServices {
    pub fn new(workshop: Workshop) -> Self {
        Self {
            workshop,
            sessions: Arc::new(Sessions::new(InMemorySessionStore::new())),
        }
    }

    pub fn workshop(&self) -> &Workshop {
        &self.workshop
    }

    pub fn sessions(&self) -> &Arc<Sessions> {
        &self.sessions
    }

    /// Apply a create/update body to `draft`: copy the fields, then run every
    /// requested part line through the stock check.
    fn fill_draft(
        &self,
        draft: &mut OrderDraft,
        body: dto::OrderRequest,
    ) -> Result<(), axum::response::Response> {
        draft.details.client_name = body.client_name;
        draft.details.equipment = body.equipment;
        draft.details.defect = body.defect;
        if let Some(status) = body.status {
            draft.details.status = status;
        }
        if let Some(payment_status) = body.payment_status {
            draft.details.payment_status = payment_status;
        }

        let Some(lines) = body.parts else {
            return Ok(());
        };

        let mut requested = Vec::with_capacity(lines.len());
        for line in lines {
            let item_id: InventoryItemId = errors::parse_id(&line.inventory_item_id)?;
            requested.push((item_id, line.quantity));
        }

        let dropped: Vec<InventoryItemId> = draft
            .parts()
            .iter()
            .map(|p| p.inventory_item_id)
            .filter(|id| !requested.iter().any(|(r, _)| r == id))
            .collect();
        for item_id in dropped {
            draft.remove_part(item_id);
        }

        for (item_id, quantity) in requested {
            self.workshop
                .add_part(draft, item_id, quantity)
                .map_err(errors::workshop_error_to_response)?;
        }
        Ok(())
    }

    pub fn create_order(
        &self,
        body: dto::OrderRequest,
        technician: &str,
    ) -> Result<ServiceOrder, axum::response::Response> {
        let mut draft = OrderDraft::new();
        self.fill_draft(&mut draft, body)?;
        self.workshop
            .save_order(draft, technician)
            .map_err(errors::workshop_error_to_response)
    }

    pub fn update_order(
        &self,
        order_id: ServiceOrderId,
        body: dto::OrderRequest,
        technician: &str,
    ) -> Result<ServiceOrder, axum::response::Response> {
        let mut draft = self
            .workshop
            .edit_order(order_id)
            .map_err(errors::workshop_error_to_response)?;
        self.fill_draft(&mut draft, body)?;
        self.workshop
            .save_order(draft, technician)
            .map_err(errors::workshop_error_to_response)
    }

    pub fn item_json(&self, item_id: InventoryItemId) -> Result<serde_json::Value, WorkshopError> {
        let item = self
            .workshop
            .item(item_id)
            .ok_or(WorkshopError::Domain(DomainError::NotFound))?;
        Ok(dto::item_to_json(&item, self.workshop.reserved_quantity(item_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repairdesk_core::AggregateId;

    fn request(parts: Option<Vec<(&str, i64)>>) -> dto::OrderRequest {
        dto::OrderRequest {
            client_name: "João Silva".to_string(),
            equipment: "iPhone 11".to_string(),
            defect: "Tela quebrada".to_string(),
            status: None,
            payment_status: None,
            parts: parts.map(|lines| {
                lines
                    .into_iter()
                    .map(|(id, quantity)| dto::PartLineRequest {
                        inventory_item_id: id.to_string(),
                        quantity,
                    })
                    .collect()
            }),
        }
    }

    #[test]
    fn update_without_parts_keeps_them() {
        let services = build_services(true).unwrap();
        let order_id = ServiceOrderId::new(AggregateId::from_i64(1));

        let order = services.update_order(order_id, request(None), "tecnico").unwrap();
        assert_eq!(order.required_parts().len(), 1);
        assert_eq!(order.defect(), "Tela quebrada");
    }

    #[test]
    fn update_replaces_and_drops_lines() {
        let services = build_services(true).unwrap();
        let order_id = ServiceOrderId::new(AggregateId::from_i64(1));

        let order = services
            .update_order(order_id, request(Some(vec![("3", 2)])), "tecnico")
            .unwrap();
        assert_eq!(order.required_parts().len(), 1);
        assert_eq!(order.required_parts()[0].name, "Conector de Carga USB-C");

        let screen = InventoryItemId::new(AggregateId::from_i64(1));
        assert_eq!(services.workshop().item(screen).unwrap().quantity(), 11);
    }

    #[test]
    fn bad_part_id_is_rejected_before_saving() {
        let services = build_services(true).unwrap();
        let before = services.workshop().orders().len();
        assert!(services.create_order(request(Some(vec![("abc", 1)])), "tecnico").is_err());
        assert_eq!(services.workshop().orders().len(), before);
    }
}
