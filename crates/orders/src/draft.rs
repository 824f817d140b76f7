//! Editable copy of a service order (the order form).
//!
//! Parts are added here, one at a time, and this is where stock availability
//! is checked. Saving the draft later moves stock unconditionally.

use repairdesk_core::{DomainError, DomainResult, Money};
use repairdesk_inventory::{InventoryItem, InventoryItemId};

use crate::order::{OrderDetails, RequiredPart, ServiceOrder, ServiceOrderId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraft {
    /// `None` until the order has been saved once.
    pub id: Option<ServiceOrderId>,
    pub details: OrderDetails,
    /// Parts the order held when editing started.
    original_parts: Vec<RequiredPart>,
}

impl OrderDraft {
    /// Blank draft for a new order (statuses pending, no parts).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_order(order: &ServiceOrder) -> Self {
        Self {
            id: Some(order.id_typed()),
            details: order.details().clone(),
            original_parts: order.required_parts().to_vec(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn parts(&self) -> &[RequiredPart] {
        &self.details.required_parts
    }

    /// Units of `item_id` the saved order already holds.
    pub fn originally_reserved(&self, item_id: InventoryItemId) -> i64 {
        self.original_parts
            .iter()
            .filter(|p| p.inventory_item_id == item_id)
            .fold(0i64, |held, p| held.saturating_add(p.quantity))
    }

    /// Stock this draft may draw from `item`: the live quantity plus what the
    /// saved order already holds of it.
    pub fn available_stock(&self, item: &InventoryItem) -> i64 {
        item.quantity()
            .saturating_add(self.originally_reserved(item.id_typed()))
    }

    /// Put `quantity` units of `item` on the draft.
    ///
    /// An item already on the draft has its quantity replaced (not added to);
    /// its name and price stay as they were when it was first added.
    pub fn add_part(&mut self, item: &InventoryItem, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation(
                "select a part and a positive quantity",
            ));
        }
        if !item.exists() {
            return Err(DomainError::not_found());
        }

        let available = self.available_stock(item);
        if quantity > available {
            return Err(DomainError::insufficient_stock(available));
        }

        let item_id = item.id_typed();
        match self
            .details
            .required_parts
            .iter_mut()
            .find(|p| p.inventory_item_id == item_id)
        {
            Some(line) => line.quantity = quantity,
            None => self.details.required_parts.push(RequiredPart {
                inventory_item_id: item_id,
                name: item.name().to_string(),
                quantity,
                unit_price: item.unit_price(),
            }),
        }

        Ok(())
    }

    /// Drop the line for `item_id`; returns whether one was present.
    pub fn remove_part(&mut self, item_id: InventoryItemId) -> bool {
        let before = self.details.required_parts.len();
        self.details
            .required_parts
            .retain(|p| p.inventory_item_id != item_id);
        before != self.details.required_parts.len()
    }

    pub fn parts_total(&self) -> Money {
        self.details
            .required_parts
            .iter()
            .map(RequiredPart::line_total)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use repairdesk_core::{Aggregate, AggregateId};
    use repairdesk_inventory::{InventoryCommand, ItemDetails, RegisterItem};

    use crate::order::{OpenOrder, ServiceOrderCommand};

    fn stock_item(id: i64, quantity: i64, cents: i64) -> InventoryItem {
        let item_id = InventoryItemId::new(AggregateId::from_i64(id));
        let mut item = InventoryItem::empty(item_id);
        let events = item
            .handle(&InventoryCommand::RegisterItem(RegisterItem {
                item_id,
                details: ItemDetails {
                    name: format!("item-{id}"),
                    description: String::new(),
                    quantity,
                    unit_price: Money::from_cents(cents),
                },
                occurred_at: Utc::now(),
            }))
            .unwrap();
        item.apply(&events[0]);
        item
    }

    fn saved_order_holding(item: &InventoryItem, quantity: i64) -> ServiceOrder {
        let order_id = ServiceOrderId::new(AggregateId::from_i64(50));
        let mut order = ServiceOrder::empty(order_id);
        let details = OrderDetails {
            client_name: "Maria".to_string(),
            equipment: "Samsung A51".to_string(),
            defect: "Não liga".to_string(),
            required_parts: vec![RequiredPart {
                inventory_item_id: item.id_typed(),
                name: item.name().to_string(),
                quantity,
                unit_price: item.unit_price(),
            }],
            ..OrderDetails::default()
        };
        let events = order
            .handle(&ServiceOrderCommand::OpenOrder(OpenOrder {
                order_id,
                technician: "tecnico".to_string(),
                details,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    #[test]
    fn new_draft_defaults_to_pending_without_parts() {
        let draft = OrderDraft::new();
        assert!(draft.is_new());
        assert!(draft.parts().is_empty());
        assert_eq!(draft.details.status, crate::OrderStatus::Pending);
        assert_eq!(draft.details.payment_status, crate::PaymentStatus::Pending);
    }

    #[test]
    fn add_part_snapshots_name_and_price() {
        let item = stock_item(1, 10, 25000);
        let mut draft = OrderDraft::new();
        draft.add_part(&item, 2).unwrap();

        assert_eq!(draft.parts().len(), 1);
        assert_eq!(draft.parts()[0].name, "item-1");
        assert_eq!(draft.parts()[0].unit_price, Money::from_cents(25000));
        assert_eq!(draft.parts_total(), Money::from_cents(50000));
    }

    #[test]
    fn add_part_rejects_non_positive_quantity() {
        let item = stock_item(1, 10, 100);
        let mut draft = OrderDraft::new();
        assert!(matches!(draft.add_part(&item, 0), Err(DomainError::Validation(_))));
        assert!(matches!(draft.add_part(&item, -3), Err(DomainError::Validation(_))));
    }

    #[test]
    fn insufficient_stock_reports_available_quantity() {
        let item = stock_item(1, 3, 100);
        let mut draft = OrderDraft::new();
        let err = draft.add_part(&item, 4).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { available: 3 });
        assert!(draft.parts().is_empty());
    }

    #[test]
    fn editing_counts_what_the_order_already_holds() {
        // Order holds 2; 3 left on the shelf; asking for 5 is fine.
        let item = stock_item(1, 3, 100);
        let order = saved_order_holding(&item, 2);
        let mut draft = OrderDraft::from_order(&order);

        assert_eq!(draft.available_stock(&item), 5);
        draft.add_part(&item, 5).unwrap();
        assert_eq!(draft.parts()[0].quantity, 5);
        assert_eq!(draft.parts().len(), 1);

        assert_eq!(
            draft.add_part(&item, 6).unwrap_err(),
            DomainError::InsufficientStock { available: 5 }
        );
    }

    #[test]
    fn availability_saturates_instead_of_overflowing() {
        let item_id = InventoryItemId::new(AggregateId::from_i64(1));
        let mut full = InventoryItem::empty(item_id);
        full.apply(&repairdesk_inventory::InventoryEvent::ItemRegistered(
            repairdesk_inventory::ItemRegistered {
                item_id,
                details: ItemDetails {
                    name: "item-1".to_string(),
                    description: String::new(),
                    quantity: i64::MAX,
                    unit_price: Money::from_cents(100),
                },
                occurred_at: Utc::now(),
            },
        ));

        let order = saved_order_holding(&full, 1);
        let mut draft = OrderDraft::from_order(&order);
        assert_eq!(draft.available_stock(&full), i64::MAX);
        draft.add_part(&full, 1).unwrap();
        assert_eq!(draft.parts()[0].quantity, 1);
    }

    #[test]
    fn re_adding_keeps_frozen_price() {
        let item = stock_item(1, 10, 100);
        let mut draft = OrderDraft::new();
        draft.add_part(&item, 1).unwrap();

        let repriced = {
            let mut i = item.clone();
            let events = i
                .handle(&InventoryCommand::UpdateItem(repairdesk_inventory::UpdateItem {
                    item_id: item.id_typed(),
                    details: ItemDetails {
                        unit_price: Money::from_cents(999),
                        ..item.details()
                    },
                    occurred_at: Utc::now(),
                }))
                .unwrap();
            i.apply(&events[0]);
            i
        };

        draft.add_part(&repriced, 4).unwrap();
        assert_eq!(draft.parts()[0].quantity, 4);
        assert_eq!(draft.parts()[0].unit_price, Money::from_cents(100));
    }

    #[test]
    fn remove_part_drops_the_line() {
        let item = stock_item(1, 10, 100);
        let mut draft = OrderDraft::new();
        draft.add_part(&item, 1).unwrap();
        assert!(draft.remove_part(item.id_typed()));
        assert!(!draft.remove_part(item.id_typed()));
        assert!(draft.parts().is_empty());
    }

    proptest! {
        #[test]
        fn accepts_exactly_up_to_available(live in 0i64..50, held in 0i64..50, want in 1i64..120) {
            let item = stock_item(1, live, 100);
            let mut draft = if held > 0 {
                OrderDraft::from_order(&saved_order_holding(&item, held))
            } else {
                OrderDraft::new()
            };
            let result = draft.add_part(&item, want);
            if want <= live + held {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(DomainError::InsufficientStock { available: live + held }));
            }
        }
    }
}
