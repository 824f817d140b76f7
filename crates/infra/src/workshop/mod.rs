//! The workshop: single owner of the inventory and the service orders.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! lock state
//!   ↓
//! clone the collections it touches (working copy)
//!   ↓
//! handle each command on the copy, apply the resulting events, queue them
//!   ↓
//! append the queued events to the journal in one call (every stream's
//! version is checked before any is written)
//!   ↓
//! swap the working copy in
//! ```
//!
//! A failing decision or a failed version check drops the working copy and
//! writes nothing, so a rejected operation never leaves stock half-moved.
//! Aggregate versions always equal their journal stream versions.
//!
//! Saving or deleting an order adjusts stock the same way every time: the
//! parts the stored order held go back to their items, then the parts of the
//! new revision are taken out. Availability is checked only when a part is
//! put on a draft ([`Workshop::add_part`]); the save itself is unconditional.

mod demo;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use repairdesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError, IdSequence};
use repairdesk_events::{Event, EventEnvelope};
use repairdesk_inventory::{
    InventoryCommand, InventoryItem, InventoryItemId, ItemDetails, RegisterItem, ReleaseStock,
    RemoveItem, ReserveStock, UpdateItem,
};
use repairdesk_orders::{
    ChangePaymentStatus, ChangeStatus, DiscardOrder, OpenOrder, OrderDraft, OrderStatus,
    PaymentStatus, RequiredPart, ReviseOrder, ServiceOrder, ServiceOrderCommand, ServiceOrderId,
};

use crate::event_store::{
    EventStore, EventStoreError, ExpectedVersion, InMemoryEventStore, UncommittedEvent,
};

/// Stream type of inventory item events.
pub const ITEM_AGGREGATE: &str = "inventory.item";
/// Stream type of service order events.
pub const ORDER_AGGREGATE: &str = "orders.service_order";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkshopError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("journal: {0}")]
    Store(#[from] EventStoreError),
}

pub type WorkshopResult<T> = Result<T, WorkshopError>;

#[derive(Debug, Clone)]
struct WorkshopState {
    /// Newest first.
    inventory: Vec<InventoryItem>,
    /// Newest first.
    orders: Vec<ServiceOrder>,
    ids: IdSequence,
}

/// Events decided for one aggregate, waiting for the journal.
struct PendingAppend {
    expected: ExpectedVersion,
    events: Vec<UncommittedEvent>,
}

#[derive(Debug, Clone, Copy)]
enum StockMove {
    Release,
    Reserve,
}

/// Run `command` against `aggregate`: apply what it decides and queue it.
fn decide<A>(
    aggregate: &mut A,
    aggregate_id: AggregateId,
    aggregate_type: &'static str,
    command: &A::Command,
    pending: &mut Vec<PendingAppend>,
) -> WorkshopResult<()>
where
    A: Aggregate<Error = DomainError>,
    A::Event: Event + Serialize,
{
    let expected = ExpectedVersion::Exact(aggregate.version());
    let events = aggregate.handle(command)?;
    if events.is_empty() {
        return Ok(());
    }

    let mut batch = Vec::with_capacity(events.len());
    for event in &events {
        batch.push(UncommittedEvent::from_typed(
            aggregate_id,
            aggregate_type,
            Uuid::now_v7(),
            event,
        )?);
        aggregate.apply(event);
    }

    pending.push(PendingAppend {
        expected,
        events: batch,
    });
    Ok(())
}

impl WorkshopState {
    fn empty(ids: IdSequence) -> Self {
        Self {
            inventory: Vec::new(),
            orders: Vec::new(),
            ids,
        }
    }

    fn item_index(&self, id: InventoryItemId) -> Option<usize> {
        self.inventory.iter().position(|i| i.id_typed() == id)
    }

    fn order_index(&self, id: ServiceOrderId) -> Option<usize> {
        self.orders.iter().position(|o| o.id_typed() == id)
    }

    /// Move one part line in or out of stock. Lines whose item no longer
    /// exists are skipped.
    fn move_stock(
        &mut self,
        order_id: ServiceOrderId,
        part: &RequiredPart,
        direction: StockMove,
        at: DateTime<Utc>,
        pending: &mut Vec<PendingAppend>,
    ) -> WorkshopResult<()> {
        let Some(idx) = self.item_index(part.inventory_item_id) else {
            debug!(item_id = %part.inventory_item_id, order_id = %order_id, "part refers to a missing item; skipped");
            return Ok(());
        };

        let command = match direction {
            StockMove::Release => InventoryCommand::ReleaseStock(ReleaseStock {
                item_id: part.inventory_item_id,
                order_id: order_id.0,
                quantity: part.quantity,
                occurred_at: at,
            }),
            StockMove::Reserve => InventoryCommand::ReserveStock(ReserveStock {
                item_id: part.inventory_item_id,
                order_id: order_id.0,
                quantity: part.quantity,
                occurred_at: at,
            }),
        };

        let item = &mut self.inventory[idx];
        decide(item, part.inventory_item_id.0, ITEM_AGGREGATE, &command, pending)?;

        if item.quantity() < 0 {
            warn!(
                item_id = %item.id_typed(),
                quantity = item.quantity(),
                order_id = %order_id,
                "stock went negative"
            );
        }
        Ok(())
    }
}

/// State owner for a repair shop.
///
/// Generic over the journal so a persistent backend can replace the
/// in-memory one.
#[derive(Debug)]
pub struct Workshop<S = InMemoryEventStore> {
    state: Mutex<WorkshopState>,
    journal: S,
}

impl Workshop<InMemoryEventStore> {
    /// Empty workshop with an in-memory journal and clock-seeded ids.
    pub fn new() -> Self {
        Self::with_store(InMemoryEventStore::new(), IdSequence::from_clock())
    }
}

impl Default for Workshop<InMemoryEventStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Workshop<S>
where
    S: EventStore,
{
    pub fn with_store(journal: S, ids: IdSequence) -> Self {
        Self {
            state: Mutex::new(WorkshopState::empty(ids)),
            journal,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkshopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal everything `pending` holds, then publish the working copy.
    fn commit(
        &self,
        state: &mut WorkshopState,
        next: WorkshopState,
        pending: Vec<PendingAppend>,
    ) -> WorkshopResult<()> {
        self.journal.append_batches(
            pending
                .into_iter()
                .map(|append| (append.events, append.expected))
                .collect(),
        )?;
        *state = next;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Service orders
    // ---------------------------------------------------------------------

    /// Create or revise an order from a draft and move its parts in stock.
    ///
    /// A draft without an id becomes a new order (fresh id, `technician`,
    /// created now, placed first in the list). A draft with an id revises
    /// that order; technician and creation time are kept.
    pub fn save_order(&self, draft: OrderDraft, technician: &str) -> WorkshopResult<ServiceOrder> {
        let now = Utc::now();
        let is_new = draft.is_new();
        let mut state = self.lock();
        let mut next = state.clone();
        let mut pending = Vec::new();

        let (saved, released) = match draft.id {
            None => {
                let order_id = ServiceOrderId::new(next.ids.next_id());
                let mut order = ServiceOrder::empty(order_id);
                decide(
                    &mut order,
                    order_id.0,
                    ORDER_AGGREGATE,
                    &ServiceOrderCommand::OpenOrder(OpenOrder {
                        order_id,
                        technician: technician.to_string(),
                        details: draft.details,
                        occurred_at: now,
                    }),
                    &mut pending,
                )?;
                next.orders.insert(0, order.clone());
                (order, Vec::new())
            }
            Some(order_id) => {
                let idx = next.order_index(order_id).ok_or(DomainError::NotFound)?;
                let released = next.orders[idx].required_parts().to_vec();
                decide(
                    &mut next.orders[idx],
                    order_id.0,
                    ORDER_AGGREGATE,
                    &ServiceOrderCommand::ReviseOrder(ReviseOrder {
                        order_id,
                        details: draft.details,
                        occurred_at: now,
                    }),
                    &mut pending,
                )?;
                (next.orders[idx].clone(), released)
            }
        };

        let order_id = saved.id_typed();
        for part in &released {
            next.move_stock(order_id, part, StockMove::Release, now, &mut pending)?;
        }
        for part in saved.required_parts() {
            next.move_stock(order_id, part, StockMove::Reserve, now, &mut pending)?;
        }

        self.commit(&mut state, next, pending)?;
        info!(
            order_id = %order_id,
            parts = saved.required_parts().len(),
            new = is_new,
            "service order saved"
        );
        Ok(saved)
    }

    /// Remove an order and give all its parts back to stock.
    pub fn delete_order(&self, order_id: ServiceOrderId) -> WorkshopResult<()> {
        let now = Utc::now();
        let mut state = self.lock();
        let mut next = state.clone();
        let mut pending = Vec::new();

        let idx = next.order_index(order_id).ok_or(DomainError::NotFound)?;
        let released = next.orders[idx].required_parts().to_vec();
        decide(
            &mut next.orders[idx],
            order_id.0,
            ORDER_AGGREGATE,
            &ServiceOrderCommand::DiscardOrder(DiscardOrder {
                order_id,
                occurred_at: now,
            }),
            &mut pending,
        )?;
        next.orders.remove(idx);

        for part in &released {
            next.move_stock(order_id, part, StockMove::Release, now, &mut pending)?;
        }

        self.commit(&mut state, next, pending)?;
        info!(order_id = %order_id, released = released.len(), "service order deleted");
        Ok(())
    }

    pub fn change_order_status(
        &self,
        order_id: ServiceOrderId,
        status: OrderStatus,
    ) -> WorkshopResult<ServiceOrder> {
        self.update_order(
            order_id,
            ServiceOrderCommand::ChangeStatus(ChangeStatus {
                order_id,
                status,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn change_payment_status(
        &self,
        order_id: ServiceOrderId,
        payment_status: PaymentStatus,
    ) -> WorkshopResult<ServiceOrder> {
        self.update_order(
            order_id,
            ServiceOrderCommand::ChangePaymentStatus(ChangePaymentStatus {
                order_id,
                payment_status,
                occurred_at: Utc::now(),
            }),
        )
    }

    /// In-place order change with no effect on stock.
    fn update_order(
        &self,
        order_id: ServiceOrderId,
        command: ServiceOrderCommand,
    ) -> WorkshopResult<ServiceOrder> {
        let mut state = self.lock();
        let mut next = state.clone();
        let mut pending = Vec::new();

        let idx = next.order_index(order_id).ok_or(DomainError::NotFound)?;
        decide(&mut next.orders[idx], order_id.0, ORDER_AGGREGATE, &command, &mut pending)?;
        let updated = next.orders[idx].clone();

        self.commit(&mut state, next, pending)?;
        Ok(updated)
    }

    /// Draft of a stored order, ready for editing.
    pub fn edit_order(&self, order_id: ServiceOrderId) -> WorkshopResult<OrderDraft> {
        let state = self.lock();
        let idx = state.order_index(order_id).ok_or(DomainError::NotFound)?;
        Ok(OrderDraft::from_order(&state.orders[idx]))
    }

    /// Put a part on a draft, checking it against the live stock.
    pub fn add_part(
        &self,
        draft: &mut OrderDraft,
        item_id: InventoryItemId,
        quantity: i64,
    ) -> WorkshopResult<()> {
        let state = self.lock();
        let idx = state.item_index(item_id).ok_or(DomainError::NotFound)?;
        draft.add_part(&state.inventory[idx], quantity)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Inventory
    // ---------------------------------------------------------------------

    /// Register a new item (`item_id == None`) or replace an existing one.
    pub fn save_item(
        &self,
        item_id: Option<InventoryItemId>,
        details: ItemDetails,
    ) -> WorkshopResult<InventoryItem> {
        let now = Utc::now();
        let mut state = self.lock();
        let mut next = state.clone();
        let mut pending = Vec::new();

        let saved = match item_id {
            None => {
                let item_id = InventoryItemId::new(next.ids.next_id());
                let mut item = InventoryItem::empty(item_id);
                decide(
                    &mut item,
                    item_id.0,
                    ITEM_AGGREGATE,
                    &InventoryCommand::RegisterItem(RegisterItem {
                        item_id,
                        details,
                        occurred_at: now,
                    }),
                    &mut pending,
                )?;
                next.inventory.insert(0, item.clone());
                item
            }
            Some(item_id) => {
                let idx = next.item_index(item_id).ok_or(DomainError::NotFound)?;
                decide(
                    &mut next.inventory[idx],
                    item_id.0,
                    ITEM_AGGREGATE,
                    &InventoryCommand::UpdateItem(UpdateItem {
                        item_id,
                        details,
                        occurred_at: now,
                    }),
                    &mut pending,
                )?;
                next.inventory[idx].clone()
            }
        };

        self.commit(&mut state, next, pending)?;
        info!(item_id = %saved.id_typed(), quantity = saved.quantity(), "inventory item saved");
        Ok(saved)
    }

    /// Remove an item nobody references.
    pub fn delete_item(&self, item_id: InventoryItemId) -> WorkshopResult<()> {
        let mut state = self.lock();
        let idx = state.item_index(item_id).ok_or(DomainError::NotFound)?;

        let in_use = state.orders.iter().filter(|o| o.references(item_id)).count();
        if in_use > 0 {
            let name = state.inventory[idx].name().to_string();
            warn!(item_id = %item_id, orders = in_use, "refusing to delete an item used by service orders");
            return Err(DomainError::item_in_use(name).into());
        }

        let mut next = state.clone();
        let mut pending = Vec::new();
        decide(
            &mut next.inventory[idx],
            item_id.0,
            ITEM_AGGREGATE,
            &InventoryCommand::RemoveItem(RemoveItem {
                item_id,
                occurred_at: Utc::now(),
            }),
            &mut pending,
        )?;
        next.inventory.remove(idx);

        self.commit(&mut state, next, pending)?;
        info!(item_id = %item_id, "inventory item deleted");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn orders(&self) -> Vec<ServiceOrder> {
        self.lock().orders.clone()
    }

    pub fn order(&self, order_id: ServiceOrderId) -> Option<ServiceOrder> {
        let state = self.lock();
        state.order_index(order_id).map(|idx| state.orders[idx].clone())
    }

    pub fn inventory(&self) -> Vec<InventoryItem> {
        self.lock().inventory.clone()
    }

    pub fn item(&self, item_id: InventoryItemId) -> Option<InventoryItem> {
        let state = self.lock();
        state.item_index(item_id).map(|idx| state.inventory[idx].clone())
    }

    /// Orders whose client name or equipment contains `term`, ignoring case.
    pub fn search_orders(&self, term: &str) -> Vec<ServiceOrder> {
        let needle = term.to_lowercase();
        self.lock()
            .orders
            .iter()
            .filter(|o| {
                o.client_name().to_lowercase().contains(&needle)
                    || o.equipment().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Items whose name contains `term`, ignoring case.
    pub fn search_inventory(&self, term: &str) -> Vec<InventoryItem> {
        let needle = term.to_lowercase();
        self.lock()
            .inventory
            .iter()
            .filter(|i| i.name().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Units of `item_id` held by all orders together.
    pub fn reserved_quantity(&self, item_id: InventoryItemId) -> i64 {
        self.lock()
            .orders
            .iter()
            .map(|o| o.reserved_quantity(item_id))
            .sum()
    }

    /// Every committed event, oldest first.
    pub fn journal(&self) -> WorkshopResult<Vec<EventEnvelope<JsonValue>>> {
        let stored = self.journal.load_all()?;
        Ok(stored.iter().map(|e| e.to_envelope()).collect())
    }
}
