//! Sample parts and orders for local development.
//!
//! Seeded as they stand: the stock counts already account for the parts the
//! sample orders hold, so seeding registers and opens without moving stock.

use chrono::{DateTime, TimeZone, Utc};

use repairdesk_core::{AggregateId, DomainError, Money};
use repairdesk_inventory::{InventoryCommand, InventoryItem, InventoryItemId, ItemDetails, RegisterItem};
use repairdesk_orders::{
    OpenOrder, OrderDetails, OrderStatus, PaymentStatus, RequiredPart, ServiceOrder,
    ServiceOrderCommand, ServiceOrderId,
};

use super::{ITEM_AGGREGATE, ORDER_AGGREGATE, Workshop, WorkshopResult, decide};
use crate::event_store::{EventStore, InMemoryEventStore};

const TECHNICIAN: &str = "tecnico";

struct DemoItem {
    id: i64,
    name: &'static str,
    description: &'static str,
    quantity: i64,
    cents: i64,
}

const ITEMS: [DemoItem; 4] = [
    DemoItem {
        id: 1,
        name: "Tela LCD iPhone 11",
        description: "Tela de reposição para iPhone 11",
        quantity: 10,
        cents: 25000,
    },
    DemoItem {
        id: 2,
        name: "Bateria Samsung A51",
        description: "Bateria original para Samsung Galaxy A51",
        quantity: 15,
        cents: 12050,
    },
    DemoItem {
        id: 3,
        name: "Conector de Carga USB-C",
        description: "Conector genérico para celulares com entrada USB-C",
        quantity: 30,
        cents: 4500,
    },
    DemoItem {
        id: 4,
        name: "Câmera Traseira Moto G8",
        description: "Módulo de câmera traseira para Motorola Moto G8",
        quantity: 5,
        cents: 18000,
    },
];

struct DemoOrder {
    id: i64,
    client_name: &'static str,
    equipment: &'static str,
    defect: &'static str,
    status: OrderStatus,
    payment_status: PaymentStatus,
    /// (year, month, day, hour, minute), UTC.
    created_at: (i32, u32, u32, u32, u32),
    /// (item id, quantity); name and price come from the item.
    parts: &'static [(i64, i64)],
}

const ORDERS: [DemoOrder; 4] = [
    DemoOrder {
        id: 1,
        client_name: "João Silva",
        equipment: "iPhone 11",
        defect: "Tela quebrada",
        status: OrderStatus::InProgress,
        payment_status: PaymentStatus::Pending,
        created_at: (2023, 10, 26, 10, 0),
        parts: &[(1, 1)],
    },
    DemoOrder {
        id: 2,
        client_name: "Maria Oliveira",
        equipment: "Samsung A51",
        defect: "Não liga, possível problema na bateria",
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        created_at: (2023, 10, 27, 14, 30),
        parts: &[],
    },
    DemoOrder {
        id: 3,
        client_name: "Carlos Pereira",
        equipment: "Macbook Pro 2019",
        defect: "Teclado não funciona",
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        created_at: (2023, 10, 20, 9, 0),
        parts: &[],
    },
    DemoOrder {
        id: 4,
        client_name: "Ana Costa",
        equipment: "Motorola Moto G8",
        defect: "Câmera não foca",
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        created_at: (2023, 10, 22, 11, 0),
        parts: &[(4, 1)],
    },
];

fn timestamp((y, mo, d, h, mi): (i32, u32, u32, u32, u32)) -> Result<DateTime<Utc>, DomainError> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .ok_or_else(|| DomainError::invariant("demo timestamp out of range"))
}

impl Workshop<InMemoryEventStore> {
    /// In-memory workshop preloaded with four parts and four orders.
    pub fn with_demo_data() -> WorkshopResult<Self> {
        let workshop = Self::new();
        workshop.seed_demo_data()?;
        Ok(workshop)
    }
}

impl<S> Workshop<S>
where
    S: EventStore,
{
    /// Load the sample data, in list order, into an empty workshop.
    pub fn seed_demo_data(&self) -> WorkshopResult<()> {
        let mut state = self.lock();
        if !state.inventory.is_empty() || !state.orders.is_empty() {
            return Err(DomainError::conflict("workshop already holds data").into());
        }

        let mut next = state.clone();
        let mut pending = Vec::new();
        let now = Utc::now();

        for demo in &ITEMS {
            let item_id = InventoryItemId::new(AggregateId::from_i64(demo.id));
            let mut item = InventoryItem::empty(item_id);
            decide(
                &mut item,
                item_id.0,
                ITEM_AGGREGATE,
                &InventoryCommand::RegisterItem(RegisterItem {
                    item_id,
                    details: ItemDetails {
                        name: demo.name.to_string(),
                        description: demo.description.to_string(),
                        quantity: demo.quantity,
                        unit_price: Money::from_cents(demo.cents),
                    },
                    occurred_at: now,
                }),
                &mut pending,
            )?;
            next.ids.observe(item_id.0);
            next.inventory.push(item);
        }

        for demo in &ORDERS {
            let order_id = ServiceOrderId::new(AggregateId::from_i64(demo.id));
            let mut required_parts = Vec::with_capacity(demo.parts.len());
            for &(item, quantity) in demo.parts {
                let item_id = InventoryItemId::new(AggregateId::from_i64(item));
                let idx = next.item_index(item_id).ok_or(DomainError::NotFound)?;
                let stocked = &next.inventory[idx];
                required_parts.push(RequiredPart {
                    inventory_item_id: item_id,
                    name: stocked.name().to_string(),
                    quantity,
                    unit_price: stocked.unit_price(),
                });
            }

            let mut order = ServiceOrder::empty(order_id);
            decide(
                &mut order,
                order_id.0,
                ORDER_AGGREGATE,
                &ServiceOrderCommand::OpenOrder(OpenOrder {
                    order_id,
                    technician: TECHNICIAN.to_string(),
                    details: OrderDetails {
                        client_name: demo.client_name.to_string(),
                        equipment: demo.equipment.to_string(),
                        defect: demo.defect.to_string(),
                        status: demo.status,
                        payment_status: demo.payment_status,
                        required_parts,
                    },
                    occurred_at: timestamp(demo.created_at)?,
                }),
                &mut pending,
            )?;
            next.ids.observe(order_id.0);
            next.orders.push(order);
        }

        self.commit(&mut state, next, pending)?;
        tracing::info!(items = ITEMS.len(), orders = ORDERS.len(), "demo data seeded");
        Ok(())
    }
}
