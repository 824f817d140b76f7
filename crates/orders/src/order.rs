use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use repairdesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money};
use repairdesk_events::Event;
use repairdesk_inventory::InventoryItemId;

/// Service order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceOrderId(pub AggregateId);

impl ServiceOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ServiceOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ServiceOrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Repair status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InProgress => "In repair",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

/// Payment lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

/// Part line on a service order.
///
/// Name and unit price are snapshots taken when the part was added; later
/// edits to the inventory item do not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPart {
    pub inventory_item_id: InventoryItemId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl RequiredPart {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Everything the order form edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub client_name: String,
    pub equipment: String,
    pub defect: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub required_parts: Vec<RequiredPart>,
}

impl OrderDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.client_name.trim().is_empty() {
            return Err(DomainError::validation("client name is required"));
        }
        if self.equipment.trim().is_empty() {
            return Err(DomainError::validation("equipment is required"));
        }
        if self.defect.trim().is_empty() {
            return Err(DomainError::validation("defect description is required"));
        }

        for (idx, part) in self.required_parts.iter().enumerate() {
            if part.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "part quantity must be positive (line {})",
                    idx + 1
                )));
            }
            if part.unit_price.is_negative() {
                return Err(DomainError::validation(format!(
                    "part price cannot be negative (line {})",
                    idx + 1
                )));
            }
            let duplicated = self.required_parts[..idx]
                .iter()
                .any(|p| p.inventory_item_id == part.inventory_item_id);
            if duplicated {
                return Err(DomainError::invariant(format!(
                    "item {} appears on more than one line",
                    part.inventory_item_id
                )));
            }
        }

        Ok(())
    }
}

/// Aggregate root: ServiceOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOrder {
    id: ServiceOrderId,
    details: OrderDetails,
    technician: String,
    created_at: DateTime<Utc>,
    version: u64,
    created: bool,
    discarded: bool,
}

impl ServiceOrder {
    /// Create an empty, not-yet-opened aggregate instance.
    pub fn empty(id: ServiceOrderId) -> Self {
        Self {
            id,
            details: OrderDetails::default(),
            technician: String::new(),
            created_at: DateTime::<Utc>::default(),
            version: 0,
            created: false,
            discarded: false,
        }
    }

    pub fn id_typed(&self) -> ServiceOrderId {
        self.id
    }

    pub fn client_name(&self) -> &str {
        &self.details.client_name
    }

    pub fn equipment(&self) -> &str {
        &self.details.equipment
    }

    pub fn defect(&self) -> &str {
        &self.details.defect
    }

    pub fn status(&self) -> OrderStatus {
        self.details.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.details.payment_status
    }

    pub fn technician(&self) -> &str {
        &self.technician
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn required_parts(&self) -> &[RequiredPart] {
        &self.details.required_parts
    }

    pub fn details(&self) -> &OrderDetails {
        &self.details
    }

    /// Opened and not discarded.
    pub fn exists(&self) -> bool {
        self.created && !self.discarded
    }

    /// Units of `item_id` this order currently holds.
    pub fn reserved_quantity(&self, item_id: InventoryItemId) -> i64 {
        self.details
            .required_parts
            .iter()
            .filter(|p| p.inventory_item_id == item_id)
            .map(|p| p.quantity)
            .sum()
    }

    pub fn references(&self, item_id: InventoryItemId) -> bool {
        self.details
            .required_parts
            .iter()
            .any(|p| p.inventory_item_id == item_id)
    }

    /// Total cost of the parts at their frozen prices.
    pub fn parts_total(&self) -> Money {
        self.details.required_parts.iter().map(RequiredPart::line_total).sum()
    }
}

impl AggregateRoot for ServiceOrder {
    type Id = ServiceOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: ServiceOrderId,
    pub technician: String,
    pub details: OrderDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseOrder (replaces every editable field, parts included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseOrder {
    pub order_id: ServiceOrderId,
    pub details: OrderDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub order_id: ServiceOrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangePaymentStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePaymentStatus {
    pub order_id: ServiceOrderId,
    pub payment_status: PaymentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DiscardOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardOrder {
    pub order_id: ServiceOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceOrderCommand {
    OpenOrder(OpenOrder),
    ReviseOrder(ReviseOrder),
    ChangeStatus(ChangeStatus),
    ChangePaymentStatus(ChangePaymentStatus),
    DiscardOrder(DiscardOrder),
}

/// Event: OrderOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOpened {
    pub order_id: ServiceOrderId,
    pub technician: String,
    pub details: OrderDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRevised {
    pub order_id: ServiceOrderId,
    pub details: OrderDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: ServiceOrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusChanged {
    pub order_id: ServiceOrderId,
    pub payment_status: PaymentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDiscarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDiscarded {
    pub order_id: ServiceOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceOrderEvent {
    OrderOpened(OrderOpened),
    OrderRevised(OrderRevised),
    StatusChanged(StatusChanged),
    PaymentStatusChanged(PaymentStatusChanged),
    OrderDiscarded(OrderDiscarded),
}

impl Event for ServiceOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ServiceOrderEvent::OrderOpened(_) => "orders.order.opened",
            ServiceOrderEvent::OrderRevised(_) => "orders.order.revised",
            ServiceOrderEvent::StatusChanged(_) => "orders.order.status_changed",
            ServiceOrderEvent::PaymentStatusChanged(_) => "orders.order.payment_status_changed",
            ServiceOrderEvent::OrderDiscarded(_) => "orders.order.discarded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ServiceOrderEvent::OrderOpened(e) => e.occurred_at,
            ServiceOrderEvent::OrderRevised(e) => e.occurred_at,
            ServiceOrderEvent::StatusChanged(e) => e.occurred_at,
            ServiceOrderEvent::PaymentStatusChanged(e) => e.occurred_at,
            ServiceOrderEvent::OrderDiscarded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ServiceOrder {
    type Command = ServiceOrderCommand;
    type Event = ServiceOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ServiceOrderEvent::OrderOpened(e) => {
                self.id = e.order_id;
                self.technician = e.technician.clone();
                self.details = e.details.clone();
                self.created_at = e.occurred_at;
                self.created = true;
                self.discarded = false;
            }
            ServiceOrderEvent::OrderRevised(e) => {
                self.details = e.details.clone();
            }
            ServiceOrderEvent::StatusChanged(e) => {
                self.details.status = e.status;
            }
            ServiceOrderEvent::PaymentStatusChanged(e) => {
                self.details.payment_status = e.payment_status;
            }
            ServiceOrderEvent::OrderDiscarded(_) => {
                self.discarded = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ServiceOrderCommand::OpenOrder(cmd) => self.handle_open(cmd),
            ServiceOrderCommand::ReviseOrder(cmd) => self.handle_revise(cmd),
            ServiceOrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            ServiceOrderCommand::ChangePaymentStatus(cmd) => self.handle_change_payment(cmd),
            ServiceOrderCommand::DiscardOrder(cmd) => self.handle_discard(cmd),
        }
    }
}

impl ServiceOrder {
    fn ensure_exists(&self, order_id: ServiceOrderId) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::not_found());
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenOrder) -> Result<Vec<ServiceOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("service order already exists"));
        }
        if cmd.technician.trim().is_empty() {
            return Err(DomainError::validation("technician is required"));
        }
        cmd.details.validate()?;

        Ok(vec![ServiceOrderEvent::OrderOpened(OrderOpened {
            order_id: cmd.order_id,
            technician: cmd.technician.clone(),
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseOrder) -> Result<Vec<ServiceOrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        cmd.details.validate()?;

        Ok(vec![ServiceOrderEvent::OrderRevised(OrderRevised {
            order_id: cmd.order_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeStatus,
    ) -> Result<Vec<ServiceOrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        if self.details.status == cmd.status {
            return Ok(vec![]);
        }

        Ok(vec![ServiceOrderEvent::StatusChanged(StatusChanged {
            order_id: cmd.order_id,
            status: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_payment(
        &self,
        cmd: &ChangePaymentStatus,
    ) -> Result<Vec<ServiceOrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;
        if self.details.payment_status == cmd.payment_status {
            return Ok(vec![]);
        }

        Ok(vec![ServiceOrderEvent::PaymentStatusChanged(PaymentStatusChanged {
            order_id: cmd.order_id,
            payment_status: cmd.payment_status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_discard(&self, cmd: &DiscardOrder) -> Result<Vec<ServiceOrderEvent>, DomainError> {
        self.ensure_exists(cmd.order_id)?;

        Ok(vec![ServiceOrderEvent::OrderDiscarded(OrderDiscarded {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
