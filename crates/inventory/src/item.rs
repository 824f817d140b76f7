use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use repairdesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money};
use repairdesk_events::Event;

/// Inventory item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub AggregateId);

impl InventoryItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for InventoryItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Largest stock count the item form accepts.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest unit price the item form accepts, in cents.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000;

/// Editable attributes of a stock item, as entered through the item form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl ItemDetails {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(DomainError::validation(format!(
                "quantity cannot exceed {MAX_QUANTITY}"
            )));
        }
        if self.unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if self.unit_price.cents() > MAX_UNIT_PRICE_CENTS {
            return Err(DomainError::validation(format!(
                "unit price cannot exceed {}",
                Money::from_cents(MAX_UNIT_PRICE_CENTS)
            )));
        }
        Ok(())
    }
}

/// Aggregate root: InventoryItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    name: String,
    description: String,
    quantity: i64,
    unit_price: Money,
    version: u64,
    created: bool,
    removed: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-registered aggregate instance.
    pub fn empty(id: InventoryItemId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            quantity: 0,
            unit_price: Money::ZERO,
            version: 0,
            created: false,
            removed: false,
        }
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Live stock count (what is on the shelf, reservations already deducted).
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Registered and not removed.
    pub fn exists(&self) -> bool {
        self.created && !self.removed
    }

    pub fn details(&self) -> ItemDetails {
        ItemDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

impl AggregateRoot for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateItem (full replacement of the editable attributes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReserveStock (a service order consumes `quantity` units).
///
/// Unconditional: availability is checked when the part is added to the
/// order, not here, so this may take the live quantity below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub item_id: InventoryItemId,
    pub order_id: AggregateId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReleaseStock (a service order gives `quantity` units back).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStock {
    pub item_id: InventoryItemId,
    pub order_id: AggregateId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    RegisterItem(RegisterItem),
    UpdateItem(UpdateItem),
    ReserveStock(ReserveStock),
    ReleaseStock(ReleaseStock),
    RemoveItem(RemoveItem),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub item_id: InventoryItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub item_id: InventoryItemId,
    pub order_id: AggregateId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub item_id: InventoryItemId,
    pub order_id: AggregateId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemRegistered(ItemRegistered),
    ItemUpdated(ItemUpdated),
    StockReserved(StockReserved),
    StockReleased(StockReleased),
    ItemRemoved(ItemRemoved),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemRegistered(_) => "inventory.item.registered",
            InventoryEvent::ItemUpdated(_) => "inventory.item.updated",
            InventoryEvent::StockReserved(_) => "inventory.item.stock_reserved",
            InventoryEvent::StockReleased(_) => "inventory.item.stock_released",
            InventoryEvent::ItemRemoved(_) => "inventory.item.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemRegistered(e) => e.occurred_at,
            InventoryEvent::ItemUpdated(e) => e.occurred_at,
            InventoryEvent::StockReserved(e) => e.occurred_at,
            InventoryEvent::StockReleased(e) => e.occurred_at,
            InventoryEvent::ItemRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.set_details(&e.details);
                self.created = true;
                self.removed = false;
            }
            InventoryEvent::ItemUpdated(e) => {
                self.set_details(&e.details);
            }
            InventoryEvent::StockReserved(e) => {
                self.quantity = self.quantity.saturating_sub(e.quantity);
            }
            InventoryEvent::StockReleased(e) => {
                self.quantity = self.quantity.saturating_add(e.quantity);
            }
            InventoryEvent::ItemRemoved(_) => {
                self.removed = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RegisterItem(cmd) => self.handle_register(cmd),
            InventoryCommand::UpdateItem(cmd) => self.handle_update(cmd),
            InventoryCommand::ReserveStock(cmd) => self.handle_reserve(cmd),
            InventoryCommand::ReleaseStock(cmd) => self.handle_release(cmd),
            InventoryCommand::RemoveItem(cmd) => self.handle_remove(cmd),
        }
    }
}

impl InventoryItem {
    fn set_details(&mut self, details: &ItemDetails) {
        self.name = details.name.clone();
        self.description = details.description.clone();
        self.quantity = details.quantity;
        self.unit_price = details.unit_price;
    }

    fn ensure_exists(&self, item_id: InventoryItemId) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::not_found());
        }
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        cmd.details.validate()?;

        Ok(vec![InventoryEvent::ItemRegistered(ItemRegistered {
            item_id: cmd.item_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists(cmd.item_id)?;
        cmd.details.validate()?;

        Ok(vec![InventoryEvent::ItemUpdated(ItemUpdated {
            item_id: cmd.item_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reserve(&self, cmd: &ReserveStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists(cmd.item_id)?;
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("reserved quantity must be positive"));
        }
        if self.quantity.checked_sub(cmd.quantity).is_none() {
            return Err(DomainError::invariant("stock count out of range"));
        }

        Ok(vec![InventoryEvent::StockReserved(StockReserved {
            item_id: cmd.item_id,
            order_id: cmd.order_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_release(&self, cmd: &ReleaseStock) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists(cmd.item_id)?;
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("released quantity must be positive"));
        }
        if self.quantity.checked_add(cmd.quantity).is_none() {
            return Err(DomainError::invariant("stock count out of range"));
        }

        Ok(vec![InventoryEvent::StockReleased(StockReleased {
            item_id: cmd.item_id,
            order_id: cmd.order_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveItem) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_exists(cmd.item_id)?;

        Ok(vec![InventoryEvent::ItemRemoved(ItemRemoved {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
