//! Spare-parts inventory domain module.
//!
//! This crate contains business rules for stock items, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{
    InventoryCommand, InventoryEvent, InventoryItem, InventoryItemId, ItemDetails, ItemRegistered,
    ItemRemoved, ItemUpdated, MAX_QUANTITY, MAX_UNIT_PRICE_CENTS, RegisterItem, ReleaseStock,
    RemoveItem, ReserveStock, StockReleased, StockReserved, UpdateItem,
};
