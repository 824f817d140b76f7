//! Service order (repair ticket) domain module.
//!
//! This crate contains business rules for repair tickets, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod draft;
pub mod order;

pub use draft::OrderDraft;
pub use order::{
    ChangePaymentStatus, ChangeStatus, DiscardOrder, OpenOrder, OrderDetails, OrderDiscarded,
    OrderOpened, OrderRevised, OrderStatus, PaymentStatus, PaymentStatusChanged, RequiredPart,
    ReviseOrder, ServiceOrder, ServiceOrderCommand, ServiceOrderEvent, ServiceOrderId,
    StatusChanged,
};
