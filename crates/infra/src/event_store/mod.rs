//! Append-only event journal boundary.
//!
//! Every state change the workshop makes is recorded here, one stream per
//! aggregate instance, without making any storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{
    AppendBatch, EventStore, EventStoreError, ExpectedVersion, StoredEvent, UncommittedEvent,
};
