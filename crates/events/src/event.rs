use chrono::{DateTime, Utc};

/// Something that happened to an item or an order, as recorded in the journal.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name such as `inventory.item.stock_reserved`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
