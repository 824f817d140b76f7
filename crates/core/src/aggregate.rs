//! Decide/apply contract shared by inventory items and service orders.

/// Identity and version of a stored aggregate.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Events applied so far; matches the length of the journal stream.
    fn version(&self) -> u64;
}

/// A command handler that never touches state until told to.
///
/// `handle` inspects the current state and returns the events a command
/// produces, or the reason it is refused. `apply` folds one event in and
/// bumps the version by one. Moving stock between an order and its items
/// spans several aggregates; the workshop runs every `handle` on a working
/// copy and publishes only when all of them succeed.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
