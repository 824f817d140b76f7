//! Infrastructure layer: event journal, state ownership, sessions.

pub mod event_store;
pub mod session;
pub mod workshop;

pub use session::{InMemorySessionStore, Session, SessionStore, Sessions, Theme};
pub use workshop::{Workshop, WorkshopError, WorkshopResult};
