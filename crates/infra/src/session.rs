//! Technician sessions and their per-session preferences.
//!
//! A session binds an opaque token to the technician's name. The name is
//! recorded on the orders that technician creates. Closing the session
//! forgets the identity together with its preferences.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use repairdesk_core::{DomainError, DomainResult};

/// Colour scheme of the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub theme: Theme,
    pub opened_at: DateTime<Utc>,
}

/// Key/value store for sessions, keyed by token.
pub trait SessionStore: Send + Sync {
    fn get(&self, token: &Uuid) -> Option<Session>;
    fn upsert(&self, session: Session);
    fn remove(&self, token: &Uuid) -> Option<Session>;

    /// Change a live session in place and return the result. A missing
    /// token stays missing.
    fn update(&self, token: &Uuid, change: &mut dyn FnMut(&mut Session)) -> Option<Session>;
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn get(&self, token: &Uuid) -> Option<Session> {
        (**self).get(token)
    }

    fn upsert(&self, session: Session) {
        (**self).upsert(session)
    }

    fn remove(&self, token: &Uuid) -> Option<Session> {
        (**self).remove(token)
    }

    fn update(&self, token: &Uuid, change: &mut dyn FnMut(&mut Session)) -> Option<Session> {
        (**self).update(token, change)
    }
}

/// In-memory session store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, token: &Uuid) -> Option<Session> {
        let map = self.inner.read().ok()?;
        map.get(token).cloned()
    }

    fn upsert(&self, session: Session) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(session.token, session);
        }
    }

    fn remove(&self, token: &Uuid) -> Option<Session> {
        self.inner.write().ok()?.remove(token)
    }

    fn update(&self, token: &Uuid, change: &mut dyn FnMut(&mut Session)) -> Option<Session> {
        let mut map = self.inner.write().ok()?;
        let session = map.get_mut(token)?;
        change(session);
        Some(session.clone())
    }
}

/// Session service on top of a [`SessionStore`].
#[derive(Debug, Default)]
pub struct Sessions<S = InMemorySessionStore> {
    store: S,
}

impl<S> Sessions<S>
where
    S: SessionStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Start a session for `username` (surrounding whitespace is dropped).
    pub fn open(&self, username: &str) -> DomainResult<Session> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username is required"));
        }

        let session = Session {
            token: Uuid::now_v7(),
            username: username.to_string(),
            theme: Theme::default(),
            opened_at: Utc::now(),
        };
        self.store.upsert(session.clone());
        info!(username = %session.username, "session opened");
        Ok(session)
    }

    pub fn resolve(&self, token: &Uuid) -> Option<Session> {
        self.store.get(token)
    }

    /// Returns whether a session was open under `token`.
    pub fn close(&self, token: &Uuid) -> bool {
        match self.store.remove(token) {
            Some(session) => {
                info!(username = %session.username, "session closed");
                true
            }
            None => false,
        }
    }

    pub fn theme(&self, token: &Uuid) -> Option<Theme> {
        self.store.get(token).map(|s| s.theme)
    }

    pub fn set_theme(&self, token: &Uuid, theme: Theme) -> DomainResult<Theme> {
        self.store
            .update(token, &mut |session: &mut Session| session.theme = theme)
            .map(|session| session.theme)
            .ok_or(DomainError::NotFound)
    }

    pub fn toggle_theme(&self, token: &Uuid) -> DomainResult<Theme> {
        self.store
            .update(token, &mut |session: &mut Session| {
                session.theme = session.theme.toggled()
            })
            .map(|session| session.theme)
            .ok_or(DomainError::NotFound)
    }
}
